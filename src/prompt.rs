/// Fixed instruction template for product descriptions. The product name is
/// substituted as opaque text; nothing in it is re-interpreted.
const PROMPT_TEMPLATE: &str = "Сгенерируй продающее описание для товара: {product}.\n\
Формат:\n\
1. Основные характеристики\n\
2. 3 уникальных преимущества\n\
3. Призыв к действию\n\
Используй эмоджи и маркированные списки.";

pub fn build_prompt(product_name: &str) -> String {
    PROMPT_TEMPLATE.replace("{product}", product_name)
}
