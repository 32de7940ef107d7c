use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, KeyboardButton, KeyboardMarkup};
use teloxide::update_listeners::webhooks;
use tracing::{error, info, warn};

use crate::config::{Config, Mode};
use crate::deepseek::DeepSeekClient;
use crate::prompt::build_prompt;

const GREETING: &str = "🛍️ Бот-генератор описаний товаров\n\
Просто напиши название товара или выбери категорию:";

const APOLOGY: &str = "😞 Не удалось сгенерировать описание.\n\
Попробуй изменить запрос или повторить позже.";

const CATEGORIES: [[&str; 2]; 2] = [["Одежда", "Электроника"], ["Косметика", "Другое"]];

/// Shared application state
pub struct AppState {
    deepseek: DeepSeekClient,
    config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let deepseek = DeepSeekClient::new(&config.api_key);
        Self { deepseek, config }
    }
}

/// Start the Telegram bot with the transport picked by the configuration.
/// Runs until the process is terminated.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let bot = Bot::new(&state.config.bot_token);
    let mode = state.config.mode.clone();

    let handler = Update::filter_message().endpoint(handle_message);

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("bot"))
        .build();

    match mode {
        Mode::Polling => {
            info!("Starting long polling...");
            dispatcher.dispatch().await;
        }
        Mode::Webhook(webhook) => {
            let address = ([0, 0, 0, 0], webhook.port).into();
            let url = format!("https://{}/webhook", webhook.host)
                .parse()
                .context("invalid webhook URL")?;

            info!("Registering webhook {} on port {}", url, webhook.port);

            // Calls setWebhook with Telegram, then serves the endpoint.
            // Undecodable update payloads are rejected by the listener
            // itself and never reach the handler.
            let listener = webhooks::axum(bot, webhooks::Options::new(address, url))
                .await
                .context("failed to set up webhook listener")?;

            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("webhook update listener"),
                )
                .await;
        }
    }

    Ok(())
}

/// What to do with an incoming message.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Greet,
    Generate(String),
    Ignore,
}

/// `/start` greets (deep-link arguments ignored), other commands are
/// silently dropped, anything else is treated as a product name.
fn classify(text: &str) -> Action {
    let first = text.split_whitespace().next().unwrap_or("");
    if first == "/start" || first.starts_with("/start@") {
        Action::Greet
    } else if text.starts_with('/') {
        Action::Ignore
    } else {
        Action::Generate(text.to_string())
    }
}

fn category_keyboard() -> KeyboardMarkup {
    let rows = CATEGORIES
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(*label)));
    KeyboardMarkup::new(rows).resize_keyboard()
}

async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Non-text updates get no reply
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    match classify(text) {
        Action::Greet => {
            info!("Greeting chat {}", msg.chat.id);
            bot.send_message(msg.chat.id, GREETING)
                .reply_markup(category_keyboard())
                .await?;
        }
        Action::Generate(product) => {
            info!("Generating description for chat {}: {}", msg.chat.id, product);
            bot.send_chat_action(msg.chat.id, ChatAction::Typing)
                .await
                .ok();

            let reply = describe_product(&state, &product).await;
            bot.send_message(msg.chat.id, reply).await?;
        }
        Action::Ignore => {}
    }

    Ok(())
}

/// Builds the user-facing reply for a product name. Every completion
/// failure is logged in full and collapses to the fixed apology; the
/// internal reason never reaches the user.
async fn describe_product(state: &AppState, product: &str) -> String {
    let prompt = build_prompt(product);

    match state.deepseek.complete(&prompt).await {
        Ok(description) => format!("📝 Описание для {product}:\n\n{description}"),
        Err(e) => {
            error!("Description generation failed: {e:?}");
            APOLOGY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Mode};

    fn test_state(base_url: &str) -> AppState {
        AppState {
            deepseek: DeepSeekClient::with_base_url("test-key", base_url),
            config: Config {
                bot_token: "test-token".to_string(),
                api_key: "test-key".to_string(),
                mode: Mode::Polling,
            },
        }
    }

    #[test]
    fn start_command_greets() {
        assert_eq!(classify("/start"), Action::Greet);
        assert_eq!(classify("/start@prodbot"), Action::Greet);
        assert_eq!(classify("/start ref123"), Action::Greet);
    }

    #[test]
    fn other_commands_are_ignored() {
        assert_eq!(classify("/help"), Action::Ignore);
        assert_eq!(classify("/startle"), Action::Ignore);
    }

    #[test]
    fn plain_text_becomes_product_name() {
        assert_eq!(classify("Чайник"), Action::Generate("Чайник".to_string()));
        assert_eq!(
            classify("умная колонка 2000"),
            Action::Generate("умная колонка 2000".to_string())
        );
    }

    #[test]
    fn keyboard_has_fixed_categories() {
        let keyboard = category_keyboard();
        let labels: Vec<Vec<String>> = keyboard
            .keyboard
            .iter()
            .map(|row| row.iter().map(|button| button.text.clone()).collect())
            .collect();

        assert_eq!(
            labels,
            vec![
                vec!["Одежда", "Электроника"],
                vec!["Косметика", "Другое"]
            ]
        );
        assert!(keyboard.resize_keyboard);
    }

    #[tokio::test]
    async fn successful_generation_is_formatted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"✨ Кипятит за минуту"}}]}"#)
            .create_async()
            .await;

        let state = test_state(&server.url());
        let reply = describe_product(&state, "Чайник").await;

        assert_eq!(reply, "📝 Описание для Чайник:\n\n✨ Кипятит за минуту");
    }

    #[tokio::test]
    async fn upstream_http_failure_yields_apology() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let state = test_state(&server.url());
        let reply = describe_product(&state, "Чайник").await;

        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn upstream_api_error_yields_apology() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"error":{"message":"Insufficient balance"}}"#)
            .create_async()
            .await;

        let state = test_state(&server.url());
        let reply = describe_product(&state, "Чайник").await;

        assert_eq!(reply, APOLOGY);
    }

    #[tokio::test]
    async fn empty_completion_yields_apology() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let state = test_state(&server.url());
        let reply = describe_product(&state, "Чайник").await;

        assert_eq!(reply, APOLOGY);
    }
}
