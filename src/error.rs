use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for environment variable {var}")]
    Invalid { var: &'static str, value: String },
}

/// Failures of a single completion request. None of these reach the end
/// user in raw form; the dispatcher logs them and replies with a fixed
/// apology.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("request to DeepSeek failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("DeepSeek returned HTTP {0}")]
    Http(reqwest::StatusCode),

    #[error("DeepSeek API error: {0}")]
    Api(String),

    #[error("DeepSeek returned no choices")]
    Empty,

    #[error("unexpected DeepSeek response body: {0}")]
    Decode(#[from] serde_json::Error),
}
