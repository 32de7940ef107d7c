use std::env;

use crate::error::ConfigError;

const DEFAULT_PORT: u16 = 5000;

/// How updates are delivered from Telegram. One mode per process.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Polling,
    Webhook(WebhookConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    /// Public hostname the webhook URL is built from.
    pub host: String,
    pub port: u16,
}

/// Process-wide configuration, loaded once at startup and immutable after.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub api_key: String,
    pub mode: Mode,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = require(&get, "TELEGRAM_BOT_TOKEN")?;
        let api_key = require(&get, "DEEPSEEK_API_KEY")?;

        let mode = match get("BOT_MODE").as_deref() {
            None | Some("") | Some("polling") => Mode::Polling,
            Some("webhook") => {
                let host = require(&get, "RENDER_EXTERNAL_HOSTNAME")?;
                let port = match get("PORT") {
                    None => DEFAULT_PORT,
                    Some(raw) if raw.is_empty() => DEFAULT_PORT,
                    Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                        var: "PORT",
                        value: raw,
                    })?,
                };
                Mode::Webhook(WebhookConfig { host, port })
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "BOT_MODE",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bot_token,
            api_key,
            mode,
        })
    }
}

/// An empty value counts as unset.
fn require(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    match get(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}
