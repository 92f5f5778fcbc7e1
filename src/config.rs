//! Startup configuration read from the environment

use crate::responder::{DEFAULT_BASE_URL, DEFAULT_ECHO_DELAY, DEFAULT_MODEL};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidDelay { var: &'static str, value: String },
    #[error("{var} must be \"echo\" or \"gemini\", got {value:?}")]
    UnknownResponder { var: &'static str, value: String },
}

/// Which responder the session talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderChoice {
    Gemini {
        api_key: String,
        model: String,
        base_url: String,
    },
    Echo {
        delay: Duration,
    },
    /// No credential and no echo fallback requested
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub responder: ResponderChoice,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let requested = non_empty("CHAT_RESPONDER").map(|v| v.trim().to_ascii_lowercase());
        let api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("VITE_GEMINI_API_KEY"));

        let responder = match requested.as_deref() {
            Some("echo") => ResponderChoice::Echo {
                delay: echo_delay(non_empty("CHAT_ECHO_DELAY_MS"))?,
            },
            Some("gemini") | None => match api_key {
                Some(api_key) => ResponderChoice::Gemini {
                    api_key,
                    model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                    base_url: non_empty("GEMINI_BASE_URL")
                        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                },
                None => ResponderChoice::Unavailable,
            },
            Some(other) => {
                return Err(ConfigError::UnknownResponder {
                    var: "CHAT_RESPONDER",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self { responder })
    }
}

fn echo_delay(raw: Option<String>) -> Result<Duration, ConfigError> {
    match raw {
        None => Ok(DEFAULT_ECHO_DELAY),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidDelay {
                var: "CHAT_ECHO_DELAY_MS",
                value,
            }),
    }
}
