//! Responder abstraction
//!
//! A responder receives the whole transcript and asynchronously produces
//! reply text, a block notice, or an error.

mod echo;
mod error;
mod gemini;
mod types;

pub use echo::{EchoResponder, DEFAULT_ECHO_DELAY};
pub use error::{ResponderError, ResponderErrorKind};
pub use gemini::{GeminiResponder, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use types::*;

use crate::config::ResponderChoice;
use crate::transcript::Turn;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for reply producers
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce a reply to the given turns, the last of which is the user's
    async fn respond(&self, turns: &[Turn]) -> Result<Reply, ResponderError>;

    /// Short name for logs and the banner
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(&self, turns: &[Turn]) -> Result<Reply, ResponderError> {
        (**self).respond(turns).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Build the configured responder, wrapped with logging.
///
/// Returns `Ok(None)` when nothing is configured; the controller then
/// refuses submissions with an alert.
pub fn from_choice(choice: &ResponderChoice) -> Result<Option<Arc<dyn Responder>>, ResponderError> {
    let inner: Arc<dyn Responder> = match choice {
        ResponderChoice::Unavailable => return Ok(None),
        ResponderChoice::Echo { delay } => Arc::new(EchoResponder::new(*delay)),
        ResponderChoice::Gemini {
            api_key,
            model,
            base_url,
        } => Arc::new(GeminiResponder::new(api_key.clone(), model.clone(), base_url)?),
    };
    Ok(Some(Arc::new(LoggingResponder::new(inner))))
}

/// Logging wrapper for responders
pub struct LoggingResponder {
    inner: Arc<dyn Responder>,
    name: String,
}

impl LoggingResponder {
    pub fn new(inner: Arc<dyn Responder>) -> Self {
        let name = inner.name().to_string();
        Self { inner, name }
    }
}

#[async_trait]
impl Responder for LoggingResponder {
    async fn respond(&self, turns: &[Turn]) -> Result<Reply, ResponderError> {
        let start = std::time::Instant::now();
        let result = self.inner.respond(turns).await;
        let duration = start.elapsed();

        match &result {
            Ok(Reply::Text { text, usage }) => {
                tracing::info!(
                    responder = %self.name,
                    duration_ms = %duration.as_millis(),
                    turns = turns.len(),
                    chars = text.chars().count(),
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "Responder completed"
                );
            }
            Ok(Reply::Blocked { reason }) => {
                tracing::warn!(
                    responder = %self.name,
                    duration_ms = %duration.as_millis(),
                    reason = %reason,
                    "Responder blocked prompt"
                );
            }
            Err(e) => {
                tracing::error!(
                    responder = %self.name,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "Responder failed"
                );
            }
        }

        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}
