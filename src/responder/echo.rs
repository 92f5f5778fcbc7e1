//! Local echo responder
//!
//! Replies to the latest user turn after a fixed delay. It can only
//! succeed, which makes it a useful stand-in when no API key is set.

use super::types::Reply;
use super::{Responder, ResponderError};
use crate::transcript::{last_user_turn, Turn};
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_ECHO_DELAY: Duration = Duration::from_secs(1);

pub struct EchoResponder {
    delay: Duration,
}

impl EchoResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn echo_text(text: &str) -> String {
        format!("\"{text}\" 라고 하셨군요!")
    }
}

impl Default for EchoResponder {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_DELAY)
    }
}

#[async_trait]
impl Responder for EchoResponder {
    async fn respond(&self, turns: &[Turn]) -> Result<Reply, ResponderError> {
        tokio::time::sleep(self.delay).await;
        let said = last_user_turn(turns).map_or("", |t| t.content.as_str());
        Ok(Reply::text(Self::echo_text(said)))
    }

    fn name(&self) -> &str {
        "echo"
    }
}
