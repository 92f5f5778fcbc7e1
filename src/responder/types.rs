//! Reply and outcome types shared by every responder

use super::ResponderError;
use serde::{Deserialize, Serialize};

/// What a responder produced when the call itself succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Generated text, possibly empty
    Text { text: String, usage: Usage },
    /// The prompt was refused by the provider's safety filter
    Blocked { reason: String },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text {
            text: text.into(),
            usage: Usage::default(),
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Reply::Blocked {
            reason: reason.into(),
        }
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Terminal outcome of one responder call
///
/// Every call ends in exactly one of these; the controller turns each into
/// exactly one transcript turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponderOutcome {
    Success { text: String },
    Empty,
    Blocked { reason: String },
    Failure { message: String },
}

impl ResponderOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ResponderOutcome::Success { .. } => "success",
            ResponderOutcome::Empty => "empty",
            ResponderOutcome::Blocked { .. } => "blocked",
            ResponderOutcome::Failure { .. } => "failure",
        }
    }
}

impl From<Result<Reply, ResponderError>> for ResponderOutcome {
    fn from(result: Result<Reply, ResponderError>) -> Self {
        match result {
            Ok(Reply::Blocked { reason }) => ResponderOutcome::Blocked { reason },
            Ok(Reply::Text { text, .. }) if text.trim().is_empty() => ResponderOutcome::Empty,
            Ok(Reply::Text { text, .. }) => ResponderOutcome::Success { text },
            Err(e) => ResponderOutcome::Failure { message: e.message },
        }
    }
}
