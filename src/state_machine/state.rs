//! Controller state types

use serde::{Deserialize, Serialize};

/// Controller state for one submission cycle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// Ready for input
    #[default]
    Idle,

    /// A responder call is in flight; new submissions are refused
    AwaitingResponse { request_id: String },
}

impl ChatState {
    /// The pending-request flag
    pub fn is_pending(&self) -> bool {
        matches!(self, ChatState::AwaitingResponse { .. })
    }
}

/// Context for a chat session (immutable configuration)
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub session_id: String,
    /// Name of the configured responder, if any
    pub responder: Option<String>,
}

impl ChatContext {
    pub fn new(session_id: impl Into<String>, responder: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            responder,
        }
    }

    pub fn has_responder(&self) -> bool {
        self.responder.is_some()
    }
}
