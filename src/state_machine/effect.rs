//! Effects produced by state transitions

use crate::transcript::{Role, UNAVAILABLE_NOTICE};

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a turn to the transcript
    AppendTurn { role: Role, content: String },

    /// Empty the input buffer of the render surface
    ClearInput,

    /// Invoke the responder with the current transcript
    RequestResponse { request_id: String },

    /// Tell the render surface the pending flag changed
    NotifyStateChange,

    /// Blocking notice that does not enter the transcript
    Alert { message: String },
}

impl Effect {
    pub fn append(role: Role, content: impl Into<String>) -> Self {
        Effect::AppendTurn {
            role,
            content: content.into(),
        }
    }

    pub fn responder_unavailable() -> Self {
        Effect::Alert {
            message: UNAVAILABLE_NOTICE.to_string(),
        }
    }
}
