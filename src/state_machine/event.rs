//! Events that drive the controller

use crate::responder::ResponderOutcome;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// The user pressed enter. `request_id` names the responder call this
    /// submission would start.
    UserSubmit { text: String, request_id: String },

    /// A responder call finished
    ResponderResult {
        request_id: String,
        outcome: ResponderOutcome,
    },
}

impl Event {
    pub fn submit(text: impl Into<String>) -> Self {
        Event::UserSubmit {
            text: text.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}
