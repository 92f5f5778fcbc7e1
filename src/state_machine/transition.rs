//! Pure state transition function
//!
//! Given the same state, context and event this always yields the same
//! result. Turn ids, timestamps and the responder call itself are left to
//! the runtime.

use super::{ChatContext, ChatState, Effect, Event};
use crate::responder::ResponderOutcome;
use crate::transcript::{
    Role, BLOCKED_NOTICE_PREFIX, EMPTY_RESPONSE_NOTICE, FAILURE_NOTICE_PREFIX,
};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("AI가 응답을 준비하는 중입니다. 잠시 후 다시 시도해주세요.")]
    ResponsePending,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Blank input is ignored in every state
        (_, Event::UserSubmit { text, .. }) if text.trim().is_empty() => {
            Ok(TransitionResult::new(state.clone()))
        }

        // Nothing to answer with: alert, leave the transcript alone
        (ChatState::Idle, Event::UserSubmit { .. }) if !context.has_responder() => {
            Ok(TransitionResult::new(ChatState::Idle).with_effect(Effect::responder_unavailable()))
        }

        // Idle + UserSubmit -> AwaitingResponse
        (ChatState::Idle, Event::UserSubmit { text, request_id }) => Ok(TransitionResult::new(
            ChatState::AwaitingResponse {
                request_id: request_id.clone(),
            },
        )
        .with_effect(Effect::append(Role::User, text))
        .with_effect(Effect::ClearInput)
        .with_effect(Effect::NotifyStateChange)
        .with_effect(Effect::RequestResponse { request_id })),

        // Single flight: one responder call at a time
        (ChatState::AwaitingResponse { .. }, Event::UserSubmit { .. }) => {
            Err(TransitionError::ResponsePending)
        }

        // AwaitingResponse + ResponderResult -> Idle with exactly one terminal turn
        (
            ChatState::AwaitingResponse { request_id },
            Event::ResponderResult {
                request_id: finished,
                outcome,
            },
        ) if *request_id == finished => {
            let (role, content) = terminal_turn(outcome);
            Ok(TransitionResult::new(ChatState::Idle)
                .with_effect(Effect::append(role, content))
                .with_effect(Effect::NotifyStateChange))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

/// The one turn a finished responder call contributes to the transcript
pub fn terminal_turn(outcome: ResponderOutcome) -> (Role, String) {
    match outcome {
        ResponderOutcome::Success { text } => (Role::Model, text),
        ResponderOutcome::Empty => (Role::Error, EMPTY_RESPONSE_NOTICE.to_string()),
        ResponderOutcome::Blocked { reason } => {
            (Role::Error, format!("{BLOCKED_NOTICE_PREFIX}{reason}"))
        }
        ResponderOutcome::Failure { message } => {
            (Role::Error, format!("{FAILURE_NOTICE_PREFIX}{message}"))
        }
    }
}
