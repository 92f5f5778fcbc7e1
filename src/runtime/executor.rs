//! Chat runtime executor

use super::SurfaceEvent;
use crate::responder::{Responder, ResponderOutcome};
use crate::state_machine::{transition, ChatContext, ChatState, Effect, Event, TransitionError};
use crate::transcript::{Transcript, Turn};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Single owner of the session state, transcript and responder
pub struct ChatRuntime<R>
where
    R: Responder + ?Sized + 'static,
{
    context: ChatContext,
    state: ChatState,
    transcript: Transcript,
    responder: Option<Arc<R>>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so that dropping every handle ends the session
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<SurfaceEvent>,
}

impl<R> ChatRuntime<R>
where
    R: Responder + ?Sized + 'static,
{
    pub fn new(
        session_id: impl Into<String>,
        responder: Option<Arc<R>>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::WeakSender<Event>,
        broadcast_tx: broadcast::Sender<SurfaceEvent>,
    ) -> Self {
        let context = ChatContext::new(
            session_id,
            responder.as_ref().map(|r| r.name().to_string()),
        );
        Self {
            context,
            state: ChatState::Idle,
            transcript: Transcript::new(),
            responder,
            event_rx,
            event_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) -> Transcript {
        tracing::info!(
            session_id = %self.context.session_id,
            responder = self.context.responder.as_deref().unwrap_or("none"),
            "Starting chat runtime"
        );

        while let Some(event) = self.event_rx.recv().await {
            match self.process_event(event) {
                Ok(()) => {}
                Err(e @ TransitionError::ResponsePending) => {
                    tracing::debug!("Submission refused while awaiting response");
                    let _ = self.broadcast_tx.send(SurfaceEvent::Rejected {
                        message: e.to_string(),
                    });
                }
                Err(TransitionError::InvalidTransition(detail)) => {
                    tracing::warn!(detail = %detail, "Discarding event");
                }
            }
        }

        tracing::info!(
            session_id = %self.context.session_id,
            turns = self.transcript.len(),
            last_role = self.transcript.last().map_or("none", |t| t.role.as_str()),
            "Chat runtime stopped"
        );
        self.transcript
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = transition(&self.state, &self.context, event)?;
        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendTurn { role, content } => {
                let turn = Turn::new(role, content);
                tracing::debug!(role = role.as_str(), id = %turn.id, "Appending turn");
                self.transcript.append(turn.clone());
                let _ = self.broadcast_tx.send(SurfaceEvent::TurnAppended { turn });
            }

            Effect::ClearInput => {
                let _ = self.broadcast_tx.send(SurfaceEvent::InputCleared);
            }

            Effect::NotifyStateChange => {
                let _ = self.broadcast_tx.send(SurfaceEvent::StateChange {
                    pending: self.state.is_pending(),
                });
            }

            Effect::Alert { message } => {
                tracing::warn!(message = %message, "Alerting user");
                let _ = self.broadcast_tx.send(SurfaceEvent::Alert { message });
            }

            Effect::RequestResponse { request_id } => self.request_response(request_id),
        }
    }

    /// Spawn the responder call; its outcome comes back as an event
    fn request_response(&self, request_id: String) {
        // transition() only requests a response when a responder is configured
        let Some(responder) = self.responder.clone() else {
            tracing::warn!(request_id = %request_id, "Response requested without a responder");
            return;
        };
        let Some(event_tx) = self.event_tx.upgrade() else {
            tracing::debug!("Session closed before the responder could be called");
            return;
        };
        let turns = self.transcript.turns().to_vec();

        tokio::spawn(async move {
            let outcome = ResponderOutcome::from(responder.respond(&turns).await);
            tracing::debug!(request_id = %request_id, outcome = outcome.label(), "Responder finished");

            // No cancellation: a result for a session that already ended is dropped
            if event_tx
                .send(Event::ResponderResult {
                    request_id,
                    outcome,
                })
                .await
                .is_err()
            {
                tracing::debug!("Session ended; discarding responder result");
            }
        });
    }
}
