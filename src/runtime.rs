//! Runtime for a chat session
//!
//! One task owns the state and the transcript. Input and responder results
//! reach it as messages; the render surface listens on a broadcast channel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ChatRuntime;

use crate::responder::Responder;
use crate::state_machine::Event;
use crate::transcript::{Transcript, Turn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Events sent to the render surface
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    TurnAppended { turn: Turn },
    StateChange { pending: bool },
    InputCleared,
    /// Blocking notice, e.g. no responder configured
    Alert { message: String },
    /// A submission was refused without touching the transcript
    Rejected { message: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Chat runtime has stopped")]
    Stopped,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct ChatHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<SurfaceEvent>,
}

impl ChatHandle {
    /// Submit a line of user input
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.send_event(Event::submit(text)).await
    }

    pub async fn send_event(&self, event: Event) -> Result<(), RuntimeError> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Stopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Start a session in the background.
///
/// The runtime stops once every handle is dropped and no responder call is
/// outstanding; its join handle yields the final transcript.
pub fn start<R>(
    session_id: impl Into<String>,
    responder: Option<Arc<R>>,
) -> (ChatHandle, JoinHandle<Transcript>)
where
    R: Responder + ?Sized + 'static,
{
    let (event_tx, event_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = ChatRuntime::new(
        session_id,
        responder,
        event_rx,
        event_tx.downgrade(),
        broadcast_tx.clone(),
    );
    let join = tokio::spawn(runtime.run());

    (
        ChatHandle {
            event_tx,
            broadcast_tx,
        },
        join,
    )
}
