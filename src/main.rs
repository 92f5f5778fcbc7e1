//! Gemini Chat - terminal chat assistant
//!
//! A single-session chat built around a small state machine: user input
//! and responder results are events, the transcript only ever grows.

mod config;
mod render;
mod responder;
mod runtime;
mod state_machine;
mod transcript;

use config::ChatConfig;
use render::TerminalSurface;
use std::io::IsTerminal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const QUIT_COMMAND: &str = "/quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_chat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ChatConfig::from_env()?;
    let responder = responder::from_choice(&config.responder)?;
    let responder_name = responder.as_ref().map(|r| r.name().to_string());

    match &responder_name {
        Some(name) => tracing::info!(responder = %name, "Responder configured"),
        None => tracing::warn!("No responder configured. Set GEMINI_API_KEY or CHAT_RESPONDER=echo."),
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let (handle, _runtime) = runtime::start(session_id, responder);

    let stdout = std::io::stdout();
    let styled = stdout.is_terminal();
    let mut surface = TerminalSurface::new(stdout, styled);
    surface.banner(responder_name.as_deref())?;

    let mut events = handle.subscribe();
    let surface_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Err(e) = surface.apply(&event) {
                        tracing::error!(error = %e, "Failed to write to terminal");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Render surface fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == QUIT_COMMAND {
            break;
        }
        handle.submit(line).await?;
    }

    // Leaving without waiting on the runtime drops any in-flight reply
    surface_task.abort();
    Ok(())
}
