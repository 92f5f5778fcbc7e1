//! Render surface: prints the transcript, the thinking indicator and
//! notices to a terminal.

mod markdown;
mod terminal;

pub use terminal::TerminalSurface;
