//! Line-oriented terminal surface

use super::markdown::render_markdown;
use crate::runtime::SurfaceEvent;
use crate::transcript::{Role, Turn};
use crossterm::style::{Color, Stylize};
use std::io::{self, Write};

pub const BANNER: &str = "🤖 나만의 AI 비서";
pub const THINKING_INDICATOR: &str = "AI가 생각중...";
pub const INPUT_HINT: &str = "메시지를 입력하세요... (/quit 으로 종료)";

/// Writes the conversation to a terminal as the runtime reports it.
///
/// Turns are printed in arrival order, so the newest turn is always the
/// last thing on screen.
pub struct TerminalSurface<W: Write> {
    out: W,
    styled: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, styled: bool) -> Self {
        Self { out, styled }
    }

    pub fn banner(&mut self, responder: Option<&str>) -> io::Result<()> {
        let title = self.paint(BANNER, |s| s.bold().to_string());
        writeln!(self.out, "{title}")?;
        if let Some(name) = responder {
            let line = format!("responder: {name}");
            let line = self.paint(&line, |s| s.dim().to_string());
            writeln!(self.out, "{line}")?;
        }
        let hint = self.paint(INPUT_HINT, |s| s.dim().to_string());
        writeln!(self.out, "{hint}")?;
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn apply(&mut self, event: &SurfaceEvent) -> io::Result<()> {
        match event {
            SurfaceEvent::TurnAppended { turn } => self.draw_turn(turn)?,
            SurfaceEvent::StateChange { pending: true } => {
                let line = self.paint(THINKING_INDICATOR, |s| s.dim().italic().to_string());
                writeln!(self.out, "{line}")?;
            }
            // Line input is consumed on enter
            SurfaceEvent::StateChange { pending: false } | SurfaceEvent::InputCleared => {}
            SurfaceEvent::Alert { message } => {
                let line = self.paint(&format!("⚠ {message}"), |s| {
                    s.with(Color::Yellow).bold().to_string()
                });
                writeln!(self.out, "{line}")?;
            }
            SurfaceEvent::Rejected { message } => {
                let line = self.paint(message, |s| s.with(Color::Yellow).to_string());
                writeln!(self.out, "{line}")?;
            }
        }
        self.out.flush()
    }

    fn draw_turn(&mut self, turn: &Turn) -> io::Result<()> {
        let (label, color) = match turn.role {
            Role::User => ("나", Color::Cyan),
            Role::Model => ("AI", Color::Green),
            Role::Error => ("오류", Color::Red),
        };
        let label = self.paint(label, |s| s.with(color).bold().to_string());
        writeln!(self.out, "{label}")?;

        // Error notices are shown as-is
        let body = if turn.role.renders_markdown() {
            render_markdown(&turn.content, self.styled)
        } else if self.styled {
            turn.content.as_str().with(Color::Red).to_string()
        } else {
            turn.content.clone()
        };
        writeln!(self.out, "{body}")?;
        writeln!(self.out)
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.styled {
            style(text)
        } else {
            text.to_string()
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
