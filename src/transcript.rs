//! Chat transcript: the append-only record of one session
//!
//! Turns are stored as plain text exactly as they were produced. Markdown is
//! only interpreted by the render surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown as an `error` turn when the responder reports a safety block.
pub const BLOCKED_NOTICE_PREFIX: &str = "응답이 차단되었습니다. 이유: ";

/// Shown as an `error` turn when the responder succeeds without any text.
pub const EMPTY_RESPONSE_NOTICE: &str = "AI의 응답이 비어있습니다. 다른 질문을 시도해보세요.";

/// Shown as an `error` turn when the responder call fails.
pub const FAILURE_NOTICE_PREFIX: &str = "메시지 전송 중 오류 발생: ";

/// Blocking alert for submissions made without a configured responder.
pub const UNAVAILABLE_NOTICE: &str = "모델이 준비되지 않았습니다. API 키를 확인해주세요.";

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
    /// Locally generated notice; never sent to a responder
    Error,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
            Role::Error => "error",
        }
    }

    /// Whether content of this role is rendered as Markdown
    pub fn renders_markdown(self) -> bool {
        matches!(self, Role::User | Role::Model)
    }
}

/// One immutable entry in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Error, content)
    }
}

/// Append-only ordered sequence of turns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end. There is no way to remove or edit one.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// Most recent `user` turn of a turn sequence
pub fn last_user_turn(turns: &[Turn]) -> Option<&Turn> {
    turns.iter().rev().find(|t| t.role == Role::User)
}
