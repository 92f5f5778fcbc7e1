//! Responder error types

use thiserror::Error;

/// Responder failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResponderError {
    pub kind: ResponderErrorKind,
    pub message: String,
}

impl ResponderError {
    pub fn new(kind: ResponderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Network, message)
    }

    pub fn content_filtered(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::ContentFiltered, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ResponderErrorKind::Unknown, message)
    }
}

/// Error classification, used for logging only; nothing is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderErrorKind {
    /// Connection failures, timeouts, unreadable bodies
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// A candidate was produced but withheld by the provider's filters
    ContentFiltered,
    Unknown,
}

impl ResponderErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::ContentFiltered => "content_filtered",
            Self::Unknown => "unknown",
        }
    }

    /// Classify an HTTP status returned by a provider
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidRequest,
            401 | 403 => Self::Auth,
            429 => Self::RateLimit,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}
