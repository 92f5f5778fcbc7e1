//! Google Gemini responder

use super::types::{Reply, Usage};
use super::{Responder, ResponderError, ResponderErrorKind};
use crate::transcript::{Role, Turn};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-pro-latest";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Harm categories whose filters are relaxed for every request
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Finish reasons for which a candidate's text must not be used
const BLOCKED_FINISH_REASONS: [&str; 6] = [
    "SAFETY",
    "RECITATION",
    "LANGUAGE",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Gemini `generateContent` client
pub struct GeminiResponder {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiResponder {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
    ) -> Result<Self, ResponderError> {
        let model = model.into();
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ResponderError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint,
            model,
        })
    }

    #[cfg(test)]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn translate_request(turns: &[Turn]) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = Vec::new();

        for turn in turns {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "model",
                // Local notices are display-only
                Role::Error => continue,
            };
            let part = GeminiPart {
                text: Some(turn.content.clone()),
            };

            // Gemini expects alternating roles; a failed cycle leaves two
            // user turns back to back, so fold them into one content.
            match contents.last_mut() {
                Some(last) if last.role.as_deref() == Some(role) => last.parts.push(part),
                _ => contents.push(GeminiContent {
                    role: Some(role.to_string()),
                    parts: vec![part],
                }),
            }
        }

        GeminiRequest {
            contents,
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|category| GeminiSafetySetting {
                    category: (*category).to_string(),
                    threshold: "BLOCK_NONE".to_string(),
                })
                .collect(),
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<Reply, ResponderError> {
        if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
            return Ok(Reply::Blocked { reason });
        }

        let usage = resp
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u64::from(u.prompt_token_count),
                output_tokens: u64::from(u.candidates_token_count),
            })
            .unwrap_or_default();

        let Some(candidate) = resp.candidates.into_iter().next() else {
            return Ok(Reply::Text {
                text: String::new(),
                usage,
            });
        };

        if let Some(reason) = candidate
            .finish_reason
            .as_deref()
            .filter(|r| BLOCKED_FINISH_REASONS.contains(r))
        {
            return Err(ResponderError::content_filtered(format!(
                "Candidate was blocked due to {reason}"
            )));
        }

        let text = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(Reply::Text { text, usage })
    }
}

#[async_trait]
impl Responder for GeminiResponder {
    async fn respond(&self, turns: &[Turn]) -> Result<Reply, ResponderError> {
        let gemini_request = Self::translate_request(turns);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResponderError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    ResponderError::network(format!("Connection failed: {e}"))
                } else {
                    ResponderError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResponderError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            ResponderError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(gemini_response)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn error_from_body(status: u16, body: &str) -> ResponderError {
    let kind = ResponderErrorKind::from_status(status);
    let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(body) else {
        // Gateways in front of the API answer with HTML pages
        return ResponderError::new(kind, format!("HTTP {status} error: {body}"));
    };
    let message = error_resp.error.message;
    let message = match kind {
        ResponderErrorKind::InvalidRequest => format!("Invalid request: {message}"),
        ResponderErrorKind::Auth => format!("Authentication failed: {message}"),
        ResponderErrorKind::RateLimit => format!("Rate limit exceeded: {message}"),
        ResponderErrorKind::ServerError => format!("Server error: {message}"),
        _ => format!("HTTP {status}: {message}"),
    };
    ResponderError::new(kind, message)
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    safety_settings: Vec<GeminiSafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// Only text parts are produced or consumed; other part kinds deserialize
/// with `text: None` and are skipped.
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiSafetySetting {
    category: String,
    threshold: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
