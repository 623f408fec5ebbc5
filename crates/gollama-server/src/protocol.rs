//! Wire protocol for the WebSocket and SSE surfaces.

use serde::{Deserialize, Serialize};

pub const GREETING: &str = "Hey! How can I assist you today?";

/// Generic failure text shown to clients. Internal errors are only logged.
pub const GENERIC_ERROR: &str = "An error occurred while processing your request";

/// One WebSocket frame, in both directions. Empty fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub response: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(skip_serializing_if = "is_false")]
    pub is_processing: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Envelope {
    pub fn greeting() -> Self {
        Self {
            response: GREETING.to_string(),
            ..Default::default()
        }
    }

    /// A "still working" notice.
    pub fn processing(session_id: &str, notice: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            response: notice.into(),
            is_processing: true,
            ..Default::default()
        }
    }

    pub fn response(session_id: &str, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            response: text.into(),
            ..Default::default()
        }
    }

    pub fn error(session_id: &str, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            error: text.into(),
            ..Default::default()
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: String,
    pub content: String,
}

/// One server-sent event on the `/chat` stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Info { session_id: String },
    Update { session_id: String, message: String },
    Final { session_id: String, response: String },
    Error { session_id: String, error: String },
}

impl StreamEvent {
    /// SSE `event:` label.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Info { .. } => "info",
            StreamEvent::Update { .. } => "update",
            StreamEvent::Final { .. } => "final",
            StreamEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Final { .. } | StreamEvent::Error { .. })
    }
}
