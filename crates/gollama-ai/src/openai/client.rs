//! OpenAI client struct, request building, and response parsing.

use std::time::Duration;

use crate::tools::to_openai_tool;
use crate::{AiError, AiResponse, Message, Role, TokenUsage, ToolCall, ToolDefinition};

use super::config::OpenAiConfig;

pub struct OpenAiClient {
    pub(crate) config: OpenAiConfig,
    pub(crate) http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // Local models can take minutes on long tool transcripts.
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| AiError::NetworkError(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key {
            Some(ref key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Build the JSON request body for `/chat/completions`.
    pub(crate) fn build_request_body(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> serde_json::Value {
        let msgs: Vec<_> = messages.iter().map(message_to_wire).collect();

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": msgs,
        });

        if !tools.is_empty() {
            let tool_defs: Vec<_> = tools.iter().map(to_openai_tool).collect();
            body["tools"] = serde_json::json!(tool_defs);
        }

        if let Some(t) = self.config.temperature {
            body["temperature"] = serde_json::json!(t);
        }

        body
    }

    /// Parse a non-streaming `/chat/completions` response.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<AiResponse, AiError> {
        let choices = json["choices"]
            .as_array()
            .ok_or_else(|| AiError::ParseError("response has no choices array".into()))?
            .iter()
            .map(|choice| message_from_wire(&choice["message"]))
            .collect();

        let usage = TokenUsage {
            input_tokens: json["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            output_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
        };

        Ok(AiResponse { choices, usage })
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn message_to_wire(msg: &Message) -> serde_json::Value {
    let mut out = serde_json::json!({
        "role": role_str(msg.role),
        "content": msg.content,
    });

    if !msg.tool_calls.is_empty() {
        let calls: Vec<_> = msg
            .tool_calls
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "type": "function",
                    "function": { "name": c.name, "arguments": c.arguments },
                })
            })
            .collect();
        out["tool_calls"] = serde_json::json!(calls);
    }
    if let Some(ref id) = msg.tool_call_id {
        out["tool_call_id"] = serde_json::json!(id);
    }
    if let Some(ref name) = msg.name {
        out["name"] = serde_json::json!(name);
    }

    out
}

fn message_from_wire(msg: &serde_json::Value) -> Message {
    let content = msg["content"].as_str().unwrap_or_default().to_string();

    let tool_calls = msg["tool_calls"]
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .map(|c| {
                    let id = c["id"]
                        .as_str()
                        .filter(|id| !id.is_empty())
                        .map(String::from)
                        .unwrap_or_else(gollama_common::new_id);
                    // Some backends send arguments as an object instead of a string.
                    let arguments = match &c["function"]["arguments"] {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => "{}".to_string(),
                        other => other.to_string(),
                    };
                    ToolCall {
                        id,
                        name: c["function"]["name"].as_str().unwrap_or("").to_string(),
                        arguments,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Message::assistant(content).with_tool_calls(tool_calls)
}
