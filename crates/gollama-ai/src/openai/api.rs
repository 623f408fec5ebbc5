//! AiClient trait implementation for OpenAiClient, plus model listing.

use async_trait::async_trait;
use tracing::debug;

use crate::{AiClient, AiError, AiResponse, Message, ToolDefinition};

use super::client::OpenAiClient;

#[async_trait]
impl AiClient for OpenAiClient {
    async fn send_message(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<AiResponse, AiError> {
        let body = self.build_request_body(messages, tools);

        debug!(
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.len(),
            "Chat completion request"
        );

        let response = self
            .authorize(self.http.post(self.config.endpoint("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        self.parse_response(json)
    }
}

impl OpenAiClient {
    /// List model ids served by the backend (`GET {base_url}/models`).
    /// Used at startup to check that the backend is reachable.
    pub async fn list_models(&self) -> Result<Vec<String>, AiError> {
        let response = self
            .authorize(self.http.get(self.config.endpoint("models")))
            .send()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::ApiError(format!("HTTP {status}")));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        Ok(json["data"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::OpenAiConfig;

    fn client_for(server: &MockServer) -> OpenAiClient {
        let config = OpenAiConfig::new(format!("{}/v1", server.uri()), "gpt-oss:20b")
            .with_api_key(Some("sk-test".into()));
        OpenAiClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn send_message_posts_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({ "model": "gpt-oss:20b" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "4" } }]
            })))
            .mount(&server)
            .await;

        let resp = client_for(&server)
            .send_message(&[Message::user("What's 2+2")], &[])
            .await
            .unwrap();
        assert_eq!(resp.choices[0].content, "4");
    }

    #[tokio::test]
    async fn rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_message(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::RateLimited));
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_message(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::ApiError(ref m) if m.contains("500") && m.contains("model not loaded")));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let config = OpenAiConfig::new("http://127.0.0.1:1/v1", "m");
        let err = OpenAiClient::new(config)
            .unwrap()
            .send_message(&[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::NetworkError(_)));
    }

    #[tokio::test]
    async fn list_models_reads_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "id": "gpt-oss:20b" }, { "id": "llama3.1:8b" }]
            })))
            .mount(&server)
            .await;

        let models = client_for(&server).list_models().await.unwrap();
        assert_eq!(models, vec!["gpt-oss:20b", "llama3.1:8b"]);
    }
}
