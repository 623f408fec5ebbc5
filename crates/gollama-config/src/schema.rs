//! Configuration types and defaults.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Operating instructions seeded as the first message of every session.
pub const SYSTEM_PROMPT: &str = "Your name is Gollama, you help with tasks related to GitHub \
and provide information about GitHub and its features. You can read issues, explore \
repository files, create branches, update files and open pull requests with the tools \
you are given. If a question is completely unrelated to GitHub, say 'I'm sorry, I can't \
help with that.' Always respond in plain text - no markdown.";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_MODEL: &str = "gpt-oss:20b";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Full server configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// OpenAI-compatible base URL of the model backend.
    pub base_url: String,
    pub model: String,
    /// Optional bearer token for the model backend (local Ollama needs none).
    pub api_key: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: String,
    /// Seconds a session may sit idle before the sweep reclaims it.
    pub session_idle_ttl_secs: u64,
    /// Seconds between reclamation sweeps.
    pub session_sweep_interval_secs: u64,
    pub max_tool_rounds: u32,
    /// Per-connection outbound queue depth.
    pub outbound_queue_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            github_token: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            session_idle_ttl_secs: 2 * 60 * 60,
            session_sweep_interval_secs: 30 * 60,
            max_tool_rounds: 6,
            outbound_queue_capacity: 256,
        }
    }
}

impl ServerConfig {
    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_secs)
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_secs)
    }

    /// Copy with credentials masked, for logging and diagnostics.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]".to_string());
        Self {
            api_key: mask(&self.api_key),
            github_token: mask(&self.github_token),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("github_api_url", &self.github_api_url)
            .field("session_idle_ttl_secs", &self.session_idle_ttl_secs)
            .field("session_sweep_interval_secs", &self.session_sweep_interval_secs)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("outbound_queue_capacity", &self.outbound_queue_capacity)
            .finish()
    }
}
