//! OpenAI-compatible chat-completions client.
//!
//! Speaks `POST {base_url}/chat/completions` with function tools, which
//! covers OpenAI itself as well as local Ollama and vLLM servers.

mod api;
mod client;
mod config;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
