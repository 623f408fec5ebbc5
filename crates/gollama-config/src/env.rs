//! Environment-variable loading.

use std::str::FromStr;

use gollama_common::ConfigError;
use tracing::{info, warn};

use crate::schema::{ServerConfig, DEFAULT_BASE_URL, DEFAULT_PORT};

pub const PORT: &str = "PORT";
pub const BASE_URL: &str = "BASE_URL";
pub const MODEL: &str = "MODEL";
pub const LLM_API_KEY: &str = "LLM_API_KEY";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const GITHUB_API_URL: &str = "GITHUB_API_URL";
pub const SESSION_IDLE_TTL_SECS: &str = "SESSION_IDLE_TTL_SECS";
pub const SESSION_SWEEP_INTERVAL_SECS: &str = "SESSION_SWEEP_INTERVAL_SECS";
pub const MAX_TOOL_ROUNDS: &str = "MAX_TOOL_ROUNDS";
pub const OUTBOUND_QUEUE_CAPACITY: &str = "OUTBOUND_QUEUE_CAPACITY";

/// Build a config from a variable lookup. Unset or blank variables fall
/// back to defaults; unparsable numbers are an error.
pub fn from_lookup<F>(lookup: F) -> Result<ServerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut config = ServerConfig::default();

    match get(PORT) {
        Some(port) => config.port = parse(PORT, &port)?,
        None => info!("No PORT environment variable found, using default port {DEFAULT_PORT}"),
    }

    match get(BASE_URL) {
        Some(url) => config.base_url = url,
        None => info!(
            "No BASE_URL environment variable found, using default base URL {DEFAULT_BASE_URL}"
        ),
    }

    config.github_token = get(GITHUB_TOKEN);
    if config.github_token.is_none() {
        warn!("No GITHUB_TOKEN environment variable found, GitHub tools will be unauthenticated");
    }

    config.api_key = get(LLM_API_KEY);
    if let Some(model) = get(MODEL) {
        config.model = model;
    }
    if let Some(url) = get(GITHUB_API_URL) {
        config.github_api_url = url;
    }
    if let Some(v) = get(SESSION_IDLE_TTL_SECS) {
        config.session_idle_ttl_secs = parse(SESSION_IDLE_TTL_SECS, &v)?;
    }
    if let Some(v) = get(SESSION_SWEEP_INTERVAL_SECS) {
        config.session_sweep_interval_secs = parse(SESSION_SWEEP_INTERVAL_SECS, &v)?;
    }
    if let Some(v) = get(MAX_TOOL_ROUNDS) {
        config.max_tool_rounds = parse(MAX_TOOL_ROUNDS, &v)?;
    }
    if let Some(v) = get(OUTBOUND_QUEUE_CAPACITY) {
        config.outbound_queue_capacity = parse(OUTBOUND_QUEUE_CAPACITY, &v)?;
    }

    Ok(config)
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ConfigError::ParseError(format!("{key}={value:?}: {e}")))
}
