//! Gollama server configuration.
//!
//! Configuration comes from the process environment, optionally seeded
//! from a `.env` file. Every field has a default except the credentials,
//! so an empty environment yields a runnable local setup.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let config = gollama_config::load_config().expect("invalid configuration");
//! println!("listening on {}", config.port);
//! ```

pub mod dotenv;
pub mod env;
pub mod schema;
pub mod validation;

pub use schema::{ServerConfig, SYSTEM_PROMPT};

use gollama_common::ConfigError;

/// Load `.env`, read the environment, and validate the result.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    dotenv::load_dotenv(".env");
    let config = env::from_lookup(|key| std::env::var(key).ok())?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to pretty JSON with credentials redacted.
pub fn config_to_json(config: &ServerConfig) -> String {
    serde_json::to_string_pretty(&config.redacted())
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
