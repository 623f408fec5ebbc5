//! Configuration validation.
//!
//! All checks run and every failure is reported at once.

use gollama_common::ConfigError;

use crate::schema::ServerConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    if config.port == 0 {
        errors.push("port must be non-zero".into());
    }

    validate_url(&mut errors, "base_url", &config.base_url);
    validate_url(&mut errors, "github_api_url", &config.github_api_url);

    if config.model.trim().is_empty() {
        errors.push("model must not be empty".into());
    }

    validate_range(&mut errors, "max_tool_rounds", u64::from(config.max_tool_rounds), 1, 32);
    validate_range(&mut errors, "session_idle_ttl_secs", config.session_idle_ttl_secs, 1, u64::MAX);
    validate_range(
        &mut errors,
        "session_sweep_interval_secs",
        config.session_sweep_interval_secs,
        1,
        u64::MAX,
    );
    validate_range(
        &mut errors,
        "outbound_queue_capacity",
        config.outbound_queue_capacity as u64,
        1,
        65_536,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_url(errors: &mut Vec<String>, field: &str, value: &str) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(format!("{field} must be an http(s) URL, got {value:?}"));
    }
}

fn validate_range(errors: &mut Vec<String>, field: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{field} must be between {min} and {max}, got {value}"));
    }
}
