#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GollamaError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("ai error: {0}")]
    Ai(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::ParseError("PORT is not a number".into());
        assert_eq!(err.to_string(), "config parse error: PORT is not a number");

        let err = ConfigError::ValidationError("base_url must be http(s)".into());
        assert_eq!(
            err.to_string(),
            "config validation error: base_url must be http(s)"
        );
    }

    #[test]
    fn gollama_error_from_config() {
        let config_err = ConfigError::ParseError("bad port".into());
        let err: GollamaError = config_err.into();
        assert!(matches!(err, GollamaError::Config(_)));
        assert!(err.to_string().contains("bad port"));
    }

    #[test]
    fn gollama_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: GollamaError = io_err.into();
        assert!(matches!(err, GollamaError::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }

    #[test]
    fn gollama_error_other_variants() {
        let err = GollamaError::Network("connection refused".into());
        assert_eq!(err.to_string(), "network error: connection refused");

        let err = GollamaError::Ai("model unavailable".into());
        assert_eq!(err.to_string(), "ai error: model unavailable");

        let err = GollamaError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
