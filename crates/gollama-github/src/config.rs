//! GitHub client configuration.

use std::fmt;

#[derive(Clone)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub api_url: String,
    pub user_agent: String,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl GitHubConfig {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            api_url: "https://api.github.com".to_string(),
            user_agent: concat!("gollama/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}
