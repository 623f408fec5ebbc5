//! Thin GitHub REST client covering the operations the assistant's tools
//! need: issue lookup, branch creation, pull requests, and file
//! read/update through the contents API.

mod client;
mod config;
mod models;


pub use client::GitHubClient;
pub use config::GitHubConfig;
pub use models::{
    Commit, ContentEntry, Contents, FileCommit, FileContent, FileUpdate, GitObject, GitRef,
    Issue, Label, NewPullRequest, PullRequest, PullRequestBranch, User,
};

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("network error: {0}")]
    Network(String),
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("GITHUB_TOKEN is not configured; {0} requires authentication")]
    MissingToken(&'static str),
}

impl GitHubError {
    /// True for a 404 from the API.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
