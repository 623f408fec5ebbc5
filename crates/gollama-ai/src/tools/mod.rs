//! Tools the model may call mid-conversation.
//!
//! The set of tools is closed: [`ToolKind`] enumerates every tool, and a
//! [`ToolRegistry`] can only be built once each kind has an executor and a
//! schema whose name matches. Name lookup from a model reply is the single
//! place an unknown name can appear.

mod definitions;
mod github;
mod registry;

use async_trait::async_trait;
use gollama_github::GitHubError;

pub use definitions::{definition, to_openai_tool};
pub use github::{CreateBranch, CreatePullRequest, GetIssueDetails, GetRepositoryFiles, UpdateFile};
pub use registry::{RegistryError, ToolRegistry, ToolRegistryBuilder};

/// Every tool the assistant knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetIssueDetails,
    CreateBranch,
    CreatePullRequest,
    GetRepositoryFiles,
    UpdateFile,
}

/// Number of tool kinds.
pub const TOOL_COUNT: usize = 5;

impl ToolKind {
    pub const ALL: [ToolKind; TOOL_COUNT] = [
        ToolKind::GetIssueDetails,
        ToolKind::CreateBranch,
        ToolKind::CreatePullRequest,
        ToolKind::GetRepositoryFiles,
        ToolKind::UpdateFile,
    ];

    /// Wire name the model uses to request this tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetIssueDetails => "get_github_issue_details",
            ToolKind::CreateBranch => "create_github_branch",
            ToolKind::CreatePullRequest => "create_github_pr",
            ToolKind::GetRepositoryFiles => "get_repository_files",
            ToolKind::UpdateFile => "update_github_file",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed tool execution. Shown to the model as the tool's result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to parse tool arguments: {0}")]
    InvalidArguments(String),
    #[error("{context}: {source}")]
    Backend {
        context: &'static str,
        #[source]
        source: GitHubError,
    },
}

impl ToolError {
    pub(crate) fn backend(context: &'static str) -> impl FnOnce(GitHubError) -> ToolError {
        move |source| ToolError::Backend { context, source }
    }
}

/// Executes one tool given the model's raw JSON arguments.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, arguments: &str) -> Result<serde_json::Value, ToolError>;
}

/// Parse a tool's argument payload. An empty payload is treated as `{}`.
pub(crate) fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: &str,
) -> Result<T, ToolError> {
    let raw = if arguments.trim().is_empty() {
        "{}"
    } else {
        arguments
    };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}
