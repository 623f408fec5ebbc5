//! Tool executors backed by the GitHub REST client.

use std::sync::Arc;

use async_trait::async_trait;
use gollama_github::{Contents, FileUpdate, GitHubClient, NewPullRequest};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{parse_arguments, RegistryError, ToolError, ToolExecutor, ToolKind, ToolRegistry};

const DEFAULT_SOURCE_BRANCH: &str = "main";

impl ToolRegistry {
    /// The standard registry: every tool talks to `client`.
    pub fn github(client: Arc<GitHubClient>) -> Result<Self, RegistryError> {
        ToolRegistry::builder()
            .register(ToolKind::GetIssueDetails, Arc::new(GetIssueDetails::new(client.clone())))
            .register(ToolKind::CreateBranch, Arc::new(CreateBranch::new(client.clone())))
            .register(ToolKind::CreatePullRequest, Arc::new(CreatePullRequest::new(client.clone())))
            .register(ToolKind::GetRepositoryFiles, Arc::new(GetRepositoryFiles::new(client.clone())))
            .register(ToolKind::UpdateFile, Arc::new(UpdateFile::new(client)))
            .build()
    }
}

macro_rules! github_tool {
    ($name:ident) => {
        pub struct $name {
            client: Arc<GitHubClient>,
        }

        impl $name {
            pub fn new(client: Arc<GitHubClient>) -> Self {
                Self { client }
            }
        }
    };
}

github_tool!(GetIssueDetails);
github_tool!(CreateBranch);
github_tool!(CreatePullRequest);
github_tool!(GetRepositoryFiles);
github_tool!(UpdateFile);

/// Models send issue numbers both as JSON numbers and as numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum IssueNumber {
    Number(u64),
    Text(String),
}

impl IssueNumber {
    fn value(&self) -> Result<u64, ToolError> {
        match self {
            IssueNumber::Number(n) => Ok(*n),
            IssueNumber::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ToolError::InvalidArguments(format!("invalid issue number {s:?}"))),
        }
    }
}

#[derive(Deserialize)]
struct IssueArgs {
    owner: String,
    repo: String,
    issue_number: IssueNumber,
}

#[async_trait]
impl ToolExecutor for GetIssueDetails {
    async fn execute(&self, arguments: &str) -> Result<serde_json::Value, ToolError> {
        let args: IssueArgs = parse_arguments(arguments)?;
        let number = args.issue_number.value()?;

        let issue = self
            .client
            .get_issue(&args.owner, &args.repo, number)
            .await
            .map_err(ToolError::backend("failed to get issue from GitHub API"))?;

        Ok(json!({
            "title": issue.title,
            "state": issue.state,
            "author": issue.user.map(|u| u.login).unwrap_or_default(),
            "body": issue.body.unwrap_or_default(),
            "labels": issue.labels,
            "url": issue.html_url,
            "created_at": issue.created_at,
        }))
    }
}

#[derive(Deserialize)]
struct BranchArgs {
    owner: String,
    repo: String,
    branch_name: String,
    #[serde(default)]
    source_branch: String,
}

#[async_trait]
impl ToolExecutor for CreateBranch {
    async fn execute(&self, arguments: &str) -> Result<serde_json::Value, ToolError> {
        let args: BranchArgs = parse_arguments(arguments)?;
        let source = if args.source_branch.is_empty() {
            DEFAULT_SOURCE_BRANCH
        } else {
            args.source_branch.as_str()
        };

        let source_ref = self
            .client
            .get_ref(&args.owner, &args.repo, &format!("heads/{source}"))
            .await
            .map_err(ToolError::backend("failed to get source branch reference"))?;

        let created = self
            .client
            .create_ref(
                &args.owner,
                &args.repo,
                &format!("refs/heads/{}", args.branch_name),
                &source_ref.object.sha,
            )
            .await
            .map_err(ToolError::backend("failed to create branch"))?;

        debug!(branch = %args.branch_name, %source, "Branch created");

        Ok(json!({
            "branch_name": args.branch_name,
            "sha": created.object.sha,
            "ref": created.name,
            "url": created.url,
        }))
    }
}

#[derive(Deserialize)]
struct PullRequestArgs {
    owner: String,
    repo: String,
    title: String,
    #[serde(default)]
    body: String,
    head: String,
    base: String,
    #[serde(default)]
    draft: bool,
}

#[async_trait]
impl ToolExecutor for CreatePullRequest {
    async fn execute(&self, arguments: &str) -> Result<serde_json::Value, ToolError> {
        let args: PullRequestArgs = parse_arguments(arguments)?;
        let request = NewPullRequest {
            title: args.title,
            head: args.head,
            base: args.base,
            body: args.body,
            draft: args.draft,
        };

        let pr = self
            .client
            .create_pull_request(&args.owner, &args.repo, &request)
            .await
            .map_err(ToolError::backend("failed to create pull request via GitHub API"))?;

        Ok(json!({
            "number": pr.number,
            "title": pr.title,
            "state": pr.state,
            "url": pr.html_url,
            "author": pr.user.map(|u| u.login).unwrap_or_default(),
            "head": pr.head.name,
            "base": pr.base.name,
            "draft": pr.draft,
            "created_at": pr.created_at,
            "body": pr.body.unwrap_or_default(),
        }))
    }
}

#[derive(Deserialize)]
struct RepoFilesArgs {
    owner: String,
    repo: String,
    #[serde(default)]
    path: String,
    #[serde(default, rename = "ref")]
    reference: String,
}

#[async_trait]
impl ToolExecutor for GetRepositoryFiles {
    async fn execute(&self, arguments: &str) -> Result<serde_json::Value, ToolError> {
        let args: RepoFilesArgs = parse_arguments(arguments)?;
        let reference = Some(args.reference.as_str()).filter(|r| !r.is_empty());

        let contents = self
            .client
            .get_contents(&args.owner, &args.repo, &args.path, reference)
            .await
            .map_err(ToolError::backend("failed to get repository contents"))?;

        Ok(match contents {
            Contents::File(file) => json!({
                "type": "file",
                "name": file.name,
                "path": file.path,
                "content": file.content,
                "size": file.size,
                "sha": file.sha,
            }),
            Contents::Directory(entries) => json!({
                "type": "directory",
                "path": args.path,
                "files": entries,
            }),
        })
    }
}

#[derive(Deserialize)]
struct UpdateFileArgs {
    owner: String,
    repo: String,
    path: String,
    content: String,
    message: String,
    branch: String,
}

#[async_trait]
impl ToolExecutor for UpdateFile {
    async fn execute(&self, arguments: &str) -> Result<serde_json::Value, ToolError> {
        let args: UpdateFileArgs = parse_arguments(arguments)?;

        // No readable file at the path means the file is being created.
        let existing_sha = match self
            .client
            .get_contents(&args.owner, &args.repo, &args.path, Some(&args.branch))
            .await
        {
            Ok(Contents::File(existing)) => Some(existing.sha),
            Ok(Contents::Directory(_)) => None,
            Err(e) => {
                debug!(path = %args.path, error = %e, "No existing file to replace");
                None
            }
        };

        let update = FileUpdate {
            message: args.message,
            content: args.content,
            branch: args.branch,
            sha: existing_sha,
        };
        let commit = self
            .client
            .put_file(&args.owner, &args.repo, &args.path, &update)
            .await
            .map_err(ToolError::backend("failed to update file"))?;

        Ok(json!({
            "path": args.path,
            "sha": commit.content_sha,
            "commit_sha": commit.commit_sha,
            "message": update.message,
            "branch": update.branch,
        }))
    }
}
