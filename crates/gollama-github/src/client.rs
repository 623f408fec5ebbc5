//! GitHub REST client: URL building, auth headers, and the operations.

use std::time::Duration;

use base64::Engine;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::GitHubConfig;
use crate::models::{
    Contents, FileCommit, FileContent, FileUpdate, GitRef, Issue, NewPullRequest, PullRequest,
    RawFile, RawFileCommit,
};
use crate::GitHubError;

const API_VERSION: &str = "2022-11-28";

pub struct GitHubClient {
    config: GitHubConfig,
    http: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| GitHubError::Network(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn has_token(&self) -> bool {
        self.config.token.is_some()
    }

    /// `GET /repos/{owner}/{repo}/issues/{number}`
    pub async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue, GitHubError> {
        let number = number.to_string();
        let url = self.url(&["repos", owner, repo, "issues", &number])?;
        self.send(self.request(Method::GET, url)).await
    }

    /// Resolve a ref such as `heads/main`.
    pub async fn get_ref(&self, owner: &str, repo: &str, reference: &str) -> Result<GitRef, GitHubError> {
        let mut segments = vec!["repos", owner, repo, "git", "ref"];
        segments.extend(reference.split('/').filter(|s| !s.is_empty()));
        let url = self.url(&segments)?;
        self.send(self.request(Method::GET, url)).await
    }

    /// Create `reference` (fully qualified, e.g. `refs/heads/feature`) at `sha`.
    pub async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        sha: &str,
    ) -> Result<GitRef, GitHubError> {
        self.require_token("creating a branch")?;
        let url = self.url(&["repos", owner, repo, "git", "refs"])?;
        let body = serde_json::json!({ "ref": reference, "sha": sha });
        self.send(self.request(Method::POST, url).json(&body)).await
    }

    pub async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr: &NewPullRequest,
    ) -> Result<PullRequest, GitHubError> {
        self.require_token("creating a pull request")?;
        let url = self.url(&["repos", owner, repo, "pulls"])?;
        self.send(self.request(Method::POST, url).json(pr)).await
    }

    /// Read a file or list a directory. An empty `path` lists the root.
    pub async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: Option<&str>,
    ) -> Result<Contents, GitHubError> {
        let url = self.contents_url(owner, repo, path)?;
        let mut request = self.request(Method::GET, url);
        if let Some(r) = reference.filter(|r| !r.is_empty()) {
            request = request.query(&[("ref", r)]);
        }

        let json: serde_json::Value = self.send(request).await?;
        if json.is_array() {
            let entries =
                serde_json::from_value(json).map_err(|e| GitHubError::Parse(e.to_string()))?;
            return Ok(Contents::Directory(entries));
        }

        let raw: RawFile =
            serde_json::from_value(json).map_err(|e| GitHubError::Parse(e.to_string()))?;
        Ok(Contents::File(decode_file(raw)?))
    }

    /// Create or replace a file through the contents API.
    pub async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        update: &FileUpdate,
    ) -> Result<FileCommit, GitHubError> {
        self.require_token("updating a file")?;
        let url = self.contents_url(owner, repo, path)?;

        let mut body = serde_json::json!({
            "message": update.message,
            "content": base64::engine::general_purpose::STANDARD.encode(&update.content),
            "branch": update.branch,
        });
        if let Some(ref sha) = update.sha {
            body["sha"] = serde_json::json!(sha);
        }

        let raw: RawFileCommit = self.send(self.request(Method::PUT, url).json(&body)).await?;
        Ok(FileCommit {
            content_sha: raw.content.map(|c| c.sha).unwrap_or_default(),
            commit_sha: raw.commit.sha,
        })
    }

    fn require_token(&self, action: &'static str) -> Result<(), GitHubError> {
        if self.has_token() {
            Ok(())
        } else {
            Err(GitHubError::MissingToken(action))
        }
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<Url, GitHubError> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        self.url(&segments)
    }

    /// Join path segments onto the API base URL, percent-encoding each.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| GitHubError::InvalidUrl(format!("{}: {e}", self.config.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| GitHubError::InvalidUrl(self.config.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "GitHub API request");
        let request = self
            .http
            .request(method, url)
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION);
        match self.config.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GitHubError> {
        let response = request
            .send()
            .await
            .map_err(|e| GitHubError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or_else(|| text.chars().take(200).collect());
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GitHubError::Parse(e.to_string()))
    }
}

fn decode_file(raw: RawFile) -> Result<FileContent, GitHubError> {
    let content = match (raw.content, raw.encoding.as_deref()) {
        (Some(encoded), Some("base64")) => {
            // The API wraps base64 at 60 columns.
            let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| GitHubError::Parse(format!("file content: {e}")))?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        (Some(plain), _) => plain,
        (None, _) => String::new(),
    };

    Ok(FileContent {
        name: raw.name,
        path: raw.path,
        content,
        size: raw.size,
        sha: raw.sha,
    })
}
