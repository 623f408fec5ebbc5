//! Request and response bodies for the subset of the REST API we use.
//! Unknown fields are ignored; absent optional fields default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct User {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Label {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitObject {
    pub sha: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub object: GitObject,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
    pub draft: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestBranch {
    #[serde(rename = "ref", default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub head: PullRequestBranch,
    #[serde(default)]
    pub base: PullRequestBranch,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Clone)]
pub struct FileContent {
    pub name: String,
    pub path: String,
    /// Decoded UTF-8 text (lossy for binary files).
    pub content: String,
    pub size: u64,
    pub sha: String,
}

/// The contents endpoint returns an object for a file and an array for a
/// directory.
#[derive(Debug, Clone)]
pub enum Contents {
    File(FileContent),
    Directory(Vec<ContentEntry>),
}

/// Raw file object as returned by the API, before base64 decoding.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFile {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Clone)]
pub struct FileUpdate {
    pub message: String,
    /// Plain file content; encoded on the wire.
    pub content: String,
    pub branch: String,
    /// SHA of the blob being replaced; `None` creates the file.
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CommittedContent {
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawFileCommit {
    #[serde(default)]
    pub content: Option<CommittedContent>,
    #[serde(default)]
    pub commit: Commit,
}

#[derive(Debug, Clone)]
pub struct FileCommit {
    pub content_sha: String,
    pub commit_sha: String,
}
