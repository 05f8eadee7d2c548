use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of an entry returned by a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file
    File,
    /// A directory that can be listed further
    Directory,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the repository root, slash separated
    pub path: String,
    /// Base name of the entry
    pub name: String,
    /// File or directory
    pub kind: EntryKind,
    /// Declared size in bytes; zero for directories
    pub size: u64,
}

impl TreeEntry {
    /// Creates a file entry, deriving the name from the path
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        Self { name: base_name(&path).to_string(), path, kind: EntryKind::File, size }
    }

    /// Creates a directory entry, deriving the name from the path
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        Self { name: base_name(&path).to_string(), path, kind: EntryKind::Directory, size: 0 }
    }

    /// Converts a raw listing entry; symlinks and submodules are dropped
    pub fn from_api(entry: ContentEntry) -> Option<Self> {
        let kind = match entry.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Directory,
            _ => return None,
        };
        let size = if kind == EntryKind::File { entry.size } else { 0 };
        Some(Self { path: entry.path, name: entry.name, kind, size })
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Raw entry of the contents endpoint when it lists a directory
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type")]
    pub kind: String,
    /// Base name
    pub name: String,
    /// Path from the repository root
    pub path: String,
    /// Declared size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Transport-encoded file body as returned by the contents and readme endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncodedContent {
    /// Encoded payload
    #[serde(default)]
    pub content: String,
    /// Payload encoding, normally `base64`
    #[serde(default)]
    pub encoding: String,
}

/// Repository metadata from `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    pub default_branch: String,
    #[serde(default)]
    pub topics: Vec<String>,
    pub license: Option<LicenseInfo>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// License block of the repository metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseInfo {
    pub name: Option<String>,
    pub spdx_id: Option<String>,
}

/// Item of `GET /repos/{owner}/{repo}/commits`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Condensed commit used in prompts and reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Abbreviated hash
    pub sha: String,
    /// First line of the commit message
    pub message: String,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl From<ApiCommit> for CommitSummary {
    fn from(commit: ApiCommit) -> Self {
        let (author, date) = match commit.commit.author {
            Some(author) => (author.name, author.date),
            None => (None, None),
        };
        Self {
            sha: commit.sha.chars().take(7).collect(),
            message: commit.commit.message.lines().next().unwrap_or_default().to_string(),
            author,
            date,
        }
    }
}

/// Item of `GET /repos/{owner}/{repo}/branches`
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
}

/// Item of `GET /repos/{owner}/{repo}/pulls`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of a GitHub API error response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}
