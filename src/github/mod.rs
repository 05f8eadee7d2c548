//! GitHub REST API access
//!
//! [`RepoLocation`] parses repository URLs without touching the network,
//! [`GitHubClient`] wraps the handful of endpoints the assessor consumes and
//! [`RepositorySource`] is the seam the content collector walks through.

use crate::config::Config;
use crate::error::{AssessorError, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use url::Url;

pub mod types;

pub use types::{
    Branch, CommitSummary, EncodedContent, EntryKind, PullRequest, RepositoryInfo, TreeEntry,
};
use types::{ApiCommit, ApiErrorBody, ContentEntry};

const GITHUB_HOST: &str = "github.com";
const API_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "repo-assessor";

/// Owner and name of a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoLocation {
    pub owner: String,
    pub repo: String,
}

impl RepoLocation {
    /// Parses `https://github.com/<owner>/<repo>[/...]`.
    ///
    /// Returns `None` unless the scheme is `https`, the host is exactly
    /// `github.com` and the path has at least two non-empty segments. Never performs a request.
    pub fn parse(url: &str) -> Option<Self> {
        let parsed = Url::parse(url.trim()).ok()?;
        if parsed.scheme() != "https" {
            return None;
        }
        if parsed.host_str() != Some(GITHUB_HOST) {
            return None;
        }

        let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let repo = segments.next()?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if repo.is_empty() {
            return None;
        }

        Some(Self { owner: owner.to_string(), repo: repo.to_string() })
    }

    /// Like [`RepoLocation::parse`] but reports why the input was rejected
    pub fn parse_or_err(url: &str) -> Result<Self> {
        Self::parse(url).ok_or_else(|| {
            AssessorError::Validation(format!(
                "'{}' is not a repository URL of the form https://github.com/<owner>/<repo>",
                url.trim()
            ))
        })
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Browser URL of the repository
    pub fn html_url(&self) -> String {
        format!("https://{}/{}/{}", GITHUB_HOST, self.owner, self.repo)
    }
}

impl fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Read access to a repository's tree, as needed by the content collector
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Lists the immediate entries of `path` (empty string for the root)
    async fn list_directory(&self, repo: &RepoLocation, path: &str, branch: &str) -> Result<Vec<TreeEntry>>;

    /// Fetches the transport-encoded body of a single file
    async fn fetch_file(&self, repo: &RepoLocation, path: &str, branch: &str) -> Result<EncodedContent>;
}

/// Thin client over the GitHub REST API
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: String,
}

impl GitHubClient {
    /// Creates a client pointed at `config.github_api_base`
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base(&config.github_api_base)
    }

    /// Creates a client for an explicit API base URL
    pub fn with_base(api_base: &str) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(|e| AssessorError::Network(e.to_string()))?;

        Ok(Self { client, api_base: api_base.trim_end_matches('/').to_string() })
    }

    /// Fetches the repository metadata.
    ///
    /// This is the one request whose failure aborts a run, so the status is
    /// mapped onto the not-found / access-denied / rate-limit errors.
    pub async fn get_repository(&self, repo: &RepoLocation) -> Result<RepositoryInfo> {
        let url = self.endpoint(repo, &[], &[])?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssessorError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<RepositoryInfo>().await?);
        }

        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        Err(repository_error(status, remaining.as_deref(), &body.message, repo))
    }

    /// Language name to byte count, largest first
    pub async fn get_languages(&self, repo: &RepoLocation) -> Result<Vec<(String, u64)>> {
        let map: HashMap<String, u64> = self.get_json(self.endpoint(repo, &["languages"], &[])?).await?;
        let mut languages: Vec<(String, u64)> = map.into_iter().collect();
        languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(languages)
    }

    /// The repository README in its transport encoding
    pub async fn get_readme(&self, repo: &RepoLocation) -> Result<EncodedContent> {
        self.get_json(self.endpoint(repo, &["readme"], &[])?).await
    }

    /// Most recent commits reachable from `branch`
    pub async fn get_commits(&self, repo: &RepoLocation, branch: &str, count: usize) -> Result<Vec<CommitSummary>> {
        let per_page = count.clamp(1, 100).to_string();
        let commits: Vec<ApiCommit> = self
            .get_json(self.endpoint(repo, &["commits"], &[("sha", branch), ("per_page", &per_page)])?)
            .await?;
        Ok(commits.into_iter().map(CommitSummary::from).collect())
    }

    /// First page (up to 100) of branches
    pub async fn get_branches(&self, repo: &RepoLocation) -> Result<Vec<Branch>> {
        self.get_json(self.endpoint(repo, &["branches"], &[("per_page", "100")])?).await
    }

    /// Most recent pull requests in any state
    pub async fn get_pull_requests(&self, repo: &RepoLocation, count: usize) -> Result<Vec<PullRequest>> {
        let per_page = count.clamp(1, 100).to_string();
        self.get_json(self.endpoint(repo, &["pulls"], &[("state", "all"), ("per_page", &per_page)])?)
            .await
    }

    fn endpoint(&self, repo: &RepoLocation, tail: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AssessorError::Config(format!("Invalid API base URL: {}", self.api_base)))?;
            segments.pop_if_empty();
            segments.push("repos").push(&repo.owner).push(&repo.repo);
            segments.extend(tail.iter().filter(|s| !s.is_empty()));
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }

    fn contents_url(&self, repo: &RepoLocation, path: &str, branch: &str) -> Result<Url> {
        let mut tail = vec!["contents"];
        tail.extend(path.split('/').filter(|s| !s.is_empty()));
        self.endpoint(repo, &tail, &[("ref", branch)])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssessorError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AssessorError::GitHubApi(format!(
                "GitHub API request failed: HTTP {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn list_directory(&self, repo: &RepoLocation, path: &str, branch: &str) -> Result<Vec<TreeEntry>> {
        let entries: Vec<ContentEntry> = self.get_json(self.contents_url(repo, path, branch)?).await?;
        Ok(entries.into_iter().filter_map(TreeEntry::from_api).collect())
    }

    async fn fetch_file(&self, repo: &RepoLocation, path: &str, branch: &str) -> Result<EncodedContent> {
        self.get_json(self.contents_url(repo, path, branch)?).await
    }
}

/// Maps a failed metadata response onto the fatal error taxonomy
pub fn repository_error(
    status: StatusCode,
    rate_limit_remaining: Option<&str>,
    message: &str,
    repo: &RepoLocation,
) -> AssessorError {
    let rate_limited = rate_limit_remaining == Some("0") || message.to_lowercase().contains("rate limit");
    match status {
        StatusCode::NOT_FOUND => AssessorError::RepositoryNotFound(repo.full_name()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS if rate_limited => {
            AssessorError::RateLimitExceeded(format!("HTTP {}: {}", status.as_u16(), message))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            AssessorError::RateLimitExceeded(format!("HTTP {}", status.as_u16()))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AssessorError::AccessDenied(repo.full_name()),
        _ => AssessorError::GitHubApi(format!(
            "Failed to fetch repository {}: HTTP {} {}",
            repo.full_name(),
            status.as_u16(),
            message
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn location() -> RepoLocation {
        RepoLocation { owner: "rust-lang".into(), repo: "rust".into() }
    }

    #[test_case("https://github.com/rust-lang/rust", Some(("rust-lang", "rust")); "plain")]
    #[test_case("https://github.com/rust-lang/rust/", Some(("rust-lang", "rust")); "trailing slash")]
    #[test_case("https://github.com/rust-lang/rust.git", Some(("rust-lang", "rust")); "git suffix")]
    #[test_case("https://github.com/rust-lang/rust/tree/master/src", Some(("rust-lang", "rust")); "deep link")]
    #[test_case("  https://github.com/a/b  ", Some(("a", "b")); "surrounding whitespace")]
    #[test_case("http://github.com/a/b", None; "plain http")]
    #[test_case("https://github.com/onlyowner", None; "missing repo segment")]
    #[test_case("https://github.com//", None; "empty segments")]
    #[test_case("https://gitlab.com/a/b", None; "other host")]
    #[test_case("https://www.github.com/a/b", None; "subdomain")]
    #[test_case("ftp://github.com/a/b", None; "other scheme")]
    #[test_case("github.com/a/b", None; "no scheme")]
    fn test_parse_repo_location(input: &str, expected: Option<(&str, &str)>) {
        let parsed = RepoLocation::parse(input);
        let expected = expected.map(|(o, r)| RepoLocation { owner: o.into(), repo: r.into() });
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_or_err_is_validation() {
        let err = RepoLocation::parse_or_err("https://github.com/onlyowner").unwrap_err();
        assert!(matches!(err, AssessorError::Validation(_)));
    }

    #[test]
    fn test_contents_url_encodes_segments() {
        let client = GitHubClient::with_base("https://api.github.com/").unwrap();
        let url = client.contents_url(&location(), "docs/my file.md", "main").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/rust-lang/rust/contents/docs/my%20file.md?ref=main"
        );

        let root = client.contents_url(&location(), "", "dev").unwrap();
        assert_eq!(root.as_str(), "https://api.github.com/repos/rust-lang/rust/contents?ref=dev");
    }

    #[test]
    fn test_repository_error_mapping() {
        let repo = location();
        assert!(matches!(
            repository_error(StatusCode::NOT_FOUND, None, "Not Found", &repo),
            AssessorError::RepositoryNotFound(_)
        ));
        assert!(matches!(
            repository_error(StatusCode::FORBIDDEN, Some("0"), "", &repo),
            AssessorError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            repository_error(StatusCode::FORBIDDEN, Some("42"), "API rate limit exceeded for 1.2.3.4", &repo),
            AssessorError::RateLimitExceeded(_)
        ));
        assert!(matches!(
            repository_error(StatusCode::FORBIDDEN, Some("42"), "Repository access blocked", &repo),
            AssessorError::AccessDenied(_)
        ));
        assert!(matches!(
            repository_error(StatusCode::UNAUTHORIZED, None, "Bad credentials", &repo),
            AssessorError::AccessDenied(_)
        ));
        assert!(matches!(
            repository_error(StatusCode::INTERNAL_SERVER_ERROR, None, "", &repo),
            AssessorError::GitHubApi(_)
        ));
    }
}
