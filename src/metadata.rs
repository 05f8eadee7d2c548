//! Repository metadata gathered next to the file contents.
//!
//! Only the top-level repository request is allowed to fail the run; the
//! secondary endpoints degrade to empty values with a warning.

use crate::collector::fetch::decode_content;
use crate::config::PromptLimits;
use crate::error::Result;
use crate::github::{CommitSummary, GitHubClient, PullRequest, RepoLocation, RepositoryInfo};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Counts over the most recent pull requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestStats {
    /// Pull requests looked at
    pub sampled: usize,
    pub open: usize,
    pub merged: usize,
    /// Closed without being merged
    pub closed: usize,
    /// Titles of the newest few
    pub recent_titles: Vec<String>,
}

impl PullRequestStats {
    /// Summarizes a page of pull requests
    pub fn from_pulls(pulls: &[PullRequest]) -> Self {
        let mut stats = Self { sampled: pulls.len(), ..Self::default() };
        for pull in pulls {
            match (pull.state.as_str(), pull.merged_at.is_some()) {
                ("open", _) => stats.open += 1,
                (_, true) => stats.merged += 1,
                _ => stats.closed += 1,
            }
        }
        stats.recent_titles = pulls.iter().take(5).map(|p| format!("#{} {}", p.number, p.title)).collect();
        stats
    }
}

/// Everything known about a repository besides its files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub info: RepositoryInfo,
    /// Language name and byte count, largest first
    pub languages: Vec<(String, u64)>,
    pub readme: Option<String>,
    /// Branches on the first page of the listing (at most 100)
    pub branch_count: usize,
    pub recent_commits: Vec<CommitSummary>,
    pub pull_requests: PullRequestStats,
}

impl RepositoryMetadata {
    /// Share of each language in percent, largest first
    pub fn language_shares(&self) -> Vec<(String, f64)> {
        let total: u64 = self.languages.iter().map(|(_, bytes)| bytes).sum();
        if total == 0 {
            return Vec::new();
        }
        self.languages
            .iter()
            .map(|(name, bytes)| (name.clone(), *bytes as f64 * 100.0 / total as f64))
            .collect()
    }
}

/// Fetches metadata for `repo`.
///
/// Recent commits come from `branch`, or from the default branch when it is
/// `None`. Fails only when the repository itself cannot be fetched.
pub async fn fetch_metadata(
    client: &GitHubClient,
    repo: &RepoLocation,
    branch: Option<&str>,
    limits: &PromptLimits,
) -> Result<RepositoryMetadata> {
    let info = client.get_repository(repo).await?;
    info!("Fetched metadata for {} (default branch {})", info.full_name, info.default_branch);
    let branch = branch.unwrap_or(&info.default_branch).to_string();

    let languages = best_effort(client.get_languages(repo).await, "languages", repo);
    let readme = match client.get_readme(repo).await {
        Ok(payload) => match decode_content(&payload) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Could not decode README of {}: {}", repo, e);
                None
            }
        },
        Err(e) => {
            warn!("No README for {}: {}", repo, e);
            None
        }
    };
    let branch_count = best_effort(client.get_branches(repo).await, "branches", repo).len();
    let recent_commits = best_effort(client.get_commits(repo, &branch, limits.recent_commits).await, "commits", repo);
    let pulls = best_effort(client.get_pull_requests(repo, 30).await, "pull requests", repo);

    Ok(RepositoryMetadata {
        info,
        languages,
        readme,
        branch_count,
        recent_commits,
        pull_requests: PullRequestStats::from_pulls(&pulls),
    })
}

fn best_effort<T: Default>(result: Result<T>, what: &str, repo: &RepoLocation) -> T {
    result.unwrap_or_else(|e| {
        warn!("Could not fetch {} for {}: {}", what, repo, e);
        T::default()
    })
}
