#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use repo_assessor::config::{CollectionLimits, Config};
use repo_assessor::error::{AssessorError, Result};
use repo_assessor::github::{EncodedContent, RepoLocation, RepositorySource, TreeEntry};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

pub mod test_helpers {
    use super::*;

    pub async fn setup_test_server() -> mockito::ServerGuard {
        mockito::Server::new_async().await
    }

    /// Config pointed at `api_base` with no delay between fetches
    pub fn create_test_config(api_base: &str, output_dir: &Path) -> Config {
        let mut config = Config::new(output_dir.to_path_buf());
        config.github_api_base = api_base.to_string();
        config.collection = no_delay_limits();
        config
    }

    pub fn no_delay_limits() -> CollectionLimits {
        CollectionLimits { fetch_delay_ms: 0, ..CollectionLimits::default() }
    }

    pub fn demo_repo() -> RepoLocation {
        RepoLocation { owner: "octo".into(), repo: "demo".into() }
    }

    /// Base64 wrapped at 60 columns, the way the contents endpoint sends it
    pub fn github_base64(bytes: &[u8]) -> String {
        let encoded = STANDARD.encode(bytes);
        encoded
            .as_bytes()
            .chunks(60)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn content_json(text: &str) -> String {
        serde_json::json!({
            "type": "file",
            "encoding": "base64",
            "content": github_base64(text.as_bytes()),
        })
        .to_string()
    }

    pub fn setup_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }
}

/// In-memory repository that records every request made against it
#[derive(Default)]
pub struct FakeRepository {
    dirs: HashMap<String, Vec<TreeEntry>>,
    files: HashMap<String, EncodedContent>,
    failing_dirs: HashSet<String>,
    listed: Mutex<Vec<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text file whose declared size is its byte length
    pub fn file(self, path: &str, body: &str) -> Self {
        let size = body.len() as u64;
        self.file_with_size(path, size, body)
    }

    /// Adds a text file with an explicit declared size
    pub fn file_with_size(self, path: &str, size: u64, body: &str) -> Self {
        let payload = EncodedContent {
            content: test_helpers::github_base64(body.as_bytes()),
            encoding: "base64".into(),
        };
        self.raw_file(path, size, payload)
    }

    /// Adds a file with an arbitrary payload
    pub fn raw_file(mut self, path: &str, size: u64, payload: EncodedContent) -> Self {
        self.add_entry(TreeEntry::file(path, size));
        self.files.insert(path.to_string(), payload);
        self
    }

    /// Makes listing `path` fail
    pub fn failing_dir(mut self, path: &str) -> Self {
        self.failing_dirs.insert(path.to_string());
        self
    }

    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    fn add_entry(&mut self, entry: TreeEntry) {
        let parent = match entry.path.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        };
        let siblings = self.dirs.entry(parent.clone()).or_default();
        if siblings.iter().any(|e| e.path == entry.path) {
            return;
        }
        siblings.push(entry);
        if !parent.is_empty() {
            self.add_entry(TreeEntry::directory(parent));
        }
    }
}

#[async_trait]
impl RepositorySource for FakeRepository {
    async fn list_directory(&self, _repo: &RepoLocation, path: &str, _branch: &str) -> Result<Vec<TreeEntry>> {
        self.listed.lock().unwrap().push(path.to_string());
        if self.failing_dirs.contains(path) {
            return Err(AssessorError::GitHubApi(format!("listing {} failed", path)));
        }
        Ok(self.dirs.get(path).cloned().unwrap_or_default())
    }

    async fn fetch_file(&self, _repo: &RepoLocation, path: &str, _branch: &str) -> Result<EncodedContent> {
        self.fetched.lock().unwrap().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssessorError::GitHubApi(format!("{} not found", path)))
    }
}
