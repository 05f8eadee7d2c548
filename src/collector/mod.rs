//! Repository content collection
//!
//! The [`Collector`] walks a repository depth-first through a
//! [`RepositorySource`], admits files through [`filter::admit`], classifies
//! them with [`classify::classify`], fetches and decodes their bodies one at a
//! time and accumulates them under a file-count ceiling and an aggregate size
//! ceiling. The result is deduplicated, ordered by priority tier and capped.
//!
//! Every per-entry failure (listing, fetch, decode) is logged and skipped;
//! a collection run itself never fails.

use crate::config::CollectionLimits;
use crate::github::{EntryKind, RepoLocation, RepositorySource, TreeEntry};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::time::sleep;

pub mod classify;
pub mod fetch;
pub mod filter;

pub use classify::{classify, infer_language, Classification, Priority};
pub use filter::{admit, is_skipped_dir, Rejection};

/// A fetched, decoded and classified repository file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedFile {
    /// Path from the repository root
    pub path: String,
    /// Decoded text
    pub content: String,
    /// Declared size in bytes, as reported by the directory listing
    pub size: u64,
    pub language: Option<String>,
    pub is_test: bool,
    pub is_config: bool,
    pub is_documentation: bool,
    pub priority: Priority,
}

impl CollectedFile {
    /// Builds a file from its path, body and declared size, classifying the path
    pub fn new(path: impl Into<String>, content: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let Classification { priority, language, is_test, is_config, is_documentation } = classify(&path);
        Self {
            path,
            content: content.into(),
            size,
            language: language.map(str::to_string),
            is_test,
            is_config,
            is_documentation,
            priority,
        }
    }
}

/// Aggregate figures reported next to the collected files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Files in the final set
    pub files_analyzed: usize,
    /// Eligible files that did not make it into the final set
    pub files_skipped: usize,
    /// Files rejected by the admission filter
    pub files_filtered: usize,
    /// Sum of the declared sizes of the final set
    pub total_code_size: u64,
    /// Whether a count or size ceiling stopped further fetches
    pub ceiling_reached: bool,
}

/// Prioritized, deduplicated and capped output of a collection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub files: Vec<CollectedFile>,
    pub stats: CollectionStats,
}

impl Collection {
    /// Files flagged as tests, in collection order
    pub fn test_files(&self) -> impl Iterator<Item = &CollectedFile> {
        self.files.iter().filter(|f| f.is_test)
    }

    /// Files flagged as configuration, in collection order
    pub fn config_files(&self) -> impl Iterator<Item = &CollectedFile> {
        self.files.iter().filter(|f| f.is_config)
    }

    /// Number of files per language label, most common first
    pub fn language_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for file in &self.files {
            if let Some(language) = &file.language {
                *counts.entry(language.as_str()).or_default() += 1;
            }
        }
        let mut counts: Vec<(String, usize)> =
            counts.into_iter().map(|(language, n)| (language.to_string(), n)).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }
}

/// Accumulator owned by a single collection run
#[derive(Debug, Default)]
pub struct CollectionState {
    files: Vec<CollectedFile>,
    total_size: u64,
    discovered: usize,
    filtered: usize,
    ceiling_reached: bool,
}

impl CollectionState {
    /// Files accumulated so far, in traversal order
    pub fn files(&self) -> &[CollectedFile] {
        &self.files
    }

    /// Running sum of declared sizes
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Eligible files seen so far
    pub fn discovered(&self) -> usize {
        self.discovered
    }

    /// Whether a ceiling has stopped further fetches
    pub fn ceiling_reached(&self) -> bool {
        self.ceiling_reached
    }

    /// Records a candidate rejected by the admission filter
    pub fn record_filtered(&mut self) {
        self.filtered += 1;
    }

    /// Records an eligible file and decides whether it may be fetched.
    ///
    /// Checks the count ceiling and the remaining size budget against the
    /// declared size. The first refusal latches: every later call returns
    /// `false` as well.
    pub fn reserve(&mut self, size: u64, limits: &CollectionLimits) -> bool {
        self.discovered += 1;
        if self.ceiling_reached {
            return false;
        }

        let count_full = self.files.len() >= limits.max_files;
        let size_full = self.total_size.saturating_add(size) > limits.max_total_size;
        if count_full || size_full {
            info!(
                "Collection ceiling reached ({} files, {} bytes); no further files will be fetched",
                self.files.len(),
                self.total_size
            );
            self.ceiling_reached = true;
            return false;
        }
        true
    }

    /// Appends a fetched file; callers must have reserved room for it first
    pub fn push(&mut self, file: CollectedFile) {
        self.total_size += file.size;
        self.files.push(file);
    }

    /// Deduplicates by path, sorts by priority and truncates to `max_files`.
    ///
    /// A repeated path keeps the position of its first occurrence and the
    /// value of its last. The sort is stable, so discovery order survives
    /// within a tier.
    pub fn finish(self, max_files: usize) -> Collection {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut files: Vec<CollectedFile> = Vec::with_capacity(self.files.len());
        for file in self.files {
            match index.get(&file.path) {
                Some(&position) => files[position] = file,
                None => {
                    index.insert(file.path.clone(), files.len());
                    files.push(file);
                }
            }
        }

        files.sort_by_key(|file| file.priority);
        files.truncate(max_files);

        let files_analyzed = files.len();
        let stats = CollectionStats {
            files_analyzed,
            files_skipped: self.discovered.saturating_sub(files_analyzed),
            files_filtered: self.filtered,
            total_code_size: files.iter().map(|file| file.size).sum(),
            ceiling_reached: self.ceiling_reached,
        };

        Collection { files, stats }
    }
}

/// Walks a repository and gathers its most relevant files
pub struct Collector<'a, S: RepositorySource + ?Sized> {
    source: &'a S,
    limits: CollectionLimits,
    progress: Option<ProgressBar>,
}

impl<'a, S: RepositorySource + ?Sized> Collector<'a, S> {
    /// Creates a collector reading through `source` under `limits`
    pub fn new(source: &'a S, limits: CollectionLimits) -> Self {
        Self { source, limits, progress: None }
    }

    /// Reports each fetched file on a progress spinner
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Collects from the repository root
    pub async fn collect(&self, repo: &RepoLocation, branch: &str) -> Collection {
        self.collect_from(repo, "", branch).await
    }

    /// Collects from `path` downwards
    pub async fn collect_from(&self, repo: &RepoLocation, path: &str, branch: &str) -> Collection {
        info!("Collecting files from {} ({}) starting at '{}'", repo, branch, path);
        let mut state = CollectionState::default();
        self.walk(repo, path, branch, &mut state).await;

        let collection = state.finish(self.limits.max_files);
        info!(
            "Collected {} files ({} bytes) from {}; {} skipped, {} filtered",
            collection.stats.files_analyzed,
            collection.stats.total_code_size,
            repo,
            collection.stats.files_skipped,
            collection.stats.files_filtered
        );
        collection
    }

    fn walk<'b>(
        &'b self,
        repo: &'b RepoLocation,
        path: &'b str,
        branch: &'b str,
        state: &'b mut CollectionState,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'b>> {
        Box::pin(async move {
            let entries = match self.source.list_directory(repo, path, branch).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Failed to list '{}' in {}: {}", path, repo, e);
                    return;
                }
            };

            for entry in entries {
                match entry.kind {
                    EntryKind::Directory => {
                        if is_skipped_dir(&entry.name) {
                            debug!("Skipping directory {}", entry.path);
                            continue;
                        }
                        self.walk(repo, &entry.path, branch, state).await;
                    }
                    EntryKind::File => self.visit_file(repo, &entry, branch, state).await,
                }
            }
        })
    }

    async fn visit_file(&self, repo: &RepoLocation, entry: &TreeEntry, branch: &str, state: &mut CollectionState) {
        if let Err(reason) = admit(&entry.path, entry.size, self.limits.max_file_size) {
            debug!("Filtered {}: {}", entry.path, reason);
            state.record_filtered();
            return;
        }

        if !state.reserve(entry.size, &self.limits) {
            debug!("Skipped {}: collection ceiling reached", entry.path);
            return;
        }

        match fetch::fetch_text(self.source, repo, &entry.path, branch).await {
            Ok(content) => {
                if let Some(pb) = &self.progress {
                    pb.set_message(format!("Fetched {} ({} files)", entry.path, state.files().len() + 1));
                }
                state.push(CollectedFile::new(entry.path.clone(), content, entry.size));

                let delay = self.limits.fetch_delay();
                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
            Err(e) => warn!("Skipping {}: {}", entry.path, e),
        }
    }
}
