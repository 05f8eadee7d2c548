//! End-to-end assessment of one repository
//!
//! URL parsing, metadata, collection, prompt assembly, the LLM request and
//! the report, in that order. Only the URL, the top-level metadata request,
//! the LLM step and writing the report can fail a run.

use crate::agents::AnalysisAgent;
use crate::collector::{Collection, Collector};
use crate::config::Config;
use crate::error::Result;
use crate::github::{GitHubClient, RepoLocation};
use crate::metadata::fetch_metadata;
use crate::prompts::build_prompt;
use crate::report::{save_report, AssessmentReport, CollectionSummary, SavedReport};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::Duration;

/// Per-run switches
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Branch to collect from instead of the default branch
    pub branch: Option<String>,
    /// Stop after collection and skip the LLM
    pub collect_only: bool,
    /// Show a spinner on stderr
    pub show_progress: bool,
}

/// What a run produced
#[derive(Debug)]
pub enum AnalysisOutcome {
    /// Collect-only run
    Collected(CollectionSummary),
    /// Full run with the report already written to disk
    Assessed {
        report: Box<AssessmentReport>,
        saved: SavedReport,
    },
}

/// Applies the spinner style used throughout the CLI
pub fn setup_progress_style(pb: &ProgressBar) {
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
}

/// Runs assessments with one configuration and one GitHub client
pub struct Analyzer {
    config: Config,
    client: GitHubClient,
}

impl Analyzer {
    pub fn new(config: Config) -> Result<Self> {
        let client = GitHubClient::new(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Collects the files of `repo` on `branch`
    pub async fn collect(&self, repo: &RepoLocation, branch: &str, progress: Option<&ProgressBar>) -> Collection {
        let mut collector = Collector::new(&self.client, self.config.collection.clone());
        if let Some(pb) = progress {
            collector = collector.with_progress(pb.clone());
        }
        collector.collect(repo, branch).await
    }

    /// Assesses the repository at `url`
    pub async fn run(&self, url: &str, options: &AnalyzeOptions) -> Result<AnalysisOutcome> {
        let repo = RepoLocation::parse_or_err(url)?;

        let pb = options.show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            setup_progress_style(&pb);
            pb
        });

        let result = if options.collect_only {
            self.run_collect_only(&repo, options, pb.as_ref()).await
        } else {
            self.run_assessment(&repo, options, pb.as_ref()).await
        };

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        result
    }

    async fn run_collect_only(
        &self,
        repo: &RepoLocation,
        options: &AnalyzeOptions,
        pb: Option<&ProgressBar>,
    ) -> Result<AnalysisOutcome> {
        set_message(pb, format!("Fetching repository {}", repo));
        let info = self.client.get_repository(repo).await?;
        let branch = options.branch.clone().unwrap_or(info.default_branch);

        set_message(pb, format!("Collecting files from {} ({})", repo, branch));
        let collection = self.collect(repo, &branch, pb).await;
        Ok(AnalysisOutcome::Collected(CollectionSummary::new(repo, &branch, &collection)))
    }

    async fn run_assessment(
        &self,
        repo: &RepoLocation,
        options: &AnalyzeOptions,
        pb: Option<&ProgressBar>,
    ) -> Result<AnalysisOutcome> {
        // missing key fails before any GitHub request
        let agent = AnalysisAgent::from_env(self.config.llm.clone())?;

        set_message(pb, format!("Fetching metadata for {}", repo));
        let metadata = fetch_metadata(&self.client, repo, options.branch.as_deref(), &self.config.prompt).await?;
        let branch = options.branch.clone().unwrap_or_else(|| metadata.info.default_branch.clone());

        set_message(pb, format!("Collecting files from {} ({})", repo, branch));
        let collection = self.collect(repo, &branch, pb).await;

        let prompt = build_prompt(&metadata, &collection, &self.config.prompt);
        info!("Prompt for {} is {} characters", repo, prompt.chars().count());

        set_message(pb, format!("Waiting for {} to assess {}", agent.model(), repo));
        let assessment = agent.assess(&prompt).await?;

        let report = AssessmentReport {
            repository: repo.full_name(),
            branch,
            generated_at: Utc::now(),
            model: agent.model().to_string(),
            metadata,
            collection: collection.stats,
            assessment,
        };
        set_message(pb, "Writing report".to_string());
        let saved = save_report(&report, repo, &self.config.output_dir).await?;

        Ok(AnalysisOutcome::Assessed { report: Box::new(report), saved })
    }
}

fn set_message(pb: Option<&ProgressBar>, message: String) {
    match pb {
        Some(pb) => pb.set_message(message),
        None => info!("{}", message),
    }
}
