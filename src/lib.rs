#![doc = include_str!("../README.md")]
#![warn(clippy::all)]

//! repo-assessor - LLM-based quality assessment of GitHub repositories
//!
//! ## Modules
//! - [`github`]: URL parsing and the REST client behind [`github::RepositorySource`]
//! - [`collector`]: bounded, prioritized collection of repository files
//! - [`metadata`]: repository facts gathered next to the files
//! - [`prompts`]: prompt assembly under character budgets
//! - [`agents`]: the OpenAI request and its structured answer
//! - [`report`]: markdown, JSON and terminal output
//! - [`analyzer`]: the end-to-end run

/// Configuration module for the application
pub mod config;
/// Error handling types and utilities
pub mod error;
/// Logging configuration and utilities
pub mod logging;
/// GitHub REST API access
pub mod github;
/// Repository content collection
pub mod collector;
/// Repository metadata
pub mod metadata;
/// Assessment schema
pub mod assessment;
/// Prompt assembly
pub mod prompts;
/// Agents for AI-powered analysis
pub mod agents;
/// Report rendering and persistence
pub mod report;
/// End-to-end orchestration
pub mod analyzer;

// Re-export common types
pub use agents::AnalysisAgent;
pub use analyzer::{AnalysisOutcome, AnalyzeOptions, Analyzer};
pub use assessment::Assessment;
pub use collector::{CollectedFile, Collection, CollectionStats, Collector, Priority};
pub use config::Config;
pub use error::{AssessorError, Result};
pub use github::{GitHubClient, RepoLocation, RepositorySource};
