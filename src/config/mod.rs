mod env_manager;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::error::{AssessorError, Result};

pub use env_manager::{get_env_value, ApiKeys};

/// Default GitHub REST API endpoint
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const ONE_MIB: u64 = 1024 * 1024;

/// Main configuration struct for the application
///
/// Every section falls back to its defaults, so a config file only needs
/// the keys it wants to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the GitHub REST API
    pub github_api_base: String,
    /// Directory where assessment reports are written
    pub output_dir: PathBuf,
    /// Ceilings applied while collecting repository files
    pub collection: CollectionLimits,
    /// Limits applied when serializing files into the prompt
    pub prompt: PromptLimits,
    /// Settings for the completion request
    pub llm: LlmSettings,
}

/// Ceilings for the repository content collector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionLimits {
    /// Largest single file (declared size, bytes) that will be fetched
    pub max_file_size: u64,
    /// Aggregate byte budget for all fetched files
    pub max_total_size: u64,
    /// Maximum number of files fetched
    pub max_files: usize,
    /// Pause after every successful file fetch, in milliseconds
    pub fetch_delay_ms: u64,
}

/// Limits for the prompt assembler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptLimits {
    /// Maximum number of file bodies included in the prompt
    pub max_files: usize,
    /// Characters kept from each file body
    pub max_file_chars: usize,
    /// Character budget for all file bodies together
    pub max_total_chars: usize,
    /// Slots reserved for test files
    pub reserved_test_files: usize,
    /// Slots reserved for configuration files
    pub reserved_config_files: usize,
    /// Characters kept from the README
    pub readme_chars: usize,
    /// Number of recent commits listed
    pub recent_commits: usize,
}

/// Settings for the LLM completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model to use for the assessment
    pub model: String,
    /// Alternative OpenAI-compatible endpoint
    pub api_base: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens in the answer
    pub max_tokens: u32,
}

impl Config {
    /// Creates a new configuration with the specified output directory
    ///
    /// # Arguments
    /// * `output_dir` - The directory where reports will be stored
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            github_api_base: GITHUB_API_BASE.to_string(),
            output_dir,
            collection: CollectionLimits::default(),
            prompt: PromptLimits::default(),
            llm: LlmSettings::default(),
        }
    }

    /// Loads configuration from the default config file location
    ///
    /// If the config file doesn't exist, returns the default configuration.
    /// The config file is expected to be in TOML format.
    pub fn load() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AssessorError::Config("Could not find config directory".into()))?;
        let config_path = config_dir.join("repo-assessor").join("config.toml");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| AssessorError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parses a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AssessorError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Validates the configuration and prepares the output directory
    pub async fn validate(&self) -> Result<()> {
        self.check_limits()?;
        self.ensure_directories_exist().await?;
        Ok(())
    }

    /// Rejects ceilings that would make collection meaningless
    pub fn check_limits(&self) -> Result<()> {
        let limits = &self.collection;
        if limits.max_files == 0 {
            return Err(AssessorError::Config("collection.max_files must be greater than zero".into()));
        }
        if limits.max_file_size == 0 || limits.max_total_size == 0 {
            return Err(AssessorError::Config("collection size ceilings must be greater than zero".into()));
        }
        if limits.max_file_size > limits.max_total_size {
            return Err(AssessorError::Config(format!(
                "collection.max_file_size ({}) exceeds collection.max_total_size ({})",
                limits.max_file_size, limits.max_total_size
            )));
        }
        if self.prompt.max_files == 0 {
            return Err(AssessorError::Config("prompt.max_files must be greater than zero".into()));
        }
        Ok(())
    }

    /// Ensures the report directory exists
    pub async fn ensure_directories_exist(&self) -> Result<()> {
        if !tokio::fs::try_exists(&self.output_dir).await? {
            tokio::fs::create_dir_all(&self.output_dir).await?;
        }
        Ok(())
    }
}

impl CollectionLimits {
    /// Pause inserted after every successful file fetch
    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }
}

impl Default for CollectionLimits {
    fn default() -> Self {
        Self {
            max_file_size: ONE_MIB,
            max_total_size: 10 * ONE_MIB,
            max_files: 500,
            fetch_delay_ms: 50,
        }
    }
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            max_files: 60,
            max_file_chars: 6_000,
            max_total_chars: 200_000,
            reserved_test_files: 5,
            reserved_config_files: 5,
            readme_chars: 4_000,
            recent_commits: 10,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_base: None,
            temperature: 0.2,
            max_tokens: 4096,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(PathBuf::from("output"))
    }
}
