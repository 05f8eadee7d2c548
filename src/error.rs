use std::io;
use thiserror::Error;
use async_openai::error::OpenAIError;

/// Custom result type alias for the application
pub type Result<T> = std::result::Result<T, AssessorError>;

/// Errors that can occur while collecting or assessing a repository
#[derive(Debug, Error)]
pub enum AssessorError {
    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Config file parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Base64 payload errors
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// File content was not valid UTF-8 text
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// General message errors
    #[error("{0}")]
    Message(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// The repository does not exist or is private
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// The API refused access to the repository
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// API rate limit exceeded errors
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// GitHub API specific errors
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Content could not be decoded into text
    #[error("Decode error: {0}")]
    Decode(String),

    /// Language Model errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// OpenAI API errors
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
}

impl AssessorError {
    /// Creates a new error with the specified message
    pub fn new(message: &str) -> Self {
        Self::Message(message.to_string())
    }

    /// Checks if this error only affects a single tree entry.
    ///
    /// The collector logs these and keeps walking.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Http(_)
                | Self::GitHubApi(_)
                | Self::Json(_)
                | Self::Base64(_)
                | Self::Utf8(_)
                | Self::Decode(_)
        )
    }

    /// Checks if this error is fatal and should terminate processing
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }

    /// A short message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::RepositoryNotFound(repo) => {
                format!("Repository {} was not found. Check the URL and make sure it is public.", repo)
            }
            Self::AccessDenied(repo) => format!("Access to {} was denied by the GitHub API.", repo),
            Self::RateLimitExceeded(_) => {
                "GitHub API rate limit exceeded. Wait for the limit to reset and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}
