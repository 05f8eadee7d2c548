use serde::{Deserialize, Serialize};
use crate::error::{AssessorError, Result};

/// Environment variable holding the LLM credential
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Stores API keys for the services the assessor talks to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// OpenAI API key for the assessment request
    pub openai_api_key: Option<String>,
}

impl ApiKeys {
    /// Loads API keys from the environment
    pub fn from_env() -> Self {
        Self {
            openai_api_key: get_env_value(OPENAI_API_KEY_VAR),
        }
    }

    /// Returns the OpenAI key or a configuration error naming the variable
    pub fn require_openai(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| AssessorError::Config(format!("{} environment variable not set", OPENAI_API_KEY_VAR)))
    }
}

/// Reads an environment variable, treating empty values as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
