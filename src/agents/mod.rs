//! OpenAI integration for the repository assessment
//!
//! One chat completion per run: a fixed system prompt, the assembled
//! repository prompt, and a strict JSON-schema response format so the answer
//! parses straight into an [`Assessment`].

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, ResponseFormat,
    ResponseFormatJsonSchema,
};
use async_openai::Client;
use log::{debug, info};

use crate::assessment::{response_schema, Assessment};
use crate::config::{ApiKeys, LlmSettings};
use crate::error::{AssessorError, Result};
use crate::prompts::SYSTEM_PROMPT;

const SCHEMA_NAME: &str = "repository_assessment";

/// Client that turns an assembled prompt into an [`Assessment`]
#[derive(Clone)]
pub struct AnalysisAgent {
    client: Client<OpenAIConfig>,
    settings: LlmSettings,
}

impl AnalysisAgent {
    /// Creates an agent with an explicit API key
    pub fn new(api_key: &str, settings: LlmSettings) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = &settings.api_base {
            config = config.with_api_base(base);
        }
        Self { client: Client::with_config(config), settings }
    }

    /// Creates an agent from `OPENAI_API_KEY`
    pub fn from_env(settings: LlmSettings) -> Result<Self> {
        let keys = ApiKeys::from_env();
        Ok(Self::new(keys.require_openai()?, settings))
    }

    /// Model the requests are sent to
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Builds the chat request for `prompt`
    pub fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest> {
        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some("Multi-dimensional quality assessment of a code repository".to_string()),
                name: SCHEMA_NAME.to_string(),
                schema: Some(response_schema()),
                strict: Some(true),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.settings.model)
            .temperature(self.settings.temperature)
            .max_completion_tokens(self.settings.max_tokens)
            .response_format(response_format)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;
        Ok(request)
    }

    /// Sends the prompt and parses the structured answer
    pub async fn assess(&self, prompt: &str) -> Result<Assessment> {
        info!("Requesting assessment from {} ({} prompt chars)", self.settings.model, prompt.chars().count());
        let request = self.build_request(prompt)?;
        let response = self.client.chat().create(request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssessorError::Llm("completion contained no choices".into()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(AssessorError::Llm(format!("model refused the request: {}", refusal)));
        }

        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AssessorError::Llm("completion was empty".into()))?;
        debug!("Assessment response: {} chars", content.len());

        Assessment::from_json(&content)
    }
}
