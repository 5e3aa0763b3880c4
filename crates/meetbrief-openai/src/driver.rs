// OpenAI Text Generator
//
// Sends one non-streaming chat completion per summary request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use meetbrief_core::error::MeetingError;
use meetbrief_core::summarize::GenerationRequest;
use meetbrief_core::traits::TextGenerator;

use crate::types::{ChatMessage, ChatRequest, ChatResponse};

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI text generator
///
/// # Example
///
/// ```ignore
/// use meetbrief_openai::OpenAiTextGenerator;
///
/// let generator = OpenAiTextGenerator::new("your-api-key");
/// // or with custom endpoint
/// let generator = OpenAiTextGenerator::with_base_url("your-api-key", "https://api.example.com/v1/chat/completions");
/// ```
#[derive(Clone)]
pub struct OpenAiTextGenerator {
    client: Client,
    api_key: String,
    api_url: String,
}

impl OpenAiTextGenerator {
    /// Create a new generator with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, OPENAI_API_URL)
    }

    /// Create a new generator with a custom API URL
    pub fn with_base_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }

    /// Get the API URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Non-streaming chat completion, returns the first choice's text
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .context("Failed to send OpenAI request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "OpenAI API request failed with status {}: {}",
                status,
                error_text
            );
        }

        let response_json: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let choice = response_json
            .choices
            .first()
            .ok_or_else(|| anyhow::anyhow!("No choices in OpenAI response"))?;

        if let Some(usage) = &response_json.usage {
            tracing::debug!(
                model = %response_json.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                finish_reason = ?choice.finish_reason,
                "OpenAI completion"
            );
        }

        Ok(choice.message.content.clone().unwrap_or_default())
    }

    fn to_chat_request(request: &GenerationRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: vec![
                ChatMessage::system(request.system_prompt.clone()),
                ChatMessage::user(request.prompt.clone()),
            ],
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            stream: false,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> meetbrief_core::Result<String> {
        self.chat_completion(&Self::to_chat_request(request))
            .await
            .map_err(|e| MeetingError::generation(format!("{:#}", e)))
    }
}

impl std::fmt::Debug for OpenAiTextGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiTextGenerator")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
