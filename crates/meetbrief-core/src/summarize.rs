// Meeting summarization
//
// Two stages: `try_generate` asks the configured TextGenerator and may fail,
// `summarize` falls back to a deterministic template and never fails.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MeetingError, Result};
use crate::traits::TextGenerator;

pub const DEFAULT_SUMMARY_MODEL: &str = "gpt-3.5-turbo";
pub const SUMMARY_MAX_TOKENS: u32 = 200;
pub const SUMMARY_TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str =
    "You are a professional meeting assistant that creates concise, helpful meeting summaries.";

/// Longest description excerpt quoted by the fallback summary, in characters
const EXCERPT_CHARS: usize = 100;

/// One text-generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Summarization service
#[derive(Clone)]
pub struct SummarizationService {
    generator: Option<Arc<dyn TextGenerator>>,
    model: String,
}

impl SummarizationService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
            model: DEFAULT_SUMMARY_MODEL.to_string(),
        }
    }

    /// Service without a text generator; every summary is the fallback
    pub fn fallback_only() -> Self {
        Self {
            generator: None,
            model: DEFAULT_SUMMARY_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn is_generation_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub fn build_request(
        &self,
        title: &str,
        description: Option<&str>,
        attendees: &[String],
    ) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(title, description, attendees),
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: SUMMARY_TEMPERATURE,
        }
    }

    /// Ask the text generator for a summary.
    ///
    /// Fails when no generator is configured, the call fails, or the answer is blank.
    pub async fn try_generate(
        &self,
        title: &str,
        description: Option<&str>,
        attendees: &[String],
    ) -> Result<String> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| MeetingError::config("No text generator configured"))?;

        let request = self.build_request(title, description, attendees);
        let text = generator.generate(&request).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(MeetingError::generation("Empty summary generated"));
        }
        Ok(text.to_string())
    }

    /// Summary for a meeting; the fallback template when generation is unavailable
    pub async fn summarize(
        &self,
        title: &str,
        description: Option<&str>,
        attendees: &[String],
    ) -> String {
        match self.try_generate(title, description, attendees).await {
            Ok(summary) => summary,
            Err(e) => {
                if self.is_generation_enabled() {
                    tracing::warn!(title, "Summary generation failed, using fallback: {}", e);
                } else {
                    tracing::debug!(title, "Summary generation disabled, using fallback");
                }
                fallback_summary(title, description, attendees)
            }
        }
    }
}

/// User prompt sent to the text generator
pub fn build_prompt(title: &str, description: Option<&str>, attendees: &[String]) -> String {
    let mut lines = vec![
        "Generate a concise and professional summary for the following meeting:".to_string(),
        String::new(),
        format!("Title: {}", title),
    ];
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        lines.push(format!("Description: {}", description));
    }
    if !attendees.is_empty() {
        lines.push(format!("Attendees: {}", attendees.join(", ")));
    }
    lines.push(String::new());
    lines.push("Please provide:".to_string());
    lines.push("1. A brief overview of the meeting topic".to_string());
    lines.push("2. Key discussion points (if available from description)".to_string());
    lines.push("3. Potential objectives or outcomes".to_string());
    lines.push(String::new());
    lines.push("Keep the summary concise and professional, around 2-3 sentences.".to_string());
    lines.join("\n")
}

/// Deterministic summary used when generation is unavailable
pub fn fallback_summary(title: &str, description: Option<&str>, attendees: &[String]) -> String {
    let mut summary = format!("Meeting \"{}\" ", title);

    match attendees.len() {
        0 => {}
        1 => summary.push_str("with 1 participant. "),
        n => summary.push_str(&format!("with {} participants. ", n)),
    }

    match description.filter(|d| !d.is_empty()) {
        Some(description) => {
            summary.push_str("Discussion focused on: ");
            if description.chars().count() > EXCERPT_CHARS {
                summary.extend(description.chars().take(EXCERPT_CHARS));
                summary.push_str("...");
            } else {
                summary.push_str(description);
            }
        }
        None => summary
            .push_str("Discussion topics and objectives to be determined based on meeting agenda."),
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ScriptedTextGenerator;

    fn people(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{}@example.com", i)).collect()
    }

    #[test]
    fn test_fallback_pluralization() {
        assert_eq!(
            fallback_summary("Sync", Some("Roadmap"), &people(1)),
            "Meeting \"Sync\" with 1 participant. Discussion focused on: Roadmap"
        );
        assert_eq!(
            fallback_summary("Sync", Some("Roadmap"), &people(2)),
            "Meeting \"Sync\" with 2 participants. Discussion focused on: Roadmap"
        );
    }

    #[test]
    fn test_fallback_without_description_or_attendees() {
        assert_eq!(
            fallback_summary("Standup", None, &[]),
            "Meeting \"Standup\" Discussion topics and objectives to be determined based on meeting agenda."
        );
        assert_eq!(
            fallback_summary("Standup", Some(""), &[]),
            fallback_summary("Standup", None, &[])
        );
    }

    #[test]
    fn test_fallback_truncates_long_description() {
        let description = "a".repeat(150);
        let summary = fallback_summary("Retro", Some(&description), &people(2));
        let expected = format!(
            "Meeting \"Retro\" with 2 participants. Discussion focused on: {}...",
            "a".repeat(100)
        );
        assert_eq!(summary, expected);
    }

    #[test]
    fn test_fallback_keeps_exactly_100_chars() {
        let description = "b".repeat(100);
        let summary = fallback_summary("Retro", Some(&description), &[]);
        assert!(summary.ends_with(&description));
        assert!(!summary.ends_with("..."));
    }

    #[test]
    fn test_fallback_truncates_by_chars() {
        let description = "é".repeat(120);
        let summary = fallback_summary("Café", Some(&description), &[]);
        assert!(summary.ends_with(&format!("{}...", "é".repeat(100))));
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("Retro", Some("What went well"), &people(2));
        assert!(prompt.contains("Title: Retro"));
        assert!(prompt.contains("Description: What went well"));
        assert!(prompt.contains("Attendees: p0@example.com, p1@example.com"));
        assert!(prompt.ends_with("around 2-3 sentences."));

        let bare = build_prompt("Standup", None, &[]);
        assert!(!bare.contains("Description:"));
        assert!(!bare.contains("Attendees:"));
    }

    #[tokio::test]
    async fn test_summarize_uses_generator() {
        let generator = Arc::new(ScriptedTextGenerator::replying("  A focused retro.  "));
        let service = SummarizationService::new(generator.clone()).with_model("gpt-4o-mini");

        let summary = service.summarize("Retro", None, &people(3)).await;
        assert_eq!(summary, "A focused retro.");

        let requests = generator.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].max_tokens, 200);
        assert_eq!(requests[0].temperature, 0.7);
        assert_eq!(requests[0].system_prompt, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_summarize_falls_back_on_failure() {
        let service =
            SummarizationService::new(Arc::new(ScriptedTextGenerator::failing("rate limited")));
        let summary = service.summarize("Retro", None, &people(1)).await;
        assert_eq!(summary, fallback_summary("Retro", None, &people(1)));
    }

    #[tokio::test]
    async fn test_summarize_falls_back_on_blank_answer() {
        let service = SummarizationService::new(Arc::new(ScriptedTextGenerator::replying("   ")));
        assert!(service.try_generate("Retro", None, &[]).await.is_err());
        let summary = service.summarize("Retro", None, &[]).await;
        assert_eq!(summary, fallback_summary("Retro", None, &[]));
    }

    #[tokio::test]
    async fn test_fallback_only_service() {
        let service = SummarizationService::fallback_only();
        assert!(!service.is_generation_enabled());
        assert!(matches!(
            service.try_generate("Retro", None, &[]).await,
            Err(MeetingError::Configuration(_))
        ));
        assert_eq!(
            service.summarize("Retro", None, &[]).await,
            fallback_summary("Retro", None, &[])
        );
    }
}
