// Unit tests for the OpenAI text generator

#[cfg(test)]
mod driver_tests {
    use crate::OpenAiTextGenerator;

    #[test]
    fn test_generator_with_api_key() {
        let generator = OpenAiTextGenerator::new("test-key");
        assert_eq!(generator.api_url(), crate::OPENAI_API_URL);
    }

    #[test]
    fn test_generator_with_base_url() {
        let generator =
            OpenAiTextGenerator::with_base_url("test-key", "https://custom.api.com/v1/completions");
        assert_eq!(generator.api_url(), "https://custom.api.com/v1/completions");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let generator = OpenAiTextGenerator::new("sk-secret-value");
        let debug = format!("{:?}", generator);
        assert!(debug.contains("OpenAiTextGenerator"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret-value"));
    }
}

#[cfg(test)]
mod generation_tests {
    use crate::{OpenAiTextGenerator, TextGenerator};
    use meetbrief_core::error::MeetingError;
    use meetbrief_core::summarize::SummarizationService;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator_for(server: &MockServer) -> OpenAiTextGenerator {
        OpenAiTextGenerator::with_base_url(
            "test-key",
            format!("{}/v1/chat/completions", server.uri()),
        )
    }

    #[tokio::test]
    async fn test_generate_summary() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 200,
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "gpt-3.5-turbo",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": "The team reviewed Q3 goals." },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 80, "completion_tokens": 8, "total_tokens": 88 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = SummarizationService::new(Arc::new(generator_for(&server)));
        let summary = service
            .try_generate("Q3 review", Some("Goals"), &["a@example.com".to_string()])
            .await
            .unwrap();

        assert_eq!(summary, "The team reviewed Q3 goals.");
    }

    #[tokio::test]
    async fn test_generate_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "Rate limit reached", "type": "requests" }
            })))
            .mount(&server)
            .await;

        let generator = generator_for(&server);
        let service = SummarizationService::fallback_only();
        let request = service.build_request("Retro", None, &[]);
        let err = generator.generate(&request).await.unwrap_err();

        match err {
            MeetingError::Generation(msg) => assert!(msg.contains("429")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_no_choices() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-3.5-turbo",
                "choices": []
            })))
            .mount(&server)
            .await;

        let generator = generator_for(&server);
        let request = SummarizationService::fallback_only().build_request("Retro", None, &[]);
        assert!(generator.generate(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_summarize_falls_back_when_api_fails() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = SummarizationService::new(Arc::new(generator_for(&server)));
        let summary = service.summarize("Retro", None, &[]).await;
        assert_eq!(
            summary,
            meetbrief_core::fallback_summary("Retro", None, &[])
        );
    }
}
