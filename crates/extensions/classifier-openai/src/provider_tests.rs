use super::*;
use webinfer_protocols::ClassificationContext;

fn request() -> ClassificationRequest {
    ClassificationRequest {
        section_id: "abc123".to_string(),
        content: "tag: nav\nlinks: 5\ntext: Home About Contact".to_string(),
        context: ClassificationContext {
            site_key: "example.com".to_string(),
            url: Some("https://example.com/".to_string()),
            ..Default::default()
        },
    }
}

#[test]
fn test_classifier_defaults() {
    let classifier = OpenAIClassifier::new("key".to_string(), None);
    assert_eq!(classifier.id(), "openai");
    assert_eq!(classifier.model(), "gpt-4o-mini");
    assert_eq!(classifier.api_url, DEFAULT_API_URL);
}

#[test]
fn test_classifier_groq_id() {
    let classifier = OpenAIClassifier::with_url(
        "key".to_string(),
        Some("llama-3.1-8b-instant".to_string()),
        GROQ_API_URL.to_string(),
    )
    .with_id("groq");
    assert_eq!(classifier.id(), "groq");
    assert_eq!(classifier.model(), "llama-3.1-8b-instant");
}

#[test]
fn test_build_request() {
    let classifier =
        OpenAIClassifier::new("key".to_string(), Some("gpt-4o".to_string())).with_sampling(200, 0.1);
    let api_request = classifier.build_request(&request());

    assert_eq!(api_request.model, "gpt-4o");
    assert_eq!(api_request.messages.len(), 2);
    assert_eq!(api_request.messages[0].role, "system");
    assert!(api_request.messages[1].content.contains("tag: nav"));
    assert_eq!(api_request.max_tokens, Some(200));

    let json = serde_json::to_value(&api_request).unwrap();
    assert_eq!(json["response_format"]["type"], "json_object");
}

mod http_tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    fn completion(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
        .to_string()
    }

    async fn classifier_for(server: &MockServer) -> OpenAIClassifier {
        OpenAIClassifier::with_url("test-key".to_string(), None, server.uri())
    }

    #[tokio::test]
    async fn test_classify_success() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/"))
            .and(matchers::header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(completion(
                r#"{"label": "Navigation", "confidence": 0.91, "rationale": "Row of site links"}"#,
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let classifier = classifier_for(&mock_server).await;
        let result = classifier.classify(&request()).await.unwrap();
        assert_eq!(result.label, "Navigation");
        assert_eq!(result.confidence, 0.91);
        assert_eq!(result.rationale, "Row of site links");
    }

    #[tokio::test]
    async fn test_classify_malformed_content() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(completion("It is a menu, I think.")),
            )
            .mount(&mock_server)
            .await;

        let classifier = classifier_for(&mock_server).await;
        let err = classifier.classify(&request()).await.unwrap_err();
        assert!(matches!(err, ClassificationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_classify_no_choices() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"id": "x", "choices": []}"#),
            )
            .mount(&mock_server)
            .await;

        let classifier = classifier_for(&mock_server).await;
        let err = classifier.classify(&request()).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn test_classify_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "7")
                    .set_body_string(r#"{"error": {"message": "Rate limit exceeded"}}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let classifier = classifier_for(&mock_server).await;
        let err = classifier.classify(&request()).await.unwrap_err();
        match err {
            ClassificationError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("Expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_classify_auth_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"error": {"message": "Invalid API key"}}"#),
            )
            .mount(&mock_server)
            .await;

        let classifier = classifier_for(&mock_server).await;
        let err = classifier.classify(&request()).await.unwrap_err();
        assert!(!err.is_retryable());
        match err {
            ClassificationError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("Invalid API key"));
            }
            other => panic!("Expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_classify_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&mock_server)
            .await;

        let classifier = classifier_for(&mock_server).await;
        let err = classifier.classify(&request()).await.unwrap_err();
        assert!(matches!(err, ClassificationError::ProviderUnavailable(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_classify_unreachable() {
        let classifier = OpenAIClassifier::with_url(
            "test-key".to_string(),
            None,
            "http://127.0.0.1:1/v1/chat/completions".to_string(),
        );
        let err = classifier.classify(&request()).await.unwrap_err();
        assert!(matches!(err, ClassificationError::ProviderUnavailable(_)));
    }
}
