use super::*;
use webinfer_protocols::ClassificationContext;

fn request() -> ClassificationRequest {
    ClassificationRequest {
        section_id: "s-footer".to_string(),
        content: "tag: footer\ntext: (c) 2024 Example Inc. Privacy Terms".to_string(),
        context: ClassificationContext::default(),
    }
}

#[test]
fn test_build_request() {
    let classifier = AnthropicClassifier::new("key".to_string(), None).with_sampling(256, 0.0);
    let api_request = classifier.build_request(&request());

    assert_eq!(api_request.model, DEFAULT_MODEL);
    assert_eq!(api_request.max_tokens, 256);
    assert_eq!(api_request.system.as_deref(), Some(SYSTEM_PROMPT));
    assert_eq!(api_request.messages.len(), 1);
    assert!(api_request.messages[0].content.contains("tag: footer"));
}

#[test]
fn test_response_text_skips_other_blocks() {
    let response: ApiResponse = serde_json::from_value(serde_json::json!({
        "content": [
            { "type": "thinking", "thinking": "hmm" },
            { "type": "text", "text": "{\"label\": \"footer\"," },
            { "type": "text", "text": "\"confidence\": 0.8}" }
        ],
        "stop_reason": "end_turn"
    }))
    .unwrap();
    assert!(response.text().starts_with("{\"label\""));
    assert_eq!(parse_classification(&response.text()).unwrap().label, "footer");
}

mod http_tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    #[tokio::test]
    async fn test_classify_success() {
        let mock_server = MockServer::start().await;

        let body = serde_json::json!({
            "id": "msg_1",
            "model": "claude-3-5-haiku-latest",
            "content": [{
                "type": "text",
                "text": "{\"label\": \"footer\", \"confidence\": 0.82, \"rationale\": \"Copyright and legal links\"}"
            }],
            "stop_reason": "end_turn"
        })
        .to_string();

        Mock::given(matchers::method("POST"))
            .and(matchers::header("x-api-key", "test-key"))
            .and(matchers::header("anthropic-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let classifier =
            AnthropicClassifier::with_url("test-key".to_string(), None, mock_server.uri());
        let result = classifier.classify(&request()).await.unwrap();
        assert_eq!(result.label, "footer");
        assert_eq!(result.confidence, 0.82);
    }

    #[tokio::test]
    async fn test_classify_overloaded() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("Overloaded"))
            .mount(&mock_server)
            .await;

        let classifier =
            AnthropicClassifier::with_url("test-key".to_string(), None, mock_server.uri());
        let err = classifier.classify(&request()).await.unwrap_err();
        assert!(matches!(err, ClassificationError::ProviderUnavailable(_)));
        assert!(err.to_string().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_classify_bad_request() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error": {"message": "max_tokens too large"}}"#),
            )
            .mount(&mock_server)
            .await;

        let classifier =
            AnthropicClassifier::with_url("test-key".to_string(), None, mock_server.uri());
        let err = classifier.classify(&request()).await.unwrap_err();
        assert!(matches!(err, ClassificationError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_classify_timeout_status() {
        let mock_server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(504))
            .mount(&mock_server)
            .await;

        let classifier =
            AnthropicClassifier::with_url("test-key".to_string(), None, mock_server.uri());
        let err = classifier.classify(&request()).await.unwrap_err();
        assert!(matches!(err, ClassificationError::Timeout(_)));
    }
}
