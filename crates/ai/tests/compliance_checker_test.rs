//! Contract tests for `HttpComplianceChecker` against a mocked completion endpoint.

use gpsrhub_ai::{
    AiError, Block, CheckerConfig, ComplianceCheckRequest, ComplianceChecker, HttpComplianceChecker,
};
use gpsrhub_core::FileUpload;
use wiremock::matchers::{body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn checker(mock_server: &MockServer) -> HttpComplianceChecker {
    let endpoint = format!("{}/api/compliance-check", mock_server.uri())
        .parse()
        .unwrap();
    let mut config = CheckerConfig::new(endpoint);
    config.timeout_secs = 5;
    config.max_image_bytes = 1024;
    HttpComplianceChecker::new(config).unwrap()
}

#[tokio::test]
async fn prompt_without_image_returns_renderable_markdown() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/compliance-check"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("Is my toy GPSR compliant?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "# Toy compliance\n\n- Check **EN 71-1**\n- See [GPSR](https://eur-lex.europa.eu/eli/reg/2023/988/oj)\n\n```\nCE\n```"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = checker(&mock_server)
        .check(&ComplianceCheckRequest::new("Is my toy GPSR compliant?"))
        .await
        .unwrap();

    assert!(result.content.starts_with("# Toy compliance"));
    let blocks = result.blocks();
    assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
    assert!(matches!(&blocks[1], Block::List { ordered: None, items } if items.len() == 2));
    assert!(matches!(&blocks[2], Block::CodeBlock { code, .. } if code == "CE"));
}

#[tokio::test]
async fn image_is_sent_as_a_file_part() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/compliance-check"))
        .and(body_string_contains("name=\"image\""))
        .and(body_string_contains("filename=\"rattle.png\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "Looks like a rattle."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = ComplianceCheckRequest::new("What markings does this need?")
        .with_image(FileUpload::new("rattle.png", "image/png", b"fake png bytes".to_vec()));
    let result = checker(&mock_server).check(&request).await.unwrap();
    assert_eq!(result.content, "Looks like a rattle.");
}

#[tokio::test]
async fn invalid_request_never_reaches_the_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = checker(&mock_server)
        .check(&ComplianceCheckRequest::new("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::InvalidInput(_)));

    let oversized = ComplianceCheckRequest::new("Is this OK?")
        .with_image(FileUpload::new("big.jpg", "image/jpeg", vec![0; 4096]));
    let err = checker(&mock_server).check(&oversized).await.unwrap_err();
    assert!(matches!(err, AiError::InvalidInput(_)));
}

#[tokio::test]
async fn server_error_is_reported_with_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/compliance-check"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream timeout"))
        .mount(&mock_server)
        .await;

    let err = checker(&mock_server)
        .check(&ComplianceCheckRequest::new("Is my toy GPSR compliant?"))
        .await
        .unwrap_err();
    match err {
        AiError::Api { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "upstream timeout");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn response_without_content_is_invalid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/compliance-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "hi" })))
        .mount(&mock_server)
        .await;

    let err = checker(&mock_server)
        .check(&ComplianceCheckRequest::new("Hello?"))
        .await
        .unwrap_err();
    assert!(matches!(err, AiError::InvalidResponse(_)));
    assert_eq!(err.user_message(), "The compliance checker is unavailable right now.");
}
