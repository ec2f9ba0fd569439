//! HTTP API tests driven through the full application router.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use gg_domain::config::{Config, ProviderConfig};
use gg_gateway::pipeline::{SUMMARY_SYSTEM_PROMPT, TEXT_SYSTEM_PROMPT};
use gg_gateway::server::build_app;
use gg_gateway::state::AppState;
use gg_providers::google::GoogleClient;
use gg_providers::InferenceClient;

use common::{state_with, test_config, upstream_failure, MockClient, Step};

const BOUNDARY: &str = "gg-test-boundary";

fn app(client: Arc<MockClient>) -> Router {
    build_app(state_with(client, test_config())).unwrap()
}

fn app_without_provider() -> Router {
    build_app(AppState::new(Arc::new(test_config()), None)).unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `(name, filename + content type, value)` fields encoded as multipart.
fn multipart(fields: &[(&str, Option<(&str, &str)>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file {
            Some((filename, content_type)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn working_dir_entries() -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(".")
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn analyze_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn text_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze-text")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/analyze
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn analyze_runs_vision_then_summary() {
    let client = MockClient::scripted(vec![
        Step::reply("Lisinopril 10mg, once daily, refill by March."),
        Step::reply("A blood pressure prescription."),
    ]);
    let body = multipart(&[(
        "file",
        Some(("rx.jpg", "image/jpeg")),
        &[0xffu8, 0xd8, 0xff, 0xe0][..],
    )]);

    let before = working_dir_entries();
    let resp = app(client.clone()).oneshot(analyze_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(working_dir_entries(), before);

    let json = json_body(resp).await;
    assert_eq!(json["analysis"], "Lisinopril 10mg, once daily, refill by March.");
    assert_eq!(json["summary"], "A blood pressure prescription.");
    assert_eq!(json["privacy"]["dataRetention"], "zero");
    assert_eq!(json["privacy"]["storageDuration"], "ephemeral");
    assert_eq!(
        json["privacy"]["compliance"],
        serde_json::json!(["HIPAA-safe", "GDPR-compliant"])
    );

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    let image = calls[0]
        .parts()
        .find_map(|p| match p {
            gg_domain::content::Part::InlineData { mime_type, data } => Some((mime_type, data)),
            _ => None,
        })
        .unwrap();
    assert_eq!(image.0, "image/jpeg");
    assert_eq!(image.1, &vec![0xff, 0xd8, 0xff, 0xe0]);
    assert_eq!(calls[1].system.as_deref(), Some(SUMMARY_SYSTEM_PROMPT));
}

#[tokio::test]
async fn analyze_passes_custom_prompt_and_accepts_return_voice() {
    let client = MockClient::new();
    let body = multipart(&[
        ("file", Some(("bill.png", "image/png")), &b"\x89PNG"[..]),
        ("prompt", None, &b"What is the total due?"[..]),
        ("returnVoice", None, &b"true"[..]),
    ]);

    let resp = app(client.clone()).oneshot(analyze_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert!(json.get("audio").is_none());

    let first_text = client.calls()[0]
        .parts()
        .find_map(|p| p.as_text().map(String::from))
        .unwrap();
    assert_eq!(first_text, "What is the total due?");
}

#[tokio::test]
async fn analyze_without_file_is_400() {
    let client = MockClient::new();
    let body = multipart(&[("prompt", None, &b"anything"[..])]);

    let resp = app(client.clone()).oneshot(analyze_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "No file uploaded");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn analyze_upstream_failure_is_500_with_details() {
    let client = MockClient::scripted(vec![Step::fail(upstream_failure())]);
    let body = multipart(&[("file", Some(("scan.png", "image/png")), &b"\x89PNG"[..])]);

    let resp = app(client.clone()).oneshot(analyze_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(resp).await;
    assert_eq!(json["error"], "Analysis failed");
    assert_eq!(json["details"], "provider mock: HTTP 503 - overloaded");
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn analyze_rejects_oversized_upload() {
    let client = MockClient::new();
    let mut config = test_config();
    config.server.max_upload_bytes = 16;
    let app = build_app(state_with(client.clone(), config)).unwrap();

    let body = multipart(&[("file", Some(("big.png", "image/png")), &[7u8; 64][..])]);
    let resp = app.oneshot(analyze_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn analyze_without_provider_is_503() {
    let body = multipart(&[("file", Some(("a.png", "image/png")), &b"\x89PNG"[..])]);
    let resp = app_without_provider().oneshot(analyze_request(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/analyze-text
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn analyze_text_single_call() {
    let client = MockClient::scripted(vec![Step::reply("Your deductible is $500.")]);
    let resp = app(client.clone())
        .oneshot(text_request(serde_json::json!({
            "text": "Plan B: deductible $500, copay $20",
            "prompt": "What is my deductible?"
        })))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["analysis"], "Your deductible is $500.");
    assert_eq!(
        json["privacy"],
        serde_json::json!({"dataRetention": "zero", "storageDuration": "ephemeral"})
    );

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].system.as_deref(), Some(TEXT_SYSTEM_PROMPT));
    assert_eq!(
        calls[0].messages[0].joined_text(),
        "What is my deductible?:\n\nPlan B: deductible $500, copay $20"
    );
}

#[tokio::test]
async fn analyze_text_accepts_return_voice_in_any_form() {
    for flag in [
        serde_json::json!("true"),
        serde_json::json!("false"),
        serde_json::json!(true),
        serde_json::json!(1),
        Value::Null,
    ] {
        let client = MockClient::new();
        let resp = app(client.clone())
            .oneshot(text_request(serde_json::json!({"text": "hello", "returnVoice": flag})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "returnVoice = {flag}");
        assert_eq!(json_body(resp).await["analysis"], "reply 1");
        assert_eq!(client.calls().len(), 1);
    }
}

#[tokio::test]
async fn upstream_transport_failure_does_not_expose_api_key() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = ProviderConfig {
        base_url: format!("http://{addr}"),
        ..Default::default()
    };
    let client = GoogleClient::with_key(
        &provider,
        "SUPERSECRETKEY".into(),
        "gemini-2.5-flash",
        Duration::from_secs(5),
    )
    .unwrap();
    let state = AppState::new(
        Arc::new(test_config()),
        Some(Arc::new(client) as Arc<dyn InferenceClient>),
    );

    let resp = build_app(state)
        .unwrap()
        .oneshot(text_request(serde_json::json!({"text": "hello"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(resp).await;
    assert_eq!(json["error"], "Analysis failed");
    assert!(!json.to_string().contains("SUPERSECRETKEY"), "leaked: {json}");
}

#[tokio::test]
async fn analyze_text_missing_or_empty_text_is_400() {
    for body in [serde_json::json!({}), serde_json::json!({"text": ""})] {
        let client = MockClient::new();
        let resp = app(client.clone()).oneshot(text_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "No text provided");
        assert!(client.calls().is_empty());
    }
}

#[tokio::test]
async fn analyze_text_malformed_json_is_400() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/analyze-text")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"text\": "))
        .unwrap();
    let resp = app(MockClient::new()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/health, /api/models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn health_reports_service_without_calling_model() {
    let client = MockClient::new();
    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let resp = app(client.clone()).oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = json_body(resp).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "GeminiGuard");
    assert_eq!(json["privacy"], "zero-retention");
    assert_eq!(
        json["capabilities"],
        serde_json::json!(["vision", "text", "live", "audio-pending"])
    );
    assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn health_works_without_provider() {
    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let resp = app_without_provider().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn models_lists_configured_models() {
    let req = Request::builder().uri("/api/models").body(Body::empty()).unwrap();
    let resp = app(MockClient::new()).oneshot(req).await.unwrap();
    let json = json_body(resp).await;

    let defaults = Config::default();
    assert_eq!(json["vision"], defaults.llm.vision_model.as_str());
    assert_eq!(json["chat"], defaults.llm.chat_model.as_str());
    assert_eq!(json["audio"], "TTS pending");
    assert_eq!(json["provider"], "Google Gemini");
    assert_eq!(json["ready"], true);
    assert_eq!(json["privacy"], "zero-retention");
}
