//! API endpoint integration tests

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use parlor_gateway::Voice;
use parlor_gateway::api::{ApiServer, ApiState};
use tower::ServiceExt;

mod common;
use common::{FakeChat, FakeSpeech, test_router};

fn post_tts(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/tts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn tts_returns_mp3_with_content_length() {
    let app = test_router(Some(FakeSpeech::ok()), None);

    let response = app
        .oneshot(post_tts(
            &serde_json::json!({"text": "Hello", "voice": "nova"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");

    let declared: usize = response.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(!body.is_empty());
    assert_eq!(declared, body.len());
}

#[tokio::test]
async fn tts_defaults_to_nova_voice() {
    let speech = FakeSpeech::ok();
    let app = test_router(Some(speech.clone()), None);

    let response = app
        .oneshot(post_tts(&serde_json::json!({"text": "Hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(speech.calls(), vec![("Hi".to_string(), Voice::Nova)]);
}

#[tokio::test]
async fn tts_honors_requested_voice() {
    let speech = FakeSpeech::ok();
    let app = test_router(Some(speech.clone()), None);

    let response = app
        .oneshot(post_tts(
            &serde_json::json!({"text": "Hi", "voice": "shimmer"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(speech.calls()[0].1, Voice::Shimmer);
}

#[tokio::test]
async fn tts_rejects_missing_text() {
    let app = test_router(Some(FakeSpeech::ok()), None);

    let response = app.oneshot(post_tts(&serde_json::json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Text is required and must be a string");
}

#[tokio::test]
async fn tts_rejects_empty_text() {
    let app = test_router(Some(FakeSpeech::ok()), None);

    let response = app
        .oneshot(post_tts(&serde_json::json!({"text": ""})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Text is required and must be a string");
}

#[tokio::test]
async fn tts_rejects_non_string_text() {
    let app = test_router(Some(FakeSpeech::ok()), None);

    let response = app
        .oneshot(post_tts(&serde_json::json!({"text": 42})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Text is required and must be a string");
}

#[tokio::test]
async fn tts_enforces_length_limit() {
    let app = test_router(Some(FakeSpeech::ok()), None);

    let at_limit = "x".repeat(4096);
    let response = app
        .clone()
        .oneshot(post_tts(&serde_json::json!({"text": at_limit})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let over_limit = "x".repeat(4097);
    let response = app
        .oneshot(post_tts(&serde_json::json!({"text": over_limit})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Text must be 4096 characters or less");
}

#[tokio::test]
async fn tts_rejects_unknown_voice() {
    let speech = FakeSpeech::ok();
    let app = test_router(Some(speech.clone()), None);

    let response = app
        .oneshot(post_tts(
            &serde_json::json!({"text": "Hi", "voice": "robotic"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert!(speech.calls().is_empty());
}

#[tokio::test]
async fn tts_surfaces_provider_failure_as_500() {
    let app = test_router(Some(FakeSpeech::failing()), None);

    let response = app
        .oneshot(post_tts(&serde_json::json!({"text": "Hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_openai_returns_greeting() {
    let app = test_router(None, Some(FakeChat::ok()));

    let response = app.oneshot(get("/api/test-openai")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["result"], "Hello from the Mafia game backend!");
}

#[tokio::test]
async fn test_openai_surfaces_provider_failure_as_500() {
    let app = test_router(None, Some(FakeChat::failing()));

    let response = app.oneshot(get("/api/test-openai")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_openai_unconfigured_is_500() {
    let app = test_router(None, None);

    let response = app.oneshot(get("/api/test-openai")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "OpenAI request failed");
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = test_router(None, None);

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn capabilities_follow_configuration() {
    let app = test_router(Some(FakeSpeech::ok()), None);
    let response = app.oneshot(get("/api/capabilities")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["tts_available"], true);
    assert_eq!(body["stt_available"], true);

    let bare_state = Arc::new(ApiState {
        speech: None,
        chat: None,
        stt_available: false,
        default_voice: Voice::Nova,
    });
    let app = ApiServer::router(bare_state);
    let response = app.oneshot(get("/api/capabilities")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["tts_available"], false);
    assert_eq!(body["stt_available"], false);
}
