mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chatkit_server::api;
use tower::util::ServiceExt; // for `oneshot`

use common::{body_json, empty_request, FakeTranscriber, ScriptedLlm, TestState};

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let state = TestState::new(Arc::new(ScriptedLlm::default())).build();
    let app = api::build_router(state);

    let response = app
        .oneshot(empty_request("GET", "/api/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["transcription_enabled"], false);
}

#[tokio::test]
async fn health_reports_transcription() {
    let state = TestState::new(Arc::new(ScriptedLlm::default()))
        .transcriber(Arc::new(FakeTranscriber::ok("")))
        .build();

    let response = api::build_router(state)
        .oneshot(empty_request("GET", "/api/health"))
        .await
        .unwrap();

    assert_eq!(body_json(response).await["transcription_enabled"], true);
}

#[tokio::test]
async fn production_state_starts_without_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = chatkit_server::Config {
        data_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let state = api::AppState::from_config(config).await.unwrap();
    assert!(state.transcriber.is_none());
    assert_eq!(state.tools.len(), 10);
    assert_eq!(state.settings.catalog().tools().count(), 8);
}
