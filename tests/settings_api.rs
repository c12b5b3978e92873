mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chatkit_server::api::{self, settings::MASKED_VALUE};
use chatkit_server::settings::MemoryStorage;
use chatkit_server::tools::catalog::{
    AuthConfig, AuthField, AuthType, Catalog, FieldKind, ToolDescriptor, ToolProvider,
};
use serde_json::json;
use tower::util::ServiceExt;

use common::{body_json, empty_request, json_request, ScriptedLlm, TestState};

fn github_catalog() -> Catalog {
    let auth = AuthConfig {
        auth_type: AuthType::ApiKey,
        fields: vec![
            AuthField {
                key: "username".to_string(),
                label: "Username".to_string(),
                kind: FieldKind::Text,
                placeholder: None,
                required: Some(true),
                description: None,
            },
            AuthField {
                key: "token".to_string(),
                label: "Access Token".to_string(),
                kind: FieldKind::Secret,
                placeholder: Some("ghp_...".to_string()),
                required: Some(true),
                description: Some("Personal access token".to_string()),
            },
        ],
    };

    Catalog::new(vec![ToolProvider {
        id: "github".to_string(),
        name: "GitHub".to_string(),
        description: "Repository tools".to_string(),
        icon: None,
        tools: vec![
            ToolDescriptor::open("github-search", "Search", "Search repositories"),
            ToolDescriptor::open("github-issues", "Issues", "Manage issues").with_auth(auth),
        ],
    }])
    .unwrap()
}

fn app_with(catalog: Catalog) -> axum::Router {
    api::build_router(
        TestState::new(Arc::new(ScriptedLlm::default()))
            .catalog(catalog)
            .build(),
    )
}

#[tokio::test]
async fn providers_list_the_builtin_catalog() {
    let app = app_with(Catalog::builtin().unwrap());

    let response = app
        .oneshot(empty_request("GET", "/api/settings/providers"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let providers = body_json(response).await;
    let tools = providers[0]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 8);
    assert!(tools.iter().all(|t| t["enabled"] == false));
    assert!(tools.iter().any(|t| t["id"] == "apple-messages"));
    assert_eq!(tools[0]["hasCredentials"], false);
}

#[tokio::test]
async fn toggle_flips_and_lists_enabled_tools() {
    let app = app_with(Catalog::builtin().unwrap());

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/api/settings/tools/apple-notes/toggle"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"id": "apple-notes", "enabled": true})
    );

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/api/settings/enabled-tools"))
        .await
        .unwrap();
    let enabled = body_json(response).await;
    assert_eq!(enabled.as_array().unwrap().len(), 1);
    assert_eq!(enabled[0]["id"], "apple-notes");
    assert_eq!(enabled[0]["enabled"], true);

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/api/settings/tools/apple-notes/toggle"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["enabled"], false);

    let response = app
        .oneshot(empty_request("GET", "/api/settings/enabled-tools"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn toggle_unknown_tool_is_not_found() {
    let app = app_with(Catalog::builtin().unwrap());

    let response = app
        .oneshot(empty_request("POST", "/api/settings/tools/nonexistent-id/toggle"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "Tool nonexistent-id not found"
    );
}

#[tokio::test]
async fn credentials_are_saved_masked_and_revealed() {
    let app = app_with(github_catalog());
    let uri = "/api/settings/tools/github-issues/credentials";

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            uri,
            json!({"credentials": {"username": "octocat", "token": "ghp_secret", "extra": "dropped"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let saved = body_json(response).await;
    assert_eq!(saved["toolId"], "github-issues");
    assert_eq!(
        saved["credentials"],
        json!({"username": "octocat", "token": MASKED_VALUE})
    );

    let response = app
        .clone()
        .oneshot(empty_request("GET", uri))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["credentials"]["token"], MASKED_VALUE);

    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("{}?reveal=true", uri)))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await["credentials"],
        json!({"username": "octocat", "token": "ghp_secret"})
    );

    let response = app
        .oneshot(empty_request("GET", "/api/settings/providers"))
        .await
        .unwrap();
    let providers = body_json(response).await;
    let issues = providers[0]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == "github-issues")
        .unwrap()
        .clone();
    assert_eq!(issues["hasCredentials"], true);
    assert_eq!(issues["requiresAuth"], true);
}

#[tokio::test]
async fn saving_credentials_replaces_previous_entry() {
    let app = app_with(github_catalog());
    let uri = "/api/settings/tools/github-issues/credentials";

    for token in ["first", "second"] {
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                uri,
                json!({"credentials": {"username": "octocat", "token": token}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(empty_request("GET", &format!("{}?reveal=true", uri)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["credentials"]["token"], "second");
}

#[tokio::test]
async fn invalid_credentials_are_rejected() {
    let app = app_with(github_catalog());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/settings/tools/github-issues/credentials",
            json!({"credentials": {"username": "octocat"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Access Token is required");

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/settings/tools/github-search/credentials",
            json!({"credentials": {"token": "x"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn clearing_credentials_removes_every_tool() {
    let app = app_with(github_catalog());
    let uri = "/api/settings/tools/github-issues/credentials";

    app.clone()
        .oneshot(json_request(
            "PUT",
            uri,
            json!({"credentials": {"username": "octocat", "token": "t"}}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/api/settings/credentials"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("GET", uri))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["credentials"], json!({}));
}

#[tokio::test]
async fn rejected_writes_are_reported_and_not_applied() {
    let storage = Arc::new(MemoryStorage::new());
    let app = api::build_router(
        TestState::new(Arc::new(ScriptedLlm::default()))
            .catalog(github_catalog())
            .storage(storage.clone())
            .build(),
    );
    let uri = "/api/settings/tools/github-issues/credentials";
    storage.fail_writes(true);

    let response = app
        .clone()
        .oneshot(empty_request("POST", "/api/settings/tools/github-search/toggle"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["enabled"], false);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/api/settings/enabled-tools"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            uri,
            json!({"credentials": {"username": "octocat", "token": "t"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Failed to save credentials");

    let response = app
        .clone()
        .oneshot(empty_request("GET", uri))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["credentials"], json!({}));

    let response = app
        .oneshot(empty_request("DELETE", "/api/settings/credentials"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
