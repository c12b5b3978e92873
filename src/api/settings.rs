//! API endpoints for tool settings: the catalog, enabled flags and credentials.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::tools::catalog::{AuthConfig, FieldKind, ToolDescriptor};

use super::routes::AppState;
use super::{error_response, ApiError};

/// Shown instead of a secret value unless the caller asks to reveal it.
pub const MASKED_VALUE: &str = "********";

/// Create the settings API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/providers", get(list_providers))
        .route("/enabled-tools", get(list_enabled_tools))
        .route("/tools/:id/toggle", post(toggle_tool))
        .route(
            "/tools/:id/credentials",
            get(get_credentials).put(save_credentials),
        )
        .route("/credentials", delete(clear_credentials))
}

/// A catalog tool with its current settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolView {
    #[serde(flatten)]
    pub tool: ToolDescriptor,
    pub has_credentials: bool,
}

#[derive(Debug, Serialize)]
pub struct ProviderView {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub tools: Vec<ToolView>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub id: String,
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsQuery {
    /// Return secret fields unmasked.
    #[serde(default)]
    pub reveal: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsResponse {
    pub tool_id: String,
    pub credentials: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveCredentialsRequest {
    pub credentials: HashMap<String, String>,
}

/// GET /api/settings/providers
async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderView>> {
    let enabled = state.settings.enabled_tools().await;
    let mut providers = Vec::new();

    for provider in state.settings.catalog().providers() {
        let mut tools = Vec::with_capacity(provider.tools.len());
        for tool in &provider.tools {
            tools.push(ToolView {
                tool: ToolDescriptor {
                    enabled: enabled.get(&tool.id).copied().unwrap_or(false),
                    ..tool.clone()
                },
                has_credentials: state.settings.has_credentials(&tool.id).await,
            });
        }
        providers.push(ProviderView {
            id: provider.id.clone(),
            name: provider.name.clone(),
            description: provider.description.clone(),
            icon: provider.icon.clone(),
            tools,
        });
    }

    Json(providers)
}

/// GET /api/settings/enabled-tools
async fn list_enabled_tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolDescriptor>> {
    Json(state.settings.list_enabled_tool_configs().await)
}

fn find_tool(state: &AppState, id: &str) -> Result<ToolDescriptor, ApiError> {
    state
        .settings
        .catalog()
        .find_tool(id)
        .cloned()
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, format!("Tool {} not found", id)))
}

/// POST /api/settings/tools/:id/toggle
///
/// Reports the persisted state, which stays unchanged if storage rejected the write.
async fn toggle_tool(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    find_tool(&state, &id)?;
    let enabled = state.settings.toggle_tool(&id).await;
    tracing::info!(tool_id = %id, enabled, "Tool toggled");
    Ok(Json(ToggleResponse { id, enabled }))
}

/// Replace secret values with [`MASKED_VALUE`].
fn mask_secrets(auth: Option<&AuthConfig>, credentials: &mut HashMap<String, String>) {
    let Some(auth) = auth else {
        return;
    };
    for (key, value) in credentials.iter_mut() {
        let is_secret = auth
            .field(key)
            .is_some_and(|f| f.kind == FieldKind::Secret);
        if is_secret && !value.is_empty() {
            *value = MASKED_VALUE.to_string();
        }
    }
}

/// GET /api/settings/tools/:id/credentials
async fn get_credentials(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<CredentialsQuery>,
) -> Result<Json<CredentialsResponse>, ApiError> {
    let tool = find_tool(&state, &id)?;
    let mut credentials = state.settings.get_credentials(&id).await;
    if !query.reveal {
        mask_secrets(tool.auth_config.as_ref(), &mut credentials);
    }

    Ok(Json(CredentialsResponse {
        tool_id: id,
        credentials,
    }))
}

/// Keep only declared fields and check that required ones are filled in.
fn validate_credentials(
    auth: &AuthConfig,
    submitted: HashMap<String, String>,
) -> Result<HashMap<String, String>, String> {
    let credentials: HashMap<String, String> = submitted
        .into_iter()
        .filter(|(key, _)| auth.field(key).is_some())
        .collect();

    for field in auth.fields.iter().filter(|f| f.is_required()) {
        let filled = credentials
            .get(&field.key)
            .is_some_and(|v| !v.trim().is_empty());
        if !filled {
            return Err(format!("{} is required", field.label));
        }
    }

    Ok(credentials)
}

/// PUT /api/settings/tools/:id/credentials
async fn save_credentials(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SaveCredentialsRequest>,
) -> Result<Json<CredentialsResponse>, ApiError> {
    let tool = find_tool(&state, &id)?;
    let auth = match (&tool.auth_config, tool.requires_auth()) {
        (Some(auth), true) => auth,
        _ => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Tool {} does not take credentials", id),
            ))
        }
    };

    let credentials = validate_credentials(auth, req.credentials)
        .map_err(|msg| error_response(StatusCode::BAD_REQUEST, msg))?;

    if !state
        .settings
        .save_credentials(&id, credentials.clone())
        .await
    {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save credentials",
        ));
    }
    tracing::info!(tool_id = %id, fields = credentials.len(), "Saved tool credentials");

    let mut masked = credentials;
    mask_secrets(Some(auth), &mut masked);
    Ok(Json(CredentialsResponse {
        tool_id: id,
        credentials: masked,
    }))
}

/// DELETE /api/settings/credentials
async fn clear_credentials(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    if !state.settings.clear_all_credentials().await {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to clear credentials",
        ));
    }
    tracing::info!("Cleared all tool credentials");
    Ok(StatusCode::NO_CONTENT)
}
