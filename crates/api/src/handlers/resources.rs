//! Generic CRUD proxy for the backend's entity collections.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use ontology::models::ResourceKind;
use ontology::OntologyApi;
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Path(kind): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let api = scoped_api(&state, &caller, kind)?;
    Ok(Json(api.list_entities(kind).await?))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind = parse_kind(&kind)?;
    require_object(&body)?;
    let api = scoped_api(&state, &caller, kind)?;
    let created = api.create_entity(kind, body).await?;
    info!(%kind, "entity created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&kind)?;
    require_object(&body)?;
    let api = scoped_api(&state, &caller, kind)?;
    Ok(Json(api.update_entity(kind, &id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    let api = scoped_api(&state, &caller, kind)?;
    api.delete_entity(kind, &id).await?;
    info!(%kind, %id, "entity deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_kind(raw: &str) -> Result<ResourceKind, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

fn require_object(body: &Value) -> Result<(), ApiError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(ApiError::BadRequest("request body must be a JSON object".into()))
    }
}

/// Organizations are global; every other collection needs a tenant.
fn scoped_api(
    state: &AppState,
    caller: &Caller,
    kind: ResourceKind,
) -> Result<Arc<dyn OntologyApi>, ApiError> {
    if kind.is_tenant_scoped() && caller.scope.tenant_id.is_none() {
        return Err(ApiError::MissingTenant);
    }
    Ok(caller.api(state))
}
