//! Backend-owned user and organization preferences.

use axum::{extract::State, Json};
use ontology::models::{ActiveOrganization, AiConfig, DelegationMatrix};

use crate::error::ApiError;
use crate::identity::{Caller, Tenant};
use crate::state::AppState;

pub async fn get_active_organization(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ActiveOrganization>, ApiError> {
    Ok(Json(caller.api(&state).get_active_organization().await?))
}

pub async fn set_active_organization(
    State(state): State<AppState>,
    caller: Caller,
    Json(selection): Json<ActiveOrganization>,
) -> Result<Json<ActiveOrganization>, ApiError> {
    if selection.organization_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
        return Err(ApiError::BadRequest("organization_id must not be blank".into()));
    }
    Ok(Json(caller.api(&state).set_active_organization(&selection).await?))
}

pub async fn get_ai_config(tenant: Tenant) -> Result<Json<AiConfig>, ApiError> {
    Ok(Json(tenant.api.get_ai_config().await?))
}

pub async fn put_ai_config(tenant: Tenant, Json(config): Json<AiConfig>) -> Result<Json<AiConfig>, ApiError> {
    if let Some(threshold) = config.confidence_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ApiError::BadRequest("confidence_threshold must be between 0 and 1".into()));
        }
    }
    Ok(Json(tenant.api.put_ai_config(&config).await?))
}

pub async fn get_delegations(tenant: Tenant) -> Result<Json<DelegationMatrix>, ApiError> {
    Ok(Json(tenant.api.get_delegation_matrix().await?))
}

pub async fn put_delegations(
    tenant: Tenant,
    Json(matrix): Json<DelegationMatrix>,
) -> Result<Json<DelegationMatrix>, ApiError> {
    if let Some((agent, _)) = matrix
        .delegations
        .iter()
        .find(|(agent, targets)| targets.iter().any(|t| t == *agent))
    {
        return Err(ApiError::BadRequest(format!("AI agent {agent} cannot delegate to itself")));
    }
    Ok(Json(tenant.api.put_delegation_matrix(&matrix).await?))
}
