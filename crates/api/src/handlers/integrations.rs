//! Integration enable/disable with the routing-impact confirmation step.

use axum::{body::Bytes, extract::Path, Json};
use engine::integrations::{confirm_disable, enable as enable_integration, request_disable, DisableOutcome};
use ontology::models::{Integration, RoutingImpact};
use serde::Deserialize;

use crate::error::ApiError;
use crate::identity::Tenant;

#[derive(Debug, Default, Deserialize)]
pub struct DisableRequest {
    /// Set once the user has seen the affected-rule count.
    #[serde(default)]
    pub confirm: bool,
}

pub async fn routing_impact(
    tenant: Tenant,
    Path(id): Path<String>,
) -> Result<Json<RoutingImpact>, ApiError> {
    Ok(Json(tenant.api.routing_impact(&id).await?))
}

/// Disable directly when no rules depend on the integration; otherwise
/// answer with the rule count and wait for `confirm: true`.
///
/// An empty body is an unconfirmed request; a body that does not parse is
/// rejected rather than read as unconfirmed.
pub async fn disable(
    tenant: Tenant,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<DisableOutcome>, ApiError> {
    let req = parse_disable_request(&body)?;
    let outcome = if req.confirm {
        DisableOutcome::Disabled { integration: confirm_disable(tenant.api.as_ref(), &id).await? }
    } else {
        request_disable(tenant.api.as_ref(), &id).await?
    };
    Ok(Json(outcome))
}

pub async fn enable(tenant: Tenant, Path(id): Path<String>) -> Result<Json<Integration>, ApiError> {
    Ok(Json(enable_integration(tenant.api.as_ref(), &id).await?))
}

fn parse_disable_request(body: &[u8]) -> Result<DisableRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DisableRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid disable request: {e}")))
}
