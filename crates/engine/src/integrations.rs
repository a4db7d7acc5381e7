//! Enabling and disabling integrations.
//!
//! Disabling an integration that routing rules depend on needs an explicit
//! confirmation showing how many rules are affected.  With no dependent rules
//! it is disabled straight away.

use ontology::models::Integration;
use ontology::OntologyApi;
use serde::Serialize;
use tracing::{info, instrument};

use crate::EngineError;

/// Result of asking to disable an integration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DisableOutcome {
    /// Nothing depended on it; it is now disabled.
    Disabled { integration: Integration },
    /// `affected_rules` rules route from it; nothing was changed.
    NeedsConfirmation { affected_rules: u64 },
}

/// Disable `integration_id` unless routing rules depend on it.
#[instrument(skip(api))]
pub async fn request_disable(
    api: &dyn OntologyApi,
    integration_id: &str,
) -> Result<DisableOutcome, EngineError> {
    let impact = api.routing_impact(integration_id).await?;
    if impact.affected_rules > 0 {
        info!(affected_rules = impact.affected_rules, "disable needs confirmation");
        return Ok(DisableOutcome::NeedsConfirmation { affected_rules: impact.affected_rules });
    }

    let integration = api.set_integration_active(integration_id, false).await?;
    info!("integration disabled");
    Ok(DisableOutcome::Disabled { integration })
}

/// Disable after the user confirmed the impact.
#[instrument(skip(api))]
pub async fn confirm_disable(
    api: &dyn OntologyApi,
    integration_id: &str,
) -> Result<Integration, EngineError> {
    Ok(api.set_integration_active(integration_id, false).await?)
}

#[instrument(skip(api))]
pub async fn enable(api: &dyn OntologyApi, integration_id: &str) -> Result<Integration, EngineError> {
    Ok(api.set_integration_active(integration_id, true).await?)
}
