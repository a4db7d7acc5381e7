//! The `OntologyApi` trait — every backend call the console makes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{
    ActiveOrganization, AiConfig, DelegationMatrix, HealthStatus, Integration, NewRoutingRule,
    NodePosition, ResourceKind, RoutingImpact, RoutingRule,
};
use crate::OntologyError;

/// Who a request is made for.
///
/// Defined here so both the HTTP client and test doubles can be scoped the
/// same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantScope {
    /// Sent as the tenant header on tenant-scoped calls.
    pub tenant_id: Option<String>,
    /// Caller's session token, forwarded as `Authorization: Bearer`.
    pub bearer: Option<String>,
}

impl TenantScope {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self { tenant_id: Some(tenant_id.into()), bearer: None }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// The backend contract.
///
/// Object safe so the editor and the HTTP layer can hold an
/// `Arc<dyn OntologyApi>` and tests can swap in [`MockOntology`](crate::mock::MockOntology).
#[async_trait]
pub trait OntologyApi: Send + Sync {
    // ------ Generic CRUD ------

    async fn list_entities(&self, kind: ResourceKind) -> Result<Vec<Value>, OntologyError>;

    async fn create_entity(&self, kind: ResourceKind, body: Value) -> Result<Value, OntologyError>;

    async fn update_entity(
        &self,
        kind: ResourceKind,
        id: &str,
        body: Value,
    ) -> Result<Value, OntologyError>;

    async fn delete_entity(&self, kind: ResourceKind, id: &str) -> Result<(), OntologyError>;

    // ------ Routing rules ------

    async fn list_routing_rules(&self) -> Result<Vec<RoutingRule>, OntologyError>;

    async fn create_routing_rule(&self, rule: &NewRoutingRule) -> Result<RoutingRule, OntologyError>;

    async fn delete_routing_rule(&self, id: &str) -> Result<(), OntologyError>;

    // ------ Canvas layout ------

    async fn get_canvas_layout(&self) -> Result<Vec<NodePosition>, OntologyError>;

    /// Replace the stored layout with `nodes` (full set, not a diff).
    async fn save_canvas_layout(&self, nodes: &[NodePosition]) -> Result<(), OntologyError>;

    // ------ Integrations ------

    /// Number of routing rules that would be affected by disabling `integration_id`.
    async fn routing_impact(&self, integration_id: &str) -> Result<RoutingImpact, OntologyError>;

    async fn set_integration_active(
        &self,
        integration_id: &str,
        active: bool,
    ) -> Result<Integration, OntologyError>;

    // ------ Preferences ------

    async fn get_active_organization(&self) -> Result<ActiveOrganization, OntologyError>;

    async fn set_active_organization(
        &self,
        selection: &ActiveOrganization,
    ) -> Result<ActiveOrganization, OntologyError>;

    async fn get_ai_config(&self) -> Result<AiConfig, OntologyError>;

    async fn put_ai_config(&self, config: &AiConfig) -> Result<AiConfig, OntologyError>;

    async fn get_delegation_matrix(&self) -> Result<DelegationMatrix, OntologyError>;

    async fn put_delegation_matrix(
        &self,
        matrix: &DelegationMatrix,
    ) -> Result<DelegationMatrix, OntologyError>;

    // ------ Health ------

    async fn health(&self) -> Result<HealthStatus, OntologyError>;
}

/// Hands out an [`OntologyApi`] bound to one caller's scope.
pub trait OntologyConnector: Send + Sync {
    fn connect(&self, scope: TenantScope) -> Arc<dyn OntologyApi>;
}

/// Fetch a collection and decode it into a concrete entity type.
pub async fn list_typed<T>(api: &dyn OntologyApi, kind: ResourceKind) -> Result<Vec<T>, OntologyError>
where
    T: serde::de::DeserializeOwned,
{
    api.list_entities(kind)
        .await?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(|e| OntologyError::Decode(e.to_string())))
        .collect()
}
