//! reqwest-backed [`OntologyApi`] implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::models::{
    ActiveOrganization, AiConfig, CanvasLayout, DelegationMatrix, HealthStatus, Integration,
    NewRoutingRule, NodePosition, ResourceKind, RoutingImpact, RoutingRule,
};
use crate::traits::{OntologyApi, OntologyConnector, TenantScope};
use crate::OntologyError;

/// Header carrying the tenant (organization) id on every scoped call.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Versioned prefix shared by every backend route.
pub const API_PREFIX: &str = "/api/v1";

/// Connection settings for the Ontology Service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Cheap-to-clone HTTP client; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpOntologyClient {
    http: Client,
    base_url: String,
    scope: TenantScope,
}

impl HttpOntologyClient {
    pub fn new(config: ClientConfig) -> Result<Self, OntologyError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            scope: TenantScope::default(),
        })
    }

    /// Same connection pool, different caller.
    pub fn scoped(&self, scope: TenantScope) -> Self {
        Self { http: self.http.clone(), base_url: self.base_url.clone(), scope }
    }

    pub fn scope(&self) -> &TenantScope {
        &self.scope
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(tenant) = &self.scope.tenant_id {
            builder = builder.header(TENANT_HEADER, tenant);
        }
        if let Some(token) = &self.scope.bearer {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, OntologyError> {
        let response = check_status(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), OntologyError> {
        check_status(builder.send().await?).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, OntologyError> {
        self.send_json(self.request(Method::GET, path)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, OntologyError> {
        self.send_json(self.request(Method::PUT, path).json(body)).await
    }
}

/// Map a non-success response to [`OntologyError`], pulling the backend's
/// message out of the body when it has one.
async fn check_status(response: Response) -> Result<Response, OntologyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(OntologyError::NotFound);
    }

    let body = response.text().await.unwrap_or_default();
    let message = backend_message(&body);
    warn!(status = status.as_u16(), message = ?message, "ontology service rejected request");
    Err(OntologyError::Backend { status: status.as_u16(), message })
}

/// The backend reports errors as `{"message": ..}`, `{"error": ..}` or
/// `{"detail": ..}` depending on the route.
pub(crate) fn backend_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl OntologyApi for HttpOntologyClient {
    #[instrument(skip(self), fields(tenant = ?self.scope.tenant_id))]
    async fn list_entities(&self, kind: ResourceKind) -> Result<Vec<Value>, OntologyError> {
        self.get(&format!("/{}", kind.path())).await
    }

    #[instrument(skip(self, body), fields(tenant = ?self.scope.tenant_id))]
    async fn create_entity(&self, kind: ResourceKind, body: Value) -> Result<Value, OntologyError> {
        let builder = self.request(Method::POST, &format!("/{}", kind.path())).json(&body);
        self.send_json(builder).await
    }

    #[instrument(skip(self, body), fields(tenant = ?self.scope.tenant_id))]
    async fn update_entity(
        &self,
        kind: ResourceKind,
        id: &str,
        body: Value,
    ) -> Result<Value, OntologyError> {
        let builder = self
            .request(Method::PATCH, &format!("/{}/{id}", kind.path()))
            .json(&body);
        self.send_json(builder).await
    }

    #[instrument(skip(self), fields(tenant = ?self.scope.tenant_id))]
    async fn delete_entity(&self, kind: ResourceKind, id: &str) -> Result<(), OntologyError> {
        self.send_empty(self.request(Method::DELETE, &format!("/{}/{id}", kind.path())))
            .await
    }

    async fn list_routing_rules(&self) -> Result<Vec<RoutingRule>, OntologyError> {
        self.get("/routing-rules").await
    }

    #[instrument(skip(self), fields(tenant = ?self.scope.tenant_id))]
    async fn create_routing_rule(&self, rule: &NewRoutingRule) -> Result<RoutingRule, OntologyError> {
        let created: RoutingRule = self
            .send_json(self.request(Method::POST, "/routing-rules").json(rule))
            .await?;
        debug!(rule_id = %created.id, "routing rule created");
        Ok(created)
    }

    #[instrument(skip(self), fields(tenant = ?self.scope.tenant_id))]
    async fn delete_routing_rule(&self, id: &str) -> Result<(), OntologyError> {
        self.send_empty(self.request(Method::DELETE, &format!("/routing-rules/{id}")))
            .await
    }

    async fn get_canvas_layout(&self) -> Result<Vec<NodePosition>, OntologyError> {
        let layout: CanvasLayout = self.get("/routing-canvas").await?;
        Ok(layout.nodes)
    }

    async fn save_canvas_layout(&self, nodes: &[NodePosition]) -> Result<(), OntologyError> {
        let builder = self
            .request(Method::PUT, "/routing-canvas")
            .json(&json!({ "nodes": nodes }));
        self.send_empty(builder).await
    }

    async fn routing_impact(&self, integration_id: &str) -> Result<RoutingImpact, OntologyError> {
        self.get(&format!("/integrations/{integration_id}/routing-impact"))
            .await
    }

    #[instrument(skip(self), fields(tenant = ?self.scope.tenant_id))]
    async fn set_integration_active(
        &self,
        integration_id: &str,
        active: bool,
    ) -> Result<Integration, OntologyError> {
        let builder = self
            .request(Method::PATCH, &format!("/integrations/{integration_id}"))
            .json(&json!({ "is_active": active }));
        self.send_json(builder).await
    }

    async fn get_active_organization(&self) -> Result<ActiveOrganization, OntologyError> {
        self.get("/me/active-organization").await
    }

    async fn set_active_organization(
        &self,
        selection: &ActiveOrganization,
    ) -> Result<ActiveOrganization, OntologyError> {
        self.put("/me/active-organization", selection).await
    }

    async fn get_ai_config(&self) -> Result<AiConfig, OntologyError> {
        self.get("/ai-config").await
    }

    async fn put_ai_config(&self, config: &AiConfig) -> Result<AiConfig, OntologyError> {
        self.put("/ai-config", config).await
    }

    async fn get_delegation_matrix(&self) -> Result<DelegationMatrix, OntologyError> {
        self.get("/ai-delegations").await
    }

    async fn put_delegation_matrix(
        &self,
        matrix: &DelegationMatrix,
    ) -> Result<DelegationMatrix, OntologyError> {
        self.put("/ai-delegations", matrix).await
    }

    async fn health(&self) -> Result<HealthStatus, OntologyError> {
        self.get("/health").await
    }
}

impl OntologyConnector for HttpOntologyClient {
    fn connect(&self, scope: TenantScope) -> Arc<dyn OntologyApi> {
        Arc::new(self.scoped(scope))
    }
}
