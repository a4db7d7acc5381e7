//! `MockOntology` — an in-memory test double for [`OntologyApi`].
//!
//! Useful in unit and integration tests where a running Ontology Service is
//! either unavailable or irrelevant.  Every call is recorded so tests can
//! assert on what did (or did not) reach the backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::models::{
    ActiveOrganization, AiConfig, DelegationMatrix, HealthStatus, Integration, NewRoutingRule,
    NodePosition, ResourceKind, RoutingImpact, RoutingRule,
};
use crate::traits::{OntologyApi, OntologyConnector, TenantScope};
use crate::OntologyError;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    ListEntities(ResourceKind),
    CreateEntity(ResourceKind, Value),
    UpdateEntity(ResourceKind, String, Value),
    DeleteEntity(ResourceKind, String),
    ListRoutingRules,
    CreateRoutingRule(NewRoutingRule),
    DeleteRoutingRule(String),
    GetCanvasLayout,
    SaveCanvasLayout(Vec<NodePosition>),
    RoutingImpact(String),
    SetIntegrationActive(String, bool),
    GetActiveOrganization,
    SetActiveOrganization(ActiveOrganization),
    GetAiConfig,
    PutAiConfig(AiConfig),
    GetDelegationMatrix,
    PutDelegationMatrix(DelegationMatrix),
    Health,
}

#[derive(Default)]
struct MockState {
    entities: HashMap<ResourceKind, Vec<Value>>,
    rules: Vec<RoutingRule>,
    layout: Vec<NodePosition>,
    impact: HashMap<String, u64>,
    active_organization: Option<String>,
    ai_config: AiConfig,
    delegations: DelegationMatrix,
    /// Error returned by every call while set.
    failure: Option<OntologyError>,
    next_rule_id: u64,
    scopes: Vec<TenantScope>,
    calls: Vec<MockCall>,
}

/// A mock backend that keeps its data in memory and records every call.
///
/// Clones share state, so a test can keep one handle while the code under
/// test owns another.
#[derive(Clone, Default)]
pub struct MockOntology {
    state: Arc<Mutex<MockState>>,
}

impl MockOntology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with raw JSON entities.
    pub fn with_entities(self, kind: ResourceKind, entities: Vec<Value>) -> Self {
        self.state.lock().unwrap().entities.insert(kind, entities);
        self
    }

    /// Seed the routing rules.
    pub fn with_rules(self, rules: Vec<RoutingRule>) -> Self {
        self.state.lock().unwrap().rules = rules;
        self
    }

    /// Seed the stored canvas layout.
    pub fn with_layout(self, layout: Vec<NodePosition>) -> Self {
        self.state.lock().unwrap().layout = layout;
        self
    }

    /// Set how many rules depend on `integration_id`.
    pub fn with_impact(self, integration_id: impl Into<String>, affected_rules: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .impact
            .insert(integration_id.into(), affected_rules);
        self
    }

    /// Make every subsequent call fail with `err` (or succeed again with `None`).
    pub fn set_failure(&self, err: Option<OntologyError>) {
        self.state.lock().unwrap().failure = err;
    }

    /// Every call seen so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    /// Layouts passed to `save_canvas_layout`, in call order.
    pub fn saved_layouts(&self) -> Vec<Vec<NodePosition>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::SaveCanvasLayout(nodes) => Some(nodes),
                _ => None,
            })
            .collect()
    }

    /// Current routing rules.
    pub fn rules(&self) -> Vec<RoutingRule> {
        self.state.lock().unwrap().rules.clone()
    }

    /// Scopes handed out through [`OntologyConnector::connect`].
    pub fn scopes(&self) -> Vec<TenantScope> {
        self.state.lock().unwrap().scopes.clone()
    }

    /// Record `call` and return the configured failure, if any.
    fn record(&self, call: MockCall) -> Result<std::sync::MutexGuard<'_, MockState>, OntologyError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        Ok(state)
    }
}

fn integration_from(value: &Value) -> Result<Integration, OntologyError> {
    serde_json::from_value(value.clone()).map_err(|e| OntologyError::Decode(e.to_string()))
}

#[async_trait]
impl OntologyApi for MockOntology {
    async fn list_entities(&self, kind: ResourceKind) -> Result<Vec<Value>, OntologyError> {
        let state = self.record(MockCall::ListEntities(kind))?;
        Ok(state.entities.get(&kind).cloned().unwrap_or_default())
    }

    async fn create_entity(&self, kind: ResourceKind, body: Value) -> Result<Value, OntologyError> {
        let mut state = self.record(MockCall::CreateEntity(kind, body.clone()))?;
        let mut created = body;
        if created.get("id").is_none() {
            if let Some(obj) = created.as_object_mut() {
                obj.insert("id".into(), json!(uuid::Uuid::new_v4().to_string()));
            }
        }
        state.entities.entry(kind).or_default().push(created.clone());
        Ok(created)
    }

    async fn update_entity(
        &self,
        kind: ResourceKind,
        id: &str,
        body: Value,
    ) -> Result<Value, OntologyError> {
        let mut state = self.record(MockCall::UpdateEntity(kind, id.to_string(), body.clone()))?;
        let entity = state
            .entities
            .get_mut(&kind)
            .and_then(|list| list.iter_mut().find(|e| e["id"] == id))
            .ok_or(OntologyError::NotFound)?;
        if let (Some(target), Some(patch)) = (entity.as_object_mut(), body.as_object()) {
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
        }
        Ok(entity.clone())
    }

    async fn delete_entity(&self, kind: ResourceKind, id: &str) -> Result<(), OntologyError> {
        let mut state = self.record(MockCall::DeleteEntity(kind, id.to_string()))?;
        let list = state.entities.entry(kind).or_default();
        let before = list.len();
        list.retain(|e| e["id"] != id);
        if list.len() == before {
            return Err(OntologyError::NotFound);
        }
        Ok(())
    }

    async fn list_routing_rules(&self) -> Result<Vec<RoutingRule>, OntologyError> {
        let state = self.record(MockCall::ListRoutingRules)?;
        Ok(state.rules.clone())
    }

    async fn create_routing_rule(&self, rule: &NewRoutingRule) -> Result<RoutingRule, OntologyError> {
        let mut state = self.record(MockCall::CreateRoutingRule(rule.clone()))?;
        state.next_rule_id += 1;
        let created = RoutingRule {
            id: format!("rule-{}", state.next_rule_id),
            source_type: rule.source_type.clone(),
            source_id: rule.source_id.clone(),
            destination_type: rule.destination_type.clone(),
            destination_id: rule.destination_id.clone(),
            priority: rule.priority,
            is_active: rule.is_active,
            created_at: None,
        };
        state.rules.push(created.clone());
        Ok(created)
    }

    async fn delete_routing_rule(&self, id: &str) -> Result<(), OntologyError> {
        let mut state = self.record(MockCall::DeleteRoutingRule(id.to_string()))?;
        let before = state.rules.len();
        state.rules.retain(|r| r.id != id);
        if state.rules.len() == before {
            return Err(OntologyError::NotFound);
        }
        Ok(())
    }

    async fn get_canvas_layout(&self) -> Result<Vec<NodePosition>, OntologyError> {
        let state = self.record(MockCall::GetCanvasLayout)?;
        Ok(state.layout.clone())
    }

    async fn save_canvas_layout(&self, nodes: &[NodePosition]) -> Result<(), OntologyError> {
        let mut state = self.record(MockCall::SaveCanvasLayout(nodes.to_vec()))?;
        state.layout = nodes.to_vec();
        Ok(())
    }

    async fn routing_impact(&self, integration_id: &str) -> Result<RoutingImpact, OntologyError> {
        let state = self.record(MockCall::RoutingImpact(integration_id.to_string()))?;
        let affected_rules = state.impact.get(integration_id).copied().unwrap_or(0);
        Ok(RoutingImpact { affected_rules })
    }

    async fn set_integration_active(
        &self,
        integration_id: &str,
        active: bool,
    ) -> Result<Integration, OntologyError> {
        let mut state =
            self.record(MockCall::SetIntegrationActive(integration_id.to_string(), active))?;
        let entity = state
            .entities
            .get_mut(&ResourceKind::Integrations)
            .and_then(|list| list.iter_mut().find(|e| e["id"] == integration_id))
            .ok_or(OntologyError::NotFound)?;
        entity["is_active"] = json!(active);
        integration_from(entity)
    }

    async fn get_active_organization(&self) -> Result<ActiveOrganization, OntologyError> {
        let state = self.record(MockCall::GetActiveOrganization)?;
        Ok(ActiveOrganization { organization_id: state.active_organization.clone() })
    }

    async fn set_active_organization(
        &self,
        selection: &ActiveOrganization,
    ) -> Result<ActiveOrganization, OntologyError> {
        let mut state = self.record(MockCall::SetActiveOrganization(selection.clone()))?;
        state.active_organization = selection.organization_id.clone();
        Ok(selection.clone())
    }

    async fn get_ai_config(&self) -> Result<AiConfig, OntologyError> {
        let state = self.record(MockCall::GetAiConfig)?;
        Ok(state.ai_config.clone())
    }

    async fn put_ai_config(&self, config: &AiConfig) -> Result<AiConfig, OntologyError> {
        let mut state = self.record(MockCall::PutAiConfig(config.clone()))?;
        state.ai_config = config.clone();
        Ok(config.clone())
    }

    async fn get_delegation_matrix(&self) -> Result<DelegationMatrix, OntologyError> {
        let state = self.record(MockCall::GetDelegationMatrix)?;
        Ok(state.delegations.clone())
    }

    async fn put_delegation_matrix(
        &self,
        matrix: &DelegationMatrix,
    ) -> Result<DelegationMatrix, OntologyError> {
        let mut state = self.record(MockCall::PutDelegationMatrix(matrix.clone()))?;
        state.delegations = matrix.clone();
        Ok(matrix.clone())
    }

    async fn health(&self) -> Result<HealthStatus, OntologyError> {
        self.record(MockCall::Health)?;
        Ok(HealthStatus { status: "ok".into(), version: Some("mock".into()) })
    }
}

impl OntologyConnector for MockOntology {
    fn connect(&self, scope: TenantScope) -> Arc<dyn OntologyApi> {
        self.state.lock().unwrap().scopes.push(scope);
        Arc::new(self.clone())
    }
}
