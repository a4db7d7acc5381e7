//! Wire models for the Ontology Service.
//!
//! These mirror the backend's JSON payloads.  They carry no routing
//! behaviour; the `engine` crate owns that.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// Entity collections that support plain CRUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Organizations,
    Departments,
    Agents,
    Queues,
    AiAgents,
    Integrations,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        Self::Organizations,
        Self::Departments,
        Self::Agents,
        Self::Queues,
        Self::AiAgents,
        Self::Integrations,
    ];

    /// Path segment under the versioned base path.
    pub fn path(self) -> &'static str {
        match self {
            Self::Organizations => "organizations",
            Self::Departments => "departments",
            Self::Agents => "agents",
            Self::Queues => "queues",
            Self::AiAgents => "ai-agents",
            Self::Integrations => "integrations",
        }
    }

    /// Organizations are global; everything else is scoped by the tenant header.
    pub fn is_tenant_scoped(self) -> bool {
        !matches!(self, Self::Organizations)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.path() == s)
            .ok_or_else(|| format!("unknown resource kind: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Organizational entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub department_id: Option<String>,
}

/// A human agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAgent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Stored and displayed only; the backend applies it.
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Integrations
// ---------------------------------------------------------------------------

/// Channel an integration receives conversations from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Whatsapp,
    Instagram,
    WebChat,
    Messenger,
    Telegram,
    Email,
    Api,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub id: String,
    pub name: String,
    pub channel: ChannelKind,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// How many routing rules depend on an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingImpact {
    pub affected_rules: u64,
}

// ---------------------------------------------------------------------------
// Routing rules
// ---------------------------------------------------------------------------

/// A persisted routing rule as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub id: String,
    pub source_type: String,
    #[serde(default)]
    pub source_id: Option<String>,
    pub destination_type: String,
    pub destination_id: String,
    pub priority: i32,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Creation payload for a routing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoutingRule {
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub destination_type: String,
    pub destination_id: String,
    pub priority: i32,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Canvas layout
// ---------------------------------------------------------------------------

/// Persisted position of one canvas node.
///
/// `node_id` is omitted for the singleton legacy AI-agent node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub position_x: f64,
    pub position_y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasLayout {
    #[serde(default)]
    pub nodes: Vec<NodePosition>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "healthy" | "up")
    }
}

// ---------------------------------------------------------------------------
// Preferences (backend-owned, per user / per tenant)
// ---------------------------------------------------------------------------

/// The organization a user is currently working in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveOrganization {
    pub organization_id: Option<String>,
}

/// Per-organization AI behaviour settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub default_ai_agent_id: Option<String>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub handoff_message: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

/// Which AI agents may delegate conversations to which other AI agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationMatrix {
    /// AI agent id -> ids it may delegate to.
    #[serde(default)]
    pub delegations: BTreeMap<String, Vec<String>>,
}

fn default_true() -> bool {
    true
}
