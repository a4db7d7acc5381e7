//! Node-reference parsing.
//!
//! Canvas node ids are opaque strings of the form `<type>_<entity id>`:
//!
//! | node id             | type          | id        |
//! |---------------------|---------------|-----------|
//! | `ai_agent`          | `ai_agent`    | none      |
//! | `ai_agent_<id>`     | `ai_agent`    | `<id>`    |
//! | `integration_<id>`  | `integration` | `<id>`    |
//! | `department_<id>`   | `department`  | `<id>`    |
//! | `queue_<id>`        | `queue`       | `<id>`    |
//! | `agent_<id>`        | `agent`       | `<id>`    |
//!
//! Entity ids may themselves contain underscores, so everything after the
//! type prefix is rejoined rather than taking a single segment.
//!
//! [`parse_node_id`] is the only place a node id is decoded.  Edge creation,
//! auto-save and manual save all go through it.

use serde::{Deserialize, Serialize};

/// The legacy singleton AI agent node.
pub const LEGACY_AI_AGENT: &str = "ai_agent";

// ---------------------------------------------------------------------------
// NodeType
// ---------------------------------------------------------------------------

/// Role of a node on the routing canvas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum NodeType {
    Integration,
    AiAgent,
    Department,
    Queue,
    Agent,
    /// A prefix the console does not know about.
    Unknown(String),
}

impl NodeType {
    /// The five types that can appear on the canvas, in column order.
    pub const KNOWN: [NodeType; 5] = [
        Self::Integration,
        Self::AiAgent,
        Self::Department,
        Self::Queue,
        Self::Agent,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Integration => "integration",
            Self::AiAgent => "ai_agent",
            Self::Department => "department",
            Self::Queue => "queue",
            Self::Agent => "agent",
            Self::Unknown(other) => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        match s {
            "integration" => Self::Integration,
            "ai_agent"    => Self::AiAgent,
            "department"  => Self::Department,
            "queue"       => Self::Queue,
            "agent"       => Self::Agent,
            other         => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<NodeType> for String {
    fn from(t: NodeType) -> Self {
        t.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// NodeRef
// ---------------------------------------------------------------------------

/// A decoded canvas node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub node_type: NodeType,
    /// `None` only for the legacy AI agent (or a malformed id with no suffix).
    pub id: Option<String>,
}

impl NodeRef {
    pub fn new(node_type: NodeType, id: impl Into<String>) -> Self {
        Self { node_type, id: Some(id.into()) }
    }

    /// The legacy default AI agent node.
    pub fn legacy_ai_agent() -> Self {
        Self { node_type: NodeType::AiAgent, id: None }
    }

    pub fn is_legacy_ai_agent(&self) -> bool {
        self.node_type == NodeType::AiAgent && self.id.is_none()
    }

    /// Encode back into a canvas node id.
    pub fn to_node_id(&self) -> String {
        match &self.id {
            Some(id) => format!("{}_{}", self.node_type, id),
            None => self.node_type.to_string(),
        }
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_node_id())
    }
}

/// Decode a canvas node id into its type and entity id.
pub fn parse_node_id(node_id: &str) -> NodeRef {
    if node_id == LEGACY_AI_AGENT {
        return NodeRef::legacy_ai_agent();
    }

    let segments: Vec<&str> = node_id.split('_').collect();

    let (node_type, rest) = match segments.as_slice() {
        ["integration", rest @ ..] => (NodeType::Integration, rest),
        ["ai", "agent", rest @ ..] => (NodeType::AiAgent, rest),
        [first, rest @ ..] => (NodeType::from(*first), rest),
        // `split` always yields at least one segment.
        [] => (NodeType::Unknown(String::new()), &[][..]),
    };

    let id = if rest.is_empty() { None } else { Some(rest.join("_")) };

    NodeRef { node_type, id }
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_ai_agent_has_no_id() {
        assert_eq!(parse_node_id("ai_agent"), NodeRef::legacy_ai_agent());
    }

    #[test]
    fn ai_agent_instance_keeps_its_id() {
        assert_eq!(parse_node_id("ai_agent_123"), NodeRef::new(NodeType::AiAgent, "123"));
    }

    #[test]
    fn underscores_in_ids_survive() {
        assert_eq!(
            parse_node_id("integration_abc_def"),
            NodeRef::new(NodeType::Integration, "abc_def")
        );
        assert_eq!(
            parse_node_id("ai_agent_support_bot_v2"),
            NodeRef::new(NodeType::AiAgent, "support_bot_v2")
        );
        assert_eq!(
            parse_node_id("queue_vip_es_mx"),
            NodeRef::new(NodeType::Queue, "vip_es_mx")
        );
    }

    #[test]
    fn plain_agent_is_not_confused_with_ai_agent() {
        assert_eq!(parse_node_id("agent_42"), NodeRef::new(NodeType::Agent, "42"));
    }

    #[test]
    fn unknown_prefix_is_preserved() {
        let parsed = parse_node_id("bot_7");
        assert_eq!(parsed.node_type, NodeType::Unknown("bot".into()));
        assert_eq!(parsed.id.as_deref(), Some("7"));

        // "ai" without "agent" is not the two-token prefix.
        assert_eq!(parse_node_id("ai_bot").node_type, NodeType::Unknown("ai".into()));
    }

    #[test]
    fn bare_type_has_no_id() {
        assert_eq!(parse_node_id("department").id, None);
        assert_eq!(parse_node_id("").node_type, NodeType::Unknown(String::new()));
    }

    #[test]
    fn every_known_form_round_trips() {
        let ids = [
            "ai_agent",
            "ai_agent_9f1c",
            "integration_wa_main",
            "department_sales",
            "queue_q_1",
            "agent_u_77",
        ];
        for id in ids {
            assert_eq!(parse_node_id(id).to_node_id(), id, "round trip of {id}");
        }
    }

    #[test]
    fn node_type_serializes_as_plain_string() {
        let json = serde_json::to_string(&NodeType::AiAgent).unwrap();
        assert_eq!(json, "\"ai_agent\"");
        let back: NodeType = serde_json::from_str("\"queue\"").unwrap();
        assert_eq!(back, NodeType::Queue);
    }
}
