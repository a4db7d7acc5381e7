//! In-memory canvas models.
//!
//! The canvas is a transient mirror of backend state: nodes come from the
//! organizational entities, edges from routing rules, and positions from the
//! stored layout.  None of it is authoritative.

use ontology::models::{NodePosition, RoutingRule};
use serde::{Deserialize, Serialize};

use crate::node_ref::{parse_node_id, NodeRef, NodeType};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// CanvasNode
// ---------------------------------------------------------------------------

/// A drawable node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    /// Opaque canvas id, e.g. `queue_vip`.
    pub id: String,
    pub node_type: NodeType,
    pub label: String,
    pub position: Position,
}

impl CanvasNode {
    /// Persistence payload for this node's position.
    pub fn to_position(&self) -> NodePosition {
        node_position(&self.id, self.position)
    }
}

/// Build the layout payload for `node_id`, decoding it with the shared parser.
pub fn node_position(node_id: &str, position: Position) -> NodePosition {
    let parsed = parse_node_id(node_id);
    NodePosition {
        node_type: parsed.node_type.to_string(),
        node_id: parsed.id,
        position_x: position.x,
        position_y: position.y,
    }
}

/// Canvas node id a stored layout entry belongs to.
pub fn layout_node_id(entry: &NodePosition) -> String {
    NodeRef {
        node_type: NodeType::from(entry.node_type.as_str()),
        id: entry.node_id.clone(),
    }
    .to_node_id()
}

// ---------------------------------------------------------------------------
// CanvasEdge
// ---------------------------------------------------------------------------

/// A drawn edge, always backed by a persisted routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasEdge {
    /// Id of the routing rule this edge mirrors.
    pub rule_id: String,
    pub source: String,
    pub target: String,
    pub priority: i32,
    pub is_active: bool,
}

impl From<&RoutingRule> for CanvasEdge {
    fn from(rule: &RoutingRule) -> Self {
        let source = NodeRef {
            node_type: NodeType::from(rule.source_type.as_str()),
            id: rule.source_id.clone(),
        };
        let target = NodeRef::new(
            NodeType::from(rule.destination_type.as_str()),
            rule.destination_id.clone(),
        );
        Self {
            rule_id: rule.id.clone(),
            source: source.to_node_id(),
            target: target.to_node_id(),
            priority: rule.priority,
            is_active: rule.is_active,
        }
    }
}

// ---------------------------------------------------------------------------
// SaveStatus
// ---------------------------------------------------------------------------

/// Layout persistence indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    #[default]
    Saved,
    Saving,
    /// The last save failed; cleared by the next successful save.
    Unsaved,
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Saved   => write!(f, "saved"),
            Self::Saving  => write!(f, "saving"),
            Self::Unsaved => write!(f, "unsaved"),
        }
    }
}
