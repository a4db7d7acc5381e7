//! Routing graph validation, run before persisting a new routing rule.
//!
//! Rules enforced:
//! 1. The source type must have an entry in the adjacency table.
//! 2. `integration` is never a destination.
//! 3. The destination type must be one the source type may route to.
//! 4. Destinations always reference a concrete entity; sources may omit the
//!    id only for the legacy default AI agent.
//!
//! Returns the normalized [`Connection`] ready for persistence on success.

use ontology::models::NewRoutingRule;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::node_ref::{parse_node_id, NodeType};

/// Legal destination types per source type.
pub fn allowed_destinations(source: &NodeType) -> Option<&'static [NodeType]> {
    use NodeType::*;

    const FROM_INTEGRATION: &[NodeType] = &[AiAgent, Department, Queue];
    const FROM_AI_AGENT: &[NodeType] = &[Department, Queue, Agent];
    const FROM_DEPARTMENT: &[NodeType] = &[Department, Queue, Agent, AiAgent];
    const FROM_QUEUE: &[NodeType] = &[Department, Agent, AiAgent];
    const FROM_AGENT: &[NodeType] = &[Department, Queue, AiAgent];

    match source {
        Integration => Some(FROM_INTEGRATION),
        AiAgent => Some(FROM_AI_AGENT),
        Department => Some(FROM_DEPARTMENT),
        Queue => Some(FROM_QUEUE),
        Agent => Some(FROM_AGENT),
        Unknown(_) => None,
    }
}

/// A validated edge, normalized for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source_type: NodeType,
    /// `None` only for the legacy default AI agent.
    pub source_id: Option<String>,
    pub destination_type: NodeType,
    pub destination_id: String,
}

impl Connection {
    /// Build the backend creation payload.
    pub fn to_new_rule(&self, priority: i32, is_active: bool) -> NewRoutingRule {
        NewRoutingRule {
            source_type: self.source_type.to_string(),
            source_id: self.source_id.clone(),
            destination_type: self.destination_type.to_string(),
            destination_id: self.destination_id.clone(),
            priority,
            is_active,
        }
    }
}

/// Decide whether an edge from `source_node_id` to `target_node_id` is legal.
///
/// # Errors
/// - [`ValidationError::InvalidSourceType`] if the source type cannot start a rule.
/// - [`ValidationError::IntegrationNotADestination`] if the target is an integration.
/// - [`ValidationError::IllegalDestination`] if the pair is not in the table.
/// - [`ValidationError::MissingEntityId`] if a required entity id is absent.
pub fn validate_connection(
    source_node_id: &str,
    target_node_id: &str,
) -> Result<Connection, ValidationError> {
    let source = parse_node_id(source_node_id);
    let target = parse_node_id(target_node_id);

    let allowed = allowed_destinations(&source.node_type)
        .ok_or_else(|| ValidationError::InvalidSourceType(source.node_type.clone()))?;

    if target.node_type == NodeType::Integration {
        return Err(ValidationError::IntegrationNotADestination);
    }

    if !allowed.contains(&target.node_type) {
        return Err(ValidationError::IllegalDestination {
            source_type: source.node_type,
            destination_type: target.node_type,
            allowed: allowed.to_vec(),
        });
    }

    if source.id.is_none() && !source.is_legacy_ai_agent() {
        return Err(ValidationError::MissingEntityId {
            node_id: source_node_id.to_string(),
            side: "source",
        });
    }

    let destination_id = target.id.ok_or_else(|| ValidationError::MissingEntityId {
        node_id: target_node_id.to_string(),
        side: "destination",
    })?;

    Ok(Connection {
        source_type: source.node_type,
        source_id: source.id,
        destination_type: target.node_type,
        destination_id,
    })
}
