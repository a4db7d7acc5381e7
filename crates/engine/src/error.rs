//! Engine-level error types.

use thiserror::Error;

use crate::node_ref::NodeType;

/// Why a proposed connection was rejected.
///
/// Produced locally, before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The source node's type has no entry in the adjacency table.
    #[error("'{0}' nodes cannot start a routing rule")]
    InvalidSourceType(NodeType),

    /// The destination type is not allowed for this source type.
    #[error("{source_type} nodes can only route to: {}", join_types(.allowed))]
    IllegalDestination {
        source_type: NodeType,
        destination_type: NodeType,
        allowed: Vec<NodeType>,
    },

    /// Integrations are entry points and never receive conversations.
    #[error("integration is not a valid destination: integrations are entry points only")]
    IntegrationNotADestination,

    /// The node id carries no entity id where one is required.
    #[error("{side} node '{node_id}' does not reference an entity")]
    MissingEntityId {
        node_id: String,
        side: &'static str,
    },
}

fn join_types(types: &[NodeType]) -> String {
    types
        .iter()
        .map(NodeType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors produced by the canvas editor and integration flows.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Local errors ------

    /// The proposed edge is illegal; nothing was sent to the backend.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The referenced edge or node is not on the canvas.
    #[error("'{0}' is not on the canvas")]
    NotOnCanvas(String),

    // ------ Backend errors ------

    /// The Ontology Service call failed.
    #[error("backend error: {0}")]
    Backend(#[from] ontology::OntologyError),
}
