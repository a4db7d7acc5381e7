//! Routing rules and the canvas behind the flow editor.

use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    Json,
};
use engine::models::{node_position, CanvasEdge, CanvasNode, Position};
use engine::{
    allowed_destinations, create_rule, parse_node_id, validate_connection, CanvasConfig, Connection,
    NodeType, RoutingCanvas,
};
use ontology::models::{NodePosition, RoutingRule};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::identity::{Caller, Tenant};

#[derive(Debug, Deserialize)]
pub struct ConnectionRequest {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub priority: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<Connection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Legal destination types for the source, for hinting in the editor.
    pub allowed_destinations: Vec<NodeType>,
}

#[derive(Debug, Serialize)]
pub struct CanvasView {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

#[derive(Debug, Deserialize)]
pub struct NodePlacement {
    pub id: String,
    pub position: Position,
}

#[derive(Debug, Deserialize)]
pub struct SaveCanvasRequest {
    pub nodes: Vec<NodePlacement>,
}

pub async fn list_rules(tenant: Tenant) -> Result<Json<Vec<RoutingRule>>, ApiError> {
    Ok(Json(tenant.api.list_routing_rules().await?))
}

/// Dry-run an edge without touching the backend.
pub async fn validate(_caller: Caller, Json(req): Json<ConnectionRequest>) -> Json<ValidationReport> {
    let source_type = parse_node_id(&req.source).node_type;
    let allowed = allowed_destinations(&source_type)
        .map(<[NodeType]>::to_vec)
        .unwrap_or_default();

    let report = match validate_connection(&req.source, &req.target) {
        Ok(connection) => ValidationReport {
            valid: true,
            connection: Some(connection),
            error: None,
            allowed_destinations: allowed,
        },
        Err(err) => ValidationReport {
            valid: false,
            connection: None,
            error: Some(err.to_string()),
            allowed_destinations: allowed,
        },
    };
    Json(report)
}

/// Validate and persist an edge drawn on the canvas.
pub async fn create_connection(
    tenant: Tenant,
    Json(req): Json<ConnectionRequest>,
) -> Result<(StatusCode, Json<RoutingRule>), ApiError> {
    let priority = req.priority.unwrap_or(CanvasConfig::default().default_priority);
    let rule = create_rule(tenant.api.as_ref(), &req.source, &req.target, priority).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn delete_rule(tenant: Tenant, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    tenant.api.delete_routing_rule(&id).await?;
    info!(rule_id = %id, tenant = tenant.id(), "routing rule deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Nodes with their positions and the current edges.
pub async fn get_canvas(tenant: Tenant) -> Result<Json<CanvasView>, ApiError> {
    let canvas = RoutingCanvas::load(Arc::clone(&tenant.api), CanvasConfig::default()).await?;
    Ok(Json(CanvasView { nodes: canvas.nodes().to_vec(), edges: canvas.edges().to_vec() }))
}

/// Replace the stored layout with the submitted positions.
pub async fn save_canvas(
    tenant: Tenant,
    Json(req): Json<SaveCanvasRequest>,
) -> Result<StatusCode, ApiError> {
    let layout = req
        .nodes
        .iter()
        .map(|node| {
            if parse_node_id(&node.id).node_type.is_known() {
                Ok(node_position(&node.id, node.position))
            } else {
                Err(ApiError::BadRequest(format!("unknown node: {}", node.id)))
            }
        })
        .collect::<Result<Vec<NodePosition>, ApiError>>()?;

    tenant.api.save_canvas_layout(&layout).await?;
    info!(nodes = layout.len(), tenant = tenant.id(), "canvas layout saved");
    Ok(StatusCode::NO_CONTENT)
}
