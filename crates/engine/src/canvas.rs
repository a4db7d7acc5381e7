//! Routing canvas editor.
//!
//! `RoutingCanvas` is the stateful controller behind the flow editor:
//! 1. Loads entities, routing rules and the stored layout from the backend.
//! 2. Validates drag-connect gestures locally and persists legal ones.
//! 3. Mirrors a rule as an edge only after the backend confirmed it.
//! 4. Deletes rules on the backend before removing their edge.
//! 5. Feeds node drags to the [`AutoSaver`]; manual saves bypass it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ontology::models::{
    Agent, AiAgent, Department, Integration, NodePosition, Queue, ResourceKind, RoutingRule,
};
use ontology::{list_typed, OntologyApi};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::autosave::{persist_layout, AutoSaver, DEFAULT_QUIET_PERIOD};
use crate::models::{layout_node_id, CanvasEdge, CanvasNode, Position, SaveStatus};
use crate::node_ref::{NodeRef, NodeType, LEGACY_AI_AGENT};
use crate::validator::validate_connection;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the editor.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Priority given to rules drawn on the canvas.
    pub default_priority: i32,
    /// Quiet period of the layout auto-save.
    pub autosave_quiet_period: Duration,
    /// Horizontal distance between type columns in the default layout.
    pub column_spacing: f64,
    /// Vertical distance between nodes of one column in the default layout.
    pub row_spacing: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            default_priority: 0,
            autosave_quiet_period: DEFAULT_QUIET_PERIOD,
            column_spacing: 280.0,
            row_spacing: 120.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule persistence shared with the HTTP layer
// ---------------------------------------------------------------------------

/// Validate an edge and, if legal, create its routing rule.
///
/// Illegal edges return [`EngineError::Validation`] without touching the backend.
#[instrument(skip(api))]
pub async fn create_rule(
    api: &dyn OntologyApi,
    source_node_id: &str,
    target_node_id: &str,
    priority: i32,
) -> Result<RoutingRule, EngineError> {
    let connection = validate_connection(source_node_id, target_node_id)?;
    let rule = api
        .create_routing_rule(&connection.to_new_rule(priority, true))
        .await?;
    info!(rule_id = %rule.id, "routing rule created");
    Ok(rule)
}

// ---------------------------------------------------------------------------
// RoutingCanvas
// ---------------------------------------------------------------------------

/// Editor state for one tenant's routing canvas.
pub struct RoutingCanvas {
    api: Arc<dyn OntologyApi>,
    config: CanvasConfig,
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
    banner: Option<String>,
    status: Arc<watch::Sender<SaveStatus>>,
    autosave: AutoSaver,
}

impl RoutingCanvas {
    /// Fetch everything the canvas displays and start the auto-saver.
    ///
    /// # Errors
    /// Returns [`EngineError::Backend`] if any of the initial fetches fails.
    #[instrument(skip(api, config))]
    pub async fn load(api: Arc<dyn OntologyApi>, config: CanvasConfig) -> Result<Self, EngineError> {
        let integrations: Vec<Integration> = list_typed(api.as_ref(), ResourceKind::Integrations).await?;
        let ai_agents: Vec<AiAgent> = list_typed(api.as_ref(), ResourceKind::AiAgents).await?;
        let departments: Vec<Department> = list_typed(api.as_ref(), ResourceKind::Departments).await?;
        let queues: Vec<Queue> = list_typed(api.as_ref(), ResourceKind::Queues).await?;
        let agents: Vec<Agent> = list_typed(api.as_ref(), ResourceKind::Agents).await?;
        let rules = api.list_routing_rules().await?;
        let layout = api.get_canvas_layout().await?;

        let stored: HashMap<String, Position> = layout
            .iter()
            .map(|entry| (layout_node_id(entry), Position::new(entry.position_x, entry.position_y)))
            .collect();

        let legacy_in_use = stored.contains_key(LEGACY_AI_AGENT)
            || rules
                .iter()
                .any(|r| r.source_type == NodeType::AiAgent.as_str() && r.source_id.is_none());

        let mut entries: Vec<(NodeRef, String)> = Vec::new();
        entries.extend(
            integrations
                .into_iter()
                .map(|i| (NodeRef::new(NodeType::Integration, i.id), i.name)),
        );
        if legacy_in_use {
            entries.push((NodeRef::legacy_ai_agent(), "Default AI agent".to_string()));
        }
        entries.extend(ai_agents.into_iter().map(|a| (NodeRef::new(NodeType::AiAgent, a.id), a.name)));
        entries.extend(
            departments
                .into_iter()
                .map(|d| (NodeRef::new(NodeType::Department, d.id), d.name)),
        );
        entries.extend(queues.into_iter().map(|q| (NodeRef::new(NodeType::Queue, q.id), q.name)));
        entries.extend(agents.into_iter().map(|a| (NodeRef::new(NodeType::Agent, a.id), a.name)));

        let nodes = place_nodes(entries, &stored, &config);
        let edges: Vec<CanvasEdge> = rules.iter().map(CanvasEdge::from).collect();

        info!("canvas loaded with {} nodes and {} edges", nodes.len(), edges.len());

        let status = Arc::new(watch::Sender::new(SaveStatus::Saved));
        let autosave = AutoSaver::spawn(Arc::clone(&api), Arc::clone(&status), config.autosave_quiet_period);

        Ok(Self { api, config, nodes, edges, banner: None, status, autosave })
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CanvasEdge] {
        &self.edges
    }

    pub fn node(&self, node_id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Message of the last failed action, until dismissed.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn save_status(&self) -> SaveStatus {
        self.autosave.status()
    }

    pub fn subscribe_save_status(&self) -> watch::Receiver<SaveStatus> {
        self.autosave.subscribe()
    }

    /// Handle a completed drag-connect gesture.
    ///
    /// The edge is added only once the backend has created the rule.
    pub async fn connect(&mut self, source: &str, target: &str) -> Result<CanvasEdge, EngineError> {
        for node_id in [source, target] {
            if self.node(node_id).is_none() {
                return Err(EngineError::NotOnCanvas(node_id.to_string()));
            }
        }

        match create_rule(self.api.as_ref(), source, target, self.config.default_priority).await {
            Ok(rule) => {
                let edge = CanvasEdge::from(&rule);
                self.edges.push(edge.clone());
                Ok(edge)
            }
            Err(err) => {
                self.show_error(&err);
                Err(err)
            }
        }
    }

    /// Delete the rule behind an edge, then remove the edge.
    pub async fn delete_edge(&mut self, rule_id: &str) -> Result<(), EngineError> {
        if !self.edges.iter().any(|e| e.rule_id == rule_id) {
            return Err(EngineError::NotOnCanvas(rule_id.to_string()));
        }

        if let Err(err) = self.api.delete_routing_rule(rule_id).await {
            let err = EngineError::from(err);
            self.show_error(&err);
            return Err(err);
        }

        self.edges.retain(|e| e.rule_id != rule_id);
        Ok(())
    }

    /// Move a node while it is being dragged.
    pub fn move_node(&mut self, node_id: &str, position: Position) -> Result<(), EngineError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| EngineError::NotOnCanvas(node_id.to_string()))?;
        node.position = position;
        Ok(())
    }

    /// A drag finished: schedule a debounced write of the whole layout.
    pub fn drag_end(&self) {
        self.autosave.schedule(self.layout_snapshot());
    }

    /// Save the layout now, independently of any pending auto-save.
    pub async fn save_now(&self) -> bool {
        persist_layout(self.api.as_ref(), &self.status, &self.layout_snapshot()).await
    }

    /// Current positions of every node, as persisted.
    pub fn layout_snapshot(&self) -> Vec<NodePosition> {
        self.nodes.iter().map(CanvasNode::to_position).collect()
    }

    fn show_error(&mut self, err: &EngineError) {
        let message = match err {
            EngineError::Backend(backend) => backend.user_message(),
            other => other.to_string(),
        };
        warn!("canvas action failed: {err}");
        self.banner = Some(message);
    }
}

/// Give every node its stored position, or the next free slot of its type column.
fn place_nodes(
    entries: Vec<(NodeRef, String)>,
    stored: &HashMap<String, Position>,
    config: &CanvasConfig,
) -> Vec<CanvasNode> {
    let mut rows: HashMap<NodeType, usize> = HashMap::new();

    entries
        .into_iter()
        .map(|(node_ref, label)| {
            let id = node_ref.to_node_id();
            let position = stored.get(&id).copied().unwrap_or_else(|| {
                let column = NodeType::KNOWN
                    .iter()
                    .position(|t| *t == node_ref.node_type)
                    .unwrap_or(NodeType::KNOWN.len());
                let row = rows.entry(node_ref.node_type.clone()).or_insert(0);
                let position = Position::new(
                    column as f64 * config.column_spacing,
                    *row as f64 * config.row_spacing,
                );
                *row += 1;
                position
            });
            CanvasNode { id, node_type: node_ref.node_type, label, position }
        })
        .collect()
}
