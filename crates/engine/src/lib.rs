//! `engine` crate — routing-domain core: node references, graph validation,
//! the canvas editor, layout auto-save and integration flows.

pub mod autosave;
pub mod canvas;
pub mod error;
pub mod health;
pub mod integrations;
pub mod models;
pub mod node_ref;
pub mod validator;

pub use canvas::{create_rule, CanvasConfig, RoutingCanvas};
pub use error::{EngineError, ValidationError};
pub use node_ref::{parse_node_id, NodeRef, NodeType};
pub use validator::{allowed_destinations, validate_connection, Connection};
