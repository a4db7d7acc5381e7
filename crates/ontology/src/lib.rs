//! `ontology` crate — typed access to the Ontology Service REST API.
//!
//! Every backend call the console makes goes through [`OntologyApi`].  The
//! engine and the HTTP layer only ever see the trait object.

pub mod client;
pub mod error;
pub mod mock;
pub mod models;
pub mod traits;

pub use client::{ClientConfig, HttpOntologyClient, TENANT_HEADER};
pub use error::OntologyError;
pub use traits::{list_typed, OntologyApi, OntologyConnector, TenantScope};
