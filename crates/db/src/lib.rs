//! `db` crate — Postgres storage for the super-admin surface.
//!
//! Holds the console's own tables only: super-admin accounts and the
//! impersonation audit trail.  Tenant data lives in the Ontology Service.

pub mod error;
pub mod models;
pub mod pool;
pub mod repository;

pub use error::DbError;
pub use models::{ImpersonationEventRow, SuperAdminRow};
pub use pool::DbPool;
