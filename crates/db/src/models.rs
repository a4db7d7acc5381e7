//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models; they carry no domain behaviour.
//! Tenant entities never land here; they belong to the Ontology Service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// super_admins
// ---------------------------------------------------------------------------

/// A platform operator allowed into the super-admin console.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SuperAdminRow {
    pub id: Uuid,
    pub email: String,
    /// bcrypt hash; never serialised back to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// impersonation_events
// ---------------------------------------------------------------------------

/// Audit record written whenever a super admin starts impersonating a tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImpersonationEventRow {
    pub id: Uuid,
    pub super_admin_id: Uuid,
    pub organization_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}
