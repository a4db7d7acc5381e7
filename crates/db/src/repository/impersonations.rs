//! Impersonation audit trail.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::ImpersonationEventRow, DbError};

/// Record that `super_admin_id` started impersonating `organization_id`.
pub async fn record_start(
    pool: &PgPool,
    super_admin_id: Uuid,
    organization_id: &str,
) -> Result<ImpersonationEventRow, DbError> {
    let row = sqlx::query_as::<_, ImpersonationEventRow>(
        r#"
        INSERT INTO impersonation_events (id, super_admin_id, organization_id, started_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, super_admin_id, organization_id, started_at, ended_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(super_admin_id)
    .bind(organization_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Close every open impersonation of `super_admin_id`.
///
/// Returns how many events were closed.
pub async fn record_end(pool: &PgPool, super_admin_id: Uuid) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE impersonation_events SET ended_at = $1 \
         WHERE super_admin_id = $2 AND ended_at IS NULL",
    )
    .bind(Utc::now())
    .bind(super_admin_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
