//! Super-admin account operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{models::SuperAdminRow, DbError};

const COLUMNS: &str = "id, email, password_hash, display_name, created_at, last_login_at";

/// Insert a new super admin.
///
/// `email` is stored lower-cased; `password_hash` must already be a bcrypt hash.
pub async fn create_super_admin(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    display_name: Option<&str>,
) -> Result<SuperAdminRow, DbError> {
    let sql = format!(
        "INSERT INTO super_admins (id, email, password_hash, display_name, created_at) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {COLUMNS}"
    );

    let row = sqlx::query_as::<_, SuperAdminRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .bind(display_name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Duplicate("email"),
            _ => DbError::Sqlx(err),
        })?;

    Ok(row)
}

/// Look up a super admin by email (case-insensitive).
pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<SuperAdminRow>, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM super_admins WHERE email = $1");
    let row = sqlx::query_as::<_, SuperAdminRow>(&sql)
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Fetch a single super admin by primary key.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<SuperAdminRow, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM super_admins WHERE id = $1");
    sqlx::query_as::<_, SuperAdminRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Stamp `last_login_at` after a successful login.
pub async fn touch_last_login(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE super_admins SET last_login_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
