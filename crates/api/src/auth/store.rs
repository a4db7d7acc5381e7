//! Where super-admin accounts live.
//!
//! Production uses Postgres through the `db` crate; tests and local runs
//! without a database use [`MemoryAdminStore`].

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use db::models::SuperAdminRow;
use db::repository::{impersonations, super_admins};
use db::{DbError, DbPool};
use uuid::Uuid;

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<SuperAdminRow>, DbError>;

    async fn get(&self, id: Uuid) -> Result<SuperAdminRow, DbError>;

    async fn touch_last_login(&self, id: Uuid) -> Result<(), DbError>;

    async fn impersonation_started(&self, admin_id: Uuid, organization_id: &str) -> Result<(), DbError>;

    async fn impersonation_ended(&self, admin_id: Uuid) -> Result<(), DbError>;
}

pub struct PgAdminStore {
    pool: DbPool,
}

impl PgAdminStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for PgAdminStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<SuperAdminRow>, DbError> {
        super_admins::get_by_email(&self.pool, email).await
    }

    async fn get(&self, id: Uuid) -> Result<SuperAdminRow, DbError> {
        super_admins::get_by_id(&self.pool, id).await
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), DbError> {
        super_admins::touch_last_login(&self.pool, id).await
    }

    async fn impersonation_started(&self, admin_id: Uuid, organization_id: &str) -> Result<(), DbError> {
        impersonations::record_start(&self.pool, admin_id, organization_id).await?;
        Ok(())
    }

    async fn impersonation_ended(&self, admin_id: Uuid) -> Result<(), DbError> {
        impersonations::record_end(&self.pool, admin_id).await?;
        Ok(())
    }
}

/// Accounts and impersonation log kept in memory.
#[derive(Default)]
pub struct MemoryAdminStore {
    admins: Mutex<Vec<SuperAdminRow>>,
    /// (admin, organization, still open)
    impersonations: Mutex<Vec<(Uuid, String, bool)>>,
}

impl MemoryAdminStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account with an already hashed password.
    pub fn insert(&self, email: &str, password_hash: &str) -> SuperAdminRow {
        let row = SuperAdminRow {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            password_hash: password_hash.to_string(),
            display_name: None,
            created_at: Utc::now(),
            last_login_at: None,
        };
        lock(&self.admins).push(row.clone());
        row
    }

    /// Delete an account; `false` when it did not exist.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut admins = lock(&self.admins);
        let before = admins.len();
        admins.retain(|row| row.id != id);
        admins.len() != before
    }

    /// Organizations with an open impersonation, per admin.
    pub fn open_impersonations(&self, admin_id: Uuid) -> Vec<String> {
        lock(&self.impersonations)
            .iter()
            .filter(|(id, _, open)| *id == admin_id && *open)
            .map(|(_, org, _)| org.clone())
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<SuperAdminRow>, DbError> {
        let email = email.trim().to_lowercase();
        Ok(lock(&self.admins).iter().find(|a| a.email == email).cloned())
    }

    async fn get(&self, id: Uuid) -> Result<SuperAdminRow, DbError> {
        lock(&self.admins)
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), DbError> {
        let mut admins = lock(&self.admins);
        let admin = admins.iter_mut().find(|a| a.id == id).ok_or(DbError::NotFound)?;
        admin.last_login_at = Some(Utc::now());
        Ok(())
    }

    async fn impersonation_started(&self, admin_id: Uuid, organization_id: &str) -> Result<(), DbError> {
        lock(&self.impersonations).push((admin_id, organization_id.to_string(), true));
        Ok(())
    }

    async fn impersonation_ended(&self, admin_id: Uuid) -> Result<(), DbError> {
        for entry in lock(&self.impersonations).iter_mut().filter(|(id, _, _)| *id == admin_id) {
            entry.2 = false;
        }
        Ok(())
    }
}
