//! Password checks for super-admin login.
//!
//! Every attempt pays for one bcrypt verification. When the email is unknown
//! the password is checked against a placeholder hash made at startup, so
//! response time does not reveal which emails have accounts.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

pub struct PasswordChecker {
    placeholder: String,
    checks: AtomicU64,
}

impl PasswordChecker {
    /// Hashes a random placeholder at `cost`; blocks for one bcrypt round.
    pub fn new(cost: u32) -> Result<Self, ApiError> {
        let placeholder = bcrypt::hash(Uuid::new_v4().to_string(), cost)
            .map_err(|e| ApiError::Internal(format!("cannot create placeholder hash: {e}")))?;
        Ok(Self { placeholder, checks: AtomicU64::new(0) })
    }

    /// `true` only when `stored` is present and matches `password`.
    pub async fn verify(&self, password: &str, stored: Option<&str>) -> Result<bool, ApiError> {
        let hash = stored.unwrap_or(&self.placeholder).to_string();
        let password = password.to_string();
        self.checks.fetch_add(1, Ordering::Relaxed);

        // bcrypt is CPU bound; run it off the async workers.
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ApiError::Internal(format!("password check panicked: {e}")))?;

        let matched = outcome.unwrap_or_else(|e| {
            warn!("stored password hash is unreadable: {e}");
            false
        });
        Ok(matched && stored.is_some())
    }

    /// Number of bcrypt verifications run so far.
    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }
}
