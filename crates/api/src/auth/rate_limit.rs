//! In-memory, per-IP login attempt limiter.
//!
//! Only failed attempts are counted.  The table lives for the lifetime of the
//! process; it is not shared between instances.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

/// Upper bound on addresses tracked at once. Past it the stalest address is
/// evicted to make room.
const MAX_TRACKED_IPS: usize = 10_000;

pub struct LoginRateLimiter {
    max_attempts: usize,
    window: Duration,
    max_tracked: usize,
    failures: Mutex<HashMap<IpAddr, Vec<Instant>>>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self { max_attempts, window, max_tracked: MAX_TRACKED_IPS, failures: Mutex::new(HashMap::new()) }
    }

    /// `Err(retry_after)` when `ip` already used up its failures.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        self.check_at(ip, Instant::now())
    }

    pub fn record_failure(&self, ip: IpAddr) {
        self.record_failure_at(ip, Instant::now());
    }

    /// Forget `ip` after a successful login.
    pub fn reset(&self, ip: IpAddr) {
        self.lock().remove(&ip);
    }

    pub(crate) fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), Duration> {
        let mut failures = self.lock();
        let Some(attempts) = failures.get_mut(&ip) else {
            return Ok(());
        };

        attempts.retain(|at| now.saturating_duration_since(*at) < self.window);
        if attempts.is_empty() {
            failures.remove(&ip);
            return Ok(());
        }

        if attempts.len() >= self.max_attempts {
            let oldest = attempts[0];
            let retry_after = self.window.saturating_sub(now.saturating_duration_since(oldest));
            return Err(retry_after);
        }
        Ok(())
    }

    pub(crate) fn record_failure_at(&self, ip: IpAddr, now: Instant) {
        let mut failures = self.lock();
        failures.retain(|_, attempts| {
            attempts.retain(|at| now.saturating_duration_since(*at) < self.window);
            !attempts.is_empty()
        });

        if !failures.contains_key(&ip) && failures.len() >= self.max_tracked {
            let stalest = failures
                .iter()
                .min_by_key(|(_, attempts)| attempts.last().copied())
                .map(|(ip, _)| *ip);
            if let Some(stalest) = stalest {
                failures.remove(&stalest);
            }
        }

        let attempts = failures.entry(ip).or_default();
        attempts.push(now);
        if attempts.len() >= self.max_attempts {
            warn!(%ip, attempts = attempts.len(), "login attempts exhausted");
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<IpAddr, Vec<Instant>>> {
        // A poisoned table only holds timestamps; keep using it.
        self.failures.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
