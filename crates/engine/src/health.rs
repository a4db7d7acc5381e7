//! Periodic backend health polling for status displays.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ontology::OntologyApi;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Latest known backend health.
/// Before the first poll it reads unhealthy with nothing checked yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub version: Option<String>,
    pub error: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

/// Re-fetches `/health` every `interval` and publishes the result.
///
/// Read-only and idempotent; nothing else waits on it.
pub struct HealthMonitor {
    rx: watch::Receiver<HealthSnapshot>,
    task: JoinHandle<()>,
}

impl HealthMonitor {
    pub fn spawn(api: Arc<dyn OntologyApi>, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(HealthSnapshot::default());
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let snapshot = match api.health().await {
                    Ok(status) => HealthSnapshot {
                        healthy: status.is_healthy(),
                        version: status.version,
                        error: None,
                        checked_at: Some(Utc::now()),
                    },
                    Err(err) => HealthSnapshot {
                        healthy: false,
                        version: None,
                        error: Some(err.to_string()),
                        checked_at: Some(Utc::now()),
                    },
                };
                debug!(healthy = snapshot.healthy, "backend health polled");
                tx.send_replace(snapshot);
            }
        });
        Self { rx, task }
    }

    pub fn latest(&self) -> HealthSnapshot {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthSnapshot> {
        self.rx.clone()
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontology::mock::{MockCall, MockOntology};
    use ontology::OntologyError;

    #[test]
    fn unpolled_snapshot_is_unhealthy() {
        let snapshot = HealthSnapshot::default();
        assert!(!snapshot.healthy);
        assert_eq!(snapshot.checked_at, None);
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_and_reports_failures() {
        let mock = MockOntology::new();
        let monitor = HealthMonitor::spawn(Arc::new(mock.clone()), Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(monitor.latest().healthy);

        mock.set_failure(Some(OntologyError::Transport("down".into())));
        tokio::time::sleep(Duration::from_secs(30)).await;
        let latest = monitor.latest();
        assert!(!latest.healthy);
        assert!(latest.error.unwrap().contains("down"));
        assert_eq!(mock.count(|c| matches!(c, MockCall::Health)), 2);
    }
}
