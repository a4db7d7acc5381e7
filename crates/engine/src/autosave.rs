//! Debounced layout auto-save.
//!
//! Every drag-end hands the full current position set to [`AutoSaver::schedule`].
//! The write happens once the quiet period has passed with no newer
//! snapshot; each new snapshot cancels and re-arms the timer (trailing edge
//! only, no maximum wait).
//!
//! Manual saves go through [`persist_layout`] directly and are not
//! coordinated with the timer.  Both may race; the backend keeps the last
//! write.

use std::sync::Arc;
use std::time::Duration;

use ontology::models::NodePosition;
use ontology::OntologyApi;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::SaveStatus;

/// Quiet period before a scheduled layout write fires.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1500);

/// Write `nodes` to the backend and drive the status indicator.
///
/// Failures are logged and reflected as [`SaveStatus::Unsaved`]; they are
/// never retried.  Returns whether the write succeeded.
pub async fn persist_layout(
    api: &dyn OntologyApi,
    status: &watch::Sender<SaveStatus>,
    nodes: &[NodePosition],
) -> bool {
    status.send_replace(SaveStatus::Saving);
    match api.save_canvas_layout(nodes).await {
        Ok(()) => {
            debug!(nodes = nodes.len(), "canvas layout saved");
            status.send_replace(SaveStatus::Saved);
            true
        }
        Err(err) => {
            warn!("canvas layout save failed: {err}");
            status.send_replace(SaveStatus::Unsaved);
            false
        }
    }
}

/// Handle to the background debounce task.
///
/// Dropping the handle stops the task; a pending, not-yet-fired snapshot is
/// discarded.
pub struct AutoSaver {
    tx: mpsc::UnboundedSender<Vec<NodePosition>>,
    status: Arc<watch::Sender<SaveStatus>>,
    task: JoinHandle<()>,
}

impl AutoSaver {
    /// Start the debounce task.  Must be called from within a tokio runtime.
    pub fn spawn(
        api: Arc<dyn OntologyApi>,
        status: Arc<watch::Sender<SaveStatus>>,
        quiet_period: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(rx, api, Arc::clone(&status), quiet_period));
        Self { tx, status, task }
    }

    /// Schedule a write of `snapshot`, replacing any pending one.
    pub fn schedule(&self, snapshot: Vec<NodePosition>) {
        if self.tx.send(snapshot).is_err() {
            warn!("auto-save task has stopped; layout change not scheduled");
        }
    }

    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.subscribe()
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Vec<NodePosition>>,
    api: Arc<dyn OntologyApi>,
    status: Arc<watch::Sender<SaveStatus>>,
    quiet_period: Duration,
) {
    let mut pending: Option<Vec<NodePosition>> = None;
    let timer = tokio::time::sleep(quiet_period);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(snapshot) => {
                    pending = Some(snapshot);
                    timer.as_mut().reset(Instant::now() + quiet_period);
                }
                None => break,
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(snapshot) = pending.take() {
                    persist_layout(api.as_ref(), &status, &snapshot).await;
                }
            }
        }
    }
}
