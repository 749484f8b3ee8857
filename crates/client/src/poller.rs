//! Background polling of import progress.
//!
//! While an import runs, [`ProgressPoller`] fetches
//! `GET /imports/{id}/progress` immediately and then once per interval,
//! publishing each snapshot on a [`watch`] channel. Polling stops on a
//! terminal status, on [`ProgressPoller::cancel`], or when the poller is
//! dropped. A failed fetch is logged and polling continues.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use hrms_core::import_pipeline::ImportProgress;
use hrms_core::types::SessionId;

use crate::api::ImportApi;

/// Default delay between progress fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Handle to a running progress-polling task.
///
/// Fetches are sequential, so at most one request is in flight at a time.
pub struct ProgressPoller {
    session_id: SessionId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    updates: watch::Receiver<Option<ImportProgress>>,
}

impl ProgressPoller {
    /// Spawn the polling task on the current tokio runtime.
    pub fn spawn<A>(api: Arc<A>, session_id: SessionId, interval: Duration) -> Self
    where
        A: ImportApi + ?Sized + 'static,
    {
        let cancel = CancellationToken::new();
        let (tx, updates) = watch::channel(None);
        let handle = tokio::spawn(poll_loop(api, session_id, interval, tx, cancel.clone()));
        Self {
            session_id,
            cancel,
            handle,
            updates,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The most recent snapshot, if any fetch has succeeded yet.
    pub fn latest(&self) -> Option<ImportProgress> {
        self.updates.borrow().clone()
    }

    /// A fresh receiver for callers that render progress as it arrives.
    pub fn subscribe(&self) -> watch::Receiver<Option<ImportProgress>> {
        self.updates.clone()
    }

    /// Wait for the next snapshot this handle has not seen yet.
    ///
    /// Returns `None` once the task has stopped and every snapshot has been
    /// seen.
    pub async fn next_update(&mut self) -> Option<ImportProgress> {
        match self.updates.changed().await {
            Ok(()) => self.updates.borrow_and_update().clone(),
            Err(_) => None,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop<A>(
    api: Arc<A>,
    session_id: SessionId,
    interval: Duration,
    tx: watch::Sender<Option<ImportProgress>>,
    cancel: CancellationToken,
) where
    A: ImportApi + ?Sized,
{
    tracing::debug!(%session_id, interval_ms = interval.as_millis() as u64, "Progress polling started");

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(%session_id, "Progress polling cancelled");
                return;
            }
            result = api.get_import_progress(session_id) => result,
        };

        match result {
            Ok(progress) => {
                let terminal = progress.status.is_terminal();
                tracing::debug!(
                    %session_id,
                    status = %progress.status,
                    processed_rows = progress.processed_rows,
                    total_rows = progress.total_rows,
                    "Import progress",
                );
                if tx.send(Some(progress)).is_err() {
                    // Every receiver is gone, including the handle's own.
                    return;
                }
                if terminal {
                    tracing::info!(%session_id, "Import reached a terminal status");
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "Failed to fetch import progress");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(%session_id, "Progress polling cancelled");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
