//! Background persistence of attempt snapshots.
//!
//! Snapshots go through a `watch` channel, so only the newest one waits at any
//! time and older pending snapshots are dropped. The worker saves one snapshot
//! at a time, in the order they were enqueued.

use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::Attempt;
use storage::repository::{AttemptRepository, SaveAck};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Coarse persistence state shown next to the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaveState {
    pub status: SaveStatus,
    /// Highest revision the worker has finished with (stored or superseded).
    pub settled_revision: Option<u64>,
    pub last_error: Option<String>,
    /// Consecutive failures of the snapshot currently being retried.
    pub failures: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `failures` (1-based), doubling up to `max_delay`.
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay)
    }
}

/// Handle to the autosave worker of one session.
#[derive(Debug)]
pub struct AttemptSaver {
    snapshots: watch::Sender<Option<Attempt>>,
    state: watch::Receiver<SaveState>,
    worker: JoinHandle<()>,
}

impl AttemptSaver {
    /// Spawns the worker on the current runtime.
    #[must_use]
    pub fn spawn(repo: Arc<dyn AttemptRepository>, policy: RetryPolicy) -> Self {
        let (snapshots, rx) = watch::channel(None);
        let (state_tx, state) = watch::channel(SaveState::default());
        let worker = tokio::spawn(run_worker(repo, policy, rx, state_tx));
        Self {
            snapshots,
            state,
            worker,
        }
    }

    /// Queues a snapshot, replacing any snapshot that has not been picked up yet.
    pub fn enqueue(&self, attempt: Attempt) {
        self.snapshots.send_replace(Some(attempt));
    }

    #[must_use]
    pub fn state(&self) -> SaveState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveState> {
        self.state.clone()
    }

    /// Waits until `revision` (or a later one) has settled, or saving failed for good.
    pub async fn settled(&self, revision: u64) -> SaveState {
        let mut rx = self.state.clone();
        let reached = rx
            .wait_for(|s| {
                s.settled_revision.is_some_and(|r| r >= revision) || s.status == SaveStatus::Failed
            })
            .await
            .map(|s| s.clone());
        match reached {
            Ok(state) => state,
            Err(_) => rx.borrow().clone(),
        }
    }

    /// Stops accepting snapshots, lets the worker drain the pending one and returns the final state.
    pub async fn shutdown(self) -> SaveState {
        let Self {
            snapshots,
            state,
            worker,
        } = self;
        drop(snapshots);
        if let Err(err) = worker.await {
            warn!(error = %err, "autosave worker ended abnormally");
        }
        state.borrow().clone()
    }
}

async fn run_worker(
    repo: Arc<dyn AttemptRepository>,
    policy: RetryPolicy,
    mut rx: watch::Receiver<Option<Attempt>>,
    state: watch::Sender<SaveState>,
) {
    let mut pending_change = false;
    'snapshots: loop {
        if !pending_change && rx.changed().await.is_err() {
            break;
        }
        pending_change = false;

        let Some(attempt) = rx.borrow_and_update().clone() else {
            continue;
        };

        state.send_modify(|s| s.status = SaveStatus::Saving);
        let mut failures = 0_u32;
        loop {
            match repo.save_attempt(&attempt).await {
                Ok(ack) => {
                    if ack == SaveAck::Superseded {
                        debug!(revision = attempt.revision(), "snapshot superseded in storage");
                    }
                    state.send_modify(|s| {
                        s.status = SaveStatus::Idle;
                        s.settled_revision = s.settled_revision.max(Some(attempt.revision()));
                        s.last_error = None;
                        s.failures = 0;
                    });
                    break;
                }
                Err(err) => {
                    failures += 1;
                    warn!(
                        quiz_id = %attempt.quiz_id(),
                        revision = attempt.revision(),
                        failures,
                        error = %err,
                        "attempt save failed"
                    );
                    state.send_modify(|s| {
                        s.status = SaveStatus::Failed;
                        s.last_error = Some(err.to_string());
                        s.failures = failures;
                    });
                    if failures >= policy.max_attempts {
                        break;
                    }

                    let delay = policy.delay_for(failures);
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        changed = rx.changed() => {
                            if changed.is_ok() {
                                // A newer snapshot replaces the one being retried.
                                pending_change = true;
                                continue 'snapshots;
                            }
                            tokio::time::sleep(delay).await;
                        }
                    }
                    state.send_modify(|s| s.status = SaveStatus::Saving);
                }
            }
        }
    }
}
