//! Quiz clock state and the background ticker that drives it.

use std::time::Duration;

use quiz_core::model::{TimerMode, TimerSnapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Result of advancing the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Clock advanced; carries the new reading.
    Running { value_secs: u32 },
    /// A countdown reached zero on this tick.
    Expired,
    /// Nothing to do: the countdown already expired or the timer is stopped.
    Idle,
}

/// Countdown or count-up clock of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizTimer {
    snapshot: TimerSnapshot,
    stopped: bool,
}

impl QuizTimer {
    #[must_use]
    pub fn from_snapshot(snapshot: TimerSnapshot) -> Self {
        Self {
            snapshot,
            stopped: false,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot
    }

    /// Remaining seconds for a countdown, elapsed seconds for a count-up.
    #[must_use]
    pub fn value_secs(&self) -> u32 {
        self.snapshot.value_secs
    }

    #[must_use]
    pub fn mode(&self) -> TimerMode {
        self.snapshot.mode
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.snapshot.is_expired()
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Advances the clock by `secs`. `Expired` is reported exactly once.
    pub fn tick(&mut self, secs: u32) -> TimerTick {
        if self.stopped || self.is_expired() {
            return TimerTick::Idle;
        }
        match self.snapshot.mode {
            TimerMode::Countdown => {
                self.snapshot.value_secs = self.snapshot.value_secs.saturating_sub(secs);
                if self.snapshot.value_secs == 0 {
                    TimerTick::Expired
                } else {
                    TimerTick::Running {
                        value_secs: self.snapshot.value_secs,
                    }
                }
            }
            TimerMode::CountUp => {
                self.snapshot.value_secs = self.snapshot.value_secs.saturating_add(secs);
                TimerTick::Running {
                    value_secs: self.snapshot.value_secs,
                }
            }
        }
    }
}

/// Proof that the timer expired while armed at a given generation.
///
/// Finishing or restarting the session bumps the generation, so a token
/// produced before that point no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryToken {
    pub(crate) generation: u64,
}

/// Background task emitting elapsed seconds on a fixed period.
///
/// The task stops when the handle is dropped or the receiver goes away.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawns the ticker on the current runtime.
    ///
    /// Each message carries the whole seconds elapsed since the previous one.
    #[must_use]
    pub fn spawn(period: Duration) -> (Self, mpsc::Receiver<u32>) {
        let (tx, rx) = mpsc::channel(16);
        let step = u32::try_from(period.as_secs()).unwrap_or(u32::MAX).max(1);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(step).await.is_err() {
                    break;
                }
            }
        });
        (Self { handle }, rx)
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
