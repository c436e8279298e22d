//! Countdown to the producer's next scheduled update.
//!
//! A repeating one-second tick recomputes the remaining time against a
//! target timestamp. While positive it emits `(minutes, seconds)`; once
//! non-positive it emits a terminal `DueNow` and the task stops. At most
//! one countdown is alive: starting a new one aborts the previous task.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

/// One countdown observation. Minutes wrap at the hour, matching the
/// dashboard's `Xm Ys` display format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CountdownTick {
    Remaining { minutes: u64, seconds: u64 },
    DueNow,
}

/// Remaining time at `now` toward `target`.
pub fn remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> CountdownTick {
    let diff = (target - now).num_seconds();
    if diff <= 0 {
        return CountdownTick::DueNow;
    }
    let total = diff as u64;
    CountdownTick::Remaining {
        minutes: (total % 3600) / 60,
        seconds: total % 60,
    }
}

/// Owns the single active countdown task.
#[derive(Debug, Default)]
pub struct CountdownScheduler {
    active: Option<JoinHandle<()>>,
}

impl CountdownScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking toward `target`, replacing any active countdown.
    /// `on_tick` receives one observation per second and exactly one
    /// terminal `DueNow`.
    pub fn start<F>(&mut self, target: DateTime<Utc>, on_tick: F)
    where
        F: Fn(CountdownTick) + Send + 'static,
    {
        if let Some(prev) = self.active.take() {
            prev.abort();
        }
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                ticker.tick().await;
                let tick = remaining(target, Utc::now());
                on_tick(tick);
                if tick == CountdownTick::DueNow {
                    break;
                }
            }
        });
        self.active = Some(handle);
    }

    /// Stop the active countdown, if any.
    pub fn cancel(&mut self) {
        if let Some(prev) = self.active.take() {
            prev.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CountdownScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
