use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard, TryLockError};
use varsel_domain::ReminderKind;

/// Scheduler bookkeeping: per-kind last-run instants, cumulative counters
/// and the per-kind in-flight guards. Only the trigger scheduler mutates it;
/// everything else reads `snapshot()`. All of it is process-local and resets
/// on restart.
pub struct SchedulerState {
    stats: Mutex<Stats>,
    // One guard per kind keeps firings of the same kind from overlapping
    // while leaving unrelated kinds independent.
    guards: HashMap<ReminderKind, AsyncMutex<()>>,
}

#[derive(Default)]
struct Stats {
    last_run: HashMap<ReminderKind, DateTime<Utc>>,
    sent: u64,
    errors: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub last_run: Vec<(ReminderKind, Option<DateTime<Utc>>)>,
    pub sent: u64,
    pub errors: u64,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(Stats::default()),
            guards: ReminderKind::ALL
                .iter()
                .map(|kind| (*kind, AsyncMutex::new(())))
                .collect(),
        }
    }

    /// Claims the in-flight slot for `kind`. Fails when a firing of the same
    /// kind is still running; the caller must skip instead of waiting.
    pub fn try_begin(&self, kind: ReminderKind) -> Result<MutexGuard<'_, ()>, TryLockError> {
        self.guards
            .get(&kind)
            .expect("Every reminder kind has a guard")
            .try_lock()
    }

    /// Records a completed firing: sends and terminal failures from the
    /// per-recipient outcomes. Retries are not counted.
    pub fn record_run(&self, kind: ReminderKind, at: DateTime<Utc>, sent: u64, errors: u64) {
        let mut stats = self.stats.lock().unwrap();
        stats.last_run.insert(kind, at);
        stats.sent += sent;
        stats.errors += errors;
    }

    /// Records a firing that aborted before any send was attempted.
    pub fn record_aborted(&self, kind: ReminderKind, at: DateTime<Utc>) {
        let mut stats = self.stats.lock().unwrap();
        stats.last_run.insert(kind, at);
        stats.errors += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let stats = self.stats.lock().unwrap();
        StatsSnapshot {
            last_run: ReminderKind::ALL
                .iter()
                .map(|kind| (*kind, stats.last_run.get(kind).copied()))
                .collect(),
            sent: stats.sent,
            errors: stats.errors,
        }
    }
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self::new()
    }
}
