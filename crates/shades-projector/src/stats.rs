use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the sync core
#[derive(Debug, Default)]
pub struct SyncStats {
    deltas_applied: AtomicU64,
    recovery_loads: AtomicU64,
    failed_ingestions: AtomicU64,
    reloads: AtomicU64,
    failed_reloads: AtomicU64,
    last_reload_at: Mutex<Option<DateTime<Utc>>>,
}

impl SyncStats {
    pub(crate) fn record_delta(&self) {
        self.deltas_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recovery(&self) {
        self.recovery_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ingest_failure(&self) {
        self.failed_ingestions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reload(&self, success: bool) {
        if success {
            self.reloads.fetch_add(1, Ordering::Relaxed);
            *self.last_reload_at.lock() = Some(Utc::now());
        } else {
            self.failed_reloads.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            deltas_applied: self.deltas_applied.load(Ordering::Relaxed),
            recovery_loads: self.recovery_loads.load(Ordering::Relaxed),
            failed_ingestions: self.failed_ingestions.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
            failed_reloads: self.failed_reloads.load(Ordering::Relaxed),
            last_reload_at: *self.last_reload_at.lock(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatsSnapshot {
    pub deltas_applied: u64,
    pub recovery_loads: u64,
    pub failed_ingestions: u64,
    pub reloads: u64,
    pub failed_reloads: u64,
    pub last_reload_at: Option<DateTime<Utc>>,
}
