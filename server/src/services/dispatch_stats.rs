//! Counters over request matching and response submission

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::services::response_dispatcher::DispatchOutcome;

#[derive(Debug, Default)]
pub struct DispatchStats {
    requests_seen: AtomicU64,
    requests_unmatched: AtomicU64,
    submissions_succeeded: AtomicU64,
    submissions_failed: AtomicU64,
    last_completed_ms: AtomicI64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchStatsSnapshot {
    pub requests_seen: u64,
    pub requests_unmatched: u64,
    pub submissions_succeeded: u64,
    pub submissions_failed: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl DispatchStats {
    pub fn record_request(&self, matched: usize) {
        self.requests_seen.fetch_add(1, Ordering::Relaxed);
        if matched == 0 {
            self.requests_unmatched.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_outcome(&self, outcome: &DispatchOutcome) {
        let counter = if outcome.result.is_ok() {
            &self.submissions_succeeded
        } else {
            &self.submissions_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.last_completed_ms
            .fetch_max(outcome.completed_at.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        let last_ms = self.last_completed_ms.load(Ordering::Relaxed);
        DispatchStatsSnapshot {
            requests_seen: self.requests_seen.load(Ordering::Relaxed),
            requests_unmatched: self.requests_unmatched.load(Ordering::Relaxed),
            submissions_succeeded: self.submissions_succeeded.load(Ordering::Relaxed),
            submissions_failed: self.submissions_failed.load(Ordering::Relaxed),
            last_completed_at: (last_ms > 0)
                .then(|| Utc.timestamp_millis_opt(last_ms).single())
                .flatten(),
        }
    }
}

/// Drains `outcomes` into `stats` until every sender is dropped.
pub fn spawn_outcome_collector(
    stats: Arc<DispatchStats>,
    mut outcomes: UnboundedReceiver<DispatchOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(outcome) = outcomes.recv().await {
            stats.record_outcome(&outcome);
        }
    })
}
