use crate::keyspace::KeySpace;
use crate::mix::OpKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

pub const STARTED: &str = "Started";
pub const FINISHED: &str = "Finished";

/// Key of the aggregate entry in the error map
pub const TOTAL: &str = "total";

/// Counters and samples shared by every worker and periodic task.
///
/// Counters are atomics and operations are claimed from the budget with a
/// compare-and-swap, so `operations()` never exceeds the budget and every
/// count is exact, whatever the number of workers.
#[derive(Debug, Default)]
pub struct RunState {
    operations: AtomicU64,
    skipped: AtomicU64,
    keys: KeySpace,
    errors: [AtomicU64; OpKind::ALL.len()],
    total_errors: AtomicU64,
    shutdown: AtomicBool,
    shutdown_signal: Notify,
    latency: Mutex<BTreeMap<OpKind, Vec<Duration>>>,
    events: Mutex<BTreeMap<String, DateTime<Utc>>>,
}

/// Point-in-time copy of the counters, for live monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSnapshot {
    pub operations: u64,
    pub records: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub errors: BTreeMap<String, u64>,
}

impl RunState {
    pub fn new(records: u64) -> Self {
        Self {
            keys: KeySpace::new(records),
            ..Self::default()
        }
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Take one operation out of the budget. `false` once it is used up.
    pub fn claim(&self, budget: Option<u64>) -> bool {
        match budget {
            Some(limit) => self
                .operations
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |done| {
                    (done < limit).then_some(done + 1)
                })
                .is_ok(),
            None => {
                self.operations.fetch_add(1, Ordering::AcqRel);
                true
            }
        }
    }

    pub fn has_budget(&self, budget: Option<u64>) -> bool {
        budget.map_or(true, |limit| self.operations() < limit)
    }

    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Acquire)
    }

    pub fn record_error(&self, op: OpKind) {
        self.errors[op.index()].fetch_add(1, Ordering::AcqRel);
        self.total_errors.fetch_add(1, Ordering::AcqRel);
    }

    pub fn error_count(&self, op: OpKind) -> u64 {
        self.errors[op.index()].load(Ordering::Acquire)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Acquire)
    }

    /// Errors keyed by operation tag, plus the `"total"` aggregate.
    pub fn errors(&self) -> BTreeMap<String, u64> {
        let mut out: BTreeMap<String, u64> = OpKind::ALL
            .iter()
            .map(|op| (op.tag().to_string(), self.error_count(*op)))
            .collect();
        out.insert(TOTAL.to_string(), self.total_errors());
        out
    }

    /// An operation that found nothing live to target.
    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::AcqRel);
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.shutdown_signal.notify_waiters();
    }

    /// Resolves once shutdown has been requested, immediately if it already
    /// was.
    pub async fn shutdown_requested(&self) {
        let notified = self.shutdown_signal.notified();
        tokio::pin!(notified);
        // register before checking the flag so a concurrent request is not lost
        notified.as_mut().enable();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Whether workers should start another batch.
    pub fn should_continue(&self, budget: Option<u64>) -> bool {
        !self.is_shutdown() && self.has_budget(budget)
    }

    pub async fn record_latency(&self, op: OpKind, elapsed: Duration) {
        self.latency.lock().await.entry(op).or_default().push(elapsed);
    }

    pub async fn latency_samples(&self) -> BTreeMap<OpKind, Vec<Duration>> {
        self.latency.lock().await.clone()
    }

    pub async fn mark(&self, event: &str) {
        self.events.lock().await.insert(event.to_string(), Utc::now());
    }

    pub async fn events(&self) -> BTreeMap<String, DateTime<Utc>> {
        self.events.lock().await.clone()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            operations: self.operations(),
            records: self.keys.records(),
            deleted: self.keys.deleted(),
            skipped: self.skipped(),
            errors: self.errors(),
        }
    }
}
