//! Per-item outcomes and the run-level tally.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// The storage location could not be split into container, host and path.
    MalformedLocation(String),
    AccessDenied,
    Forbidden,
    MaxRetriesExceeded,
    /// Dispatch stopped before this item was attempted.
    Cancelled,
    WorkerPanicked,
}

/// Terminal state of one catalog table in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Name as echoed by the lake; differs from the desired name when the lake auto-renamed.
    Created { name: String },
    SkippedExisting,
    SkippedUnsupportedFormat,
    SkippedNotExternal,
    Failed(FailureReason),
}

impl Outcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Outcome::Created { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Outcome::SkippedExisting
                | Outcome::SkippedUnsupportedFormat
                | Outcome::SkippedNotExternal
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub schema_name: String,
    pub table_name: String,
    pub outcome: Outcome,
    /// Create calls issued for this item, rate-limited ones included.
    pub calls: u32,
    /// 429 answers that were waited out.
    pub rate_limit_waits: u32,
}

impl ItemReport {
    pub fn without_calls(schema_name: &str, table_name: &str, outcome: Outcome) -> Self {
        Self {
            schema_name: schema_name.to_string(),
            table_name: table_name.to_string(),
            outcome,
            calls: 0,
            rate_limit_waits: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Counters shared by all creation workers.
#[derive(Debug, Default)]
pub struct Tally {
    created: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl Tally {
    pub fn record(&self, outcome: &Outcome) {
        let counter = if outcome.is_created() {
            &self.created
        } else if outcome.is_skipped() {
            &self.skipped
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SummaryCounts {
        SummaryCounts {
            created: self.created.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Everything a run produced, items in catalog order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub summary: SummaryCounts,
    pub items: Vec<ItemReport>,
}
