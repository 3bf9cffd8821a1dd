//! Run statistics shared by the coordinator, workers and collector

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Live counters for a run
#[derive(Debug, Default)]
pub struct RunStats {
    /// References returned by discovery
    pub discovered: AtomicUsize,
    /// References already present in the storage root
    pub skipped: AtomicUsize,
    /// Exports handed to the worker pool
    pub submitted: AtomicUsize,
    /// Objects committed to the storage root
    pub committed: AtomicUsize,
    /// Objects that failed for any reason
    pub failed: AtomicUsize,
    /// Subset of `failed` caused by badly shaped export packages
    pub format_failures: AtomicUsize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn summary(&self, elapsed: Duration) -> RunSummary {
        RunSummary {
            discovered: self.discovered.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            format_failures: self.format_failures.load(Ordering::Relaxed),
            elapsed,
        }
    }

    /// One-line status for progress displays
    pub fn progress_message(&self) -> String {
        format!(
            "{} discovered, {} skipped, {} committed, {} failed",
            self.discovered.load(Ordering::Relaxed),
            self.skipped.load(Ordering::Relaxed),
            self.committed.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }
}

/// Final counts of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub skipped: usize,
    pub submitted: usize,
    pub committed: usize,
    pub failed: usize,
    pub format_failures: usize,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn objects_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.committed as f64 / secs
        } else {
            0.0
        }
    }

    /// At least one export package did not have the expected shape
    pub fn has_format_failures(&self) -> bool {
        self.format_failures > 0
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
