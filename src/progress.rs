//! Progress tracking for counting runs.
//!
//! Workers record every read they finish; the orchestrator takes snapshots to
//! report progress while the run is in flight and totals once it has ended.
//!
//! # Example
//!
//! ```rust,no_run
//! use kmertally::catalog::load_catalog;
//! use kmertally::input::Input;
//! use kmertally::run::{count_input_with_progress, RunOptions};
//!
//! let catalog = load_catalog("catalogs/targets.csv")?;
//! let input = Input::File("reads.fastq.gz".into());
//! let counts = count_input_with_progress(&catalog, &input, &RunOptions::default(), |progress| {
//!     eprintln!(
//!         "Counted {} reads ({} bases)",
//!         progress.reads_processed, progress.bases_processed
//!     );
//! })?;
//! # Ok::<(), kmertally::error::KmerTallyError>(())
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Progress snapshot during a counting run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Number of reads counted so far.
    pub reads_processed: u64,
    /// Total length of the reads counted so far.
    pub bases_processed: u64,
}

/// Thread-safe progress tracker using atomic counters.
///
/// Counters are observational only; the counts themselves never pass through
/// here.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    reads: AtomicU64,
    bases: AtomicU64,
}

impl ProgressTracker {
    /// Create a new progress tracker with zero counts.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reads: AtomicU64::new(0),
            bases: AtomicU64::new(0),
        }
    }

    /// Record that a read of `bases` bases has been counted.
    pub fn record_read(&self, bases: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bases.fetch_add(bases, Ordering::Relaxed);
    }

    /// Get a snapshot of the current progress.
    ///
    /// While workers are running the snapshot may be stale immediately; after
    /// they have been joined it is exact.
    pub fn snapshot(&self) -> Progress {
        Progress {
            reads_processed: self.reads.load(Ordering::Relaxed),
            bases_processed: self.bases.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_starts_at_zero() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.snapshot(), Progress::default());
    }

    #[test]
    fn tracker_records_reads() {
        let tracker = ProgressTracker::new();
        tracker.record_read(150);
        tracker.record_read(100);

        let progress = tracker.snapshot();
        assert_eq!(progress.reads_processed, 2);
        assert_eq!(progress.bases_processed, 250);
    }

    #[test]
    fn tracker_is_shared_across_threads() {
        let tracker = ProgressTracker::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..250 {
                        tracker.record_read(10);
                    }
                });
            }
        });
        let progress = tracker.snapshot();
        assert_eq!(progress.reads_processed, 1_000);
        assert_eq!(progress.bases_processed, 10_000);
    }
}
