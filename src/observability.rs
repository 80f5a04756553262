//! Logging setup and per-run counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber; logs go to stderr so stdout only carries URLs.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` enables debug output for this crate.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "warn,hoist=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Task outcome counters for one run
#[derive(Debug, Default)]
pub struct RunStats {
    finished: AtomicU64,
    failed: AtomicU64,
    ignored: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_finished(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_finished", "Metric incremented");
    }

    pub fn task_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tasks_failed", "Metric incremented");
    }

    /// Remote inputs passed through; also counted as finished
    pub fn task_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
        self.task_finished();
    }

    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            finished: self.finished.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatsSnapshot {
    pub finished: u64,
    pub failed: u64,
    pub ignored: u64,
}

impl RunStatsSnapshot {
    pub fn total(&self) -> u64 {
        self.finished + self.failed
    }
}
