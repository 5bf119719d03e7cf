//! Skip counters for ACID file filtering.
//!
//! Two layers:
//! - `SkipStats`: per-call sink passed to the resolver (optional). Atomic, so one
//!   instance may be shared by resolutions of different partitions running in
//!   parallel.
//! - process-wide counters (`record_*`, `snapshot()`, `reset()`), always updated.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Per-call skip sink. Write-only from the resolver's point of view.
#[derive(Debug, Default)]
pub struct SkipStats {
    uncommitted_files_skipped: AtomicU64,
    files_superseded_by_newer_base: AtomicU64,
}

/// Plain copy of `SkipStats` counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub uncommitted_files_skipped: u64,
    pub files_superseded_by_newer_base: u64,
}

impl SkipStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_uncommitted(&self) {
        self.uncommitted_files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_superseded(&self) {
        self.files_superseded_by_newer_base
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SkipCounts {
        SkipCounts {
            uncommitted_files_skipped: self.uncommitted_files_skipped.load(Ordering::Relaxed),
            files_superseded_by_newer_base: self
                .files_superseded_by_newer_base
                .load(Ordering::Relaxed),
        }
    }
}

// ----- Process-wide -----
static RESOLUTIONS_TOTAL: AtomicU64 = AtomicU64::new(0);
static RESOLUTIONS_FAILED: AtomicU64 = AtomicU64::new(0);
static FILES_KEPT: AtomicU64 = AtomicU64::new(0);
static UNCOMMITTED_SKIPPED: AtomicU64 = AtomicU64::new(0);
static SUPERSEDED_SKIPPED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub resolutions_total: u64,
    pub resolutions_failed: u64,
    pub files_kept: u64,
    pub uncommitted_skipped: u64,
    pub superseded_skipped: u64,
}

pub fn record_resolution(files_kept: usize) {
    RESOLUTIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
    FILES_KEPT.fetch_add(files_kept as u64, Ordering::Relaxed);
}

pub fn record_resolution_failed() {
    RESOLUTIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
    RESOLUTIONS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_uncommitted_skipped() {
    UNCOMMITTED_SKIPPED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_superseded_skipped() {
    SUPERSEDED_SKIPPED.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        resolutions_total: RESOLUTIONS_TOTAL.load(Ordering::Relaxed),
        resolutions_failed: RESOLUTIONS_FAILED.load(Ordering::Relaxed),
        files_kept: FILES_KEPT.load(Ordering::Relaxed),
        uncommitted_skipped: UNCOMMITTED_SKIPPED.load(Ordering::Relaxed),
        superseded_skipped: SUPERSEDED_SKIPPED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    RESOLUTIONS_TOTAL.store(0, Ordering::Relaxed);
    RESOLUTIONS_FAILED.store(0, Ordering::Relaxed);
    FILES_KEPT.store(0, Ordering::Relaxed);
    UNCOMMITTED_SKIPPED.store(0, Ordering::Relaxed);
    SUPERSEDED_SKIPPED.store(0, Ordering::Relaxed);
}
