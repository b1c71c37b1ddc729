//! Tunable constants for the storage engine (spec §6).
//!
//! `PAGE_SIZE` is the one knob tests are allowed to override at runtime
//! (spec §6: "runtime-overrideable for tests only"); every other constant
//! is fixed for a build.

use std::sync::atomic::{AtomicUsize, Ordering};

static PAGE_SIZE_OVERRIDE: AtomicUsize = AtomicUsize::new(0);

const DEFAULT_PAGE_SIZE: usize = 4096;

/// Bytes reserved on disk for a `Field::Str` value: a 4-byte big-endian
/// length prefix followed by this many NUL-padded bytes.
pub const STRING_MAX_SIZE: usize = 128;

/// Default resident-frame capacity of a `BufferPool`.
pub const DEFAULT_PAGES: usize = 50;

/// Bucket count used by `TableStats` when building a fresh histogram.
pub const NUM_HIST_BINS: usize = 100;

/// Per-page I/O cost unit used by `TableStats::estimate_scan_cost`.
pub const IOCOST_PER_PAGE: f64 = 1000.0;

/// Wall-clock budget a transaction is given to acquire a page lock before
/// `BufferPool::get_page` fails with `TransactionAborted` (spec §5).
pub const LOCK_TIMEOUT_MS: u64 = 3000;

/// Current page size. Defaults to 4096; tests may call
/// `set_page_size_for_test` to shrink it so that small heap files span
/// multiple pages without allocating megabytes of fixtures.
pub fn page_size() -> usize {
    let v = PAGE_SIZE_OVERRIDE.load(Ordering::SeqCst);
    if v == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        v
    }
}

/// Test-only override of `page_size()`. Not thread-safe across tests that
/// run concurrently with a different page size expectation; callers that
/// need isolation should run under `#[test]` with `--test-threads=1` or
/// scope the override to a dedicated process, matching how the teacher's
/// test suite resets global state between cases (`Database::reset`).
pub fn set_page_size_for_test(size: usize) {
    PAGE_SIZE_OVERRIDE.store(size, Ordering::SeqCst);
}

pub fn reset_page_size_for_test() {
    PAGE_SIZE_OVERRIDE.store(0, Ordering::SeqCst);
}
