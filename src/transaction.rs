//! `TransactionId`: an opaque, monotonically increasing identifier tagging
//! every operation belonging to one transaction.
//!
//! Grounded on the teacher's `transaction/tx.rs::Transaction`, minus the
//! commit/abort orchestration that this crate places on `BufferPool`
//! (spec §4.4) rather than on the id type itself.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Reconstructs a `TransactionId` from a raw value previously produced
    /// by `raw()` (used when replaying log records, which persist only the
    /// raw id).
    pub fn from_raw(raw: u64) -> Self {
        TransactionId(raw)
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = TransactionId::new();
        let b = TransactionId::new();
        assert!(b.raw() > a.raw());
    }
}
