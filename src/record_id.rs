//! `RecordId` = `(PageId, slotIndex)` (spec §3).

use std::fmt;

use crate::page_id::PageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_index: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_index: usize) -> Self {
        RecordId { page_id, slot_index }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "RecordId({}, slot={})", self.page_id, self.slot_index)
    }
}
