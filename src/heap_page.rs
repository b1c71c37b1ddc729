//! `HeapPage`: a fixed-size page holding a header bitmap plus a slot array
//! of tuples (spec §3, §4.2, §6).

use std::io::Cursor;

use crate::config;
use crate::error::{SmallDbError, SmallResult};
use crate::page_id::PageId;
use crate::record_id::RecordId;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;

/// `floor(page_size * 8 / (tuple_width * 8 + 1))`.
fn num_slots(tuple_width: usize) -> usize {
    let page_bits = config::page_size() * 8;
    page_bits / (tuple_width * 8 + 1)
}

fn header_size(slots: usize) -> usize {
    (slots + 7) / 8
}

fn is_bit_set(header: &[u8], i: usize) -> bool {
    let byte = header[i / 8];
    let bit = i % 8;
    (byte >> bit) & 1 != 0
}

fn set_bit(header: &mut [u8], i: usize) {
    header[i / 8] |= 1 << (i % 8);
}

fn clear_bit(header: &mut [u8], i: usize) {
    header[i / 8] &= !(1 << (i % 8));
}

#[derive(Debug)]
pub struct HeapPage {
    pid: PageId,
    td: TupleDesc,
    num_slots: usize,
    header: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    old_data: Vec<u8>,
    dirtier: Option<TransactionId>,
}

impl HeapPage {
    /// Parses a page image previously produced by `get_page_data`. Unused
    /// slots are skipped (their tuple-width span is advanced over but left
    /// empty).
    pub fn new(pid: PageId, td: TupleDesc, bytes: &[u8]) -> SmallResult<Self> {
        if bytes.len() != config::page_size() {
            return Err(SmallDbError::format_error(format!(
                "page image is {} bytes, expected {}",
                bytes.len(),
                config::page_size()
            )));
        }

        let tuple_width = td.size();
        let slots = num_slots(tuple_width);
        let hsize = header_size(slots);

        let header = bytes[0..hsize].to_vec();

        let mut tuples = Vec::with_capacity(slots);
        let slot_data = &bytes[hsize..];
        let mut pos = 0usize;
        for slot in 0..slots {
            let slot_bytes = &slot_data[pos..pos + tuple_width];
            if is_bit_set(&header, slot) {
                let mut field_cursor = Cursor::new(slot_bytes);
                let mut t = Tuple::new(td.clone());
                for i in 0..td.num_fields() {
                    let ty = td.field_type(i)?;
                    let field = ty.parse(&mut field_cursor)?;
                    t.set_field(i, field)?;
                }
                t.set_record_id(RecordId::new(pid, slot));
                tuples.push(Some(t));
            } else {
                tuples.push(None);
            }
            pos += tuple_width;
        }

        Ok(HeapPage {
            pid,
            td,
            num_slots: slots,
            header,
            tuples,
            old_data: bytes.to_vec(),
            dirtier: None,
        })
    }

    /// The zero-filled image of a freshly allocated, empty page of this
    /// shape (used by `HeapFile` when it grows a table by one page).
    pub fn empty_page_data() -> Vec<u8> {
        vec![0u8; config::page_size()]
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn is_slot_used(&self, i: usize) -> bool {
        is_bit_set(&self.header, i)
    }

    pub fn get_num_empty_slots(&self) -> usize {
        (0..self.num_slots).filter(|&i| !self.is_slot_used(i)).count()
    }

    /// Serializes header then each slot (unused slots emit
    /// tuple-width zero bytes), zero-padded to `page_size`.
    pub fn get_page_data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(config::page_size());
        out.extend_from_slice(&self.header);

        let tuple_width = self.td.size();
        for slot in 0..self.num_slots {
            match &self.tuples[slot] {
                Some(t) => {
                    for field in t.fields() {
                        field.serialize(&mut out).expect("serialize into Vec cannot fail");
                    }
                }
                None => out.extend(std::iter::repeat(0u8).take(tuple_width)),
            }
        }

        out.resize(config::page_size(), 0);
        out
    }

    /// Finds the lowest unused slot, assigns `t`'s `RecordId`, and stores
    /// it. Fails with `PageFull` if every slot is occupied.
    pub fn insert_tuple(&mut self, mut t: Tuple) -> SmallResult<()> {
        let slot = (0..self.num_slots)
            .find(|&i| !self.is_slot_used(i))
            .ok_or_else(|| SmallDbError::page_full(format!("page {} has no empty slot", self.pid)))?;

        set_bit(&mut self.header, slot);
        t.set_record_id(RecordId::new(self.pid, slot));
        self.tuples[slot] = Some(t);
        Ok(())
    }

    /// Finds the slot whose `RecordId` matches `t`'s and whose stored tuple
    /// equals `t`; clears it. Fails with `NotOnPage` otherwise.
    pub fn delete_tuple(&mut self, t: &Tuple) -> SmallResult<()> {
        let rid = t
            .record_id()
            .ok_or_else(|| SmallDbError::not_on_page("tuple has no RecordId"))?;
        if rid.page_id != self.pid {
            return Err(SmallDbError::not_on_page(format!(
                "tuple's page {} does not match this page {}",
                rid.page_id, self.pid
            )));
        }
        let slot = rid.slot_index;
        if slot >= self.num_slots || !self.is_slot_used(slot) {
            return Err(SmallDbError::not_on_page(format!(
                "slot {} is not occupied on page {}",
                slot, self.pid
            )));
        }
        if self.tuples[slot].as_ref() != Some(t) {
            return Err(SmallDbError::not_on_page(format!(
                "tuple at slot {} does not match the tuple being deleted",
                slot
            )));
        }

        clear_bit(&mut self.header, slot);
        self.tuples[slot] = None;
        Ok(())
    }

    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        if dirty {
            self.dirtier = Some(tid);
        } else {
            self.dirtier = None;
        }
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirtier
    }

    /// Clones the current on-disk image into `old_data`, for later
    /// rollback via `get_before_image`.
    pub fn set_before_image(&mut self) {
        self.old_data = self.get_page_data();
    }

    pub fn get_before_image(&self) -> HeapPage {
        HeapPage::new(self.pid, self.td.clone(), &self.old_data)
            .expect("before-image bytes were produced by this crate and must parse")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().filter_map(|t| t.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Type};
    use crate::tuple_desc::FieldItem;

    fn two_int_desc() -> TupleDesc {
        TupleDesc::new(vec![
            FieldItem::new(Type::Int, "a"),
            FieldItem::new(Type::Int, "b"),
        ])
    }

    fn tuple(td: &TupleDesc, a: i32, b: i32) -> Tuple {
        let mut t = Tuple::new(td.clone());
        t.set_field(0, Field::Int(a)).unwrap();
        t.set_field(1, Field::Int(b)).unwrap();
        t
    }

    #[test]
    fn round_trip_law() {
        let td = two_int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::new(pid, td.clone(), &HeapPage::empty_page_data()).unwrap();
        page.insert_tuple(tuple(&td, 1, 2)).unwrap();
        page.insert_tuple(tuple(&td, 3, 4)).unwrap();

        let bytes = page.get_page_data();
        let round_tripped = HeapPage::new(pid, td, &bytes).unwrap();
        assert_eq!(round_tripped.get_page_data(), bytes);
    }

    #[test]
    fn slot_header_consistency() {
        let td = two_int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::new(pid, td.clone(), &HeapPage::empty_page_data()).unwrap();
        assert!(!page.is_slot_used(0));
        page.insert_tuple(tuple(&td, 1, 2)).unwrap();
        assert!(page.is_slot_used(0));
        assert_eq!(page.get_num_empty_slots(), page.num_slots() - 1);
    }

    #[test]
    fn insert_assigns_record_id() {
        let td = two_int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::new(pid, td.clone(), &HeapPage::empty_page_data()).unwrap();
        page.insert_tuple(tuple(&td, 1, 2)).unwrap();
        let stored = page.iter().next().unwrap();
        let rid = stored.record_id().unwrap();
        assert_eq!(rid.page_id, pid);
        assert!(page.is_slot_used(rid.slot_index));
    }

    #[test]
    fn page_full_when_no_empty_slot() {
        let td = two_int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::new(pid, td.clone(), &HeapPage::empty_page_data()).unwrap();
        let slots = page.num_slots();
        for i in 0..slots {
            page.insert_tuple(tuple(&td, i as i32, i as i32)).unwrap();
        }
        let err = page.insert_tuple(tuple(&td, 0, 0)).unwrap_err();
        assert!(matches!(err, SmallDbError::PageFull(_)));
    }

    #[test]
    fn delete_unknown_tuple_is_not_on_page() {
        let td = two_int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::new(pid, td.clone(), &HeapPage::empty_page_data()).unwrap();
        let mut stray = tuple(&td, 9, 9);
        stray.set_record_id(RecordId::new(pid, 0));
        assert!(matches!(page.delete_tuple(&stray), Err(SmallDbError::NotOnPage(_))));
    }

    #[test]
    fn insert_then_delete_frees_slot() {
        let td = two_int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::new(pid, td.clone(), &HeapPage::empty_page_data()).unwrap();
        page.insert_tuple(tuple(&td, 1, 2)).unwrap();
        let stored = page.iter().next().unwrap().clone();
        page.delete_tuple(&stored).unwrap();
        assert_eq!(page.get_num_empty_slots(), page.num_slots());
    }

    #[test]
    fn before_image_round_trip() {
        let td = two_int_desc();
        let pid = PageId::new(1, 0);
        let mut page = HeapPage::new(pid, td.clone(), &HeapPage::empty_page_data()).unwrap();
        page.set_before_image();
        page.insert_tuple(tuple(&td, 1, 2)).unwrap();
        let before = page.get_before_image();
        assert_eq!(before.get_num_empty_slots(), before.num_slots());
    }
}
