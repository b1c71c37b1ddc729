//! Integration tests for the end-to-end scenarios named in the storage
//! engine's testable-properties section: a small heap round-trip, NO STEAL
//! eviction, lock acquisition timeout, and abort rollback.

use std::sync::Arc;

use gradedb::buffer_pool::BufferPool;
use gradedb::catalog::Catalog;
use gradedb::config;
use gradedb::field::{Field, Type};
use gradedb::heap_file::HeapFile;
use gradedb::log_file::LogFile;
use gradedb::transaction::TransactionId;
use gradedb::tuple::Tuple;
use gradedb::tuple_desc::{FieldItem, TupleDesc};
use gradedb::types::Permission;

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

/// Scenario 1: insert three tuples into an empty heap file; a scan yields
/// exactly those three tuples, in insertion order.
#[test]
fn small_heap_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let td = two_int_desc();
    let hf = HeapFile::new(dir.path().join("t.dat"), td.clone()).unwrap();
    let catalog = Arc::new(Catalog::new());
    let hf = catalog.add_table("t", hf);
    let bp = BufferPool::new(10, Arc::clone(&catalog));
    let tid = TransactionId::new();

    for (a, b) in [(1, 2), (3, 4), (5, 6)] {
        bp.insert_tuple(tid, hf.table_id(), tuple(&td, a, b)).unwrap();
    }

    let mut iter = hf.iter(&bp, tid);
    iter.open().unwrap();
    let got: Vec<(i32, i32)> = (&mut iter)
        .map(|r| r.unwrap())
        .map(|t| {
            let a = match t.get_field(0).unwrap() {
                Field::Int(v) => *v,
                _ => unreachable!(),
            };
            let b = match t.get_field(1).unwrap() {
                Field::Int(v) => *v,
                _ => unreachable!(),
            };
            (a, b)
        })
        .collect();

    assert_eq!(got, vec![(1, 2), (3, 4), (5, 6)]);
}

/// Scenario 2: with capacity 2, loading a third clean page evicts one of
/// the first two; once a resident page is dirtied, loading past capacity
/// with every other resident page also dirty raises cache-full.
#[test]
fn eviction_respects_no_steal() {
    let dir = tempfile::tempdir().unwrap();
    let td = two_int_desc();
    let hf = HeapFile::new(dir.path().join("t.dat"), td.clone()).unwrap();
    let catalog = Arc::new(Catalog::new());
    let hf = catalog.add_table("t", hf);
    let bp = BufferPool::new(2, Arc::clone(&catalog));
    let tid = TransactionId::new();

    // Give the table four pages' worth of room by writing four empty pages
    // directly (bypassing the pool, as HeapFile::read_page/write_page do
    // for tests).
    for page_number in 0..4 {
        let pid = gradedb::page_id::PageId::new(hf.table_id(), page_number);
        let page = gradedb::heap_page::HeapPage::new(pid, td.clone(), &gradedb::heap_page::HeapPage::empty_page_data()).unwrap();
        hf.write_page(&page).unwrap();
    }
    let p0 = gradedb::page_id::PageId::new(hf.table_id(), 0);
    let p1 = gradedb::page_id::PageId::new(hf.table_id(), 1);
    let p2 = gradedb::page_id::PageId::new(hf.table_id(), 2);
    let p3 = gradedb::page_id::PageId::new(hf.table_id(), 3);

    bp.get_page(tid, p0, Permission::ReadOnly).unwrap();
    bp.get_page(tid, p1, Permission::ReadOnly).unwrap();
    bp.get_page(tid, p2, Permission::ReadOnly).unwrap();
    assert_eq!(bp.num_resident_pages(), 2);
    assert!(bp.is_resident(p2));
    let survivor = if bp.is_resident(p0) { p0 } else { p1 };

    // Dirty both resident frames, so no clean page is left to evict.
    let page_lock = bp.get_page(tid, survivor, Permission::ReadWrite).unwrap();
    page_lock.write().unwrap().mark_dirty(true, tid);
    let page_lock = bp.get_page(tid, p2, Permission::ReadWrite).unwrap();
    page_lock.write().unwrap().mark_dirty(true, tid);

    let err = bp.get_page(tid, p3, Permission::ReadOnly).unwrap_err();
    assert!(matches!(err, gradedb::SmallDbError::CacheFull(_)));
}

/// Scenario 3: a second transaction requesting a conflicting lock times out
/// after the fixed lock-acquisition budget and the pool reports
/// transaction-aborted.
#[test]
fn conflicting_lock_request_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let td = two_int_desc();
    let hf = HeapFile::new(dir.path().join("t.dat"), td.clone()).unwrap();
    let catalog = Arc::new(Catalog::new());
    let hf = catalog.add_table("t", hf);
    let bp = Arc::new(BufferPool::new(10, Arc::clone(&catalog)));

    let pid = gradedb::page_id::PageId::new(hf.table_id(), 0);
    let page = gradedb::heap_page::HeapPage::new(pid, td.clone(), &gradedb::heap_page::HeapPage::empty_page_data()).unwrap();
    hf.write_page(&page).unwrap();

    let a = TransactionId::new();
    let b = TransactionId::new();
    bp.get_page(a, pid, Permission::ReadWrite).unwrap();

    let started = std::time::Instant::now();
    let err = bp.get_page(b, pid, Permission::ReadOnly).unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_transaction_aborted());
    assert!(elapsed.as_millis() as u64 >= config::LOCK_TIMEOUT_MS - 200);
}

/// Scenario 5: aborting a transaction that inserted a tuple restores the
/// page's pre-insert bytes; the lock is released; a fresh transaction's
/// scan does not observe the inserted tuple.
#[test]
fn abort_rolls_back_inserted_tuple() {
    let dir = tempfile::tempdir().unwrap();
    let td = two_int_desc();
    let hf = HeapFile::new(dir.path().join("t.dat"), td.clone()).unwrap();
    let catalog = Arc::new(Catalog::new());
    let hf = catalog.add_table("t", hf);
    let bp = BufferPool::new(10, Arc::clone(&catalog));
    let log = LogFile::new(dir.path().join("log.dat")).unwrap();

    let t = TransactionId::new();
    log.log_start(t).unwrap();
    bp.insert_tuple(t, hf.table_id(), tuple(&td, 1, 2)).unwrap();

    let pid = gradedb::page_id::PageId::new(hf.table_id(), 0);
    assert!(bp.holds_lock(t, pid));

    bp.transaction_complete(t, false, &log).unwrap();

    assert!(!bp.holds_lock(t, pid));

    let fresh = TransactionId::new();
    let mut iter = hf.iter(&bp, fresh);
    iter.open().unwrap();
    assert_eq!(iter.count(), 0);
}
