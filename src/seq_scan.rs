//! `SeqScan`: iterates every tuple of a table under one transaction,
//! mediated by the buffer pool (SPEC_FULL §4.10).
//!
//! Grounded on the teacher's `src/sequential_scan.rs`, rewritten so every
//! page access goes through `BufferPool::get_page` — the teacher's version
//! reaches into the page cache directly and never requests locks.

use crate::buffer_pool::BufferPool;
use crate::error::SmallResult;
use crate::heap_file::HeapFileIterator;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

pub struct SeqScan<'a> {
    table_alias: String,
    inner: HeapFileIterator<'a>,
}

impl<'a> SeqScan<'a> {
    pub fn new(
        tid: TransactionId,
        heap_file: &'a crate::heap_file::HeapFile,
        buffer_pool: &'a BufferPool,
        table_alias: &str,
    ) -> SmallResult<Self> {
        let mut inner = heap_file.iter(buffer_pool, tid);
        inner.open()?;
        Ok(SeqScan {
            table_alias: table_alias.to_string(),
            inner,
        })
    }

    pub fn table_alias(&self) -> &str {
        &self.table_alias
    }

    pub fn rewind(&mut self) -> SmallResult<()> {
        self.inner.rewind()
    }
}

impl<'a> Iterator for SeqScan<'a> {
    type Item = SmallResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::field::{Field, Type};
    use crate::heap_file::HeapFile;
    use crate::tuple::Tuple;
    use crate::tuple_desc::{FieldItem, TupleDesc};
    use std::sync::Arc;

    #[test]
    fn scans_every_inserted_tuple_and_rewinds() {
        let dir = tempfile::tempdir().unwrap();
        let td = TupleDesc::new(vec![FieldItem::new(Type::Int, "a")]);
        let hf = HeapFile::new(dir.path().join("t.dat"), td.clone()).unwrap();
        let catalog = Arc::new(Catalog::new());
        let hf = catalog.add_table("t", hf);
        let bp = BufferPool::new(10, Arc::clone(&catalog));
        let tid = TransactionId::new();

        for v in 0..5 {
            let mut t = Tuple::new(td.clone());
            t.set_field(0, Field::Int(v)).unwrap();
            bp.insert_tuple(tid, hf.table_id(), t).unwrap();
        }

        let mut scan = SeqScan::new(tid, &hf, &bp, "t").unwrap();
        let count = (&mut scan).filter(|r| r.is_ok()).count();
        assert_eq!(count, 5);

        scan.rewind().unwrap();
        assert_eq!(scan.count(), 5);
    }
}
