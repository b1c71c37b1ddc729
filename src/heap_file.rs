//! `HeapFile`: a disk-backed sequence of `HeapPage`s for one table (spec
//! §3, §4.3, §6).

use std::collections::hash_map::DefaultHasher;
use std::fs::OpenOptions;
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::buffer_pool::BufferPool;
use crate::config;
use crate::error::{SmallDbError, SmallResult};
use crate::heap_page::HeapPage;
use crate::page_id::PageId;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;
use crate::tuple_desc::TupleDesc;
use crate::types::Permission;

/// A table's backing store: one flat file, pages laid out contiguously.
/// Page `n` starts at byte `n * page_size`.
pub struct HeapFile {
    path: PathBuf,
    td: TupleDesc,
    table_id: i32,
}

impl HeapFile {
    /// Opens (creating if absent) the backing file at `path`. `table_id` is
    /// derived from a hash of the canonicalized path, so the same file
    /// always maps to the same id.
    pub fn new<P: AsRef<Path>>(path: P, td: TupleDesc) -> SmallResult<Self> {
        let path = path.as_ref().to_path_buf();
        // Ensure the file exists so canonicalize succeeds.
        OpenOptions::new().write(true).create(true).open(&path)?;
        let canonical = path.canonicalize()?;
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        let table_id = hasher.finish() as i32;

        Ok(HeapFile { path, td, table_id })
    }

    pub fn table_id(&self) -> i32 {
        self.table_id
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_len(&self) -> SmallResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    pub fn num_pages(&self) -> SmallResult<usize> {
        Ok((self.file_len()? as usize) / config::page_size())
    }

    /// Reads page `page_number` directly from disk, bypassing the buffer
    /// pool. Used by the pool's own miss path and by tests.
    pub fn read_page(&self, page_number: i32) -> SmallResult<HeapPage> {
        let pid = PageId::new(self.table_id, page_number);
        let offset = page_number as u64 * config::page_size() as u64;

        let mut file = OpenOptions::new().read(true).open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; config::page_size()];
        file.read_exact(&mut buf)?;

        HeapPage::new(pid, self.td.clone(), &buf)
    }

    /// Writes `page` to its slot, growing the file by one page if the
    /// offset lands at or past the current end.
    pub fn write_page(&self, page: &HeapPage) -> SmallResult<()> {
        let offset = page.pid().page_number as u64 * config::page_size() as u64;

        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&page.get_page_data())?;
        file.flush()?;
        Ok(())
    }

    /// Linear-scans existing pages (through the buffer pool, under an
    /// exclusive lock) for room; allocates and appends a new page if none
    /// has an empty slot.
    pub fn insert_tuple(
        &self,
        buffer_pool: &BufferPool,
        tid: TransactionId,
        t: Tuple,
    ) -> SmallResult<()> {
        let num_pages = self.num_pages()?;
        for page_number in 0..num_pages {
            let pid = PageId::new(self.table_id, page_number as i32);
            let page_lock = buffer_pool.get_page(tid, pid, Permission::ReadWrite)?;
            let mut page = page_lock.write().unwrap();
            if page.get_num_empty_slots() > 0 {
                page.insert_tuple(t)?;
                page.mark_dirty(true, tid);
                return Ok(());
            }
        }

        // No page had room: grow the file with an empty page, then go
        // through the buffer pool like the existing-page branch above, so
        // the new page is lock-mediated and its before-image is taken from
        // the (empty) on-disk image rather than the already-inserted one.
        let new_pid = PageId::new(self.table_id, num_pages as i32);
        let empty = HeapPage::new(new_pid, self.td.clone(), &HeapPage::empty_page_data())?;
        self.write_page(&empty)?;
        let page_lock = buffer_pool.get_page(tid, new_pid, Permission::ReadWrite)?;
        let mut page = page_lock.write().unwrap();
        page.insert_tuple(t)?;
        page.mark_dirty(true, tid);
        Ok(())
    }

    pub fn delete_tuple(&self, buffer_pool: &BufferPool, tid: TransactionId, t: &Tuple) -> SmallResult<()> {
        let rid = t
            .record_id()
            .ok_or_else(|| SmallDbError::not_on_page("tuple has no RecordId"))?;
        let page_lock = buffer_pool.get_page(tid, rid.page_id, Permission::ReadWrite)?;
        let mut page = page_lock.write().unwrap();
        page.delete_tuple(t)?;
        page.mark_dirty(true, tid);
        Ok(())
    }

    /// A finite, restartable iterator over every tuple in the file, in
    /// ascending `(page_number, slot)` order, mediated by the buffer pool
    /// under read-only permission.
    pub fn iter<'a>(&'a self, buffer_pool: &'a BufferPool, tid: TransactionId) -> HeapFileIterator<'a> {
        HeapFileIterator {
            file: self,
            buffer_pool,
            tid,
            open: false,
            page_number: 0,
            slot: 0,
            num_pages: 0,
        }
    }
}

/// Open/close stateful iterator over a `HeapFile`'s tuples.
/// `next()` after `close()` (or before `open()`) fails with `NotFound`
/// (spec's `iterator-not-open`).
pub struct HeapFileIterator<'a> {
    file: &'a HeapFile,
    buffer_pool: &'a BufferPool,
    tid: TransactionId,
    open: bool,
    page_number: i32,
    slot: usize,
    num_pages: i32,
}

impl<'a> HeapFileIterator<'a> {
    pub fn open(&mut self) -> SmallResult<()> {
        self.num_pages = self.file.num_pages()? as i32;
        self.page_number = 0;
        self.slot = 0;
        self.open = true;
        Ok(())
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn rewind(&mut self) -> SmallResult<()> {
        self.close();
        self.open()
    }

    fn next_tuple(&mut self) -> SmallResult<Option<Tuple>> {
        if !self.open {
            return Err(SmallDbError::not_found("iterator is not open"));
        }

        while self.page_number < self.num_pages {
            let pid = PageId::new(self.file.table_id(), self.page_number);
            let page_lock = self.buffer_pool.get_page(self.tid, pid, Permission::ReadOnly)?;
            let page = page_lock.read().unwrap();
            let tuples: Vec<Tuple> = page.iter().cloned().collect();
            drop(page);

            if self.slot < tuples.len() {
                let t = tuples[self.slot].clone();
                self.slot += 1;
                return Ok(Some(t));
            }

            self.page_number += 1;
            self.slot = 0;
        }

        Ok(None)
    }
}

impl<'a> Iterator for HeapFileIterator<'a> {
    type Item = SmallResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_tuple() {
            Ok(Some(t)) => Some(Ok(t)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
