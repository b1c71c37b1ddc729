//! Append-only write-ahead log: `Update`/`Commit`/`Abort`/`Checkpoint`
//! records, plus the `rollback` pass used to recover from a crash that
//! interrupted a commit in progress (spec §6).
//!
//! Under this crate's NO STEAL buffer pool, a page is only ever written to
//! disk by `BufferPool::flush_page` as part of a commit, and `log_update`
//! is only called from there. So an in-process abort never has, and never
//! needs, a matching `Update` record to replay: `BufferPool::transaction_
//! complete` undoes an abort directly, by dropping the transaction's dirty
//! resident pages before they are ever written out. `rollback` instead
//! backs a restart after a crash mid-commit: if the process died after some
//! of a transaction's pages were logged (and possibly written) but before
//! its `Commit` record was appended, replaying that transaction's `Update`
//! records restores every page it touched to its pre-commit state.
//!
//! Grounded on the teacher's `tx_log/log_manager.rs` (record types, a
//! before/after image `Update` record, log-then-write ordering) and
//! `src/io.rs::SmallFile` (one `Mutex<File>` wrapping raw reads/writes),
//! adapted from B-tree pages to heap pages and stripped of the teacher's
//! `tx_start_position` bookkeeping that this design's simpler commit/abort
//! contract (spec §4.4, §5) has no use for.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;

use crate::buffer_pool::BufferPool;
use crate::error::SmallResult;
use crate::page_id::PageId;
use crate::transaction::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum RecordType {
    Start = 0,
    Commit = 1,
    Abort = 2,
    Update = 3,
    Checkpoint = 4,
}

impl RecordType {
    fn from_u8(v: u8) -> SmallResult<Self> {
        Ok(match v {
            0 => RecordType::Start,
            1 => RecordType::Commit,
            2 => RecordType::Abort,
            3 => RecordType::Update,
            4 => RecordType::Checkpoint,
            other => {
                return Err(crate::error::SmallDbError::format_error(format!(
                    "unknown log record type tag {}",
                    other
                )))
            }
        })
    }
}

pub struct LogFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl LogFile {
    pub fn new<P: AsRef<Path>>(path: P) -> SmallResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        Ok(LogFile {
            path,
            file: Mutex::new(file),
        })
    }

    fn write_u64(file: &mut File, v: u64) -> SmallResult<()> {
        file.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn read_u64(file: &mut File) -> SmallResult<u64> {
        let mut buf = [0u8; 8];
        file.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn write_blob(file: &mut File, bytes: &[u8]) -> SmallResult<()> {
        Self::write_u64(file, bytes.len() as u64)?;
        file.write_all(bytes)?;
        Ok(())
    }

    fn read_blob(file: &mut File) -> SmallResult<Vec<u8>> {
        let len = Self::read_u64(file)? as usize;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn log_start(&self, tid: TransactionId) -> SmallResult<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::End(0))?;
        file.write_all(&[RecordType::Start as u8])?;
        Self::write_u64(&mut file, tid.raw())?;
        debug!("logged start for {}", tid);
        Ok(())
    }

    pub fn log_commit(&self, tid: TransactionId) -> SmallResult<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::End(0))?;
        file.write_all(&[RecordType::Commit as u8])?;
        Self::write_u64(&mut file, tid.raw())?;
        Ok(())
    }

    /// Appends `(tid, pid, before_image, after_image)`. The caller is
    /// responsible for calling `force()` before writing the page itself —
    /// `log_update` alone does not guarantee durability.
    pub fn log_update(
        &self,
        tid: TransactionId,
        pid: PageId,
        before_image: &[u8],
        after_image: &[u8],
    ) -> SmallResult<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::End(0))?;
        file.write_all(&[RecordType::Update as u8])?;
        Self::write_u64(&mut file, tid.raw())?;
        Self::write_u64(&mut file, pid.table_id as u64)?;
        Self::write_u64(&mut file, pid.page_number as u64)?;
        Self::write_blob(&mut file, before_image)?;
        Self::write_blob(&mut file, after_image)?;
        Ok(())
    }

    pub fn log_abort(&self, tid: TransactionId) -> SmallResult<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::End(0))?;
        file.write_all(&[RecordType::Abort as u8])?;
        Self::write_u64(&mut file, tid.raw())?;
        Ok(())
    }

    /// A checkpoint record carries no payload; it only marks a point after
    /// which `rollback` need not scan further back.
    pub fn log_checkpoint(&self, _buffer_pool: &BufferPool) -> SmallResult<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::End(0))?;
        file.write_all(&[RecordType::Checkpoint as u8])?;
        Ok(())
    }

    /// Forces the log to stable storage. Must happen before the
    /// corresponding page write (spec §9's fixed open question: log before
    /// data).
    pub fn force(&self) -> SmallResult<()> {
        self.file.lock().unwrap().flush()?;
        Ok(())
    }

    /// Crash recovery only: scans the log from its last checkpoint forward
    /// and, for every `Update` record belonging to `tid`, rewrites the
    /// on-disk page from the record's before-image and discards any stale
    /// resident copy. Not part of the normal in-process abort path; see
    /// the module comment.
    pub fn rollback(&self, tid: TransactionId, buffer_pool: &BufferPool) -> SmallResult<()> {
        let mut file = self.file.lock().unwrap();
        let len = file.seek(SeekFrom::End(0))?;
        let start = self.last_checkpoint_offset(&mut file)?;
        file.seek(SeekFrom::Start(start))?;

        let mut pos = start;
        while pos < len {
            let mut tag = [0u8; 1];
            file.read_exact(&mut tag)?;
            pos += 1;
            let record_type = RecordType::from_u8(tag[0])?;

            match record_type {
                RecordType::Start | RecordType::Commit | RecordType::Abort => {
                    file.seek(SeekFrom::Current(8))?;
                    pos += 8;
                }
                RecordType::Checkpoint => {}
                RecordType::Update => {
                    let record_tid = TransactionId::from_raw(Self::read_u64(&mut file)?);
                    let table_id = Self::read_u64(&mut file)? as i32;
                    let page_number = Self::read_u64(&mut file)? as i32;
                    let before = Self::read_blob(&mut file)?;
                    let after = Self::read_blob(&mut file)?;
                    pos = file.seek(SeekFrom::Current(0))?;

                    if record_tid == tid {
                        let pid = PageId::new(table_id, page_number);
                        let heap_file = buffer_pool.catalog_heap_file(table_id)?;
                        let page = crate::heap_page::HeapPage::new(
                            pid,
                            heap_file.tuple_desc().clone(),
                            &before,
                        )?;
                        heap_file.write_page(&page)?;
                        buffer_pool.discard_page(pid);
                    }
                    let _ = after;
                }
            }
        }
        Ok(())
    }

    fn last_checkpoint_offset(&self, file: &mut File) -> SmallResult<u64> {
        let len = file.seek(SeekFrom::End(0))?;
        let mut pos = 0u64;
        let mut last_checkpoint = 0u64;
        file.seek(SeekFrom::Start(0))?;

        while pos < len {
            let mut tag = [0u8; 1];
            file.read_exact(&mut tag)?;
            pos += 1;
            match RecordType::from_u8(tag[0])? {
                RecordType::Start | RecordType::Commit | RecordType::Abort => {
                    file.seek(SeekFrom::Current(8))?;
                    pos += 8;
                }
                RecordType::Checkpoint => {
                    last_checkpoint = pos;
                }
                RecordType::Update => {
                    file.seek(SeekFrom::Current(24))?;
                    pos += 24;
                    let before_len = Self::read_u64(file)?;
                    pos += 8;
                    file.seek(SeekFrom::Current(before_len as i64))?;
                    pos += before_len;
                    let after_len = Self::read_u64(file)?;
                    pos += 8;
                    file.seek(SeekFrom::Current(after_len as i64))?;
                    pos += after_len;
                }
            }
        }
        Ok(last_checkpoint)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
