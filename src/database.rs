//! `Database`: process-wide facade bundling the `Catalog`, `BufferPool`,
//! and `LogFile` (SPEC_FULL §4.9).
//!
//! Grounded on the teacher's `src/common/database.rs` singleton (a
//! `mem::transmute`d raw pointer behind `Once`-style reset), reworked onto
//! `once_cell::sync::OnceCell<RwLock<Database>>` — the teacher's own
//! `once_cell` dependency gives the same lazily-initialized, resettable
//! global without the raw-pointer unsafety their `Pod<T>` pattern needs.

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use once_cell::sync::OnceCell;

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::config;
use crate::error::SmallResult;
use crate::log_file::LogFile;

pub struct Database {
    #[allow(dead_code)]
    path: PathBuf,
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    log_file: Arc<LogFile>,
}

static INSTANCE: OnceCell<RwLock<Database>> = OnceCell::new();

impl Database {
    fn build() -> SmallResult<Database> {
        let path = PathBuf::from("data").join("default_db");
        std::fs::create_dir_all(&path)?;

        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(config::DEFAULT_PAGES, Arc::clone(&catalog)));
        let log_file = Arc::new(LogFile::new(path.join("wal.log"))?);

        Ok(Database {
            path,
            catalog,
            buffer_pool,
            log_file,
        })
    }

    pub fn global() -> RwLockReadGuard<'static, Database> {
        INSTANCE
            .get_or_init(|| RwLock::new(Database::build().expect("failed to initialize database")))
            .read()
            .unwrap()
    }

    /// Rebuilds the singleton in place: a fresh, empty catalog and buffer
    /// pool, and a fresh log file. Used for test isolation (teacher's
    /// `Database::reset`).
    pub fn reset() {
        let fresh = Database::build().expect("failed to rebuild database");
        match INSTANCE.get() {
            Some(lock) => *lock.write().unwrap() = fresh,
            None => {
                let _ = INSTANCE.set(RwLock::new(fresh));
            }
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn log_file(&self) -> &Arc<LogFile> {
        &self.log_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_previously_registered_tables() {
        Database::reset();
        {
            let db = Database::global();
            assert!(db.catalog().table_names().is_empty());
        }
    }
}
