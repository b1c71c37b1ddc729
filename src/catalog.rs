//! Thin name/tableId → `HeapFile` registry (SPEC_FULL §4.8).
//!
//! Spec.md treats the catalog as an external collaborator, but
//! `BufferPool` needs *some* way to turn a `PageId`'s `table_id` into the
//! `HeapFile` that owns it, and `HeapPage` construction needs a
//! `TupleDesc` looked up the same way. Grounded on the teacher's
//! `src/database.rs::Catalog` (`table_id_table_map: HashMap<i32, ...>`),
//! with no SQL binding.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{SmallDbError, SmallResult};
use crate::heap_file::HeapFile;

pub struct Catalog {
    by_name: RwLock<HashMap<String, Arc<HeapFile>>>,
    by_id: RwLock<HashMap<i32, Arc<HeapFile>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            by_name: RwLock::new(HashMap::new()),
            by_id: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_table(&self, name: &str, heap_file: HeapFile) -> Arc<HeapFile> {
        let heap_file = Arc::new(heap_file);
        self.by_name
            .write()
            .unwrap()
            .insert(name.to_string(), Arc::clone(&heap_file));
        self.by_id
            .write()
            .unwrap()
            .insert(heap_file.table_id(), Arc::clone(&heap_file));
        heap_file
    }

    pub fn get_by_name(&self, name: &str) -> SmallResult<Arc<HeapFile>> {
        self.by_name
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| SmallDbError::not_found(format!("no table named {}", name)))
    }

    pub fn get_by_id(&self, table_id: i32) -> SmallResult<Arc<HeapFile>> {
        self.by_id
            .read()
            .unwrap()
            .get(&table_id)
            .cloned()
            .ok_or_else(|| SmallDbError::not_found(format!("no table with id {}", table_id)))
    }

    pub fn table_id(&self, name: &str) -> SmallResult<i32> {
        Ok(self.get_by_name(name)?.table_id())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.by_name.read().unwrap().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.by_name.write().unwrap().clear();
        self.by_id.write().unwrap().clear();
    }
}
