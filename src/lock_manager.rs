//! Per-page lock table (spec §4.5).
//!
//! The table is a plain data structure guarded by one mutex; `lock` is
//! non-blocking and returns a boolean. Waiting — and the 3 s timeout that
//! substitutes for deadlock detection — is the caller's responsibility
//! (`BufferPool::get_page`), per spec §5 and §9 ("the lock table as state,
//! not control flow"). Grounded on the holder-table shape of the teacher's
//! `transaction/concurrent_status.rs`, stripped of its wait-for-graph
//! (spec §5 fixes timeout-only deadlock avoidance for this design).

use std::collections::HashMap;
use std::sync::Mutex;

use crate::page_id::PageId;
use crate::transaction::TransactionId;
use crate::types::Permission;

#[derive(Debug, Clone, Copy, Default)]
struct HolderState {
    share_count: u32,
    exclusive_count: u32,
}

impl HolderState {
    fn is_empty(&self) -> bool {
        self.share_count == 0 && self.exclusive_count == 0
    }
}

pub struct LockManager {
    holders: Mutex<HashMap<PageId, HashMap<TransactionId, HolderState>>>,
}

impl LockManager {
    pub fn new() -> Self {
        LockManager {
            holders: Mutex::new(HashMap::new()),
        }
    }

    /// Attempts to acquire `perm` for `tid` on `pid`. Non-blocking: returns
    /// `true` on success, `false` if the lock cannot be granted right now.
    pub fn lock(&self, pid: PageId, tid: TransactionId, perm: Permission) -> bool {
        let mut table = self.holders.lock().unwrap();
        let page_holders = table.entry(pid).or_insert_with(HashMap::new);

        if page_holders.is_empty() {
            page_holders.insert(tid, new_holder(perm));
            return true;
        }

        if page_holders.len() == 1 && page_holders.contains_key(&tid) {
            let state = page_holders.get_mut(&tid).unwrap();
            match perm {
                Permission::ReadOnly => {
                    if state.exclusive_count > 0 && state.share_count == 0 {
                        // downgrade: move the exclusive hold over to shared.
                        state.share_count = state.exclusive_count;
                        state.exclusive_count = 0;
                    } else {
                        state.share_count += 1;
                    }
                }
                Permission::ReadWrite => {
                    if state.share_count > 0 && state.exclusive_count == 0 {
                        // upgrade: move the shared hold over to exclusive.
                        state.exclusive_count = state.share_count;
                        state.share_count = 0;
                    } else {
                        state.exclusive_count += 1;
                    }
                }
            }
            return true;
        }

        if perm == Permission::ReadOnly
            && page_holders.values().all(|s| s.exclusive_count == 0)
        {
            let state = page_holders.entry(tid).or_insert_with(HolderState::default);
            state.share_count += 1;
            return true;
        }

        false
    }

    /// Decrements the first non-zero counter for `(pid, tid)`; removes the
    /// holder when both counters reach zero, and the page's entry when no
    /// holders remain.
    pub fn unlock(&self, pid: PageId, tid: TransactionId) {
        let mut table = self.holders.lock().unwrap();
        if let Some(page_holders) = table.get_mut(&pid) {
            if let Some(state) = page_holders.get_mut(&tid) {
                if state.share_count > 0 {
                    state.share_count -= 1;
                } else if state.exclusive_count > 0 {
                    state.exclusive_count -= 1;
                }
                if state.is_empty() {
                    page_holders.remove(&tid);
                }
            }
            if page_holders.is_empty() {
                table.remove(&pid);
            }
        }
    }

    /// Releases every lock `tid` holds across every page. Used by
    /// `BufferPool::transaction_complete`.
    pub fn unlock_all(&self, tid: TransactionId) {
        let mut table = self.holders.lock().unwrap();
        table.retain(|_, holders| {
            holders.remove(&tid);
            !holders.is_empty()
        });
    }

    /// Drops every holder of `pid`, regardless of transaction. Used when a
    /// page is discarded outright rather than committed or rolled back.
    pub fn unlock_all_for_page(&self, pid: PageId) {
        self.holders.lock().unwrap().remove(&pid);
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        let table = self.holders.lock().unwrap();
        table
            .get(&pid)
            .and_then(|h| h.get(&tid))
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }
}

fn new_holder(perm: Permission) -> HolderState {
    match perm {
        Permission::ReadOnly => HolderState {
            share_count: 1,
            exclusive_count: 0,
        },
        Permission::ReadWrite => HolderState {
            share_count: 0,
            exclusive_count: 1,
        },
    }
}
