//! Small cross-cutting helpers shared by several modules.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A handy shortcut to replace the `RwLock` `.write().unwrap()` /
/// `.read().unwrap()` pattern with `.wl()` / `.rl()`.
///
/// Copied in spirit from the teacher's `src/util.rs::HandyRwLock` (itself
/// borrowed from tikv_util), which this crate's `BufferPool`, `Catalog`
/// and `Database` all lean on to keep lock-guard call sites terse.
pub trait HandyRwLock<T> {
    fn wl(&self) -> RwLockWriteGuard<'_, T>;
    fn rl(&self) -> RwLockReadGuard<'_, T>;
}

impl<T> HandyRwLock<T> for RwLock<T> {
    fn wl(&self) -> RwLockWriteGuard<'_, T> {
        self.write().unwrap()
    }

    fn rl(&self) -> RwLockReadGuard<'_, T> {
        self.read().unwrap()
    }
}

/// Initializes `env_logger` exactly once for the process; safe to call
/// from every test that wants log output.
pub fn init_log() {
    use std::io::Write;
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format_timestamp_secs()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} - {}] [{}:{}] {}",
                    record.level(),
                    record.target(),
                    record.file().unwrap_or("?"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .is_test(true)
            .try_init()
            .ok();
    });
}
