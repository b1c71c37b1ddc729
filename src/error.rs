//! Crate-wide error type.
//!
//! Follows the teacher's hand-rolled `SimpleError`/`SmallError` convention
//! (see the teacher's `src/error.rs`) rather than pulling in a derive-macro
//! error crate the teacher never reached for.

use std::{error::Error, fmt, io};

/// One variant per error kind named in the specification's error-handling
/// design (§7): `NotFound`, `SchemaViolation`, `FormatError`, `PageFull`,
/// `NotOnPage`, `CacheFull`, `TransactionAborted`, `Io`.
#[derive(Debug)]
pub enum SmallDbError {
    /// Addressing an absent field name or record id.
    NotFound(String),
    /// Field type does not match the tuple descriptor.
    SchemaViolation(String),
    /// Malformed bytes encountered during page or tuple parsing.
    FormatError(String),
    /// Insert into a page with no empty slot.
    PageFull(String),
    /// Delete of a tuple that is not resident in the addressed page.
    NotOnPage(String),
    /// No clean frame is available to evict.
    CacheFull(String),
    /// Lock acquisition exceeded the timeout; the caller must abort.
    TransactionAborted(String),
    /// Underlying filesystem failure.
    Io(io::Error),
}

impl SmallDbError {
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        SmallDbError::NotFound(msg.into())
    }

    pub fn schema_violation<S: Into<String>>(msg: S) -> Self {
        SmallDbError::SchemaViolation(msg.into())
    }

    pub fn format_error<S: Into<String>>(msg: S) -> Self {
        SmallDbError::FormatError(msg.into())
    }

    pub fn page_full<S: Into<String>>(msg: S) -> Self {
        SmallDbError::PageFull(msg.into())
    }

    pub fn not_on_page<S: Into<String>>(msg: S) -> Self {
        SmallDbError::NotOnPage(msg.into())
    }

    pub fn cache_full<S: Into<String>>(msg: S) -> Self {
        SmallDbError::CacheFull(msg.into())
    }

    pub fn transaction_aborted<S: Into<String>>(msg: S) -> Self {
        SmallDbError::TransactionAborted(msg.into())
    }

    /// True for the one error kind that signals the deadlock-avoidance
    /// timeout rather than a data-level failure.
    pub fn is_transaction_aborted(&self) -> bool {
        matches!(self, SmallDbError::TransactionAborted(_))
    }
}

impl fmt::Display for SmallDbError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SmallDbError::NotFound(msg) => write!(f, "not found: {}", msg),
            SmallDbError::SchemaViolation(msg) => {
                write!(f, "schema violation: {}", msg)
            }
            SmallDbError::FormatError(msg) => write!(f, "format error: {}", msg),
            SmallDbError::PageFull(msg) => write!(f, "page full: {}", msg),
            SmallDbError::NotOnPage(msg) => write!(f, "not on page: {}", msg),
            SmallDbError::CacheFull(msg) => write!(f, "cache full: {}", msg),
            SmallDbError::TransactionAborted(msg) => {
                write!(f, "transaction aborted: {}", msg)
            }
            SmallDbError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl Error for SmallDbError {}

impl From<io::Error> for SmallDbError {
    fn from(e: io::Error) -> Self {
        SmallDbError::Io(e)
    }
}

pub type SmallResult<T> = Result<T, SmallDbError>;
