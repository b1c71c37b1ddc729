//! Shared small enums used across the predicate, field and histogram
//! layers.

/// Comparison operators a `Predicate` or histogram selectivity estimate can
/// be evaluated against (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
    /// Substring match; valid for `Field::Str` only.
    Like,
}

/// Page access permission a transaction requests from the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}
