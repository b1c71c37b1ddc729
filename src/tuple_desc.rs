//! `TupleDesc`: ordered sequence of (type, optional name) items (spec §3,
//! §4.1).

use std::fmt;

use crate::error::{SmallDbError, SmallResult};
use crate::field::Type;

/// One column of a `TupleDesc`. An empty name means "anonymous"; anonymous
/// fields never match a non-empty name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldItem {
    pub field_type: Type,
    pub field_name: String,
}

impl FieldItem {
    pub fn new(field_type: Type, field_name: &str) -> Self {
        FieldItem {
            field_type,
            field_name: field_name.to_string(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.field_name.is_empty()
    }
}

impl fmt::Display for FieldItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.field_name, self.field_type)
    }
}

/// Ordered sequence of `(Type, optional Name)` items describing a row
/// shape. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleDesc {
    items: Vec<FieldItem>,
}

impl TupleDesc {
    /// Panics if `items` is empty: a `TupleDesc` must describe at least one
    /// field (spec §3 invariant).
    pub fn new(items: Vec<FieldItem>) -> Self {
        assert!(!items.is_empty(), "TupleDesc must have at least one field");
        TupleDesc { items }
    }

    pub fn items(&self) -> &[FieldItem] {
        &self.items
    }

    pub fn num_fields(&self) -> usize {
        self.items.len()
    }

    pub fn field_type(&self, i: usize) -> SmallResult<Type> {
        self.items
            .get(i)
            .map(|it| it.field_type)
            .ok_or_else(|| SmallDbError::not_found(format!("field index {} out of range", i)))
    }

    pub fn field_name(&self, i: usize) -> SmallResult<&str> {
        self.items
            .get(i)
            .map(|it| it.field_name.as_str())
            .ok_or_else(|| SmallDbError::not_found(format!("field index {} out of range", i)))
    }

    /// First index whose name equals `name`. Anonymous fields never match.
    pub fn field_name_to_index(&self, name: &str) -> SmallResult<usize> {
        if name.is_empty() {
            return Err(SmallDbError::not_found("cannot search for an empty field name"));
        }
        self.items
            .iter()
            .position(|it| !it.is_anonymous() && it.field_name == name)
            .ok_or_else(|| SmallDbError::not_found(format!("no field named {}", name)))
    }

    /// Total tuple width in bytes: sum of each field's serialized type
    /// width.
    pub fn size(&self) -> usize {
        self.items.iter().map(|it| it.field_type.len()).sum()
    }

    /// Concatenates `a` and `b` in order; the result has
    /// `a.num_fields() + b.num_fields()` items.
    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut items = a.items.clone();
        items.extend(b.items.clone());
        TupleDesc { items }
    }
}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.items.iter().map(|it| it.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}
