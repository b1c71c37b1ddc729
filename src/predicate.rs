//! `Predicate`: a single `(field_index, op, constant)` comparison
//! evaluated against a tuple (SPEC_FULL §4.10).
//!
//! Grounded on the teacher's `src/predicate.rs`, renamed `Cell` -> `Field`
//! and routed through `Field::compare` rather than reimplementing each
//! `Op` arm here.

use std::fmt;

use crate::field::Field;
use crate::tuple::Tuple;
use crate::types::Op;

#[derive(Debug, Clone)]
pub struct Predicate {
    pub field_index: usize,
    pub op: Op,
    pub field: Field,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, field: Field) -> Self {
        Predicate { field_index, op, field }
    }

    pub fn matches(&self, tuple: &Tuple) -> bool {
        match tuple.get_field(self.field_index) {
            Ok(actual) => actual.compare(self.op, &self.field),
            Err(_) => false,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "field_index: {}, op: {:?}, field: {}", self.field_index, self.op, self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Type;
    use crate::tuple_desc::{FieldItem, TupleDesc};

    fn tuple_with(v: i32) -> Tuple {
        let td = TupleDesc::new(vec![FieldItem::new(Type::Int, "a")]);
        let mut t = Tuple::new(td);
        t.set_field(0, Field::Int(v)).unwrap();
        t
    }

    #[test]
    fn matches_evaluates_the_named_field() {
        let p = Predicate::new(0, Op::GreaterThan, Field::Int(5));
        assert!(p.matches(&tuple_with(6)));
        assert!(!p.matches(&tuple_with(5)));
    }

    #[test]
    fn unset_or_out_of_range_field_never_matches() {
        let p = Predicate::new(3, Op::Equals, Field::Int(1));
        assert!(!p.matches(&tuple_with(1)));
    }
}
