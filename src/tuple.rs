//! `Tuple`: a vector of field values plus an optional `RecordId` (spec §3,
//! §4.1).

use std::fmt;

use crate::error::{SmallDbError, SmallResult};
use crate::field::Field;
use crate::record_id::RecordId;
use crate::tuple_desc::TupleDesc;

#[derive(Debug, Clone)]
pub struct Tuple {
    tuple_desc: TupleDesc,
    fields: Vec<Option<Field>>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// A fresh tuple with every field unset.
    pub fn new(tuple_desc: TupleDesc) -> Self {
        let num_fields = tuple_desc.num_fields();
        Tuple {
            tuple_desc,
            fields: vec![None; num_fields],
            record_id: None,
        }
    }

    pub fn tuple_desc(&self) -> &TupleDesc {
        &self.tuple_desc
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: RecordId) {
        self.record_id = Some(rid);
    }

    /// Sets field `i`; fails with `SchemaViolation` if `value`'s type does
    /// not match the descriptor's type at that index.
    pub fn set_field(&mut self, i: usize, value: Field) -> SmallResult<()> {
        let expected = self.tuple_desc.field_type(i)?;
        if value.field_type() != expected {
            return Err(SmallDbError::schema_violation(format!(
                "field {} expects {} but got {}",
                i,
                expected,
                value.field_type()
            )));
        }
        self.fields[i] = Some(value);
        Ok(())
    }

    /// Fails with `NotFound` if the index is out of range or the field was
    /// never set.
    pub fn get_field(&self, i: usize) -> SmallResult<&Field> {
        self.fields
            .get(i)
            .ok_or_else(|| SmallDbError::not_found(format!("field index {} out of range", i)))?
            .as_ref()
            .ok_or_else(|| SmallDbError::not_found(format!("field {} is unset", i)))
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter_map(|f| f.as_ref())
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.tuple_desc == other.tuple_desc
            && self.fields == other.fields
            && self.record_id == other.record_id
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|v| match v {
                Some(field) => field.to_string(),
                None => "<unset>".to_string(),
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Type;
    use crate::page_id::PageId;
    use crate::tuple_desc::FieldItem;

    fn two_int_desc() -> TupleDesc {
        TupleDesc::new(vec![
            FieldItem::new(Type::Int, "a"),
            FieldItem::new(Type::Int, "b"),
        ])
    }

    #[test]
    fn set_and_get_field() {
        let mut t = Tuple::new(two_int_desc());
        t.set_field(0, Field::Int(1)).unwrap();
        t.set_field(1, Field::Int(2)).unwrap();
        assert_eq!(t.get_field(0).unwrap(), &Field::Int(1));
        assert_eq!(t.get_field(1).unwrap(), &Field::Int(2));
    }

    #[test]
    fn type_mismatch_is_schema_violation() {
        let mut t = Tuple::new(two_int_desc());
        let err = t.set_field(0, Field::Str("x".into())).unwrap_err();
        assert!(matches!(err, SmallDbError::SchemaViolation(_)));
    }

    #[test]
    fn unset_field_is_not_found() {
        let t = Tuple::new(two_int_desc());
        assert!(matches!(t.get_field(0), Err(SmallDbError::NotFound(_))));
    }

    #[test]
    fn record_id_round_trip() {
        let mut t = Tuple::new(two_int_desc());
        let rid = RecordId::new(PageId::new(1, 0), 3);
        t.set_record_id(rid);
        assert_eq!(t.record_id(), Some(rid));
    }

    #[test]
    fn equality_over_descriptor_values_and_record_id() {
        let mut a = Tuple::new(two_int_desc());
        let mut b = Tuple::new(two_int_desc());
        a.set_field(0, Field::Int(7)).unwrap();
        b.set_field(0, Field::Int(7)).unwrap();
        assert_eq!(a, b);
        b.set_field(0, Field::Int(8)).unwrap();
        assert_ne!(a, b);
    }
}
