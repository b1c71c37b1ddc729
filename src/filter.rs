//! `Filter`: wraps a tuple iterator, yielding only tuples a `Predicate`
//! matches (SPEC_FULL §4.10).

use crate::error::SmallResult;
use crate::predicate::Predicate;
use crate::tuple::Tuple;

pub struct Filter<I> {
    predicate: Predicate,
    child: I,
}

impl<I> Filter<I>
where
    I: Iterator<Item = SmallResult<Tuple>>,
{
    pub fn new(predicate: Predicate, child: I) -> Self {
        Filter { predicate, child }
    }
}

impl<I> Iterator for Filter<I>
where
    I: Iterator<Item = SmallResult<Tuple>>,
{
    type Item = SmallResult<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.child.next()? {
                Ok(t) if self.predicate.matches(&t) => return Some(Ok(t)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Type};
    use crate::tuple_desc::{FieldItem, TupleDesc};
    use crate::types::Op;

    fn tuple(v: i32) -> SmallResult<Tuple> {
        let td = TupleDesc::new(vec![FieldItem::new(Type::Int, "a")]);
        let mut t = Tuple::new(td);
        t.set_field(0, Field::Int(v)).unwrap();
        Ok(t)
    }

    #[test]
    fn keeps_only_matching_tuples() {
        let child = vec![tuple(1), tuple(5), tuple(9)].into_iter();
        let predicate = Predicate::new(0, Op::GreaterThan, Field::Int(3));
        let filtered: Vec<_> = Filter::new(predicate, child).collect();
        assert_eq!(filtered.len(), 2);
    }
}
