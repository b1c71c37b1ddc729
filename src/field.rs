//! Primitive value model: `Type` and `Field` (spec §3, §4.1).

use std::fmt;
use std::io::{self, Read, Write};

use crate::config::STRING_MAX_SIZE;
use crate::error::{SmallDbError, SmallResult};
use crate::types::Op;

/// A primitive column type. Serialized width is constant per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Str,
}

impl Type {
    /// Serialized width in bytes of a field of this type.
    pub fn len(self) -> usize {
        match self {
            Type::Int => 4,
            Type::Str => 4 + STRING_MAX_SIZE,
        }
    }

    /// Reads one field of this type from `reader`. The inverse of
    /// `Field::serialize`.
    pub fn parse<R: Read>(self, reader: &mut R) -> SmallResult<Field> {
        match self {
            Type::Int => {
                let mut buf = [0u8; 4];
                reader
                    .read_exact(&mut buf)
                    .map_err(|e| SmallDbError::format_error(e.to_string()))?;
                Ok(Field::Int(i32::from_be_bytes(buf)))
            }
            Type::Str => {
                let mut len_buf = [0u8; 4];
                reader
                    .read_exact(&mut len_buf)
                    .map_err(|e| SmallDbError::format_error(e.to_string()))?;
                let len = u32::from_be_bytes(len_buf) as usize;
                if len > STRING_MAX_SIZE {
                    return Err(SmallDbError::format_error(format!(
                        "string length {} exceeds STRING_MAX_SIZE {}",
                        len, STRING_MAX_SIZE
                    )));
                }
                let mut payload = vec![0u8; STRING_MAX_SIZE];
                reader
                    .read_exact(&mut payload)
                    .map_err(|e| SmallDbError::format_error(e.to_string()))?;
                payload.truncate(len);
                let s = String::from_utf8(payload)
                    .map_err(|e| SmallDbError::format_error(e.to_string()))?;
                Ok(Field::Str(s))
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::Str => write!(f, "STRING"),
        }
    }
}

/// A concrete value. `Str` carries an unpadded Rust string; padding to
/// `STRING_MAX_SIZE` happens only on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Int(i32),
    Str(String),
}

impl Field {
    pub fn field_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::Str(_) => Type::Str,
        }
    }

    /// Serializes this field to exactly `field_type().len()` bytes.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Field::Int(v) => writer.write_all(&v.to_be_bytes()),
            Field::Str(s) => {
                let bytes = s.as_bytes();
                debug_assert!(bytes.len() <= STRING_MAX_SIZE);
                writer.write_all(&(bytes.len() as u32).to_be_bytes())?;
                writer.write_all(bytes)?;
                let padding = STRING_MAX_SIZE - bytes.len();
                writer.write_all(&vec![0u8; padding])
            }
        }
    }

    /// Evaluates `self <op> other`. `Op::Like` is a substring match and is
    /// only meaningful between two `Str` fields.
    pub fn compare(&self, op: Op, other: &Field) -> bool {
        match op {
            Op::Equals => self == other,
            Op::NotEquals => self != other,
            Op::LessThan => self < other,
            Op::LessThanOrEq => self <= other,
            Op::GreaterThan => self > other,
            Op::GreaterThanOrEq => self >= other,
            Op::Like => match (self, other) {
                (Field::Str(haystack), Field::Str(needle)) => haystack.contains(needle.as_str()),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Str(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trip() {
        let f = Field::Int(-42);
        let mut buf = Vec::new();
        f.serialize(&mut buf).unwrap();
        assert_eq!(buf.len(), Type::Int.len());
        let mut cursor = std::io::Cursor::new(buf);
        let parsed = Type::Int.parse(&mut cursor).unwrap();
        assert_eq!(parsed, f);
    }

    #[test]
    fn str_round_trip_and_padding() {
        let f = Field::Str("hello".to_string());
        let mut buf = Vec::new();
        f.serialize(&mut buf).unwrap();
        assert_eq!(buf.len(), Type::Str.len());
        // length prefix + payload, NUL-padded to STRING_MAX_SIZE.
        assert_eq!(&buf[0..4], &5u32.to_be_bytes());
        assert!(buf[4 + 5..].iter().all(|&b| b == 0));
        let mut cursor = std::io::Cursor::new(buf);
        let parsed = Type::Str.parse(&mut cursor).unwrap();
        assert_eq!(parsed, f);
    }

    #[test]
    fn like_is_substring_match() {
        let a = Field::Str("hello world".to_string());
        let b = Field::Str("wor".to_string());
        assert!(a.compare(Op::Like, &b));
        assert!(!b.compare(Op::Like, &a));
    }

    #[test]
    fn comparisons() {
        assert!(Field::Int(1).compare(Op::LessThan, &Field::Int(2)));
        assert!(Field::Int(2).compare(Op::GreaterThanOrEq, &Field::Int(2)));
        assert!(Field::Int(3).compare(Op::NotEquals, &Field::Int(2)));
    }
}
