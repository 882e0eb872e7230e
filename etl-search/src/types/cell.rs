use serde::{Serialize, Serializer};
use std::fmt;

use crate::conversions::hex::encode_hex;

/// A single column value of a replicated row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Cell {
    /// Returns `true` if this cell holds no value.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// Renders the value as used in document ids. Bytes are rendered as lowercase hex.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("null"),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::I64(value) => write!(f, "{value}"),
            Cell::U64(value) => write!(f, "{value}"),
            Cell::F64(value) => write!(f, "{value}"),
            Cell::String(value) => f.write_str(value),
            Cell::Bytes(value) => f.write_str(&encode_hex(value)),
            Cell::Json(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(value) => serializer.serialize_bool(*value),
            Cell::I64(value) => serializer.serialize_i64(*value),
            Cell::U64(value) => serializer.serialize_u64(*value),
            Cell::F64(value) => serializer.serialize_f64(*value),
            Cell::String(value) => serializer.serialize_str(value),
            Cell::Bytes(value) => serializer.serialize_str(&encode_hex(value)),
            Cell::Json(value) => value.serialize(serializer),
        }
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::I64(i64::from(value))
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::I64(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::U64(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::F64(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<Vec<u8>> for Cell {
    fn from(value: Vec<u8>) -> Self {
        Cell::Bytes(value)
    }
}

impl From<serde_json::Value> for Cell {
    fn from(value: serde_json::Value) -> Self {
        Cell::Json(value)
    }
}

impl<T> From<Option<T>> for Cell
where
    T: Into<Cell>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_matches_document_id_rendering() {
        assert_eq!(Cell::from(42).to_string(), "42");
        assert_eq!(Cell::from(7u64).to_string(), "7");
        assert_eq!(Cell::from("abc").to_string(), "abc");
        assert_eq!(Cell::from(vec![0xde, 0xad]).to_string(), "dead");
        assert_eq!(Cell::from(1.5).to_string(), "1.5");
    }

    #[test]
    fn serializes_to_natural_json_values() {
        let cells = vec![
            Cell::Null,
            Cell::from(true),
            Cell::from(-3),
            Cell::from("x"),
            Cell::from(vec![1u8, 255]),
            Cell::from(json!({"a": 1})),
        ];

        assert_eq!(
            serde_json::to_value(&cells).unwrap(),
            json!([null, true, -3, "x", "01ff", {"a": 1}])
        );
    }

    #[test]
    fn none_converts_to_null() {
        assert!(Cell::from(None::<i64>).is_null());
        assert_eq!(Cell::from(Some("a")), Cell::String("a".to_string()));
    }
}
