use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

///
/// FieldType
///
/// Semantic column type carried by every [`crate::spec::FieldSpec`] and by
/// the schema model. The semantic type, not the dialect type string, drives
/// literal encoding and mutation validation.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum FieldType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    Bytes,
    Enum,
    Time,
}

impl FieldType {
    /// Signed integer widths.
    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Unsigned integer widths.
    #[must_use]
    pub const fn is_uint(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Numeric types are the only valid targets for Add mutations.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        self.is_int() || self.is_uint() || self.is_float()
    }

    /// Width rank within the signed or unsigned integer family.
    /// `None` for non-integer types.
    #[must_use]
    pub const fn int_rank(self) -> Option<u8> {
        match self {
            Self::I8 | Self::U8 => Some(0),
            Self::I16 | Self::U16 => Some(1),
            Self::I32 | Self::U32 => Some(2),
            Self::I64 | Self::U64 => Some(3),
            _ => None,
        }
    }
}

///
/// Value
///
/// A literal SQL argument. Enum values are carried as `Text` and encoded as
/// quoted strings; byte slices as blobs. `Null` doubles as the cleared state
/// for any field type.
///

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Time(OffsetDateTime),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The type-appropriate zero value, used by Clear mutations on NOT NULL
    /// columns and by backfill defaults during migration.
    #[must_use]
    pub const fn zero_for(ty: FieldType) -> Self {
        match ty {
            FieldType::Bool => Self::Bool(false),
            FieldType::I8 | FieldType::I16 | FieldType::I32 | FieldType::I64 => Self::Int(0),
            FieldType::U8 | FieldType::U16 | FieldType::U32 | FieldType::U64 => Self::Uint(0),
            FieldType::F32 | FieldType::F64 => Self::Float(0.0),
            FieldType::String | FieldType::Enum => Self::Text(String::new()),
            FieldType::Bytes => Self::Bytes(Vec::new()),
            FieldType::Time => Self::Time(OffsetDateTime::UNIX_EPOCH),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Time(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Self::Time(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_gate_matches_integer_and_float_widths() {
        assert!(FieldType::I8.is_numeric());
        assert!(FieldType::U64.is_numeric());
        assert!(FieldType::F32.is_numeric());
        assert!(!FieldType::String.is_numeric());
        assert!(!FieldType::Enum.is_numeric());
        assert!(!FieldType::Bytes.is_numeric());
    }

    #[test]
    fn zero_values_match_their_types() {
        assert_eq!(Value::zero_for(FieldType::I32), Value::Int(0));
        assert_eq!(Value::zero_for(FieldType::U8), Value::Uint(0));
        assert_eq!(Value::zero_for(FieldType::String), Value::Text(String::new()));
        assert_eq!(Value::zero_for(FieldType::Bool), Value::Bool(false));
    }

    #[test]
    fn option_folds_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3_i64)), Value::Int(3));
    }

    #[test]
    fn values_round_trip_through_json() {
        let values = vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(-3),
            Value::Uint(7),
            Value::Text("it's".into()),
            Value::Bytes(vec![1, 2]),
            Value::Time(OffsetDateTime::UNIX_EPOCH),
        ];
        let json = serde_json::to_string(&values).expect("serialize");
        let back: Vec<Value> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, values);
    }
}
