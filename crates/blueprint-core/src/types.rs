use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sentinel for size attributes that do not apply to a column.
pub const NOT_APPLICABLE: i32 = -1;

/// Engine-agnostic column type derived from the raw catalog type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Boolean,
    SmallInteger,
    Integer,
    BigInteger,
    Decimal,
    Float,
    Double,
    Char,
    String,
    Text,
    Binary,
    Date,
    Time,
    DateTime,
    Timestamp,
    Interval,
    Json,
    Uuid,
    Enum,
    Other(String),
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::SmallInteger
                | DataType::Integer
                | DataType::BigInteger
                | DataType::Decimal
                | DataType::Float
                | DataType::Double
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::SmallInteger | DataType::Integer | DataType::BigInteger
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, DataType::Char | DataType::String | DataType::Text)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataType::Boolean => "boolean",
            DataType::SmallInteger => "small_integer",
            DataType::Integer => "integer",
            DataType::BigInteger => "big_integer",
            DataType::Decimal => "decimal",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Char => "char",
            DataType::String => "string",
            DataType::Text => "text",
            DataType::Binary => "binary",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::DateTime => "date_time",
            DataType::Timestamp => "timestamp",
            DataType::Interval => "interval",
            DataType::Json => "json",
            DataType::Uuid => "uuid",
            DataType::Enum => "enum",
            DataType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Foreign key action semantics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    Unknown,
}

/// Scalar metadata of one column.
///
/// Size attributes hold a non-negative value or [`NOT_APPLICABLE`].
/// `is_unsigned` stays `None` when the catalog did not declare signedness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAttributes {
    pub data_type: DataType,
    pub is_nullable: bool,
    pub maximum_characters: i32,
    pub numeric_precision: i32,
    pub numeric_scale: i32,
    pub is_autoincrement: bool,
    pub has_default: bool,
    pub is_unsigned: Option<bool>,
}

impl ColumnAttributes {
    /// Attributes of a non-nullable column with no size information.
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            is_nullable: false,
            maximum_characters: NOT_APPLICABLE,
            numeric_precision: NOT_APPLICABLE,
            numeric_scale: NOT_APPLICABLE,
            is_autoincrement: false,
            has_default: false,
            is_unsigned: None,
        }
    }

    pub(crate) fn validate(&self, column: &str) -> Result<()> {
        let sizes = [
            ("maximum_characters", self.maximum_characters),
            ("numeric_precision", self.numeric_precision),
            ("numeric_scale", self.numeric_scale),
        ];
        for (field, value) in sizes {
            if value < NOT_APPLICABLE {
                return Err(Error::InvalidBlueprint(format!(
                    "{field} of column {column} must be >= 0 or {NOT_APPLICABLE}, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sizes_below_sentinel() {
        let mut attributes = ColumnAttributes::new(DataType::String);
        attributes.maximum_characters = -2;
        let err = attributes.validate("app.public.users.email").unwrap_err();
        assert!(err.to_string().contains("maximum_characters"));
    }

    #[test]
    fn accepts_sentinel_and_zero() {
        let mut attributes = ColumnAttributes::new(DataType::Decimal);
        attributes.numeric_precision = 0;
        assert!(attributes.validate("c").is_ok());
    }

    #[test]
    fn other_type_displays_raw_name() {
        assert_eq!(DataType::Other("geometry".to_string()).to_string(), "geometry");
        assert!(DataType::BigInteger.is_numeric());
        assert!(!DataType::Text.is_numeric());
    }
}
