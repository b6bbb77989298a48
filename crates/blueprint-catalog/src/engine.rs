use std::fmt;
use std::str::FromStr;

use blueprint_core::{DataType, FkAction};

use crate::error::CatalogError;

/// Database engines whose type names the mapper understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    Postgres,
    Mysql,
    Sqlite,
}

impl Engine {
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Postgres => "postgres",
            Engine::Mysql => "mysql",
            Engine::Sqlite => "sqlite",
        }
    }

    /// Map an engine type spelling onto a [`DataType`].
    ///
    /// Unrecognized spellings are kept verbatim as [`DataType::Other`].
    pub fn normalize_type(self, raw: &str) -> DataType {
        let lowered = raw.trim().to_ascii_lowercase();
        if self == Engine::Mysql && lowered.starts_with("tinyint(1)") {
            return DataType::Boolean;
        }

        let base = base_type(&lowered);
        let mapped = match self {
            Engine::Postgres => postgres_type(&base),
            Engine::Mysql => mysql_type(&base),
            Engine::Sqlite => sqlite_type(&base),
        };
        mapped.unwrap_or_else(|| DataType::Other(raw.trim().to_string()))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Engine::Postgres),
            "mysql" | "mariadb" => Ok(Engine::Mysql),
            "sqlite" | "sqlite3" => Ok(Engine::Sqlite),
            _ => Err(CatalogError::UnsupportedEngine(value.to_string())),
        }
    }
}

/// Signedness of a column: an explicit flag wins, then the type text.
pub fn detect_unsigned(explicit: Option<bool>, raw_type: &str) -> Option<bool> {
    explicit.or_else(|| {
        raw_type
            .to_ascii_lowercase()
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .any(|token| token == "unsigned")
            .then_some(true)
    })
}

/// Parse a referential action written as SQL or as a one-letter catalog code.
pub fn parse_action(raw: Option<&str>) -> FkAction {
    let Some(raw) = raw else {
        return FkAction::NoAction;
    };
    match raw.trim().to_ascii_uppercase().replace('_', " ").as_str() {
        "" | "A" | "NO ACTION" => FkAction::NoAction,
        "R" | "RESTRICT" => FkAction::Restrict,
        "C" | "CASCADE" => FkAction::Cascade,
        "N" | "SET NULL" => FkAction::SetNull,
        "D" | "SET DEFAULT" => FkAction::SetDefault,
        _ => FkAction::Unknown,
    }
}

/// Strip type arguments and sign modifiers: `int(10) unsigned` -> `int`.
fn base_type(lowered: &str) -> String {
    let mut depth = 0usize;
    let mut stripped = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }

    stripped
        .split_whitespace()
        .filter(|word| !matches!(*word, "unsigned" | "signed" | "zerofill"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn postgres_type(base: &str) -> Option<DataType> {
    let data_type = match base {
        "boolean" | "bool" => DataType::Boolean,
        "smallint" | "int2" | "smallserial" | "serial2" => DataType::SmallInteger,
        "integer" | "int" | "int4" | "serial" | "serial4" => DataType::Integer,
        "bigint" | "int8" | "bigserial" | "serial8" => DataType::BigInteger,
        "numeric" | "decimal" | "money" => DataType::Decimal,
        "real" | "float4" => DataType::Float,
        "double precision" | "float8" | "float" => DataType::Double,
        "character" | "char" | "bpchar" => DataType::Char,
        "character varying" | "varchar" => DataType::String,
        "text" | "citext" | "name" => DataType::Text,
        "bytea" => DataType::Binary,
        "date" => DataType::Date,
        "time" | "time without time zone" | "time with time zone" | "timetz" => DataType::Time,
        "timestamp" | "timestamp without time zone" => DataType::DateTime,
        "timestamp with time zone" | "timestamptz" => DataType::Timestamp,
        "interval" => DataType::Interval,
        "json" | "jsonb" => DataType::Json,
        "uuid" => DataType::Uuid,
        _ => return None,
    };
    Some(data_type)
}

fn mysql_type(base: &str) -> Option<DataType> {
    let data_type = match base {
        "bool" | "boolean" | "bit" => DataType::Boolean,
        "tinyint" | "smallint" | "year" => DataType::SmallInteger,
        "mediumint" | "int" | "integer" => DataType::Integer,
        "bigint" => DataType::BigInteger,
        "decimal" | "numeric" | "dec" | "fixed" => DataType::Decimal,
        "float" => DataType::Float,
        "double" | "double precision" | "real" => DataType::Double,
        "char" => DataType::Char,
        "varchar" => DataType::String,
        "tinytext" | "text" | "mediumtext" | "longtext" => DataType::Text,
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            DataType::Binary
        }
        "date" => DataType::Date,
        "time" => DataType::Time,
        "datetime" => DataType::DateTime,
        "timestamp" => DataType::Timestamp,
        "json" => DataType::Json,
        "enum" | "set" => DataType::Enum,
        _ => return None,
    };
    Some(data_type)
}

/// SQLite accepts any spelling, so exact names come first and column
/// affinity rules settle the rest.
fn sqlite_type(base: &str) -> Option<DataType> {
    let exact = match base {
        "boolean" | "bool" => Some(DataType::Boolean),
        "smallint" | "tinyint" | "int2" => Some(DataType::SmallInteger),
        "bigint" | "int8" | "unsigned big int" => Some(DataType::BigInteger),
        "varchar" | "character varying" | "nvarchar" | "varying character" => {
            Some(DataType::String)
        }
        "char" | "character" | "nchar" | "native character" => Some(DataType::Char),
        "date" => Some(DataType::Date),
        "time" => Some(DataType::Time),
        "datetime" => Some(DataType::DateTime),
        "timestamp" => Some(DataType::Timestamp),
        "json" => Some(DataType::Json),
        "uuid" => Some(DataType::Uuid),
        "numeric" | "decimal" => Some(DataType::Decimal),
        "float" => Some(DataType::Float),
        _ => None,
    };
    if exact.is_some() {
        return exact;
    }

    if base.contains("int") {
        Some(DataType::Integer)
    } else if base.contains("char") || base.contains("clob") || base.contains("text") {
        Some(DataType::Text)
    } else if base.is_empty() || base.contains("blob") {
        Some(DataType::Binary)
    } else if base.contains("real") || base.contains("floa") || base.contains("doub") {
        Some(DataType::Double)
    } else {
        None
    }
}
