//! Snowflake scalar and semi-structured column types.
use std::fmt;
use std::str::FromStr;

use crate::errors::{SnowflakeError, SnowflakeResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Number,
    Float,
    Varchar,
    Binary,
    Boolean,
    Date,
    Time,
    TimestampLtz,
    TimestampNtz,
    TimestampTz,
    Variant,
    Object,
    Array,
    Geography,
    Geometry,
}

// Longer synonyms must come before their own prefixes within a bucket,
// and buckets sharing a prefix (TIMESTAMP*, TIME) are ordered most specific first.
const SYNONYMS: &[(DataType, &[&str])] = &[
    (
        DataType::Number,
        &[
            "NUMBER", "DECIMAL", "NUMERIC", "INTEGER", "INT", "BIGINT", "SMALLINT", "TINYINT",
            "BYTEINT",
        ],
    ),
    (
        DataType::Float,
        &[
            "FLOAT8",
            "FLOAT4",
            "FLOAT",
            "DOUBLE PRECISION",
            "DOUBLE",
            "REAL",
        ],
    ),
    (
        DataType::Varchar,
        &["VARCHAR", "CHARACTER", "CHAR", "STRING", "TEXT", "NVARCHAR2", "NVARCHAR", "NCHAR"],
    ),
    (DataType::Binary, &["VARBINARY", "BINARY"]),
    (DataType::Boolean, &["BOOLEAN", "BOOL"]),
    (
        DataType::TimestampLtz,
        &[
            "TIMESTAMP_LTZ",
            "TIMESTAMPLTZ",
            "TIMESTAMP WITH LOCAL TIME ZONE",
        ],
    ),
    (
        DataType::TimestampTz,
        &["TIMESTAMP_TZ", "TIMESTAMPTZ", "TIMESTAMP WITH TIME ZONE"],
    ),
    (
        DataType::TimestampNtz,
        &[
            "TIMESTAMP_NTZ",
            "TIMESTAMPNTZ",
            "TIMESTAMP WITHOUT TIME ZONE",
            "DATETIME",
            "TIMESTAMP",
        ],
    ),
    (DataType::Date, &["DATE"]),
    (DataType::Time, &["TIME"]),
    (DataType::Variant, &["VARIANT"]),
    (DataType::Object, &["OBJECT"]),
    (DataType::Array, &["ARRAY"]),
    (DataType::Geography, &["GEOGRAPHY"]),
    (DataType::Geometry, &["GEOMETRY"]),
];

impl DataType {
    /// Parse any of Snowflake's spellings of a type, ignoring case and any
    /// trailing precision/length, e.g. `decimal(38, 0)` or `Text`.
    pub fn parse(input: &str) -> SnowflakeResult<DataType> {
        let normalized = input.trim().to_ascii_uppercase();
        for (data_type, synonyms) in SYNONYMS {
            for synonym in *synonyms {
                if let Some(rest) = normalized.strip_prefix(synonym) {
                    // Avoid "INTERVAL" matching "INT" or "DATETIME" matching "DATE".
                    if rest.is_empty() || rest.starts_with(['(', ' ']) {
                        return Ok(*data_type);
                    }
                }
            }
        }
        Err(SnowflakeError::InvalidDataType(input.to_owned()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Number => "NUMBER",
            DataType::Float => "FLOAT",
            DataType::Varchar => "VARCHAR",
            DataType::Binary => "BINARY",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::TimestampLtz => "TIMESTAMP_LTZ",
            DataType::TimestampNtz => "TIMESTAMP_NTZ",
            DataType::TimestampTz => "TIMESTAMP_TZ",
            DataType::Variant => "VARIANT",
            DataType::Object => "OBJECT",
            DataType::Array => "ARRAY",
            DataType::Geography => "GEOGRAPHY",
            DataType::Geometry => "GEOMETRY",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = SnowflakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::parse(s)
    }
}
