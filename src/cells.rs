use chrono::{
    naive::{NaiveDate, NaiveDateTime, NaiveTime},
    DateTime, Duration, FixedOffset, Local, TimeZone, Utc,
};

use crate::errors::{SnowflakeError, SnowflakeResult};

/// The wire type of a column, as reported in the result set metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawCell {
    Fixed,
    Real,
    Text,
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
    /// Types without a dedicated cell, such as GEOGRAPHY or VECTOR, read as text.
    #[serde(other)]
    Other,
}

fn split_epoch(value: &str) -> Option<(i64, u32)> {
    let (seconds, fraction) = match value.split_once('.') {
        Some((seconds, fraction)) => (seconds, fraction),
        None => (value, ""),
    };
    let seconds: i64 = seconds.parse().ok()?;
    let nanos = if fraction.is_empty() {
        0
    } else {
        let digits = &fraction[..fraction.len().min(9)];
        let scale = 10u32.pow(9 - digits.len() as u32);
        digits.parse::<u32>().ok()? * scale
    };
    // Negative epochs carry the fraction towards zero.
    if value.starts_with('-') && nanos > 0 {
        return Some((seconds - 1, 1_000_000_000 - nanos));
    }
    Some((seconds, nanos))
}

impl RawCell {
    /// Convert a raw string value into a [`Cell`].
    ///
    /// The SQL API serializes every value as a string:
    ///
    /// - NUMBER columns become `Int` when they fit in an i128, otherwise `Float`
    /// - DATE is days since the epoch, TIME is seconds since midnight
    /// - timestamps are seconds since the epoch, with TIMESTAMP_TZ followed by
    ///   the offset in minutes plus 1440
    pub fn to_cell(&self, value: &Option<String>) -> SnowflakeResult<Cell> {
        let value = if let Some(value) = value {
            value
        } else {
            return Ok(Cell::Null);
        };
        let fail = |message: &str| SnowflakeError::decoding(format!("{self:?}"), format!("{message}: {value}"));
        Ok(match self {
            RawCell::Fixed => match value.trim_end_matches(".0").parse() {
                Ok(value) => Cell::Int(value),
                Err(_) => Cell::Float(value.parse().map_err(|_| fail("not a number"))?),
            },
            RawCell::Real => Cell::Float(value.parse().map_err(|_| fail("not a float"))?),
            RawCell::Text
            | RawCell::Variant
            | RawCell::Object
            | RawCell::Array
            | RawCell::Other => {
                Cell::Varchar(value.to_owned())
            }
            RawCell::Binary => Cell::Binary(hex::decode(value).map_err(|_| fail("not hex"))?),
            RawCell::Boolean => Cell::Boolean(value.parse().map_err(|_| fail("not a boolean"))?),
            RawCell::Date => {
                let days: i64 = value.parse().map_err(|_| fail("not a day count"))?;
                let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).ok_or_else(|| fail("epoch"))?;
                Cell::Date(epoch + Duration::days(days))
            }
            RawCell::Time => {
                let (seconds, nanos) = split_epoch(value).ok_or_else(|| fail("not a time"))?;
                Cell::Time(
                    NaiveTime::from_num_seconds_from_midnight_opt(seconds as u32, nanos)
                        .ok_or_else(|| fail("time out of range"))?,
                )
            }
            RawCell::TimestampLtz => {
                let (seconds, nanos) = split_epoch(value).ok_or_else(|| fail("not a timestamp"))?;
                Cell::TimestampLtz(
                    Local
                        .timestamp_opt(seconds, nanos)
                        .single()
                        .ok_or_else(|| fail("timestamp out of range"))?,
                )
            }
            RawCell::TimestampNtz => {
                let (seconds, nanos) = split_epoch(value).ok_or_else(|| fail("not a timestamp"))?;
                Cell::TimestampNtz(
                    DateTime::<Utc>::from_timestamp(seconds, nanos)
                        .ok_or_else(|| fail("timestamp out of range"))?
                        .naive_utc(),
                )
            }
            RawCell::TimestampTz => {
                let (epoch, offset) = value
                    .split_once(' ')
                    .ok_or_else(|| fail("missing time zone offset"))?;
                let (seconds, nanos) = split_epoch(epoch).ok_or_else(|| fail("not a timestamp"))?;
                let minutes: i32 = offset.parse().map_err(|_| fail("bad offset"))?;
                let offset = FixedOffset::east_opt((minutes - 1440) * 60)
                    .ok_or_else(|| fail("offset out of range"))?;
                Cell::TimestampTz(
                    offset
                        .timestamp_opt(seconds, nanos)
                        .single()
                        .ok_or_else(|| fail("timestamp out of range"))?,
                )
            }
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Null,
    Int(i128),
    Float(f64),
    Varchar(String),
    Binary(Vec<u8>),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    TimestampLtz(DateTime<Local>),
    TimestampNtz(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
}

impl From<Cell> for serde_json::Value {
    fn from(cell: Cell) -> Self {
        use serde_json::json;
        use Cell::*;
        match cell {
            Null => json!(null),
            Int(value) => json!(value),
            Float(value) => json!(value),
            Varchar(value) => json!(value),
            Binary(value) => json!(hex::encode(value)),
            Boolean(value) => json!(value),
            Date(value) => json!(value),
            Time(value) => json!(value),
            TimestampLtz(value) => json!(value),
            TimestampNtz(value) => json!(value),
            TimestampTz(value) => json!(value),
        }
    }
}

/// Conversion from a non-null [`Cell`] into a Rust value.
///
/// SHOW and DESCRIBE output is loosely typed (many numeric or boolean columns
/// are returned as text), so conversions accept any sensible representation.
pub trait FromCell: Sized {
    fn from_cell(cell: Cell) -> Result<Self, String>;
}

impl FromCell for String {
    fn from_cell(cell: Cell) -> Result<Self, String> {
        Ok(match cell {
            Cell::Null => String::new(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::Varchar(v) => v,
            Cell::Binary(v) => hex::encode(v),
            Cell::Boolean(v) => v.to_string(),
            Cell::Date(v) => v.to_string(),
            Cell::Time(v) => v.to_string(),
            Cell::TimestampLtz(v) => v.to_rfc3339(),
            Cell::TimestampNtz(v) => v.to_string(),
            Cell::TimestampTz(v) => v.to_rfc3339(),
        })
    }
}

impl FromCell for i64 {
    fn from_cell(cell: Cell) -> Result<Self, String> {
        match cell {
            Cell::Int(v) => i64::try_from(v).map_err(|e| e.to_string()),
            Cell::Float(v) if v.fract() == 0.0 => Ok(v as i64),
            Cell::Varchar(v) => v
                .trim()
                .trim_end_matches(".0")
                .parse()
                .map_err(|_| format!("{v:?} is not an integer")),
            other => Err(format!("{other:?} is not an integer")),
        }
    }
}

impl FromCell for i32 {
    fn from_cell(cell: Cell) -> Result<Self, String> {
        i32::try_from(i64::from_cell(cell)?).map_err(|e| e.to_string())
    }
}

impl FromCell for u64 {
    fn from_cell(cell: Cell) -> Result<Self, String> {
        u64::try_from(i64::from_cell(cell)?).map_err(|e| e.to_string())
    }
}

impl FromCell for f64 {
    fn from_cell(cell: Cell) -> Result<Self, String> {
        match cell {
            Cell::Int(v) => Ok(v as f64),
            Cell::Float(v) => Ok(v),
            Cell::Varchar(v) => v.trim().parse().map_err(|_| format!("{v:?} is not a number")),
            other => Err(format!("{other:?} is not a number")),
        }
    }
}

impl FromCell for bool {
    fn from_cell(cell: Cell) -> Result<Self, String> {
        match cell {
            Cell::Boolean(v) => Ok(v),
            Cell::Int(v) => Ok(v != 0),
            Cell::Varchar(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "y" | "yes" | "on" | "1" => Ok(true),
                "false" | "n" | "no" | "off" | "0" | "" => Ok(false),
                _ => Err(format!("{v:?} is not a boolean")),
            },
            other => Err(format!("{other:?} is not a boolean")),
        }
    }
}

impl FromCell for DateTime<Utc> {
    fn from_cell(cell: Cell) -> Result<Self, String> {
        match cell {
            Cell::TimestampLtz(v) => Ok(v.with_timezone(&Utc)),
            Cell::TimestampTz(v) => Ok(v.with_timezone(&Utc)),
            Cell::TimestampNtz(v) => Ok(Utc.from_utc_datetime(&v)),
            Cell::Varchar(v) => DateTime::parse_from_rfc3339(v.trim())
                .map(|v| v.with_timezone(&Utc))
                .map_err(|e| format!("{v:?} is not a timestamp: {e}")),
            other => Err(format!("{other:?} is not a timestamp")),
        }
    }
}

impl FromCell for NaiveDate {
    fn from_cell(cell: Cell) -> Result<Self, String> {
        match cell {
            Cell::Date(v) => Ok(v),
            Cell::Varchar(v) => v.trim().parse().map_err(|_| format!("{v:?} is not a date")),
            other => Err(format!("{other:?} is not a date")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn some(value: &str) -> Option<String> {
        Some(value.to_owned())
    }

    #[test]
    fn null_is_null_for_every_type() {
        for raw in [RawCell::Fixed, RawCell::Text, RawCell::TimestampTz, RawCell::Boolean] {
            assert_eq!(raw.to_cell(&None).unwrap(), Cell::Null);
        }
    }

    #[test]
    fn numbers_prefer_integers() {
        assert_eq!(RawCell::Fixed.to_cell(&some("10")).unwrap(), Cell::Int(10));
        assert_eq!(RawCell::Fixed.to_cell(&some("1.0")).unwrap(), Cell::Int(1));
        assert_eq!(RawCell::Fixed.to_cell(&some("1.5")).unwrap(), Cell::Float(1.5));
        assert!(RawCell::Fixed.to_cell(&some("abc")).is_err());
    }

    #[test]
    fn dates_and_times_decode_from_epoch_values() {
        let Cell::Date(date) = RawCell::Date.to_cell(&some("19358")).unwrap() else {
            panic!("not a date")
        };
        assert_eq!((date.year(), date.month(), date.day()), (2023, 1, 1));

        let Cell::Time(time) = RawCell::Time.to_cell(&some("3661.5")).unwrap() else {
            panic!("not a time")
        };
        assert_eq!((time.hour(), time.minute(), time.second()), (1, 1, 1));
        assert_eq!(time.nanosecond(), 500_000_000);

        let Cell::TimestampNtz(ts) = RawCell::TimestampNtz
            .to_cell(&some("1672534861.000000000"))
            .unwrap()
        else {
            panic!("not a timestamp")
        };
        assert_eq!((ts.year(), ts.hour(), ts.minute(), ts.second()), (2023, 1, 1, 1));
    }

    #[test]
    fn timestamp_tz_carries_its_offset() {
        let Cell::TimestampTz(ts) = RawCell::TimestampTz
            .to_cell(&some("1672534861.000000000 1500"))
            .unwrap()
        else {
            panic!("not a timestamp")
        };
        assert_eq!(ts.offset().local_minus_utc(), 3600);
        assert_eq!(ts.with_timezone(&Utc).hour(), 1);
        assert!(RawCell::TimestampTz.to_cell(&some("1672534861")).is_err());
    }

    #[test]
    fn loose_conversions_for_show_output() {
        assert_eq!(i64::from_cell(Cell::Varchar("7".into())).unwrap(), 7);
        assert!(bool::from_cell(Cell::Varchar("Y".into())).unwrap());
        assert!(!bool::from_cell(Cell::Varchar("false".into())).unwrap());
        assert!(bool::from_cell(Cell::Varchar("maybe".into())).is_err());
        assert_eq!(String::from_cell(Cell::Int(3)).unwrap(), "3");
        assert_eq!(f64::from_cell(Cell::Varchar("2.5".into())).unwrap(), 2.5);
    }
}
