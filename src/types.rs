use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::BTreeMap;
use std::fmt;

/// One decoded JSON object: field name to classified scalar value
pub type RowRecord = BTreeMap<String, FieldValue>;

/// A scalar JSON value after type detection
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Present in the row, but carries no type evidence
    Null,
    Bool(bool),
    Integer(i64),
    /// Floating-point literal, kept at the precision written in the source
    Decimal(BigDecimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => {
                write!(f, "{}T{}", dt.format("%Y-%m-%d"), dt.format(time_format(dt)))
            }
            FieldValue::Time(t) => write!(f, "{}", t.format(time_format(t))),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Seconds and fractions are only written when non-zero
fn time_format<T: Timelike>(t: &T) -> &'static str {
    if t.nanosecond() != 0 {
        "%H:%M:%S%.f"
    } else if t.second() != 0 {
        "%H:%M:%S"
    } else {
        "%H:%M"
    }
}

/// Configuration for the row decoder
///
/// Fixed for the lifetime of a decoder; build one per process and hand
/// clones to every pass so both passes classify values identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Recognize bare `HH:MM` / `HH:MM:SS` strings as times
    pub parse_times: bool,

    /// Parse the time-of-day part of `YYYY-MM-DDT...` strings instead of
    /// keeping only the calendar date
    pub full_date_times: bool,
}

impl DecoderConfig {
    pub fn with_parse_times(mut self, enabled: bool) -> Self {
        self.parse_times = enabled;
        self
    }

    pub fn with_full_date_times(mut self, enabled: bool) -> Self {
        self.full_date_times = enabled;
        self
    }
}
