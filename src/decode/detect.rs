//! Value-level type detection
//!
//! Strings are checked against cheap regex gates before a strict chrono
//! parse is attempted. A string that passes a gate but fails the strict
//! parse leaves a [`ParseWarning`] behind and falls through to the next
//! candidate, ending at plain text.

use crate::types::{DecoderConfig, FieldValue};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, ParseResult, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Number;
use std::fmt;
use std::str::FromStr;

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap()
});

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]+.*$").unwrap()
});

static TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2}:[0-9]{2}(:[0-9]{2})?$").unwrap()
});

/// Which strict parse produced a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    Date,
    DateTime,
    Time,
}

impl WarningKind {
    fn as_str(self) -> &'static str {
        match self {
            WarningKind::Date => "Date",
            WarningKind::DateTime => "DateTime",
            WarningKind::Time => "Time",
        }
    }
}

/// A string that looked date/time-shaped but failed strict parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub kind: WarningKind,
    /// The original string value
    pub text: String,
    /// Message from the underlying parser
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Parse Error ({}) - {}",
            self.kind.as_str(),
            self.text,
            self.message
        )
    }
}

/// Classify a JSON number literal
///
/// Integer literals become `Integer`; anything else keeps its source text as
/// a `Decimal`. Integers outside the `i64` range are kept as `Decimal` too.
pub fn classify_number(n: &Number) -> FieldValue {
    if let Some(i) = n.as_i64() {
        return FieldValue::Integer(i);
    }

    let text = n.to_string();
    match BigDecimal::from_str(&text) {
        Ok(d) => FieldValue::Decimal(d),
        // serde_json has already validated the literal
        Err(_) => FieldValue::Text(text),
    }
}

/// Classify a JSON string literal, recording a warning for every strict
/// parse that was gated in but failed
pub fn classify_string(
    text: String,
    config: &DecoderConfig,
    warnings: &mut Vec<ParseWarning>,
) -> FieldValue {
    if is_iso_date(&text) {
        match parse_date(&text) {
            Ok(date) => return FieldValue::Date(date),
            Err(e) => warnings.push(warning(WarningKind::Date, &text, e)),
        }
    }

    if is_iso_datetime(&text) {
        let parsed = if config.full_date_times {
            parse_full_date_time(&text)
        } else {
            parse_date_time_date_part(&text)
        };
        match parsed {
            Ok(dt) => return FieldValue::DateTime(dt),
            Err(e) => warnings.push(warning(WarningKind::DateTime, &text, e)),
        }
    }

    if config.parse_times && is_time(&text) {
        match parse_time(&text) {
            Ok(time) => return FieldValue::Time(time),
            Err(e) => warnings.push(warning(WarningKind::Time, &text, e)),
        }
    }

    FieldValue::Text(text)
}

fn warning(kind: WarningKind, text: &str, err: impl fmt::Display) -> ParseWarning {
    let warning = ParseWarning {
        kind,
        text: text.to_string(),
        message: err.to_string(),
    };
    tracing::debug!(%warning, "strict parse failed");
    warning
}

fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && ISO_DATE_REGEX.is_match(s)
}

fn is_iso_datetime(s: &str) -> bool {
    s.len() > 11 && s.as_bytes()[10] == b'T' && ISO_DATETIME_REGEX.is_match(s)
}

fn is_time(s: &str) -> bool {
    (s.len() == 5 || s.len() == 8) && TIME_REGEX.is_match(s)
}

fn parse_date(s: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

/// Validates only the leading calendar date; the time-of-day suffix is
/// dropped and the value lands at midnight.
fn parse_date_time_date_part(s: &str) -> Result<NaiveDateTime, String> {
    // the gate guarantees ten ASCII bytes before the 'T'
    parse_date(&s[..10])
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|e| e.to_string())
}

fn parse_full_date_time(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return reject_leap_second(dt.naive_local());
    }

    let s = s.strip_suffix('Z').unwrap_or(s);
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| e.to_string())
        .and_then(reject_leap_second)
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    let parsed = if s.len() == 5 {
        NaiveTime::parse_from_str(s, "%H:%M")
    } else {
        NaiveTime::parse_from_str(s, "%H:%M:%S")
    };
    parsed.map_err(|e| e.to_string()).and_then(reject_leap_second)
}

/// chrono reads second 60 as a leap second; local times here stop at 59
fn reject_leap_second<T: Timelike>(value: T) -> Result<T, String> {
    if value.nanosecond() >= 1_000_000_000 {
        Err("input is out of range".to_string())
    } else {
        Ok(value)
    }
}
