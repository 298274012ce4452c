use crate::types::FieldValue;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Resolved column type of a field
///
/// The types form a small join lattice: `Unresolved` is the bottom,
/// `Text` the top, `Integer < Double` and `Date < DateTime` are the only
/// widening chains. Every other pair of distinct types joins to `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Integer,
    Double,
    Date,
    DateTime,
    Time,
    Text,
    /// Only nulls observed so far
    Unresolved,
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::Boolean,
        FieldType::Integer,
        FieldType::Double,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Time,
        FieldType::Text,
        FieldType::Unresolved,
    ];

    /// Type evidence carried by a single value
    pub fn of(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => FieldType::Unresolved,
            FieldValue::Bool(_) => FieldType::Boolean,
            FieldValue::Integer(_) => FieldType::Integer,
            FieldValue::Decimal(_) => FieldType::Double,
            FieldValue::Date(_) => FieldType::Date,
            FieldValue::DateTime(_) => FieldType::DateTime,
            FieldValue::Time(_) => FieldType::Time,
            FieldValue::Text(_) => FieldType::Text,
        }
    }

    /// Join of two observations; symmetric, associative and idempotent
    pub fn merge(self, other: FieldType) -> FieldType {
        use FieldType::*;

        match (self, other) {
            (a, b) if a == b => a,
            (Unresolved, t) | (t, Unresolved) => t,
            (Integer, Double) | (Double, Integer) => Double,
            (Date, DateTime) | (DateTime, Date) => DateTime,
            _ => Text,
        }
    }

    pub fn is_resolved(self) -> bool {
        self != FieldType::Unresolved
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Double => "double",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Time => "time",
            FieldType::Text => "text",
            FieldType::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field type '{}'", s))
    }
}

/// Concrete type given to columns that only ever saw nulls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedPolicy {
    fallback: FieldType,
}

impl UnresolvedPolicy {
    /// `None` if `fallback` is itself `Unresolved`
    pub fn new(fallback: FieldType) -> Option<Self> {
        fallback.is_resolved().then_some(UnresolvedPolicy { fallback })
    }

    pub fn fallback(&self) -> FieldType {
        self.fallback
    }

    pub fn resolve(&self, field_type: FieldType) -> FieldType {
        if field_type.is_resolved() {
            field_type
        } else {
            self.fallback
        }
    }
}

impl Default for UnresolvedPolicy {
    fn default() -> Self {
        UnresolvedPolicy {
            fallback: FieldType::Boolean,
        }
    }
}
