use crate::schema::{FieldType, Schema, UnresolvedPolicy};
use crate::types::{FieldValue, RowRecord};
use bigdecimal::ToPrimitive;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};

/// A value ready to be pushed into a typed column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Text(String),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            ColumnValue::Null => Value::Null,
            ColumnValue::Boolean(b) => Value::Bool(*b),
            ColumnValue::Integer(i) => Value::Number((*i).into()),
            ColumnValue::Double(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
            ColumnValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            ColumnValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
            ColumnValue::Time(t) => Value::String(t.format("%H:%M:%S").to_string()),
            ColumnValue::Text(s) => Value::String(s.clone()),
        }
    }
}

/// Convert a decoded value for a column of type `column`
///
/// Values that do not fit the column become `Null`; this never fails.
/// A `Double` column keeps integer values as integers.
pub fn coerce(value: &FieldValue, column: FieldType) -> ColumnValue {
    match (column, value) {
        (_, FieldValue::Null) => ColumnValue::Null,
        (FieldType::Boolean, FieldValue::Bool(b)) => ColumnValue::Boolean(*b),
        (FieldType::Integer, FieldValue::Integer(i)) => ColumnValue::Integer(*i),
        (FieldType::Double, FieldValue::Integer(i)) => ColumnValue::Integer(*i),
        (FieldType::Double, FieldValue::Decimal(d)) => {
            d.to_f64().map_or(ColumnValue::Null, ColumnValue::Double)
        }
        (FieldType::Date, FieldValue::Date(d)) => ColumnValue::Date(*d),
        (FieldType::DateTime, FieldValue::DateTime(dt)) => ColumnValue::DateTime(*dt),
        (FieldType::DateTime, FieldValue::Date(d)) => ColumnValue::DateTime(d.and_time(NaiveTime::MIN)),
        (FieldType::Time, FieldValue::Time(t)) => ColumnValue::Time(*t),
        (FieldType::Text, v) => ColumnValue::Text(v.to_string()),
        _ => ColumnValue::Null,
    }
}

/// A named column with a concrete type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub field_type: FieldType,
}

/// Ordered, fully resolved column layout derived from a [`Schema`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    columns: Vec<Column>,
}

impl TableDefinition {
    /// Columns in field-name order; `Unresolved` replaced per `policy`
    pub fn from_schema(schema: &Schema, policy: UnresolvedPolicy) -> Self {
        let columns = schema
            .resolved(policy)
            .into_iter()
            .map(|(name, field_type)| Column { name, field_type })
            .collect();

        TableDefinition { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// One value per column; fields missing from the row come out `Null`,
    /// fields not in the table are ignored
    pub fn coerce_row(&self, row: &RowRecord) -> Vec<ColumnValue> {
        self.columns
            .iter()
            .map(|column| match row.get(&column.name) {
                Some(value) => coerce(value, column.field_type),
                None => ColumnValue::Null,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::unify;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, 5).unwrap()
    }

    #[test]
    fn test_matching_values_pass_through() {
        assert_eq!(coerce(&FieldValue::Bool(true), FieldType::Boolean), ColumnValue::Boolean(true));
        assert_eq!(coerce(&FieldValue::Integer(7), FieldType::Integer), ColumnValue::Integer(7));
        assert_eq!(coerce(&FieldValue::Date(day()), FieldType::Date), ColumnValue::Date(day()));
    }

    #[test]
    fn test_double_column_widening() {
        let d = FieldValue::Decimal(BigDecimal::from_str("2.5").unwrap());
        assert_eq!(coerce(&d, FieldType::Double), ColumnValue::Double(2.5));
        assert_eq!(coerce(&FieldValue::Integer(3), FieldType::Double), ColumnValue::Integer(3));
    }

    #[test]
    fn test_date_into_datetime_column() {
        let expected = day().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(
            coerce(&FieldValue::Date(day()), FieldType::DateTime),
            ColumnValue::DateTime(expected)
        );
    }

    #[test]
    fn test_text_column_takes_anything() {
        assert_eq!(
            coerce(&FieldValue::Integer(12), FieldType::Text),
            ColumnValue::Text("12".to_string())
        );
        assert_eq!(
            coerce(&FieldValue::Date(day()), FieldType::Text),
            ColumnValue::Text("2021-03-05".to_string())
        );
        assert_eq!(
            coerce(&FieldValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()), FieldType::Text),
            ColumnValue::Text("09:30".to_string())
        );
        assert_eq!(
            coerce(&FieldValue::DateTime(day().and_hms_opt(0, 0, 0).unwrap()), FieldType::Text),
            ColumnValue::Text("2021-03-05T00:00".to_string())
        );
        assert_eq!(coerce(&FieldValue::Null, FieldType::Text), ColumnValue::Null);
    }

    #[test]
    fn test_mismatch_is_null() {
        assert_eq!(coerce(&FieldValue::Integer(1), FieldType::Boolean), ColumnValue::Null);
        assert_eq!(coerce(&FieldValue::Text("x".into()), FieldType::Date), ColumnValue::Null);
        assert_eq!(coerce(&FieldValue::Bool(true), FieldType::Unresolved), ColumnValue::Null);
    }

    #[test]
    fn test_coerce_row_follows_column_order() {
        let rows = vec![
            RowRecord::from([
                ("b".to_string(), FieldValue::Integer(1)),
                ("a".to_string(), FieldValue::Text("x".into())),
            ]),
            RowRecord::from([("c".to_string(), FieldValue::Null)]),
        ];
        let table = TableDefinition::from_schema(&unify(rows.clone()), UnresolvedPolicy::default());

        assert_eq!(table.len(), 3);
        assert_eq!(table.column_index("c"), Some(2));
        assert_eq!(table.columns()[2].field_type, FieldType::Boolean);

        assert_eq!(
            table.coerce_row(&rows[0]),
            vec![
                ColumnValue::Text("x".into()),
                ColumnValue::Integer(1),
                ColumnValue::Null,
            ]
        );
        assert!(table.coerce_row(&rows[1]).iter().all(ColumnValue::is_null));
    }

    #[test]
    fn test_to_json() {
        assert_eq!(ColumnValue::Double(f64::NAN).to_json(), Value::Null);
        assert_eq!(
            ColumnValue::DateTime(day().and_hms_opt(1, 2, 3).unwrap()).to_json(),
            Value::String("2021-03-05T01:02:03".to_string())
        );
    }
}
