//! Schema unification
//!
//! [`SchemaBuilder`] is the mutable accumulator of a fold over rows; two
//! builders combine with the same per-field join, so a stream may be split
//! into shards, folded independently and combined in any order. Once the
//! input is exhausted the builder freezes into an immutable [`Schema`].

use crate::schema::field_type::{FieldType, UnresolvedPolicy};
use crate::types::RowRecord;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::thread;

/// Accumulator for per-field type observations
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    fields: HashMap<String, FieldType>,
    rows: usize,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one row into the running schema
    pub fn observe(&mut self, row: &RowRecord) {
        self.rows += 1;
        for (name, value) in row {
            self.record(name, FieldType::of(value));
        }
    }

    /// Merge a single observation for `name`
    pub fn record(&mut self, name: &str, field_type: FieldType) {
        match self.fields.get_mut(name) {
            Some(current) => *current = current.merge(field_type),
            None => {
                self.fields.insert(name.to_string(), field_type);
            }
        }
    }

    /// Combine two partial folds
    pub fn combine(mut self, other: SchemaBuilder) -> SchemaBuilder {
        self.rows += other.rows;
        for (name, field_type) in other.fields {
            match self.fields.get_mut(&name) {
                Some(current) => *current = current.merge(field_type),
                None => {
                    self.fields.insert(name, field_type);
                }
            }
        }
        self
    }

    pub fn rows_observed(&self) -> usize {
        self.rows
    }

    /// Freeze into the final schema
    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields.into_iter().collect(),
            rows: self.rows,
        }
    }
}

impl Extend<RowRecord> for SchemaBuilder {
    fn extend<I: IntoIterator<Item = RowRecord>>(&mut self, rows: I) {
        for row in rows {
            self.observe(&row);
        }
    }
}

/// Unified field name to type mapping, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: BTreeMap<String, FieldType>,
    rows: usize,
}

impl Schema {
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(name, t)| (name.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of rows folded into this schema
    pub fn rows_observed(&self) -> usize {
        self.rows
    }

    /// Fields that never saw a non-null value
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, t)| !t.is_resolved())
            .map(|(name, _)| name)
    }

    /// Every field with a concrete type, `Unresolved` replaced per `policy`
    pub fn resolved(&self, policy: UnresolvedPolicy) -> Vec<(String, FieldType)> {
        self.fields
            .iter()
            .map(|(name, t)| (name.clone(), policy.resolve(*t)))
            .collect()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Unify a sequence of rows in one pass
pub fn unify<I>(rows: I) -> Schema
where
    I: IntoIterator<Item = RowRecord>,
{
    let mut builder = SchemaBuilder::new();
    builder.extend(rows);
    builder.build()
}

/// Unify independent shards on scoped threads, one builder per shard
///
/// The final combine runs on the calling thread after every shard has
/// finished; no builder is shared while shards are running.
pub fn unify_sharded<I>(shards: Vec<I>) -> Schema
where
    I: IntoIterator<Item = RowRecord> + Send,
{
    let builders: Vec<SchemaBuilder> = thread::scope(|scope| {
        let handles: Vec<_> = shards
            .into_iter()
            .map(|shard| {
                scope.spawn(move || {
                    let mut builder = SchemaBuilder::new();
                    builder.extend(shard);
                    builder
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    builders
        .into_iter()
        .fold(SchemaBuilder::new(), SchemaBuilder::combine)
        .build()
}
