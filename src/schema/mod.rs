//! Schema unification
//!
//! Folds per-row type observations into one column type per field name
//! using an associative, commutative merge.

pub mod builder;
pub mod field_type;

pub use builder::{unify, unify_sharded, Schema, SchemaBuilder};
pub use field_type::{FieldType, UnresolvedPolicy};
