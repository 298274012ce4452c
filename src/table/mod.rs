//! Typed row materialization
//!
//! Turns a unified [`Schema`](crate::schema::Schema) into a concrete column
//! layout and coerces decoded rows into it for an external writer.

pub mod coerce;
pub mod writer;

pub use coerce::{coerce, Column, ColumnValue, TableDefinition};
pub use writer::{load_rows, JsonLinesSink, RowSink};
