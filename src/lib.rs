//! # Ingot - JSON to typed tables
//!
//! Infers a stable tabular schema from an array of heterogeneous JSON objects
//! and coerces every row into it.
//!
//! ## Modules
//!
//! - **decode**: stream a top-level JSON array one object at a time, detecting
//!   booleans, integers, decimals, dates, date-times and times
//! - **schema**: unify per-row type observations into one type per field
//! - **table**: resolve the schema into columns and coerce rows for a writer
//!
//! ## Quick Start
//!
//! ```rust
//! use ingot::{infer_schema, DecoderConfig, FieldType};
//! use std::io::Cursor;
//!
//! let input = r#"[{"a": true}, {"a": null}, {"b": 1}, {"b": 2.5}]"#;
//! let pass = infer_schema(Cursor::new(input), DecoderConfig::default());
//!
//! assert!(pass.report.error.is_none());
//! assert_eq!(pass.schema.get("a"), Some(FieldType::Boolean));
//! assert_eq!(pass.schema.get("b"), Some(FieldType::Double));
//! ```
//!
//! The schema is only final once the whole input has been read. Writing rows
//! takes a second pass over the same source:
//!
//! ```rust
//! use ingot::table::{load_rows, JsonLinesSink, TableDefinition};
//! use ingot::{infer_schema, DecoderConfig, RowDecoder, UnresolvedPolicy};
//! use std::io::Cursor;
//!
//! # fn main() -> anyhow::Result<()> {
//! let input = r#"[{"day": "2021-03-05"}, {"day": "2021-03-06T10:00:00"}]"#;
//! let pass = infer_schema(Cursor::new(input), DecoderConfig::default());
//! let table = TableDefinition::from_schema(&pass.schema, UnresolvedPolicy::default());
//!
//! let mut decoder = RowDecoder::new(Cursor::new(input), DecoderConfig::default());
//! let mut sink = JsonLinesSink::new(Vec::new());
//! let written = load_rows(&mut decoder, &table, &mut sink)?;
//! assert_eq!(written, 2);
//! # Ok(())
//! # }
//! ```

use std::io::BufRead;
use std::path::Path;
use std::thread;

pub mod decode;
pub mod error;
pub mod schema;
pub mod table;
pub mod types;

// Re-export commonly used types for convenience
pub use decode::{DecodeReport, ParseWarning, RowDecoder, Step};
pub use error::DecodeError;
pub use schema::{unify, FieldType, Schema, SchemaBuilder, UnresolvedPolicy};
pub use types::{DecoderConfig, FieldValue, RowRecord};

/// Result of a schema-inference pass
#[derive(Debug)]
pub struct SchemaPass {
    /// Unified from every row decoded before the pass ended
    pub schema: Schema,
    pub report: DecodeReport,
}

impl SchemaPass {
    /// No warnings and no terminal error
    pub fn is_clean(&self) -> bool {
        self.report.error.is_none() && self.report.warnings.is_empty()
    }
}

/// Result of inferring one schema over several sources in parallel
#[derive(Debug)]
pub struct ShardedPass {
    pub schema: Schema,
    /// Warnings from every shard; order across shards is not meaningful
    pub warnings: Vec<ParseWarning>,
    pub errors: Vec<DecodeError>,
}

/// Decode a JSON array from `reader` and unify its rows
pub fn infer_schema<R: BufRead>(reader: R, config: DecoderConfig) -> SchemaPass {
    schema_pass(RowDecoder::new(reader, config))
}

/// Same as [`infer_schema`] for a file; an open failure lands in the report
pub fn infer_schema_from_path<P: AsRef<Path>>(path: P, config: DecoderConfig) -> SchemaPass {
    schema_pass(RowDecoder::open(path, config))
}

fn schema_pass<R: BufRead>(mut decoder: RowDecoder<R>) -> SchemaPass {
    let mut builder = SchemaBuilder::new();
    builder.extend(decoder.by_ref());

    SchemaPass {
        schema: builder.build(),
        report: decoder.into_report(),
    }
}

/// Infer one schema across several files, each decoded on its own thread
pub fn infer_schema_sharded<P>(paths: &[P], config: &DecoderConfig) -> ShardedPass
where
    P: AsRef<Path> + Sync,
{
    let shards: Vec<(SchemaBuilder, DecodeReport)> = thread::scope(|scope| {
        let handles: Vec<_> = paths
            .iter()
            .map(|path| {
                let config = config.clone();
                scope.spawn(move || {
                    let mut decoder = RowDecoder::open(path, config);
                    let mut builder = SchemaBuilder::new();
                    builder.extend(decoder.by_ref());
                    (builder, decoder.into_report())
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    let mut combined = SchemaBuilder::new();
    let mut warnings = Vec::new();
    let mut errors = Vec::new();
    for (builder, report) in shards {
        combined = combined.combine(builder);
        warnings.extend(report.warnings);
        errors.extend(report.error);
    }

    ShardedPass {
        schema: combined.build(),
        warnings,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn pass(input: &str) -> SchemaPass {
        infer_schema(Cursor::new(input.as_bytes()), DecoderConfig::default())
    }

    #[test]
    fn test_bad_date_demotes_field_to_text() {
        let result = pass(r#"[{"a":"2021-03-05"},{"a":"2021-13-40"}]"#);

        assert_eq!(result.schema.get("a"), Some(FieldType::Text));
        assert_eq!(result.report.warnings.len(), 1);
        assert!(result.report.error.is_none());
        assert!(!result.is_clean());
    }

    #[test]
    fn test_null_and_missing_fields() {
        let result = pass(r#"[{"a":true},{"a":null},{"b":1}]"#);

        assert_eq!(result.schema.len(), 2);
        assert_eq!(result.schema.get("a"), Some(FieldType::Boolean));
        assert_eq!(result.schema.get("b"), Some(FieldType::Integer));
        assert!(result.is_clean());
    }

    #[test]
    fn test_widening_and_conflicts() {
        let result = pass(
            r#"[
                {"n": 1, "d": "2021-01-01", "x": true},
                {"n": 1.25, "d": "2021-01-02T03:04:05", "x": 7}
            ]"#,
        );

        assert_eq!(result.schema.get("n"), Some(FieldType::Double));
        assert_eq!(result.schema.get("d"), Some(FieldType::DateTime));
        assert_eq!(result.schema.get("x"), Some(FieldType::Text));
    }

    #[test]
    fn test_top_level_object() {
        let result = pass(r#"{"not":"an array"}"#);

        assert!(result.schema.is_empty());
        assert_eq!(result.report.rows, 0);
        assert!(matches!(result.report.error, Some(DecodeError::Format(_))));
    }

    #[test]
    fn test_partial_schema_survives_fatal_error() {
        let result = pass(r#"[{"a": 1}, {"a": 2, "b": {"nested": true}}]"#);

        assert_eq!(result.schema.get("a"), Some(FieldType::Integer));
        assert!(!result.schema.contains("b"));
        assert_eq!(result.report.rows, 1);
        assert!(matches!(
            result.report.error,
            Some(DecodeError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_shuffled_input_gives_same_schema() {
        let forward = pass(r#"[{"a": 1}, {"a": null, "b": "x"}, {"a": 2.0, "b": "2020-02-02"}]"#);
        let shuffled = pass(r#"[{"a": 2.0, "b": "2020-02-02"}, {"a": 1}, {"a": null, "b": "x"}]"#);
        assert_eq!(forward.schema, shuffled.schema);
    }

    #[test]
    fn test_sharded_files() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        write!(first, r#"[{{"a": 1, "t": "2021-02-30"}}]"#).unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        write!(second, r#"[{{"a": 1.5, "u": null}}]"#).unwrap();

        let paths = vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
            "/definitely/not/here.json".into(),
        ];
        let result = infer_schema_sharded(&paths, &DecoderConfig::default());

        assert_eq!(result.schema.get("a"), Some(FieldType::Double));
        assert_eq!(result.schema.get("t"), Some(FieldType::Text));
        assert_eq!(result.schema.get("u"), Some(FieldType::Unresolved));
        assert_eq!(result.schema.rows_observed(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.errors.len(), 1);
    }
}
