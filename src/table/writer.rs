use crate::decode::RowDecoder;
use crate::table::coerce::{ColumnValue, TableDefinition};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};

/// Destination for typed rows
///
/// The decoder and unifier never write output themselves; anything that can
/// accept one value per column plugs in here.
pub trait RowSink {
    fn write_row(&mut self, table: &TableDefinition, values: &[ColumnValue]) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects rows in memory
impl RowSink for Vec<Vec<ColumnValue>> {
    fn write_row(&mut self, _table: &TableDefinition, values: &[ColumnValue]) -> Result<()> {
        self.push(values.to_vec());
        Ok(())
    }
}

/// Writes each row as one JSON object per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    skip_nulls: bool,
    rows: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        JsonLinesSink {
            writer,
            skip_nulls: false,
            rows: 0,
        }
    }

    /// Leave null columns out of each line instead of writing `null`
    pub fn skip_nulls(mut self, skip: bool) -> Self {
        self.skip_nulls = skip;
        self
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn write_row(&mut self, table: &TableDefinition, values: &[ColumnValue]) -> Result<()> {
        let mut data = Map::new();
        for (column, value) in table.columns().iter().zip(values) {
            if self.skip_nulls && value.is_null() {
                continue;
            }
            data.insert(column.name.clone(), value.to_json());
        }

        let json = serde_json::to_string(&Value::Object(data))
            .context("Failed to serialize row")?;
        writeln!(self.writer, "{}", json)
            .context("Failed to write row")?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

/// Replay a decode pass into `sink` against a resolved table layout
///
/// Returns the number of rows written. A decode error ends the pass early
/// and stays stored on the decoder for the caller to inspect.
pub fn load_rows<R, S>(
    decoder: &mut RowDecoder<R>,
    table: &TableDefinition,
    sink: &mut S,
) -> Result<usize>
where
    R: BufRead,
    S: RowSink + ?Sized,
{
    let mut written = 0;
    for row in decoder.by_ref() {
        let values = table.coerce_row(&row);
        sink.write_row(table, &values)
            .with_context(|| format!("Failed to write row {}", written + 1))?;
        written += 1;
    }

    sink.finish()?;
    tracing::debug!(rows = written, columns = table.len(), "loaded rows");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{unify, UnresolvedPolicy};
    use crate::types::DecoderConfig;
    use std::io::Cursor;

    const INPUT: &str = r#"[
        {"id": 1, "price": 2.50, "day": "2021-03-05", "flag": null},
        {"id": 2, "price": 3, "day": "2021-03-06T08:00:00"}
    ]"#;

    fn decoder() -> RowDecoder<Cursor<&'static [u8]>> {
        RowDecoder::new(Cursor::new(INPUT.as_bytes()), DecoderConfig::default())
    }

    fn table() -> TableDefinition {
        let schema = unify(decoder());
        TableDefinition::from_schema(&schema, UnresolvedPolicy::default())
    }

    #[test]
    fn test_json_lines_sink() {
        let table = table();
        let mut sink = JsonLinesSink::new(Vec::new());
        let written = load_rows(&mut decoder(), &table, &mut sink).unwrap();
        assert_eq!(written, 2);
        assert_eq!(sink.rows_written(), 2);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines[0]["day"], Value::String("2021-03-05T00:00:00".to_string()));
        assert_eq!(lines[0]["flag"], Value::Null);
        assert_eq!(lines[1]["id"].as_i64(), Some(2));
        assert_eq!(lines[1]["price"].as_i64(), Some(3));
        assert_eq!(lines[0]["price"].as_f64(), Some(2.5));
    }

    #[test]
    fn test_skip_nulls() {
        let table = table();
        let mut sink = JsonLinesSink::new(Vec::new()).skip_nulls(true);
        load_rows(&mut decoder(), &table, &mut sink).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(!output.contains("flag"));
    }

    #[test]
    fn test_decode_error_stops_pass_but_keeps_rows() {
        let table = table();
        let mut broken = RowDecoder::new(
            Cursor::new(r#"[{"id": 7}, {"id": [1]}]"#.as_bytes()),
            DecoderConfig::default(),
        );

        let mut rows: Vec<Vec<ColumnValue>> = Vec::new();
        let written = load_rows(&mut broken, &table, &mut rows).unwrap();

        assert_eq!(written, 1);
        assert_eq!(rows[0][table.column_index("id").unwrap()], ColumnValue::Integer(7));
        assert!(broken.error().is_some());
    }
}
