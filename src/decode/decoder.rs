use crate::decode::detect::{classify_number, classify_string, ParseWarning};
use crate::error::DecodeError;
use crate::types::{DecoderConfig, FieldValue, RowRecord};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Result of a single [`RowDecoder::advance`] call
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Row(RowRecord),
    /// The array closed normally
    Exhausted,
    /// The pass stopped on a terminal error, see [`RowDecoder::error`]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Just past `[`
    First,
    /// Just past an element
    Next,
    Done,
    Failed,
}

/// Everything a finished pass leaves behind
#[derive(Debug)]
pub struct DecodeReport {
    pub rows: usize,
    pub warnings: Vec<ParseWarning>,
    pub error: Option<DecodeError>,
}

/// Pull-based decoder over a top-level JSON array of objects
///
/// Each object is read from the underlying stream only when the next row is
/// requested. Errors never surface mid-iteration: the pass ends and the error
/// is stored for [`RowDecoder::error`]. The reader is dropped as soon as the
/// pass ends, normally or not.
pub struct RowDecoder<R: BufRead> {
    reader: Option<R>,
    config: DecoderConfig,
    state: State,
    warnings: Vec<ParseWarning>,
    error: Option<DecodeError>,
    rows: usize,
}

impl RowDecoder<BufReader<File>> {
    /// Open a file for decoding; an open failure is stored, not returned
    pub fn open<P: AsRef<Path>>(path: P, config: DecoderConfig) -> Self {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => {
                tracing::debug!(path = %path.display(), "opened JSON source");
                Self::new(BufReader::new(file), config)
            }
            Err(e) => Self::failed(DecodeError::Io(e), config),
        }
    }
}

impl<R: BufRead> RowDecoder<R> {
    /// Start decoding from a reader, consuming everything up to the opening `[`
    pub fn new(reader: R, config: DecoderConfig) -> Self {
        let mut decoder = RowDecoder {
            reader: Some(reader),
            config,
            state: State::First,
            warnings: Vec::new(),
            error: None,
            rows: 0,
        };

        if let Err(e) = decoder.open_array() {
            decoder.fail(e);
        }

        decoder
    }

    fn failed(error: DecodeError, config: DecoderConfig) -> Self {
        let mut decoder = RowDecoder {
            reader: None,
            config,
            state: State::First,
            warnings: Vec::new(),
            error: None,
            rows: 0,
        };
        decoder.fail(error);
        decoder
    }

    /// Decode the next row, or report why there is none
    pub fn advance(&mut self) -> Step {
        match self.state {
            State::Done => return Step::Exhausted,
            State::Failed => return Step::Failed,
            State::First | State::Next => {}
        }

        match self.next_row() {
            Ok(Some(row)) => {
                self.rows += 1;
                self.state = State::Next;
                Step::Row(row)
            }
            Ok(None) => {
                self.finish();
                Step::Exhausted
            }
            Err(e) => {
                self.fail(e);
                Step::Failed
            }
        }
    }

    /// Terminal error of this pass, if it stopped early
    pub fn error(&self) -> Option<&DecodeError> {
        self.error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<DecodeError> {
        self.error.take()
    }

    /// Warnings recorded so far, in the order they were found
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ParseWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn rows_decoded(&self) -> usize {
        self.rows
    }

    /// True once the pass has ended, normally or not
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done | State::Failed)
    }

    pub fn into_report(self) -> DecodeReport {
        DecodeReport {
            rows: self.rows,
            warnings: self.warnings,
            error: self.error,
        }
    }

    fn finish(&mut self) {
        self.reader = None;
        self.state = State::Done;
        tracing::debug!(rows = self.rows, warnings = self.warnings.len(), "decode pass exhausted");
    }

    fn fail(&mut self, error: DecodeError) {
        tracing::warn!(error = %error, rows = self.rows, "decode pass stopped");
        self.reader = None;
        self.state = State::Failed;
        self.error = Some(error);
    }

    fn open_array(&mut self) -> Result<(), DecodeError> {
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Ok(()),
        };

        skip_byte_order_mark(reader)?;
        match peek_significant(reader)? {
            Some(b'[') => {
                reader.consume(1);
                Ok(())
            }
            Some(_) => Err(DecodeError::format("top-level value is not an array")),
            None => Err(DecodeError::format("empty input, expected an array")),
        }
    }

    fn next_row(&mut self) -> Result<Option<RowRecord>, DecodeError> {
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Ok(None),
        };

        let mut next = peek_significant(reader)?;
        if self.state == State::Next {
            match next {
                Some(b',') => {
                    reader.consume(1);
                    next = peek_significant(reader)?;
                    if next == Some(b']') {
                        return Err(DecodeError::format("trailing comma before end of array"));
                    }
                }
                Some(b']') => {}
                Some(other) => {
                    return Err(DecodeError::format(format!(
                        "expected ',' or ']' after element {}, found '{}'",
                        self.rows,
                        char::from(other)
                    )));
                }
                None => return Err(DecodeError::format("array is not terminated")),
            }
        }

        match next {
            Some(b']') => {
                // nothing past the closing bracket is read
                reader.consume(1);
                Ok(None)
            }
            Some(b'{') => {
                // the deserializer stops right after the closing brace
                let object = {
                    let mut de = serde_json::Deserializer::from_reader(&mut *reader);
                    Map::<String, Value>::deserialize(&mut de)?
                };
                self.classify_object(object).map(Some)
            }
            Some(other) => Err(DecodeError::format(format!(
                "array element {} is not an object (starts with '{}')",
                self.rows,
                char::from(other)
            ))),
            None => Err(DecodeError::format("array is not terminated")),
        }
    }

    fn classify_object(&mut self, object: Map<String, Value>) -> Result<RowRecord, DecodeError> {
        let mut row = RowRecord::new();

        for (field, value) in object {
            let value = match value {
                Value::Null => FieldValue::Null,
                Value::Bool(b) => FieldValue::Bool(b),
                Value::Number(n) => classify_number(&n),
                Value::String(s) => classify_string(s, &self.config, &mut self.warnings),
                Value::Array(_) | Value::Object(_) => {
                    return Err(DecodeError::Unsupported { field });
                }
            };
            row.insert(field, value);
        }

        Ok(row)
    }
}

impl<R: BufRead> Iterator for RowDecoder<R> {
    type Item = RowRecord;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Step::Row(row) => Some(row),
            Step::Exhausted | Step::Failed => None,
        }
    }
}

/// Drop a leading UTF-8 byte order mark, if there is one
fn skip_byte_order_mark<R: BufRead>(reader: &mut R) -> io::Result<()> {
    const BOM: &[u8] = b"\xEF\xBB\xBF";

    if reader.fill_buf()?.starts_with(BOM) {
        reader.consume(BOM.len());
    }
    Ok(())
}

/// Skip JSON whitespace and return the next byte without consuming it
fn peek_significant<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        let (skipped, found) = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }
            let skipped = buf
                .iter()
                .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                .count();
            (skipped, buf.get(skipped).copied())
        };

        reader.consume(skipped);
        if found.is_some() {
            return Ok(found);
        }
    }
}
