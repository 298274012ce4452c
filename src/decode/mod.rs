//! Streaming row decoding
//!
//! Reads a top-level JSON array one object at a time and classifies every
//! scalar into a [`FieldValue`](crate::types::FieldValue).

pub mod decoder;
pub mod detect;

pub use decoder::{DecodeReport, RowDecoder, Step};
pub use detect::{ParseWarning, WarningKind};
