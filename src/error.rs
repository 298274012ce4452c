use std::io;

/// Terminal failure of a decode pass
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unable to read source: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected JSON format: {0}")]
    Format(String),

    #[error("unsupported object structure in field '{field}'")]
    Unsupported { field: String },
}

impl DecodeError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        DecodeError::Format(msg.into())
    }

    /// True for malformed or unsupported input, false for I/O failures
    pub fn is_fatal_structure(&self) -> bool {
        matches!(self, DecodeError::Format(_) | DecodeError::Unsupported { .. })
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            DecodeError::Io(err.into())
        } else {
            DecodeError::Format(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_errors_are_format_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{\"a\":").unwrap_err();
        let decode: DecodeError = err.into();
        assert!(matches!(decode, DecodeError::Format(_)));
        assert!(decode.is_fatal_structure());
    }

    #[test]
    fn test_io_errors_are_not_structural() {
        let err = DecodeError::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(!err.is_fatal_structure());
        assert_eq!(err.to_string(), "unable to read source: missing");
    }
}
