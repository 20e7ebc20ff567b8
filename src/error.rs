//! Error taxonomy for a transpile run.
//!
//! Every failure is fatal for the run that raised it: there is no partial
//! output and nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const TRANSLATION_ERROR: &str = "TRANSLATION_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const ENCODING_ERROR: &str = "ENCODING_ERROR";

#[derive(Debug, Error)]
pub enum TranspileError {
    /// The source is not valid JavaScript + JSX.
    #[error("failed to parse source: {}", messages.join("; "))]
    Parse { messages: Vec<String> },

    /// A markup shape the lowerer cannot turn into DOM calls.
    #[error("unsupported markup: {message}")]
    Translation { message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown encoding `{label}`")]
    UnknownEncoding { label: String },
}

impl TranspileError {
    pub fn translation(message: impl Into<String>) -> Self {
        TranspileError::Translation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            TranspileError::Parse { .. } => PARSE_ERROR,
            TranspileError::Translation { .. } => TRANSLATION_ERROR,
            TranspileError::Io { .. } => IO_ERROR,
            TranspileError::UnknownEncoding { .. } => ENCODING_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let parse = TranspileError::Parse {
            messages: vec!["Unexpected token".to_string()],
        };
        assert_eq!(parse.code(), "PARSE_ERROR");
        assert_eq!(
            TranspileError::translation("x").code(),
            "TRANSLATION_ERROR"
        );
        assert_eq!(
            TranspileError::UnknownEncoding {
                label: "klingon".to_string()
            }
            .code(),
            "ENCODING_ERROR"
        );
    }

    #[test]
    fn test_parse_message_joins_diagnostics() {
        let err = TranspileError::Parse {
            messages: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "failed to parse source: first; second");
    }

    #[test]
    fn test_io_error_names_path() {
        let err = TranspileError::Io {
            path: PathBuf::from("missing.jsx"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.code(), "IO_ERROR");
        assert!(err.to_string().contains("missing.jsx"));
    }
}
