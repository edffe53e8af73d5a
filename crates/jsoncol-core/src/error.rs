//! Error types for schema construction and decoding

use crate::tokens::{Location, TokenKind};

/// Result type alias for jsoncol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for jsoncol operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Invalid schema configuration, raised at build time and never during decode
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Token kind not accepted by the schema node
    #[error("{location}: unexpected {actual} for {expected}")]
    TypeMismatch {
        /// The schema node's type name
        expected: &'static str,
        /// The offending token kind
        actual: TokenKind,
        /// Input position of the offending token
        location: Location,
    },

    /// Value absent where the schema node disallows missing
    #[error("{location}: missing value not allowed for {expected}")]
    MissingMismatch {
        /// The schema node's type name
        expected: &'static str,
        /// Input position where the absence was observed
        location: Location,
    },

    /// Unknown field/tag disallowed, repeated field disallowed, arity underflow
    #[error("{location}: {message}")]
    Structural {
        /// Error description
        message: String,
        /// Input position of the violation
        location: Location,
    },

    /// Malformed JSON token sequence
    #[error("{location}: invalid JSON: {message}")]
    Syntax {
        /// Error description
        message: String,
        /// Input position of the malformed text
        location: Location,
    },

    /// Supplied output column set does not match the compiled schema
    #[error("column binding mismatch: {0}")]
    ColumnBinding(String),

    /// Underlying source unreadable
    #[error("I/O failure: {0}")]
    Io(String),

    /// Cooperative shutdown was requested mid-stream
    #[error("shutdown requested")]
    Shutdown,
}

impl Error {
    /// Create a schema configuration error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create a type mismatch error
    pub fn mismatch(expected: &'static str, actual: TokenKind, location: Location) -> Self {
        Self::TypeMismatch {
            expected,
            actual,
            location,
        }
    }

    /// Create a missing mismatch error
    pub fn missing(expected: &'static str, location: Location) -> Self {
        Self::MissingMismatch { expected, location }
    }

    /// Create a structural error
    pub fn structural(message: impl Into<String>, location: Location) -> Self {
        Self::Structural {
            message: message.into(),
            location,
        }
    }

    /// Create a syntax error
    pub fn syntax(message: impl Into<String>, location: Location) -> Self {
        Self::Syntax {
            message: message.into(),
            location,
        }
    }

    /// Create a column binding error
    pub fn binding(message: impl Into<String>) -> Self {
        Self::ColumnBinding(message.into())
    }

    /// Create an I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_location() {
        let loc = Location::new(12, 2, 3);
        let err = Error::mismatch("int", TokenKind::String, loc);
        let text = err.to_string();
        assert!(text.contains("line 2"), "{text}");
        assert!(text.contains("int"), "{text}");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
