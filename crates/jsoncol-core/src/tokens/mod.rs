//! Token reader interface and the bundled JSON pull tokenizer
//!
//! Processors consume JSON through the narrow [`TokenSource`] trait. The
//! bundled [`Lexer`] implements it over in-memory text; anything else that
//! can produce the same token stream (and honor the same cursor contract)
//! can drive the compiled processors.

mod lexer;

pub use lexer::Lexer;

use std::fmt;

use crate::Result;

/// Kind of the current JSON token.
///
/// "Missing" is deliberately not a token: processors are told about absent
/// values through a separate entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// An object member name; `text()` holds the name
    FieldName,
    /// A string value; `text()` holds the unescaped content
    String,
    /// A number with no fraction or exponent; `text()` holds the literal
    Int,
    /// A number with a fraction and/or exponent; `text()` holds the literal
    Decimal,
    /// `true` or `false`; `bool_value()` holds the value
    Bool,
    /// `null`
    Null,
}

impl TokenKind {
    /// Whether this token opens an object or array
    pub fn is_structural_start(self) -> bool {
        matches!(self, Self::BeginObject | Self::BeginArray)
    }

    /// Whether this token can begin a JSON value
    pub fn is_value_start(self) -> bool {
        !matches!(self, Self::EndObject | Self::EndArray | Self::FieldName)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeginObject => "'{'",
            Self::EndObject => "'}'",
            Self::BeginArray => "'['",
            Self::EndArray => "']'",
            Self::FieldName => "field name",
            Self::String => "string",
            Self::Int => "integer",
            Self::Decimal => "decimal",
            Self::Bool => "boolean",
            Self::Null => "null",
        };
        f.write_str(name)
    }
}

/// Position within the input text, tracked per token for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// Byte offset from the start of the input
    pub offset: usize,
    /// 1-based line number
    pub line: u32,
    /// 1-based column number in bytes from the start of the line
    pub column: u32,
}

impl Location {
    /// Create a new location
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Streaming token cursor over one JSON document (or a concatenation of
/// top-level values).
///
/// Cursor contract, shared with every compiled processor: a processor is
/// entered with the current token being the *first* token of its value and
/// must return with the current token being the *last* token of that value
/// (the scalar itself, or the matching `EndObject`/`EndArray`).
pub trait TokenSource {
    /// Kind of the current token; `None` before the first [`advance`] and
    /// after the input is exhausted.
    ///
    /// [`advance`]: TokenSource::advance
    fn current(&self) -> Option<TokenKind>;

    /// Advance to the next token, returning its kind, or `None` at the end
    /// of input between top-level values.
    fn advance(&mut self) -> Result<Option<TokenKind>>;

    /// Text of the current `String`, `Int`, `Decimal`, or `FieldName` token.
    ///
    /// Borrows from the source where the text needed no unescaping.
    fn text(&self) -> &str;

    /// Value of the current `Bool` token.
    fn bool_value(&self) -> bool;

    /// Consume the current value wholesale. For `BeginObject`/`BeginArray`
    /// this advances to the matching end token; for scalars it is a no-op.
    fn skip_value(&mut self) -> Result<()>;

    /// Position of the current token (or of the end of input).
    fn location(&self) -> Location;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_kind_value_start() {
        assert!(TokenKind::BeginObject.is_value_start());
        assert!(TokenKind::Null.is_value_start());
        assert!(!TokenKind::EndArray.is_value_start());
        assert!(!TokenKind::FieldName.is_value_start());
    }

    #[test]
    fn test_location_display() {
        let loc = Location::new(42, 3, 7);
        assert_eq!(loc.to_string(), "line 3, column 7");
    }
}
