//! Compiled processor tree
//!
//! The compiler lowers a [`Schema`](crate::schema::Schema) into a tree of
//! [`ValueProcessor`]s (one value → zero or more column cells) and, inside
//! arrays, [`Repeater`]s (a whole JSON array → one array cell per output
//! column). Processors hold absolute column indices into the batch slice
//! assigned at compile time, so the same tree can be re-bound to a fresh
//! batch without recompiling.

mod array;
mod object;
mod scalars;
mod typed;

pub(crate) use array::{ArrayProcessor, ObjectRepeater, SkipRepeater, TupleProcessor, TupleRepeater};
pub(crate) use object::{KvProcessor, ObjectProcessor};
pub(crate) use scalars::{
    AnyProcessor, AnyRepeater, BigDecimalDecoder, BigIntegerDecoder, BoolDecoder, ByteDecoder,
    CharDecoder, DoubleDecoder, FloatDecoder, InstantDecoder, InstantNumberDecoder, IntDecoder,
    LocalDateDecoder, LongDecoder, ScalarProcessor, ScalarRepeater, ShortDecoder, SkipProcessor,
    StringDecoder,
};
pub(crate) use typed::{TypedObjectProcessor, VariantSlot};

use std::ops::Range;

use crate::chunk::Column;
use crate::schema::Kinds;
use crate::tokens::{TokenKind, TokenSource};
use crate::{Error, Result};

/// Decodes one JSON value (or its absence) into the processor's columns.
///
/// Cursor contract: `process_value` is entered with the current token being
/// the first token of the value and returns with the current token being the
/// last token of that value. `process_missing` consumes no tokens.
pub trait ValueProcessor {
    fn process_value(&mut self, src: &mut dyn TokenSource, out: &mut [Column]) -> Result<()>;

    fn process_missing(&mut self, out: &mut [Column]) -> Result<()>;
}

/// Decodes a whole JSON array into one array cell per output column.
///
/// Driven as `begin`, then `element`/`element_missing` per element, then
/// `finish`; or short-circuited with `null_sequence`/`missing_sequence`
/// when the array value itself is null or absent.
pub trait Repeater {
    fn begin(&mut self);

    /// One element; same cursor contract as [`ValueProcessor::process_value`].
    fn element(&mut self, src: &mut dyn TokenSource) -> Result<()>;

    fn element_missing(&mut self) -> Result<()>;

    /// Close the sequence, writing one array cell per column.
    fn finish(&mut self, out: &mut [Column]) -> Result<()>;

    /// The whole array was `null`: write the zero-length representation.
    fn null_sequence(&mut self, out: &mut [Column]) -> Result<()>;

    /// The whole array was absent: write the zero-length representation.
    fn missing_sequence(&mut self, out: &mut [Column]) -> Result<()>;
}

/// The [`Kinds`] flag a token would need to be accepted.
pub(crate) fn token_flag(kind: TokenKind) -> Kinds {
    match kind {
        TokenKind::BeginObject => Kinds::OBJECT,
        TokenKind::BeginArray => Kinds::ARRAY,
        // Key/value keys arrive as field names and decode as strings.
        TokenKind::String | TokenKind::FieldName => Kinds::STRING,
        TokenKind::Int => Kinds::INT,
        TokenKind::Decimal => Kinds::DECIMAL,
        TokenKind::Bool => Kinds::BOOL,
        TokenKind::Null => Kinds::NULL,
        TokenKind::EndObject | TokenKind::EndArray => Kinds::empty(),
    }
}

/// Gate the current token against a node's allowed kinds.
pub(crate) fn check_kind(
    kinds: Kinds,
    type_name: &'static str,
    src: &dyn TokenSource,
) -> Result<TokenKind> {
    let kind = src
        .current()
        .ok_or_else(|| Error::structural("unexpected end of input", src.location()))?;
    if !kinds.contains(token_flag(kind)) {
        return Err(Error::mismatch(type_name, kind, src.location()));
    }
    Ok(kind)
}

/// Advance, treating end-of-input as a structural error. Used inside
/// objects and arrays, where the input cannot legally end.
pub(crate) fn advance_in_structure(src: &mut dyn TokenSource) -> Result<TokenKind> {
    src.advance()?
        .ok_or_else(|| Error::structural("unexpected end of input", src.location()))
}

/// Append one null-representation cell to every column in `range`.
pub(crate) fn fill_null_range(out: &mut [Column], range: Range<usize>) {
    for col in &mut out[range] {
        col.fill_null(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Lexer;

    #[test]
    fn test_token_flag_mapping() {
        assert_eq!(token_flag(TokenKind::BeginObject), Kinds::OBJECT);
        assert_eq!(token_flag(TokenKind::FieldName), Kinds::STRING);
        assert_eq!(token_flag(TokenKind::EndArray), Kinds::empty());
    }

    #[test]
    fn test_check_kind_gates() {
        let mut lexer = Lexer::new("true");
        lexer.advance().unwrap();
        assert!(check_kind(Kinds::BOOL, "bool", &lexer).is_ok());
        assert!(matches!(
            check_kind(Kinds::INT, "int", &lexer),
            Err(Error::TypeMismatch { .. })
        ));
    }
}
