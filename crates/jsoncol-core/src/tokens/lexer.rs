//! Hand-rolled pull tokenizer over in-memory JSON text

use memchr::memchr2;
use smallvec::SmallVec;

use crate::tokens::{Location, TokenKind, TokenSource};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy)]
enum Frame {
    Object {
        seen_entry: bool,
        awaiting_value: bool,
    },
    Array {
        seen_entry: bool,
    },
}

#[derive(Debug, Clone, Copy)]
enum TextRef {
    None,
    Slice(usize, usize),
    Scratch,
}

/// Pull tokenizer over a `&str`, supporting concatenated top-level values.
///
/// Strings without escapes are surfaced as zero-copy slices of the input;
/// escaped strings are unescaped into an internal scratch buffer that is
/// reused across tokens.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    line_start: usize,
    stack: SmallVec<[Frame; 16]>,
    current: Option<TokenKind>,
    token_loc: Location,
    text: TextRef,
    scratch: String,
    bool_val: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned before the first token.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
            stack: SmallVec::new(),
            current: None,
            token_loc: Location::new(0, 1, 1),
            text: TextRef::None,
            scratch: String::new(),
            bool_val: false,
        }
    }

    /// Current nesting depth (open objects/arrays).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn here(&self) -> Location {
        Location::new(
            self.pos,
            self.line,
            (self.pos - self.line_start + 1) as u32,
        )
    }

    fn syntax_here(&self, message: impl Into<String>) -> Error {
        Error::syntax(message, self.here())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.line_start = self.pos;
                }
                _ => break,
            }
        }
    }

    fn expect_literal(&mut self, literal: &'static str) -> Result<()> {
        let end = self.pos + literal.len();
        if self.bytes.len() < end || &self.bytes[self.pos..end] != literal.as_bytes() {
            return Err(self.syntax_here(format!("invalid literal, expected '{literal}'")));
        }
        self.pos = end;
        Ok(())
    }

    fn lex_value(&mut self) -> Result<TokenKind> {
        self.token_loc = self.here();
        self.text = TextRef::None;
        let Some(b) = self.peek() else {
            return Err(self.syntax_here("unexpected end of input, expected a value"));
        };
        match b {
            b'{' => {
                self.bump();
                self.stack.push(Frame::Object {
                    seen_entry: false,
                    awaiting_value: false,
                });
                Ok(TokenKind::BeginObject)
            }
            b'[' => {
                self.bump();
                self.stack.push(Frame::Array { seen_entry: false });
                Ok(TokenKind::BeginArray)
            }
            b'"' => {
                self.lex_string()?;
                Ok(TokenKind::String)
            }
            b't' => {
                self.expect_literal("true")?;
                self.bool_val = true;
                Ok(TokenKind::Bool)
            }
            b'f' => {
                self.expect_literal("false")?;
                self.bool_val = false;
                Ok(TokenKind::Bool)
            }
            b'n' => {
                self.expect_literal("null")?;
                Ok(TokenKind::Null)
            }
            b'-' | b'0'..=b'9' => self.lex_number(),
            _ => Err(self.syntax_here("unexpected character, expected a value")),
        }
    }

    fn lex_number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.bump();
        }
        match self.peek() {
            Some(b'0') => self.bump(),
            Some(b'1'..=b'9') => {
                while matches!(self.peek(), Some(b'0'..=b'9')) {
                    self.bump();
                }
            }
            _ => return Err(self.syntax_here("invalid number")),
        }
        let mut decimal = false;
        if self.peek() == Some(b'.') {
            decimal = true;
            self.bump();
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.syntax_here("invalid number, expected digits after '.'"));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            decimal = true;
            self.bump();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.bump();
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.syntax_here("invalid number, expected exponent digits"));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }
        self.text = TextRef::Slice(start, self.pos);
        Ok(if decimal {
            TokenKind::Decimal
        } else {
            TokenKind::Int
        })
    }

    /// Lexes the string starting at the opening quote under `self.pos`,
    /// leaving `self.text` pointing at the unescaped content.
    fn lex_string(&mut self) -> Result<()> {
        debug_assert_eq!(self.peek(), Some(b'"'));
        self.bump();
        let start = self.pos;
        let mut escaped = false;
        loop {
            let rest = &self.bytes[self.pos..];
            let Some(ix) = memchr2(b'"', b'\\', rest) else {
                return Err(self.syntax_here("unterminated string"));
            };
            let seg = &self.input[self.pos..self.pos + ix];
            if seg.bytes().any(|b| b < 0x20) {
                return Err(self.syntax_here("raw control character in string"));
            }
            if rest[ix] == b'"' {
                if escaped {
                    self.scratch.push_str(seg);
                    self.text = TextRef::Scratch;
                } else {
                    self.text = TextRef::Slice(start, self.pos + ix);
                }
                self.pos += ix + 1;
                return Ok(());
            }
            // backslash
            if !escaped {
                escaped = true;
                self.scratch.clear();
            }
            self.scratch.push_str(seg);
            self.pos += ix + 1;
            self.decode_escape()?;
        }
    }

    /// Decodes one escape sequence; `self.pos` is the byte after the backslash.
    fn decode_escape(&mut self) -> Result<()> {
        let Some(b) = self.peek() else {
            return Err(self.syntax_here("unterminated escape sequence"));
        };
        self.bump();
        let ch = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{0008}',
            b'f' => '\u{000C}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let hi = self.hex4()?;
                let code = if (0xD800..0xDC00).contains(&hi) {
                    if self.peek() != Some(b'\\') {
                        return Err(self.syntax_here("unpaired surrogate escape"));
                    }
                    self.bump();
                    if self.peek() != Some(b'u') {
                        return Err(self.syntax_here("unpaired surrogate escape"));
                    }
                    self.bump();
                    let lo = self.hex4()?;
                    if !(0xDC00..0xE000).contains(&lo) {
                        return Err(self.syntax_here("invalid low surrogate escape"));
                    }
                    0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00)
                } else if (0xDC00..0xE000).contains(&hi) {
                    return Err(self.syntax_here("unpaired surrogate escape"));
                } else {
                    hi
                };
                char::from_u32(code)
                    .ok_or_else(|| self.syntax_here("invalid unicode escape"))?
            }
            _ => return Err(self.syntax_here("invalid escape sequence")),
        };
        self.scratch.push(ch);
        Ok(())
    }

    fn hex4(&mut self) -> Result<u32> {
        let end = self.pos + 4;
        let digits = self
            .bytes
            .get(self.pos..end)
            .and_then(|s| std::str::from_utf8(s).ok())
            .ok_or_else(|| self.syntax_here("truncated unicode escape"))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.syntax_here("invalid unicode escape digits"))?;
        self.pos = end;
        Ok(code)
    }

    /// Lexes a field name (current byte must be `"`), consumes the `:`.
    fn lex_field_name(&mut self) -> Result<()> {
        let loc = self.here();
        if self.peek() != Some(b'"') {
            return Err(self.syntax_here("expected field name"));
        }
        self.lex_string()?;
        self.token_loc = loc;
        self.skip_ws();
        if self.peek() != Some(b':') {
            return Err(self.syntax_here("expected ':' after field name"));
        }
        self.bump();
        Ok(())
    }
}

impl TokenSource for Lexer<'_> {
    fn current(&self) -> Option<TokenKind> {
        self.current
    }

    fn advance(&mut self) -> Result<Option<TokenKind>> {
        self.skip_ws();
        if self.stack.is_empty() {
            if self.pos >= self.bytes.len() {
                self.current = None;
                self.token_loc = self.here();
                return Ok(None);
            }
            let kind = self.lex_value()?;
            self.current = Some(kind);
            return Ok(self.current);
        }
        let top = self.stack.len() - 1;
        let kind = match self.stack[top] {
            Frame::Object {
                awaiting_value: true,
                ..
            } => {
                if let Frame::Object {
                    seen_entry,
                    awaiting_value,
                } = &mut self.stack[top]
                {
                    *seen_entry = true;
                    *awaiting_value = false;
                }
                self.lex_value()?
            }
            Frame::Object {
                seen_entry,
                awaiting_value: false,
            } => match self.peek() {
                None => return Err(self.syntax_here("unexpected end of input inside object")),
                Some(b'}') => {
                    self.token_loc = self.here();
                    self.bump();
                    self.stack.pop();
                    TokenKind::EndObject
                }
                Some(b) => {
                    if seen_entry {
                        if b != b',' {
                            return Err(self.syntax_here("expected ',' or '}'"));
                        }
                        self.bump();
                        self.skip_ws();
                    }
                    self.lex_field_name()?;
                    if let Frame::Object { awaiting_value, .. } = &mut self.stack[top] {
                        *awaiting_value = true;
                    }
                    TokenKind::FieldName
                }
            },
            Frame::Array { seen_entry } => match self.peek() {
                None => return Err(self.syntax_here("unexpected end of input inside array")),
                Some(b']') => {
                    self.token_loc = self.here();
                    self.bump();
                    self.stack.pop();
                    TokenKind::EndArray
                }
                Some(b) => {
                    if seen_entry {
                        if b != b',' {
                            return Err(self.syntax_here("expected ',' or ']'"));
                        }
                        self.bump();
                        self.skip_ws();
                    }
                    if let Frame::Array { seen_entry } = &mut self.stack[top] {
                        *seen_entry = true;
                    }
                    self.skip_ws();
                    self.lex_value()?
                }
            },
        };
        self.current = Some(kind);
        Ok(self.current)
    }

    fn text(&self) -> &str {
        match self.text {
            TextRef::None => "",
            TextRef::Slice(start, end) => &self.input[start..end],
            TextRef::Scratch => &self.scratch,
        }
    }

    fn bool_value(&self) -> bool {
        self.bool_val
    }

    fn skip_value(&mut self) -> Result<()> {
        if matches!(
            self.current,
            Some(TokenKind::BeginObject | TokenKind::BeginArray)
        ) {
            let depth = self.stack.len();
            while self.stack.len() >= depth {
                self.advance()?;
            }
        }
        Ok(())
    }

    fn location(&self) -> Location {
        self.token_loc
    }
}
