//! Recursive-descent JSON parser.
//!
//! The parser walks the input with a byte cursor. Every structural token in
//! JSON is ASCII, so the cursor only ever stops on `char` boundaries and string
//! contents can be copied out of the source as `&str` slices.

use thiserror::Error;

use crate::json::value::{Map, Value};

/// What went wrong while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonErrorKind {
    /// Input ended while a value, key or delimiter was still expected
    UnexpectedEnd,
    /// A value could not start with this character
    UnexpectedCharacter(char),
    /// Object key not followed by `:`
    ExpectedColon,
    /// Found this character where `,` or the closing bracket belongs
    ExpectedCommaOrClose(char),
    /// Object key did not start with `"`
    ExpectedKey,
    /// `true`, `false` or `null` misspelled
    InvalidLiteral,
    /// Number text rejected by decimal-to-double conversion
    InvalidNumber,
    /// Malformed `\u` escape
    InvalidEscape,
    /// Non-whitespace after the top-level value
    TrailingCharacters,
    /// Arrays and objects nested deeper than [`MAX_DEPTH`]
    DepthLimitExceeded,
}

/// Deepest array/object nesting accepted before parsing gives up.
pub const MAX_DEPTH: usize = 128;

/// A parse failure with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at offset {offset}", describe(.kind))]
pub struct JsonError {
    pub kind: JsonErrorKind,
    pub offset: usize,
}

fn describe(kind: &JsonErrorKind) -> String {
    match kind {
        JsonErrorKind::UnexpectedEnd => "unexpected end of input".to_string(),
        JsonErrorKind::UnexpectedCharacter(c) => format!("unexpected character {c:?}"),
        JsonErrorKind::ExpectedColon => "expected ':' after object key".to_string(),
        JsonErrorKind::ExpectedCommaOrClose(c) => {
            format!("expected ',' or closing bracket, found {c:?}")
        }
        JsonErrorKind::ExpectedKey => "expected '\"' to start object key".to_string(),
        JsonErrorKind::InvalidLiteral => "invalid literal".to_string(),
        JsonErrorKind::InvalidNumber => "invalid number".to_string(),
        JsonErrorKind::InvalidEscape => "invalid unicode escape".to_string(),
        JsonErrorKind::TrailingCharacters => "trailing characters after value".to_string(),
        JsonErrorKind::DepthLimitExceeded => {
            format!("nesting deeper than {MAX_DEPTH} levels")
        }
    }
}

/// Parses a complete JSON document.
///
/// Surrounding whitespace is allowed; anything else after the first value is
/// an error.
pub fn parse(input: &str) -> Result<Value, JsonError> {
    let mut parser = Parser::new(input);
    let value = parser.parse_value()?;
    parser.skip_whitespace();

    if parser.pos < parser.bytes.len() {
        return Err(parser.error(JsonErrorKind::TrailingCharacters));
    }

    Ok(value)
}

/// Returns `true` when `input` is exactly one JSON value plus optional whitespace.
pub fn is_valid(input: &str) -> bool {
    parse(input).is_ok()
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, kind: JsonErrorKind) -> JsonError {
        JsonError {
            kind,
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// The character under the cursor, for error reporting.
    fn current_char(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or('\0')
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn parse_value(&mut self) -> Result<Value, JsonError> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(self.error(JsonErrorKind::UnexpectedEnd)),
            Some(b'{') => self.nested(|p| p.parse_object().map(Value::Object)),
            Some(b'[') => self.nested(|p| p.parse_array().map(Value::Array)),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b't') => self.parse_literal("true", Value::Bool(true)),
            Some(b'f') => self.parse_literal("false", Value::Bool(false)),
            Some(b'n') => self.parse_literal("null", Value::Null),
            Some(b'-' | b'0'..=b'9') => self.parse_number().map(Value::Number),
            Some(_) => Err(self.error(JsonErrorKind::UnexpectedCharacter(self.current_char()))),
        }
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Value, JsonError>,
    ) -> Result<Value, JsonError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(JsonErrorKind::DepthLimitExceeded));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_object(&mut self) -> Result<Map, JsonError> {
        self.pos += 1; // '{'
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(map);
        }

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'"') => {}
                None => return Err(self.error(JsonErrorKind::UnexpectedEnd)),
                Some(_) => return Err(self.error(JsonErrorKind::ExpectedKey)),
            }
            let key = self.parse_string()?;

            self.skip_whitespace();
            match self.peek() {
                Some(b':') => self.pos += 1,
                None => return Err(self.error(JsonErrorKind::UnexpectedEnd)),
                Some(_) => return Err(self.error(JsonErrorKind::ExpectedColon)),
            }

            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(map);
                }
                None => return Err(self.error(JsonErrorKind::UnexpectedEnd)),
                Some(_) => {
                    let found = self.current_char();
                    return Err(self.error(JsonErrorKind::ExpectedCommaOrClose(found)));
                }
            }
        }
    }

    fn parse_array(&mut self) -> Result<Vec<Value>, JsonError> {
        self.pos += 1; // '['
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            return Ok(items);
        }

        loop {
            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                None => return Err(self.error(JsonErrorKind::UnexpectedEnd)),
                Some(_) => {
                    let found = self.current_char();
                    return Err(self.error(JsonErrorKind::ExpectedCommaOrClose(found)));
                }
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, JsonError> {
        self.pos += 1; // opening quote
        let mut out = String::new();

        loop {
            let run_start = self.pos;
            while let Some(b) = self.peek() {
                if b == b'"' || b == b'\\' {
                    break;
                }
                self.pos += 1;
            }
            out.push_str(&self.src[run_start..self.pos]);

            match self.peek() {
                None => return Err(self.error(JsonErrorKind::UnexpectedEnd)),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(_) => self.parse_escape(&mut out)?,
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), JsonError> {
        self.pos += 1; // backslash
        let Some(b) = self.peek() else {
            return Err(self.error(JsonErrorKind::UnexpectedEnd));
        };

        match b {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{08}'),
            b'f' => out.push('\u{0C}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let digits = self
                    .bytes
                    .get(self.pos + 1..self.pos + 5)
                    .ok_or_else(|| self.error(JsonErrorKind::UnexpectedEnd))?;
                // Checked on bytes: four bytes may end inside a multibyte char.
                let unit = digits
                    .iter()
                    .try_fold(0u32, |acc, &d| {
                        char::from(d).to_digit(16).map(|v| acc * 16 + v)
                    })
                    .ok_or_else(|| self.error(JsonErrorKind::InvalidEscape))?;
                // Each \u escape is decoded on its own; surrogate halves
                // cannot stand alone in a Rust string.
                out.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
                self.pos += 4;
            }
            _ => {
                // Unknown escapes are kept verbatim.
                out.push('\\');
                out.push(self.current_char());
                self.pos += self.current_char().len_utf8() - 1;
            }
        }

        self.pos += 1;
        Ok(())
    }

    fn parse_number(&mut self) -> Result<f64, JsonError> {
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        self.skip_digits();

        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.skip_digits();
        }

        if let Some(b'e' | b'E') = self.peek() {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.peek() {
                self.pos += 1;
            }
            self.skip_digits();
        }

        self.src[start..self.pos].parse::<f64>().map_err(|_| JsonError {
            kind: JsonErrorKind::InvalidNumber,
            offset: start,
        })
    }

    fn skip_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }

    fn parse_literal(&mut self, literal: &str, value: Value) -> Result<Value, JsonError> {
        let end = self.pos + literal.len();

        match self.src.get(self.pos..end) {
            Some(text) if text == literal => {
                self.pos = end;
                Ok(value)
            }
            _ if end > self.bytes.len() && literal.starts_with(&self.src[self.pos..]) => {
                Err(JsonError {
                    kind: JsonErrorKind::UnexpectedEnd,
                    offset: self.bytes.len(),
                })
            }
            _ => Err(self.error(JsonErrorKind::InvalidLiteral)),
        }
    }
}
