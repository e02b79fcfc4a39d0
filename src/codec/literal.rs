//! Restricted literal parser for list-shaped strings
//!
//! Recognizes only literals: brackets, parentheses, numbers, quoted strings,
//! `True`/`False`/`None` and `nan`/`inf`. Items are separated by commas or by
//! whitespace, so both `[1, 2, 3]` and the printed array form `[1. 2. 3.]`
//! parse. Nothing is ever evaluated.

use super::Value;
use crate::{Error, Result};

/// Nesting limit for brackets and parentheses.
pub const MAX_DEPTH: usize = 64;

/// Parse a whole string as one literal.
///
/// # Errors
///
/// Returns [`Error::DecodeError`] if the text is not a complete literal.
pub fn parse_literal(text: &str) -> Result<Value> {
    let mut parser = Parser {
        src: text.as_bytes(),
        pos: 0,
    };
    parser.skip_ws();
    let value = parser.value(0)?;
    parser.skip_ws();
    if parser.pos != parser.src.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> Error {
        Error::DecodeError(format!("literal parse error at byte {}: {msg}", self.pos))
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    /// Skips whitespace, reporting whether any was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn value(&mut self, depth: usize) -> Result<Value> {
        match self.peek() {
            Some(b'[') => self.sequence(depth, b']').map(Value::List),
            Some(b'(') => self.sequence(depth, b')').map(Value::Tuple),
            Some(b'\'' | b'"') => self.string().map(Value::Str),
            Some(b) if b == b'-' || b == b'+' || b == b'.' || b.is_ascii_digit() => self.number(),
            Some(b) if b.is_ascii_alphabetic() => self.word(),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn sequence(&mut self, depth: usize, close: u8) -> Result<Vec<Value>> {
        if depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.pos += 1;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.value(depth + 1)?);
            let spaced = self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_ws();
                    if self.peek() == Some(close) {
                        self.pos += 1;
                        return Ok(items);
                    }
                }
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) if spaced => {}
                Some(_) => return Err(self.error("expected separator")),
                None => return Err(self.error("unterminated sequence")),
            }
        }
    }

    fn string(&mut self) -> Result<String> {
        let quote = self.src[self.pos];
        self.pos += 1;
        let mut out = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => {
                    let escaped = self.peek().ok_or_else(|| self.error("dangling escape"))?;
                    self.pos += 1;
                    out.push(match escaped {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        b'0' => b'\0',
                        other => other,
                    });
                }
                b if b == quote => {
                    return String::from_utf8(out)
                        .map_err(|_| self.error("invalid utf-8 in string"));
                }
                b => out.push(b),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        if self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
            let negative = self.src[start] == b'-';
            return match self.word()? {
                Value::Float(f) if negative => Ok(Value::Float(-f)),
                Value::Float(f) => Ok(Value::Float(f)),
                _ => Err(self.error("sign before non-numeric word")),
            };
        }
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'_' => {}
                b'.' => is_float = true,
                b'e' | b'E' => {
                    is_float = true;
                    if matches!(self.src.get(self.pos + 1), Some(b'-' | b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }
        let text: String = std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|_| self.error("invalid number"))?
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if !is_float {
            if let Ok(i) = text.parse::<i64>() {
                return Ok(Value::Int(i));
            }
        }
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| self.error("invalid number"))
    }

    fn word(&mut self) -> Result<Value> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        match &self.src[start..self.pos] {
            b"True" => Ok(Value::Bool(true)),
            b"False" => Ok(Value::Bool(false)),
            b"None" => Ok(Value::Null),
            b"nan" | b"NaN" => Ok(Value::Float(f64::NAN)),
            b"inf" | b"Infinity" => Ok(Value::Float(f64::INFINITY)),
            _ => {
                self.pos = start;
                Err(self.error("unknown identifier"))
            }
        }
    }
}
