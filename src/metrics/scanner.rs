//! Token scanner over a flat info response string

use crate::utils::ProtocolError;

/// Result of reading up to a delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Delimiter found; holds the bytes before it
    Found(&'a str),
    /// Input ran out first; holds whatever was left
    End(&'a str),
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Token::Found(s) | Token::End(s) => s,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Token::Found(_))
    }
}

/// Cursor over one response string
#[derive(Debug, Clone)]
pub struct InfoScanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> InfoScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Unconsumed input
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Consume exactly `s`, failing if the input differs
    pub fn expect_literal(&mut self, s: &str) -> Result<(), ProtocolError> {
        self.peek_and_expect(s)?;
        self.pos += s.len();
        Ok(())
    }

    /// Check that the input continues with `s` without consuming it
    pub fn peek_and_expect(&self, s: &str) -> Result<(), ProtocolError> {
        let rest = self.remaining();
        if rest.starts_with(s) {
            return Ok(());
        }

        let mut end = s.len().min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        Err(ProtocolError::Mismatch {
            expected: s.to_string(),
            actual: rest[..end].to_string(),
        })
    }

    /// Consume through the next `delimiter`, returning the bytes before it
    ///
    /// Returns `Token::End` with the rest of the input when no delimiter
    /// remains.
    pub fn read_until(&mut self, delimiter: char) -> Token<'a> {
        let rest = self.remaining();
        match rest.find(delimiter) {
            Some(idx) => {
                self.pos += idx + delimiter.len_utf8();
                Token::Found(&rest[..idx])
            }
            None => {
                self.pos = self.input.len();
                Token::End(rest)
            }
        }
    }

    /// Like `read_until` but treats a missing delimiter as an error
    pub fn read_field(&mut self, delimiter: char) -> Result<&'a str, ProtocolError> {
        match self.read_until(delimiter) {
            Token::Found(s) => Ok(s),
            Token::End(_) => Err(ProtocolError::UnexpectedEnd(delimiter)),
        }
    }

    /// Read up to `delimiter` and parse the token as a float
    pub fn read_float(&mut self, delimiter: char) -> Result<f64, ProtocolError> {
        let token = self.read_field(delimiter)?;
        parse_float(token)
    }
}

pub(crate) fn parse_float(token: &str) -> Result<f64, ProtocolError> {
    token
        .trim()
        .parse::<f64>()
        .map_err(|_| ProtocolError::InvalidNumber(token.to_string()))
}
