//! `key=value` token access for space-separated payloads such as
//! `tile: part=0 tileposx=3840 tileposy=0 wid=17`.

use std::str::FromStr;

use crate::ParseError;
use crate::rect::MAX_TWIPS;

#[cfg(test)]
#[path = "tokens_test.rs"]
mod tokens_test;

/// Borrowed view over the tokens of a payload.
#[derive(Debug, Clone, Copy)]
pub struct Tokens<'a> {
    text: &'a str,
}

impl<'a> Tokens<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Raw value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.text.split_whitespace().find_map(|token| {
            let (k, v) = token.split_once('=')?;
            (k == key).then_some(v)
        })
    }

    /// Whether a bare word (no `=`) appears, e.g. `EMPTY`.
    #[must_use]
    pub fn has_word(&self, word: &str) -> bool {
        self.text
            .split(|c: char| c.is_whitespace() || c == ',')
            .any(|token| token == word)
    }

    /// Required numeric value.
    ///
    /// # Errors
    ///
    /// [`ParseError::MissingField`] if absent, [`ParseError::BadNumber`] if it
    /// does not parse as `T`.
    pub fn number<T: FromStr>(&self, key: &'static str) -> Result<T, ParseError> {
        let value = self.get(key).ok_or(ParseError::MissingField(key))?;
        value
            .parse()
            .map_err(|_| ParseError::BadNumber { field: key, value: value.to_owned() })
    }

    /// Required twips coordinate or extent, bounded by [`MAX_TWIPS`].
    ///
    /// # Errors
    ///
    /// As [`Tokens::number`], plus [`ParseError::BadNumber`] when the value is
    /// out of range.
    pub fn twips(&self, key: &'static str) -> Result<i64, ParseError> {
        let value: i64 = self.number(key)?;
        if value.unsigned_abs() > MAX_TWIPS.unsigned_abs() {
            return Err(ParseError::BadNumber { field: key, value: value.to_string() });
        }
        Ok(value)
    }

    /// Optional numeric value with a default when absent.
    ///
    /// # Errors
    ///
    /// [`ParseError::BadNumber`] if present but malformed.
    pub fn number_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ParseError> {
        match self.get(key) {
            None => Ok(default),
            Some(_) => self.number(key),
        }
    }

    /// Comma-separated numeric list, e.g. `wids=1,2,3`.
    ///
    /// # Errors
    ///
    /// [`ParseError::MissingField`] if absent, [`ParseError::BadNumber`] if any
    /// element fails to parse.
    pub fn list<T: FromStr>(&self, key: &'static str) -> Result<Vec<T>, ParseError> {
        let value = self.get(key).ok_or(ParseError::MissingField(key))?;
        value
            .split(',')
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse()
                    .map_err(|_| ParseError::BadNumber { field: key, value: item.to_owned() })
            })
            .collect()
    }
}
