//! Twips rectangles as they appear in message payloads.
//!
//! The kernel writes a rectangle as `x, y, width, height` and a list of them
//! separated by `;`. The literal `EMPTY` (or an empty payload) denotes no
//! rectangle at all.

use serde::Serialize;

use crate::ParseError;

#[cfg(test)]
#[path = "rect_test.rs"]
mod rect_test;

/// Largest coordinate or extent magnitude accepted from the wire, about two
/// kilometres of document. Anything past it is a corrupt payload.
pub const MAX_TWIPS: i64 = 1 << 40;

/// Axis-aligned rectangle in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    #[must_use]
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn right(&self) -> i64 {
        self.x.saturating_add(self.width)
    }

    #[must_use]
    pub fn bottom(&self) -> i64 {
        self.y.saturating_add(self.height)
    }

    /// The all-zero rectangle the kernel sends to hide a marker. A zero-width
    /// caret with a height is not empty, and neither is a degenerate rectangle
    /// away from the origin.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The same rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: i64, dy: i64) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy), self.width, self.height)
    }

    /// Half-open overlap test.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Parse `x, y, w, h`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::BadRectangle`] unless exactly four integers
    /// within [`MAX_TWIPS`] are present.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let values = parse_numbers(text)?;
        match values.as_slice() {
            [x, y, w, h] => Ok(Self::new(*x, *y, *w, *h)),
            _ => Err(ParseError::BadRectangle(text.to_owned())),
        }
    }

    /// Parse a `;`-separated rectangle list. `EMPTY` and blank input yield an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::BadRectangle`] if any entry is malformed.
    pub fn parse_list(text: &str) -> Result<Vec<Self>, ParseError> {
        let text = text.trim();
        if text.is_empty() || text == "EMPTY" {
            return Ok(Vec::new());
        }
        text.split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::parse)
            .collect()
    }
}

/// Parse an `x, y` point.
///
/// # Errors
///
/// Returns [`ParseError::BadRectangle`] unless exactly two integers within
/// [`MAX_TWIPS`] are present.
pub fn parse_point(text: &str) -> Result<(i64, i64), ParseError> {
    match parse_numbers(text)?.as_slice() {
        [x, y] => Ok((*x, *y)),
        _ => Err(ParseError::BadRectangle(text.to_owned())),
    }
}

/// A graphic (shape) selection: its bounds plus an optional rotation angle in
/// hundredths of a degree. Trailing handle metadata is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicSelection {
    pub rect: Rect,
    pub angle: Option<i64>,
}

impl GraphicSelection {
    /// Parse `x, y, w, h[, angle[, {...}]]`. `EMPTY` yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::BadRectangle`] if fewer than four integers lead
    /// the payload.
    pub fn parse(text: &str) -> Result<Option<Self>, ParseError> {
        let text = text.trim();
        if text.is_empty() || text.starts_with("EMPTY") {
            return Ok(None);
        }
        let numeric = text.find('{').map_or(text, |brace| &text[..brace]);
        let values = parse_numbers(numeric.trim_end_matches([',', ' ']))?;
        let [x, y, w, h, rest @ ..] = values.as_slice() else {
            return Err(ParseError::BadRectangle(text.to_owned()));
        };
        Ok(Some(Self { rect: Rect::new(*x, *y, *w, *h), angle: rest.first().copied() }))
    }
}

fn parse_numbers(text: &str) -> Result<Vec<i64>, ParseError> {
    text.split(',')
        .map(str::trim)
        .map(|value| match value.parse::<i64>() {
            Ok(n) if n.unsigned_abs() <= MAX_TWIPS.unsigned_abs() => Ok(n),
            _ => Err(ParseError::BadRectangle(text.to_owned())),
        })
        .collect()
}
