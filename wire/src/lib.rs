//! Message model and text codec for the kernel tile protocol.
//!
//! This crate owns the wire representation shared by the `engine` and the
//! `mosaic` runner. Inbound messages are tagged text lines (`type: payload`),
//! optionally followed by a binary attachment carrying tile or dialog pixels.
//! Outbound requests are a small fixed vocabulary rendered back into text.
//!
//! Nothing here holds state: parsing is a pure function of the bytes received.

pub mod payload;
pub mod rect;
pub mod request;
pub mod tokens;

pub use rect::Rect;
pub use request::Request;
pub use tokens::Tokens;

/// Identifier the kernel assigns to every connected view.
pub type ViewId = i32;

/// Error returned when a message or one of its fields fails to parse.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The message had no type tag at all.
    #[error("message has no type tag")]
    MissingType,
    /// A required `key=value` token or JSON field was absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    /// A numeric field did not parse.
    #[error("invalid number for `{field}`: {value:?}")]
    BadNumber { field: &'static str, value: String },
    /// A rectangle or rectangle list was not `x, y, w, h` shaped.
    #[error("invalid rectangle: {0:?}")]
    BadRectangle(String),
    /// The header of a binary frame was not UTF-8.
    #[error("binary frame header is not valid UTF-8")]
    BadHeader,
    /// A JSON body failed to deserialize.
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single inbound kernel message.
///
/// `kind` is the type tag (text before the first `:` or whitespace) and
/// `payload` is everything after it with the separator and leading blanks
/// stripped. Binary frames keep the bytes after the header line as
/// `attachment`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inbound {
    pub kind: String,
    pub payload: String,
    pub attachment: Option<Vec<u8>>,
}

impl Inbound {
    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingType`] for a blank message.
    pub fn parse_text(text: &str) -> Result<Self, ParseError> {
        let text = text.trim_start();
        let split = text
            .find(|c: char| c == ':' || c.is_whitespace())
            .unwrap_or(text.len());
        let kind = &text[..split];
        if kind.is_empty() {
            return Err(ParseError::MissingType);
        }

        let rest = &text[split..];
        let rest = rest.strip_prefix(':').unwrap_or(rest);
        Ok(Self {
            kind: kind.to_owned(),
            payload: rest.trim_start().trim_end_matches(['\n', '\r']).to_owned(),
            attachment: None,
        })
    }

    /// Parse a binary frame: a text header line terminated by `\n`, followed
    /// by an attachment. A frame without a newline is treated as header only.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::BadHeader`] when the header is not UTF-8, or
    /// [`ParseError::MissingType`] when it is blank.
    pub fn parse_binary(bytes: &[u8]) -> Result<Self, ParseError> {
        let (header, attachment) = match bytes.iter().position(|b| *b == b'\n') {
            Some(pos) => (&bytes[..pos], Some(bytes[pos + 1..].to_vec())),
            None => (bytes, None),
        };
        let header = std::str::from_utf8(header).map_err(|_| ParseError::BadHeader)?;
        let mut message = Self::parse_text(header)?;
        message.attachment = attachment.filter(|data| !data.is_empty());
        Ok(message)
    }

    /// Build a text message from its parts. Used by replays and tests.
    #[must_use]
    pub fn new(kind: &str, payload: &str) -> Self {
        Self { kind: kind.to_owned(), payload: payload.to_owned(), attachment: None }
    }

    /// The header line in `kind: payload` form.
    #[must_use]
    pub fn raw(&self) -> String {
        if self.payload.is_empty() {
            format!("{}:", self.kind)
        } else {
            format!("{}: {}", self.kind, self.payload)
        }
    }

    /// Whitespace-separated `key=value` tokens of the payload.
    #[must_use]
    pub fn tokens(&self) -> Tokens<'_> {
        Tokens::new(&self.payload)
    }

    /// Whether the payload is a JSON object or array.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.payload.starts_with('{') || self.payload.starts_with('[')
    }

    /// Deserialize the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Json`] when the body does not match `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ParseError> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
