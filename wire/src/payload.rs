//! Typed payloads for the inbound message kinds the engine consumes.
//!
//! The kernel is loose about JSON scalar types: view ids and parts arrive as
//! numbers or as strings, booleans as `true` or `"true"`. The deserializers
//! at the bottom of this file accept both forms.

use serde::{Deserialize, Deserializer, de};

use crate::rect::{Rect, parse_point};
use crate::tokens::Tokens;
use crate::{Inbound, ParseError, ViewId};

#[cfg(test)]
#[path = "payload_test.rs"]
mod payload_test;

// =============================================================
// Tiles
// =============================================================

/// Header of a `tile:` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileHeader {
    pub part: i32,
    pub pos_x: i64,
    pub pos_y: i64,
    pub tile_width: i64,
    pub tile_height: i64,
    pub wire_id: u64,
}

impl TileHeader {
    /// # Errors
    ///
    /// Returns a [`ParseError`] when a required token is missing or malformed.
    pub fn parse(tokens: &Tokens<'_>) -> Result<Self, ParseError> {
        let tile_width = tokens.twips("tilewidth")?;
        let tile_height = tokens.twips("tileheight")?;
        if tile_width <= 0 || tile_height <= 0 {
            return Err(ParseError::BadNumber { field: "tilewidth", value: tile_width.to_string() });
        }
        Ok(Self {
            part: tokens.number_or("part", 0)?,
            pos_x: tokens.twips("tileposx")?,
            pos_y: tokens.twips("tileposy")?,
            tile_width,
            tile_height,
            wire_id: tokens.number_or("wid", 0)?,
        })
    }
}

/// Area named by an `invalidatetiles:` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateTarget {
    /// `EMPTY`: everything in the part.
    Everything,
    Area(Rect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub part: Option<i32>,
    pub target: InvalidateTarget,
    pub wire_id: Option<u64>,
}

impl Invalidation {
    /// Parse `part=P x= y= width= height= [wid=N]`, `EMPTY[, part[, mode]] [wid=N]`
    /// or the bare `x, y, w, h` the kernel falls back to. The bare form names
    /// no part.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the area form lacks a coordinate.
    pub fn parse(payload: &str) -> Result<Self, ParseError> {
        let tokens = Tokens::new(payload);
        let wire_id = match tokens.get("wid") {
            Some(_) => Some(tokens.number("wid")?),
            None => None,
        };
        if tokens.has_word("EMPTY") {
            let part = payload
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|word| !word.is_empty() && !word.contains('='))
                .skip(1)
                .find_map(|word| word.parse::<i32>().ok());
            return Ok(Self { part, target: InvalidateTarget::Everything, wire_id });
        }
        if tokens.get("x").is_none() {
            let bare: Vec<&str> = payload.split_whitespace().filter(|word| !word.contains('=')).collect();
            let rect = Rect::parse(&bare.join(" "))?;
            return Ok(Self { part: None, target: InvalidateTarget::Area(rect), wire_id });
        }
        let rect = Rect::new(
            tokens.twips("x")?,
            tokens.twips("y")?,
            tokens.twips("width")?,
            tokens.twips("height")?,
        );
        let part = match tokens.get("part") {
            Some(_) => Some(tokens.number("part")?),
            None => None,
        };
        Ok(Self { part, target: InvalidateTarget::Area(rect), wire_id })
    }
}

// =============================================================
// Cursors
// =============================================================

/// Own-view cursor position (`invalidatecursor:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorUpdate {
    pub view_id: Option<ViewId>,
    pub rect: Rect,
    /// Spreadsheet form of the same cursor: `relrect` against the print-twips
    /// cell anchor `refpoint`.
    pub anchored: Option<AnchoredRect>,
}

/// A rectangle relative to an anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchoredRect {
    pub rect: Rect,
    pub anchor: (i64, i64),
}

#[derive(Deserialize)]
struct CursorJson {
    #[serde(rename = "viewId", default, deserialize_with = "opt_view_id")]
    view_id: Option<ViewId>,
    rectangle: String,
    relrect: Option<String>,
    refpoint: Option<String>,
}

impl CursorUpdate {
    /// Accepts the JSON form (`{"viewId":..,"rectangle":".."}`) and the bare
    /// rectangle form.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for malformed JSON or rectangles.
    pub fn parse(msg: &Inbound) -> Result<Self, ParseError> {
        if msg.is_json() {
            let body: CursorJson = msg.json()?;
            let anchored = match (body.relrect, body.refpoint) {
                (Some(rect), Some(anchor)) => {
                    Some(AnchoredRect { rect: Rect::parse(&rect)?, anchor: parse_point(&anchor)? })
                }
                _ => None,
            };
            Ok(Self { view_id: body.view_id, rect: rect_or_empty(&body.rectangle)?, anchored })
        } else {
            Ok(Self { view_id: None, rect: rect_or_empty(&msg.payload)?, anchored: None })
        }
    }
}

/// Remote cursor position (`invalidateviewcursor:`) or remote cell cursor
/// (`cellviewcursor:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewCursor {
    pub view_id: ViewId,
    pub part: i32,
    pub rect: Rect,
}

#[derive(Deserialize)]
struct ViewCursorJson {
    #[serde(rename = "viewId", deserialize_with = "view_id")]
    view_id: ViewId,
    #[serde(default, deserialize_with = "part")]
    part: i32,
    rectangle: String,
}

impl ViewCursor {
    /// # Errors
    ///
    /// Returns a [`ParseError`] for malformed JSON or rectangles.
    pub fn parse(msg: &Inbound) -> Result<Self, ParseError> {
        let body: ViewCursorJson = msg.json()?;
        Ok(Self { view_id: body.view_id, part: body.part, rect: rect_or_empty(&body.rectangle)? })
    }
}

/// `viewcursorvisible:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ViewVisibility {
    #[serde(rename = "viewId", deserialize_with = "view_id")]
    pub view_id: ViewId,
    #[serde(deserialize_with = "flag")]
    pub visible: bool,
}

// =============================================================
// Selections
// =============================================================

/// Remote text or graphic selection. `selection` is the raw rectangle text,
/// interpreted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewSelection {
    #[serde(rename = "viewId", deserialize_with = "view_id")]
    pub view_id: ViewId,
    #[serde(default, deserialize_with = "part")]
    pub part: i32,
    #[serde(default)]
    pub selection: String,
}

// =============================================================
// Views, search, state
// =============================================================

/// One entry of a `viewinfo:` roster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViewInfo {
    #[serde(deserialize_with = "view_id")]
    pub id: ViewId,
    #[serde(rename = "userid", default)]
    pub user_id: String,
    #[serde(rename = "username", default)]
    pub user_name: String,
    #[serde(default)]
    pub color: i64,
    #[serde(rename = "readonly", default, deserialize_with = "flag")]
    pub read_only: bool,
}

/// Highlights for one part of a `searchresultselection:` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub part: i32,
    pub rects: Vec<Rect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub search_string: String,
    pub highlight_all: bool,
    pub hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchJson {
    #[serde(rename = "searchString", default)]
    search_string: String,
    #[serde(rename = "highlightAll", default, deserialize_with = "flag")]
    highlight_all: bool,
    #[serde(rename = "searchResultSelection", default)]
    selection: Vec<SearchHitJson>,
}

#[derive(Deserialize)]
struct SearchHitJson {
    #[serde(default, deserialize_with = "part")]
    part: i32,
    rectangles: String,
}

impl SearchResults {
    /// # Errors
    ///
    /// Returns a [`ParseError`] for malformed JSON or rectangles.
    pub fn parse(msg: &Inbound) -> Result<Self, ParseError> {
        let body: SearchJson = msg.json()?;
        let hits = body
            .selection
            .into_iter()
            .map(|hit| Ok(SearchHit { part: hit.part, rects: Rect::parse_list(&hit.rectangles)? }))
            .collect::<Result<Vec<_>, ParseError>>()?;
        Ok(Self { search_string: body.search_string, highlight_all: body.highlight_all, hits })
    }
}

/// One highlighted reference of a `referencemarks:` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceMark {
    pub part: i32,
    pub rect: Rect,
}

#[derive(Deserialize)]
struct MarksJson {
    #[serde(default)]
    marks: Vec<MarkJson>,
}

#[derive(Deserialize)]
struct MarkJson {
    rectangle: String,
    #[serde(default, deserialize_with = "part")]
    part: i32,
}

impl ReferenceMark {
    /// Parse `{"marks":[{"rectangle":"x, y, w, h","part":"0"}, ..]}`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for malformed JSON or rectangles.
    pub fn parse_all(msg: &Inbound) -> Result<Vec<Self>, ParseError> {
        let body: MarksJson = msg.json()?;
        body.marks
            .into_iter()
            .map(|mark| Ok(Self { part: mark.part, rect: Rect::parse(&mark.rectangle)? }))
            .collect()
    }
}

/// A command state echo from `statechanged:` or `commandvalues:`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub command: String,
    pub value: serde_json::Value,
}

impl StateChange {
    /// Accepts `{"commandName":..,"state":..}`, `{"commandName":..,"commandValues":..}`
    /// and the text form `.uno:Bold=true`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when neither form matches.
    pub fn parse(msg: &Inbound) -> Result<Self, ParseError> {
        if msg.is_json() {
            let body: serde_json::Value = msg.json()?;
            let command = body
                .get("commandName")
                .and_then(serde_json::Value::as_str)
                .ok_or(ParseError::MissingField("commandName"))?
                .to_owned();
            let value = body
                .get("state")
                .or_else(|| body.get("commandValues"))
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            return Ok(Self { command, value });
        }
        let (command, value) = msg
            .payload
            .split_once('=')
            .ok_or(ParseError::MissingField("commandName"))?;
        Ok(Self { command: command.trim().to_owned(), value: serde_json::Value::String(value.trim().to_owned()) })
    }
}

// =============================================================
// Sheet geometry
// =============================================================

/// Command name of the spreadsheet row/column geometry reply.
pub const SHEET_GEOMETRY_COMMAND: &str = ".uno:SheetGeometryData";

/// Highest row or column index accepted in a geometry reply.
pub const MAX_SHEET_INDEX: i64 = 1 << 24;

/// A run of equally sized rows or columns ending at index `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpan {
    /// Print twips per element.
    pub size: i64,
    pub last: i64,
}

/// Alternating flag runs: `start` holds up to `ends[0]`, its negation up to
/// `ends[1]`, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlagSpans {
    pub start: bool,
    pub ends: Vec<i64>,
}

impl FlagSpans {
    /// Flag value at `index`. Indices past the last run are unset.
    #[must_use]
    pub fn get(&self, index: i64) -> bool {
        let run = self.ends.partition_point(|end| *end < index);
        run < self.ends.len() && (self.start ^ (run % 2 == 1))
    }
}

/// One axis of a geometry reply. Absent fields leave the stored value as is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DimensionData {
    pub sizes: Option<Vec<SizeSpan>>,
    pub hidden: Option<FlagSpans>,
    pub filtered: Option<FlagSpans>,
}

/// `commandvalues:` reply to `.uno:SheetGeometryData`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetGeometryData {
    pub max_column: Option<i64>,
    pub max_row: Option<i64>,
    pub columns: Option<DimensionData>,
    pub rows: Option<DimensionData>,
}

#[derive(Deserialize)]
struct SheetGeometryJson {
    #[serde(rename = "maxtiledcolumn", default, deserialize_with = "opt_number")]
    max_column: Option<i64>,
    #[serde(rename = "maxtiledrow", default, deserialize_with = "opt_number")]
    max_row: Option<i64>,
    columns: Option<DimensionJson>,
    rows: Option<DimensionJson>,
}

#[derive(Deserialize)]
struct DimensionJson {
    sizes: Option<String>,
    hidden: Option<String>,
    filtered: Option<String>,
}

impl SheetGeometryData {
    /// `Ok(None)` for any other command reply.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when a geometry reply has malformed JSON or
    /// span encodings.
    pub fn parse(msg: &Inbound) -> Result<Option<Self>, ParseError> {
        if !msg.is_json() {
            return Ok(None);
        }
        let body: serde_json::Value = msg.json()?;
        if body.get("commandName").and_then(serde_json::Value::as_str) != Some(SHEET_GEOMETRY_COMMAND) {
            return Ok(None);
        }
        let body: SheetGeometryJson = serde_json::from_value(body)?;
        Ok(Some(Self {
            max_column: body.max_column,
            max_row: body.max_row,
            columns: body.columns.map(DimensionJson::into_data).transpose()?,
            rows: body.rows.map(DimensionJson::into_data).transpose()?,
        }))
    }
}

impl DimensionJson {
    fn into_data(self) -> Result<DimensionData, ParseError> {
        Ok(DimensionData {
            sizes: self.sizes.as_deref().map(parse_size_spans).transpose()?,
            hidden: self.hidden.as_deref().map(|text| parse_flag_spans("hidden", text)).transpose()?,
            filtered: self.filtered.as_deref().map(|text| parse_flag_spans("filtered", text)).transpose()?,
        })
    }
}

/// `size:last size:last ...`. Sizes fit in 16 bits, as the kernel stores
/// them.
fn parse_size_spans(text: &str) -> Result<Vec<SizeSpan>, ParseError> {
    let bad = || ParseError::BadNumber { field: "sizes", value: text.to_owned() };
    text.split_whitespace()
        .map(|span| {
            let (size, last) = span.split_once(':').ok_or_else(bad)?;
            let size: u16 = size.parse().map_err(|_| bad())?;
            let last = sheet_index(last).ok_or_else(bad)?;
            Ok(SizeSpan { size: i64::from(size), last })
        })
        .collect()
}

/// `start:first end end ...`.
fn parse_flag_spans(field: &'static str, text: &str) -> Result<FlagSpans, ParseError> {
    let bad = || ParseError::BadNumber { field, value: text.to_owned() };
    let mut words = text.split_whitespace();
    let (start, first) = words.next().and_then(|word| word.split_once(':')).ok_or_else(bad)?;
    let start = match start {
        "0" => false,
        "1" => true,
        _ => return Err(bad()),
    };
    let ends = std::iter::once(first)
        .chain(words)
        .map(|end| sheet_index(end).ok_or_else(bad))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FlagSpans { start, ends })
}

fn sheet_index(text: &str) -> Option<i64> {
    text.parse::<i64>().ok().filter(|index| (0..=MAX_SHEET_INDEX).contains(index))
}

// =============================================================
// Dialogs, errors, status
// =============================================================

/// `window:` lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WindowAction {
    #[serde(deserialize_with = "window_id")]
    pub id: u64,
    pub action: String,
}

/// Header of a `windowpaint:` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPaint {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

impl WindowPaint {
    /// # Errors
    ///
    /// Returns a [`ParseError`] when `id` is missing or a size is malformed.
    pub fn parse(tokens: &Tokens<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            id: tokens.number("id")?,
            width: tokens.number_or("width", 0)?,
            height: tokens.number_or("height", 0)?,
        })
    }
}

/// `error: cmd=.. kind=.. [code=..]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelError {
    pub command: String,
    pub kind: String,
    pub code: Option<String>,
}

impl KernelError {
    #[must_use]
    pub fn parse(tokens: &Tokens<'_>) -> Self {
        Self {
            command: tokens.get("cmd").unwrap_or_default().to_owned(),
            kind: tokens.get("kind").unwrap_or_default().to_owned(),
            code: tokens.get("code").map(str::to_owned),
        }
    }
}

/// `status:` document summary. Sizes are in twips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub doc_type: String,
    pub parts: i32,
    pub current_part: i32,
    pub width: i64,
    pub height: i64,
    pub view_id: Option<ViewId>,
}

impl Status {
    /// # Errors
    ///
    /// Returns a [`ParseError`] when a size token is missing or malformed.
    pub fn parse(tokens: &Tokens<'_>) -> Result<Self, ParseError> {
        let view_id = match tokens.get("viewid") {
            Some(_) => Some(tokens.number("viewid")?),
            None => None,
        };
        Ok(Self {
            doc_type: tokens.get("type").unwrap_or("text").to_owned(),
            parts: tokens.number_or("parts", 1)?,
            current_part: tokens.number_or("current", 0)?,
            width: tokens.twips("width")?,
            height: tokens.twips("height")?,
            view_id,
        })
    }
}

// =============================================================
// Lenient scalar deserializers
// =============================================================

fn rect_or_empty(text: &str) -> Result<Rect, ParseError> {
    let text = text.trim();
    if text.is_empty() || text == "EMPTY" {
        return Ok(Rect::default());
    }
    Rect::parse(text)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Bool(bool),
    Text(String),
}

fn scalar_to_i64<E: de::Error>(raw: Scalar) -> Result<i64, E> {
    match raw {
        Scalar::Int(n) => Ok(n),
        Scalar::Bool(b) => Ok(i64::from(b)),
        Scalar::Text(s) => s.trim().parse().map_err(E::custom),
    }
}

fn view_id<'de, D: Deserializer<'de>>(d: D) -> Result<ViewId, D::Error> {
    let n = scalar_to_i64(Scalar::deserialize(d)?)?;
    ViewId::try_from(n).map_err(de::Error::custom)
}

fn opt_view_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ViewId>, D::Error> {
    view_id(d).map(Some)
}

fn part<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    let n = scalar_to_i64(Scalar::deserialize(d)?)?;
    i32::try_from(n).map_err(de::Error::custom)
}

fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    scalar_to_i64(Scalar::deserialize(d)?).map(Some)
}

fn window_id<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let n = scalar_to_i64(Scalar::deserialize(d)?)?;
    u64::try_from(n).map_err(de::Error::custom)
}

fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Scalar::deserialize(d)? {
        Scalar::Bool(b) => Ok(b),
        Scalar::Int(n) => Ok(n != 0),
        Scalar::Text(s) => Ok(s.trim() == "true"),
    }
}
