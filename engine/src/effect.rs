//! Effects returned by handlers and the events they surface to the host.
//!
//! Handlers never touch the render surface or the socket. They return a list
//! of [`Effect`]s which [`crate::engine::Engine`] executes in order after the
//! handler returns.

use serde::Serialize;
use wire::request::Request;
use wire::{Rect, ViewId};

use crate::coords::{PixelRect, Point};
use crate::tile::{Bitmap, TileCoord};

/// Follow-up work a handler asks for. Runs after the current turn, once per
/// distinct task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Recompute visible tiles, fetch what is missing and announce the view.
    RefreshView,
    /// Re-dispatch every stored replay entry.
    Replay { part_changed: bool },
    /// Re-dispatch stored entries of one remote view.
    ReplayView(ViewId),
    /// Re-request tiles whose "unchanged" reply found no pixels.
    RequestKeyframes,
}

/// One unit of output from a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(Request),
    /// Acknowledge a consumed tile message. Batched into one `tileprocessed`.
    Ack(u64),
    Paint(TileCoord),
    Invalidate(PixelRect),
    DrawScaled { scale: f64, center: Point },
    DrawOverlays,
    PaintDialog { id: u64, bitmap: Bitmap },
    Emit(Event),
    Schedule(Task),
    RequestFrame,
}

/// High-level notifications for UI collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    TileReady { coord: TileCoord },
    AllTilesLoaded,
    CursorChanged { visible: bool, rect: Rect },
    SelectionChanged { view_id: Option<ViewId>, rects: Vec<Rect> },
    ViewAdded { view_id: ViewId, user_name: String, color: i64, read_only: bool },
    ViewRemoved { view_id: ViewId },
    StateChanged { command: String, value: serde_json::Value },
    SearchResults { search_string: String, count: usize, highlight_all: bool },
    DialogOpened { id: u64 },
    DialogClosed { id: u64 },
    KernelError { command: String, kind: String, code: Option<String> },
    /// Non-fatal condition worth surfacing, such as a zoom finish timeout.
    Diagnostic { message: String },
}
