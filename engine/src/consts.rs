//! Shared numeric constants for the engine crate.

// ── Tile geometry ───────────────────────────────────────────────

/// Tile edge length in core pixels.
pub const TILE_SIZE: i64 = 256;

/// Tile edge length in twips at [`DEFAULT_ZOOM`] (256 px * 15 twips/px).
pub const BASE_TILE_TWIPS: f64 = 3840.0;

// ── Zoom ────────────────────────────────────────────────────────

/// Zoom level at which one core pixel is 15 twips.
pub const DEFAULT_ZOOM: i32 = 10;

pub const MIN_ZOOM: i32 = 1;
pub const MAX_ZOOM: i32 = 18;

/// Scale factor between two adjacent zoom levels.
pub const ZOOM_STEP_FACTOR: f64 = 1.2;

/// Interpolation frames between gesture end and the exact target zoom.
pub const FINISH_STEPS: u32 = 10;

// ── Retention ───────────────────────────────────────────────────

/// Coarser zoom levels searched for a stand-in when a wanted tile is not ready.
pub const PARENT_RETAIN_LEVELS: i32 = 5;

/// Finer zoom levels searched when no coarser stand-in exists.
pub const CHILD_RETAIN_LEVELS: i32 = 2;

// ── Prefetch ────────────────────────────────────────────────────

/// Maximum border ring width, in tiles, for a read-only view.
pub const PREFETCH_BORDER_READ_ONLY: u32 = 40;

/// Maximum border ring width, in tiles, while editing.
pub const PREFETCH_BORDER_EDITING: u32 = 10;
