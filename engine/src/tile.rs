//! Tile identity and per-tile state.

use std::sync::Arc;

use serde::Serialize;
use wire::Rect;

use crate::consts::TILE_SIZE;
use crate::coords::tile_twips;

#[cfg(test)]
#[path = "tile_test.rs"]
mod tile_test;

/// Decoded-or-encoded pixel payload as received from the kernel. Shared so the
/// content cache and render surface can hold it without copying.
pub type Bitmap = Arc<[u8]>;

/// Position of a tile: core-pixel origin, zoom level and part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileCoord {
    pub left: i64,
    pub top: i64,
    pub zoom: i32,
    pub part: i32,
}

impl TileCoord {
    #[must_use]
    pub fn new(left: i64, top: i64, zoom: i32, part: i32) -> Self {
        Self { left, top, zoom, part }
    }

    /// Coordinate of grid cell `(col, row)`.
    #[must_use]
    pub fn from_cell(col: i64, row: i64, zoom: i32, part: i32) -> Self {
        Self::new(col * TILE_SIZE, row * TILE_SIZE, zoom, part)
    }

    /// Coordinate of the tile whose twips origin is `(x, y)` when tiles are
    /// `tile_twips` wide.
    #[must_use]
    pub fn from_twips(x: i64, y: i64, tile_twips: i64, zoom: i32, part: i32) -> Self {
        let col = div_round(x, tile_twips);
        let row = div_round(y, tile_twips);
        Self::from_cell(col, row, zoom, part)
    }

    #[must_use]
    pub fn col(&self) -> i64 {
        self.left.div_euclid(TILE_SIZE)
    }

    #[must_use]
    pub fn row(&self) -> i64 {
        self.top.div_euclid(TILE_SIZE)
    }

    /// `left:top:zoom:part`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}:{}:{}", self.left, self.top, self.zoom, self.part)
    }

    /// Document area covered by this tile.
    #[must_use]
    pub fn twips_rect(&self) -> Rect {
        let size = tile_twips(self.zoom);
        Rect::new(self.col() * size, self.row() * size, size, size)
    }

    /// Row-major ordering key within one zoom and part.
    #[must_use]
    pub fn row_major(&self) -> (i32, i32, i64, i64) {
        (self.part, self.zoom, self.top, self.left)
    }
}

/// An outstanding fetch for a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub requested_at: u64,
    /// Invalidations pending when the request went out; the response settles
    /// exactly this many.
    pub covers_invalid: u32,
}

/// A resident tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub coord: TileCoord,
    pub bitmap: Option<Bitmap>,
    /// Time (clock ms) of the last content arrival.
    pub loaded: Option<u64>,
    /// Inside a visible pane at the view's zoom and part.
    pub active: bool,
    /// At the view's zoom and part, near the viewport, with settled content.
    pub current: bool,
    pub wire_id: u64,
    pub invalid_count: u32,
    pub in_flight: Option<InFlight>,
}

impl Tile {
    #[must_use]
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            bitmap: None,
            loaded: None,
            active: false,
            current: false,
            wire_id: 0,
            invalid_count: 0,
            in_flight: None,
        }
    }

    /// Loaded content with no invalidation pending.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.bitmap.is_some() && self.loaded.is_some() && self.invalid_count == 0
    }

    /// Whether a fetch must be issued at `now`: the tile is not ready and no
    /// request younger than `retry_ms` already covers every pending
    /// invalidation.
    #[must_use]
    pub fn needs_fetch(&self, now: u64, retry_ms: u64) -> bool {
        if self.is_ready() {
            return false;
        }
        match self.in_flight {
            Some(flight) => {
                flight.covers_invalid < self.invalid_count
                    || now.saturating_sub(flight.requested_at) >= retry_ms
            }
            None => true,
        }
    }
}

fn div_round(value: i64, by: i64) -> i64 {
    if by <= 0 {
        return 0;
    }
    value.saturating_add(by / 2).div_euclid(by)
}
