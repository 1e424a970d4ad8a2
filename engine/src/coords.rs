//! Coordinate spaces and the conversions between them.
//!
//! Three spaces are in play:
//!
//! - **twips**: the kernel's zoom-invariant document unit (1/1440 inch).
//! - **core pixels**: device-independent tile pixels. One tile is always
//!   [`TILE_SIZE`] core pixels wide; how many twips that covers depends on zoom.
//! - **CSS pixels**: core pixels divided by the device pixel ratio.
//!
//! Twips and core pixels convert losslessly in `f64`; rounding happens only
//! when producing CSS pixels.

use wire::Rect;

use crate::consts::{BASE_TILE_TWIPS, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, TILE_SIZE, ZOOM_STEP_FACTOR};

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

/// A point in twips, core pixels or CSS pixels; the space is implied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self { x: self.x * factor, y: self.y * factor }
    }
}

/// Half-open rectangle `[min, max)` in core pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub min: Point,
    pub max: Point,
}

impl PixelRect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { min: Point::new(x, y), max: Point::new(x + width, y + height) }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        PixelRect {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// The rectangle the same document area occupies after scaling by
    /// `factor` around `center`, keeping `center` fixed on screen.
    #[must_use]
    pub fn zoomed_about(&self, center: Point, factor: f64) -> PixelRect {
        let origin = Point::new(
            center.x * factor - (center.x - self.min.x),
            center.y * factor - (center.y - self.min.y),
        );
        PixelRect::new(origin.x, origin.y, self.width(), self.height())
    }
}

/// One independently scrolled region of the viewport. Frozen panes are fixed
/// along one or both axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pane {
    pub rect: PixelRect,
    pub x_fixed: bool,
    pub y_fixed: bool,
}

impl Pane {
    #[must_use]
    pub fn new(rect: PixelRect) -> Self {
        Self { rect, x_fixed: false, y_fixed: false }
    }

    /// This pane after zooming by `factor` about `center`. Fixed axes do not
    /// scroll.
    #[must_use]
    pub fn zoomed_about(&self, center: Point, factor: f64) -> Self {
        let zoomed = self.rect.zoomed_about(center, factor);
        let x = if self.x_fixed { self.rect.min.x } else { zoomed.min.x };
        let y = if self.y_fixed { self.rect.min.y } else { zoomed.min.y };
        Self { rect: PixelRect::new(x, y, self.rect.width(), self.rect.height()), ..*self }
    }
}

/// Inclusive range of tile columns and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRange {
    pub min_col: i64,
    pub min_row: i64,
    pub max_col: i64,
    pub max_row: i64,
}

impl TileRange {
    #[must_use]
    pub fn new(min_col: i64, min_row: i64, max_col: i64, max_row: i64) -> Self {
        Self { min_col, min_row, max_col, max_row }
    }

    /// Tiles touched by a half-open core-pixel rectangle.
    #[must_use]
    pub fn from_pixels(rect: &PixelRect) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let size = TILE_SIZE as f64;
        Self {
            min_col: floor_i64(rect.min.x / size),
            min_row: floor_i64(rect.min.y / size),
            max_col: floor_i64((rect.max.x / size).ceil()) - 1,
            max_row: floor_i64((rect.max.y / size).ceil()) - 1,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_col < self.min_col || self.max_row < self.min_row
    }

    #[must_use]
    pub fn contains(&self, col: i64, row: i64) -> bool {
        (self.min_col..=self.max_col).contains(&col) && (self.min_row..=self.max_row).contains(&row)
    }

    #[must_use]
    pub fn expand(&self, by: i64) -> Self {
        Self::new(self.min_col - by, self.min_row - by, self.max_col + by, self.max_row + by)
    }

    #[must_use]
    pub fn intersect(&self, other: &TileRange) -> Self {
        Self::new(
            self.min_col.max(other.min_col),
            self.min_row.max(other.min_row),
            self.max_col.min(other.max_col),
            self.max_row.min(other.max_row),
        )
    }

    #[must_use]
    pub fn union(&self, other: &TileRange) -> Self {
        Self::new(
            self.min_col.min(other.min_col),
            self.min_row.min(other.min_row),
            self.max_col.max(other.max_col),
            self.max_row.max(other.max_row),
        )
    }

    #[must_use]
    pub fn columns(&self) -> i64 {
        (self.max_col - self.min_col + 1).max(0)
    }

    #[must_use]
    pub fn rows(&self) -> i64 {
        (self.max_row - self.min_row + 1).max(0)
    }

    /// `(col, row)` pairs in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        (self.min_row..=self.max_row).flat_map(move |row| (self.min_col..=self.max_col).map(move |col| (col, row)))
    }
}

/// Tile edge length in twips at `zoom`.
#[must_use]
pub fn tile_twips(zoom: i32) -> i64 {
    debug_assert!(zoom > 0, "zoom must be positive");
    #[allow(clippy::cast_possible_truncation)]
    let twips = (BASE_TILE_TWIPS * ZOOM_STEP_FACTOR.powi(DEFAULT_ZOOM - zoom)).round() as i64;
    twips
}

/// Zoom level whose tile edge is `twips` wide. Inverse of [`tile_twips`].
#[must_use]
pub fn zoom_for_tile_twips(twips: i64) -> i32 {
    #[allow(clippy::cast_precision_loss)]
    let ratio = twips as f64 / BASE_TILE_TWIPS;
    #[allow(clippy::cast_possible_truncation)]
    let zoom = (f64::from(DEFAULT_ZOOM) - ratio.ln() / ZOOM_STEP_FACTOR.ln()).round() as i32;
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Magnification going from zoom level `from` to `to`.
#[must_use]
pub fn zoom_scale(from: i32, to: i32) -> f64 {
    ZOOM_STEP_FACTOR.powi(to - from)
}

#[must_use]
pub fn clamp_zoom(zoom: i32) -> i32 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Conversions for one zoom level and device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub zoom: i32,
    pub dpi_scale: f64,
    tile_twips: f64,
}

impl Transform {
    #[must_use]
    pub fn new(zoom: i32, dpi_scale: f64) -> Self {
        debug_assert!(dpi_scale > 0.0, "dpi scale must be positive");
        #[allow(clippy::cast_precision_loss)]
        let tile_twips = tile_twips(zoom) as f64;
        Self { zoom, dpi_scale, tile_twips }
    }

    #[must_use]
    pub fn tile_twips(&self) -> f64 {
        self.tile_twips
    }

    #[must_use]
    pub fn twips_to_core(&self, p: Point) -> Point {
        p.scale(tile_size() / self.tile_twips)
    }

    #[must_use]
    pub fn core_to_twips(&self, p: Point) -> Point {
        p.scale(self.tile_twips / tile_size())
    }

    /// Twips to whole CSS pixels.
    #[must_use]
    pub fn twips_to_css(&self, p: Point) -> Point {
        let css = self.twips_to_core(p).scale(1.0 / self.dpi_scale);
        Point::new(css.x.round(), css.y.round())
    }

    #[must_use]
    pub fn css_to_twips(&self, p: Point) -> Point {
        self.core_to_twips(p.scale(self.dpi_scale))
    }

    #[must_use]
    pub fn twips_rect_to_core(&self, rect: &Rect) -> PixelRect {
        #[allow(clippy::cast_precision_loss)]
        let (x, y, w, h) = (rect.x as f64, rect.y as f64, rect.width as f64, rect.height as f64);
        let min = self.twips_to_core(Point::new(x, y));
        let size = self.twips_to_core(Point::new(w, h));
        PixelRect::new(min.x, min.y, size.x, size.y)
    }

    /// Covering twips rectangle of a core-pixel rectangle, rounded to whole twips.
    #[must_use]
    pub fn core_rect_to_twips(&self, rect: &PixelRect) -> Rect {
        let min = self.core_to_twips(rect.min);
        let max = self.core_to_twips(rect.max);
        let (x, y) = (floor_i64(min.x), floor_i64(min.y));
        Rect::new(x, y, floor_i64(max.x.ceil()) - x, floor_i64(max.y.ceil()) - y)
    }

    /// Tile range of the document at this zoom, or `None` when the size is unknown.
    #[must_use]
    pub fn document_tiles(&self, width_twips: i64, height_twips: i64) -> Option<TileRange> {
        if width_twips <= 0 || height_twips <= 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = ((width_twips - 1) as f64, (height_twips - 1) as f64);
        Some(TileRange::new(0, 0, floor_i64(w / self.tile_twips), floor_i64(h / self.tile_twips)))
    }
}

fn tile_size() -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let size = TILE_SIZE as f64;
    size
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn floor_i64(value: f64) -> i64 {
    value.floor() as i64
}
