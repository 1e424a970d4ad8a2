//! The drawing seam between the engine and whatever presents pixels.

use crate::coords::{PixelRect, Point};
use crate::overlay::OverlayShape;
use crate::tile::{Bitmap, TileCoord};

/// Host-provided drawing target. Only tile painting and invalidation are
/// required; hosts without animation or dialogs can ignore the rest.
pub trait RenderSurface {
    fn paint_tile(&mut self, coord: &TileCoord, bitmap: &Bitmap);

    fn invalidate_rect(&mut self, rect: &PixelRect);

    /// Redraw resident bitmaps magnified by `scale` around `center` (core px).
    fn draw_scaled(&mut self, _scale: f64, _center: Point) {}

    fn draw_overlays(&mut self, _shapes: &[OverlayShape]) {}

    fn paint_dialog(&mut self, _id: u64, _bitmap: &Bitmap) {}
}

/// A call received by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum Draw {
    Tile(TileCoord),
    Invalidate(PixelRect),
    Scaled { scale: f64, center: Point },
    Overlays(Vec<OverlayShape>),
    Dialog(u64),
}

/// Surface that records every call, for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub draws: Vec<Draw>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Painted tile coordinates in call order.
    #[must_use]
    pub fn painted(&self) -> Vec<TileCoord> {
        self.draws
            .iter()
            .filter_map(|draw| match draw {
                Draw::Tile(coord) => Some(*coord),
                _ => None,
            })
            .collect()
    }

    /// The most recent overlay set, if any was drawn.
    #[must_use]
    pub fn last_overlays(&self) -> Option<&[OverlayShape]> {
        self.draws.iter().rev().find_map(|draw| match draw {
            Draw::Overlays(shapes) => Some(shapes.as_slice()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.draws.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn paint_tile(&mut self, coord: &TileCoord, _bitmap: &Bitmap) {
        self.draws.push(Draw::Tile(*coord));
    }

    fn invalidate_rect(&mut self, rect: &PixelRect) {
        self.draws.push(Draw::Invalidate(*rect));
    }

    fn draw_scaled(&mut self, scale: f64, center: Point) {
        self.draws.push(Draw::Scaled { scale, center });
    }

    fn draw_overlays(&mut self, shapes: &[OverlayShape]) {
        self.draws.push(Draw::Overlays(shapes.to_vec()));
    }

    fn paint_dialog(&mut self, id: u64, _bitmap: &Bitmap) {
        self.draws.push(Draw::Dialog(id));
    }
}
