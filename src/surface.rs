//! Headless render surface: counts what the engine draws and logs it.

use engine::RenderSurface;
use engine::coords::{PixelRect, Point};
use engine::overlay::OverlayShape;
use engine::tile::{Bitmap, TileCoord};
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct LogSurface {
    pub tiles_painted: u64,
    pub bytes_painted: u64,
    pub dialogs_painted: u64,
    pub overlay_shapes: usize,
}

impl RenderSurface for LogSurface {
    fn paint_tile(&mut self, coord: &TileCoord, bitmap: &Bitmap) {
        self.tiles_painted += 1;
        self.bytes_painted += bitmap.len() as u64;
        trace!(tile = %coord.key(), bytes = bitmap.len(), "paint");
    }

    fn invalidate_rect(&mut self, rect: &PixelRect) {
        trace!(x = rect.min.x, y = rect.min.y, width = rect.width(), height = rect.height(), "invalidate");
    }

    fn draw_scaled(&mut self, scale: f64, center: Point) {
        trace!(scale, x = center.x, y = center.y, "scaled redraw");
    }

    fn draw_overlays(&mut self, shapes: &[OverlayShape]) {
        if shapes.len() != self.overlay_shapes {
            debug!(shapes = shapes.len(), "overlays");
        }
        self.overlay_shapes = shapes.len();
    }

    fn paint_dialog(&mut self, id: u64, bitmap: &Bitmap) {
        self.dialogs_painted += 1;
        debug!(id, bytes = bitmap.len(), "dialog paint");
    }
}
