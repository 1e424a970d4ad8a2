//! Spreadsheet row and column geometry.
//!
//! DESIGN
//! ======
//! Spreadsheet kernels report cursors and cell ranges in print twips. Tiles
//! are laid out in tile twips, where every row and column is first rounded
//! down to whole core pixels at the current zoom, so the two drift apart
//! further down and right on the sheet. [`SheetGeometry`] keeps run-length
//! sizes per axis and projects print-twips rectangles onto the tile-twips
//! bounds of the cells that enclose them.
//!
//! Pixel positions are derived per query from the zoom passed in, so zoom
//! changes need no bookkeeping here; replaying the stored messages is enough.

use std::collections::BTreeSet;

use wire::Rect;
use wire::payload::{DimensionData, FlagSpans, SheetGeometryData, SizeSpan};

use crate::consts::TILE_SIZE;
use crate::coords::{floor_i64, tile_twips};

#[cfg(test)]
#[path = "sheet_test.rs"]
mod sheet_test;

/// Row and column geometry of one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetGeometry {
    part: i32,
    columns: SheetAxis,
    rows: SheetAxis,
}

impl SheetGeometry {
    #[must_use]
    pub fn new(part: i32) -> Self {
        Self { part, columns: SheetAxis::default(), rows: SheetAxis::default() }
    }

    /// Sheet the geometry describes.
    #[must_use]
    pub fn part(&self) -> i32 {
        self.part
    }

    /// Both axes have sizes.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.columns.runs.is_empty() && !self.rows.runs.is_empty()
    }

    /// Merge a reply. A reply for another sheet starts from scratch.
    pub fn update(&mut self, data: &SheetGeometryData, part: i32) {
        if part != self.part {
            *self = Self::new(part);
        }
        if let Some(columns) = &data.columns {
            self.columns.update(columns);
        }
        if let Some(rows) = &data.rows {
            self.rows.update(rows);
        }
        if data.max_column.is_some() {
            self.columns.max_index = data.max_column;
        }
        if data.max_row.is_some() {
            self.rows.max_index = data.max_row;
        }
    }

    /// Tile-twips bounds at `zoom` of the cell range enclosing `rect`, a
    /// print-twips rectangle. Returned unchanged while an axis is unknown.
    #[must_use]
    pub fn area_to_tile(&self, rect: &Rect, zoom: i32) -> Rect {
        let per_pixel = twips_per_pixel(zoom);
        let horizontal = self.columns.range_to_tile(rect.x, rect.right(), per_pixel);
        let vertical = self.rows.range_to_tile(rect.y, rect.bottom(), per_pixel);
        match (horizontal, vertical) {
            (Some((left, right)), Some((top, bottom))) => Rect::new(left, top, right - left, bottom - top),
            _ => *rect,
        }
    }

    /// Tile-twips position at `zoom` of a print-twips point, keeping its
    /// offset inside the cell.
    #[must_use]
    pub fn point_to_tile(&self, x: i64, y: i64, zoom: i32) -> (i64, i64) {
        let per_pixel = twips_per_pixel(zoom);
        (
            self.columns.pos_to_tile(x, per_pixel).unwrap_or(x),
            self.rows.pos_to_tile(y, per_pixel).unwrap_or(y),
        )
    }
}

fn twips_per_pixel(zoom: i32) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let ratio = tile_twips(zoom) as f64 / TILE_SIZE as f64;
    ratio
}

// =============================================================================
// AXIS
// =============================================================================

/// Consecutive elements of one visible size. Hidden and filtered elements
/// have size zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    first: i64,
    last: i64,
    size: i64,
}

impl Run {
    fn count(&self) -> i64 {
        self.last - self.first + 1
    }
}

/// A run with its start offsets at one zoom.
#[derive(Debug, Clone, Copy)]
struct Placed {
    run: Run,
    start_print: i64,
    start_pixel: i64,
    pixel_size: i64,
}

impl Placed {
    fn end_print(&self) -> i64 {
        self.start_print.saturating_add(self.run.size.saturating_mul(self.run.count()))
    }

    fn print_start_of(&self, index: i64) -> i64 {
        self.start_print + self.run.size * (index - self.run.first)
    }

    fn tile_start_of(&self, index: i64, per_pixel: f64) -> i64 {
        let pixels = self.start_pixel + self.pixel_size * (index - self.run.first);
        #[allow(clippy::cast_precision_loss)]
        let pixels = pixels as f64;
        floor_i64(pixels * per_pixel)
    }

    fn tile_size(&self, per_pixel: f64) -> i64 {
        #[allow(clippy::cast_precision_loss)]
        let pixels = self.pixel_size as f64;
        floor_i64(pixels * per_pixel)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SheetAxis {
    sizes: Vec<SizeSpan>,
    hidden: FlagSpans,
    filtered: FlagSpans,
    max_index: Option<i64>,
    runs: Vec<Run>,
}

impl SheetAxis {
    fn update(&mut self, data: &DimensionData) {
        if let Some(sizes) = &data.sizes {
            self.sizes.clone_from(sizes);
        }
        if let Some(hidden) = &data.hidden {
            self.hidden.clone_from(hidden);
        }
        if let Some(filtered) = &data.filtered {
            self.filtered.clone_from(filtered);
        }
        self.rebuild();
    }

    /// Split the sizes at every hidden or filtered boundary, zero the
    /// invisible stretches and merge neighbours of equal size.
    fn rebuild(&mut self) {
        self.runs.clear();
        let Some(limit) = self.sizes.last().map(|span| span.last) else {
            return;
        };
        let mut cuts: BTreeSet<i64> = self.sizes.iter().map(|span| span.last).collect();
        cuts.extend(
            self.hidden
                .ends
                .iter()
                .chain(&self.filtered.ends)
                .copied()
                .filter(|end| (0..limit).contains(end)),
        );

        let mut first = 0;
        for last in cuts {
            if last < first {
                continue;
            }
            let size = if self.hidden.get(last) || self.filtered.get(last) { 0 } else { self.size_at(last) };
            match self.runs.last_mut() {
                Some(previous) if previous.size == size => previous.last = last,
                _ => self.runs.push(Run { first, last, size }),
            }
            first = last + 1;
        }
    }

    fn size_at(&self, index: i64) -> i64 {
        let span = self.sizes.partition_point(|span| span.last < index);
        self.sizes.get(span).map_or(0, |span| span.size)
    }

    fn last_index(&self) -> Option<i64> {
        let limit = self.runs.last()?.last;
        Some(self.max_index.map_or(limit, |max| max.clamp(0, limit)))
    }

    fn placed(&self, per_pixel: f64) -> Vec<Placed> {
        let mut print = 0_i64;
        let mut pixel = 0_i64;
        self.runs
            .iter()
            .map(|run| {
                #[allow(clippy::cast_precision_loss)]
                let pixel_size = floor_i64(run.size as f64 / per_pixel);
                let placed = Placed { run: *run, start_print: print, start_pixel: pixel, pixel_size };
                print = print.saturating_add(run.size.saturating_mul(run.count()));
                pixel = pixel.saturating_add(pixel_size.saturating_mul(run.count()));
                placed
            })
            .collect()
    }

    /// Element holding print-twips position `pos`. Positions outside the
    /// sheet clamp to the first or last element.
    fn locate(&self, placed: &[Placed], pos: i64) -> Option<(i64, Placed)> {
        if let Some(hit) = placed
            .iter()
            .find(|p| p.run.size > 0 && p.start_print <= pos && pos < p.end_print())
        {
            return Some((hit.run.first + (pos - hit.start_print) / hit.run.size, *hit));
        }
        let index = if pos >= 0 { self.last_index()? } else { 0 };
        let hit = placed.iter().find(|p| p.run.first <= index && index <= p.run.last)?;
        Some((index, *hit))
    }

    /// Tile-twips `(start, end)` of the elements covering print twips
    /// `start..end`. An empty range maps to one core pixel.
    fn range_to_tile(&self, start: i64, end: i64, per_pixel: f64) -> Option<(i64, i64)> {
        let placed = self.placed(per_pixel);
        let (first, first_run) = self.locate(&placed, start)?;
        let tile_start = first_run.tile_start_of(first, per_pixel);
        if start == end {
            return Some((tile_start, tile_start + floor_i64(per_pixel)));
        }
        let (last, last_run) = self.locate(&placed, end)?;
        let tile_end = last_run.tile_start_of(last, per_pixel) + last_run.tile_size(per_pixel);
        Some((tile_start, tile_end.max(tile_start)))
    }

    fn pos_to_tile(&self, pos: i64, per_pixel: f64) -> Option<i64> {
        let placed = self.placed(per_pixel);
        let (index, run) = self.locate(&placed, pos)?;
        Some(run.tile_start_of(index, per_pixel) + (pos - run.print_start_of(index)))
    }
}
