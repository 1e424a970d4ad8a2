//! Background prefetcher.
//!
//! After the view has been idle for a debounce period the prefetcher grows a
//! ring around each pane's visible tile range, one layer per pass, and hands
//! back coordinates worth fetching. Each call is capped by a tile budget;
//! a ring that could not be fully queued is retried before growing further.
//! Once every pane reaches the maximum ring width, or a pass finds nothing to
//! fetch, the prefetcher sleeps until the next [`Prefetcher::reset`].

use std::collections::HashSet;

use crate::consts::{PREFETCH_BORDER_EDITING, PREFETCH_BORDER_READ_ONLY};
use crate::coords::TileRange;
use crate::tile::TileCoord;

#[cfg(test)]
#[path = "prefetch_test.rs"]
mod prefetch_test;

/// A pane's visible tile range and which axes it scrolls along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchPane {
    pub range: TileRange,
    pub x_fixed: bool,
    pub y_fixed: bool,
}

/// Snapshot of the view the prefetcher works against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchView {
    pub zoom: i32,
    pub part: i32,
    pub panes: Vec<PrefetchPane>,
    pub editing: bool,
    /// Tile range of the whole document; prefetching needs a known size.
    pub limit: Option<TileRange>,
    /// Tiles the viewport spans; scales the per-call budget.
    pub view_tiles: i64,
}

impl PrefetchView {
    fn max_border(&self) -> u32 {
        if self.editing { PREFETCH_BORDER_EDITING } else { PREFETCH_BORDER_READ_ONLY }
    }

    fn budget(&self) -> usize {
        let quarter = usize::try_from((self.view_tiles.max(0) + 3) / 4).unwrap_or(0);
        if self.editing { quarter } else { quarter * 4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Border {
    bounds: TileRange,
    x_fixed: bool,
    y_fixed: bool,
    index: u32,
}

#[derive(Debug, Clone)]
pub struct Prefetcher {
    idle_ms: u64,
    interval_ms: u64,
    armed_at: Option<u64>,
    last_run: Option<u64>,
    view: Option<PrefetchView>,
    borders: Vec<Border>,
}

impl Prefetcher {
    #[must_use]
    pub fn new(idle_ms: u64, interval_ms: u64) -> Self {
        Self { idle_ms, interval_ms, armed_at: None, last_run: None, view: None, borders: Vec::new() }
    }

    /// Restart the idle debounce. Called on every view change.
    pub fn reset(&mut self, now: u64) {
        self.armed_at = Some(now);
        self.last_run = None;
    }

    /// Sleeping until the next reset.
    #[must_use]
    pub fn is_dormant(&self) -> bool {
        self.armed_at.is_none()
    }

    /// One prefetch pass. Returns coordinates to fetch, possibly empty.
    /// `needs_fetch` filters out tiles already resident or in flight.
    pub fn tick(
        &mut self,
        now: u64,
        view: &PrefetchView,
        needs_fetch: impl Fn(&TileCoord) -> bool,
        foreground_busy: bool,
    ) -> Vec<TileCoord> {
        let Some(armed_at) = self.armed_at else {
            return Vec::new();
        };
        if now < armed_at + self.idle_ms {
            return Vec::new();
        }
        if self.last_run.is_some_and(|last| now < last + self.interval_ms) {
            return Vec::new();
        }
        self.last_run = Some(now);
        if foreground_busy {
            return Vec::new();
        }
        let Some(limit) = view.limit else {
            self.sleep();
            return Vec::new();
        };

        if self.view.as_ref() != Some(view) || self.borders.is_empty() {
            self.compute_borders(view);
        }

        let max_border = view.max_border();
        let mut budget = view.budget();
        let mut visited = HashSet::new();
        let mut queue = Vec::new();
        let mut done_all = true;

        for border in &mut self.borders {
            while budget > 0 && border.index < max_border {
                let clamped = border.bounds.intersect(&limit);
                let ring = ring_cells(border, &clamped, view.zoom, view.part);
                let Some(ring) = ring else {
                    break;
                };

                let mut pending = false;
                for coord in ring {
                    if visited.contains(&coord) || !needs_fetch(&coord) {
                        continue;
                    }
                    if budget > 0 {
                        visited.insert(coord);
                        queue.push(coord);
                        budget -= 1;
                    } else {
                        pending = true;
                    }
                }
                if pending {
                    continue;
                }
                grow(border, &limit);
                border.index += 1;
            }
            if border.index < max_border {
                done_all = false;
            }
        }

        if queue.is_empty() || done_all {
            tracing::debug!(queued = queue.len(), "prefetch going dormant");
            self.sleep();
        }
        queue
    }

    fn compute_borders(&mut self, view: &PrefetchView) {
        self.borders = view
            .panes
            .iter()
            .filter(|pane| !(pane.x_fixed && pane.y_fixed))
            .map(|pane| {
                let dx = i64::from(!pane.x_fixed);
                let dy = i64::from(!pane.y_fixed);
                let range = pane.range;
                Border {
                    bounds: TileRange::new(range.min_col - dx, range.min_row - dy, range.max_col + dx, range.max_row + dy),
                    x_fixed: pane.x_fixed,
                    y_fixed: pane.y_fixed,
                    index: 0,
                }
            })
            .collect();
        self.view = Some(view.clone());
    }

    fn sleep(&mut self) {
        self.armed_at = None;
        self.last_run = None;
        self.borders.clear();
        self.view = None;
    }
}

/// Cells on the current ring edge of `border`, or `None` when every edge lies
/// outside the document or along a fixed axis.
fn ring_cells(border: &Border, clamped: &TileRange, zoom: i32, part: i32) -> Option<Vec<TileCoord>> {
    let bounds = &border.bounds;
    let top = !border.y_fixed && bounds.min_row == clamped.min_row;
    let bottom = !border.y_fixed && bounds.max_row == clamped.max_row;
    let left = !border.x_fixed && bounds.min_col == clamped.min_col;
    let right = !border.x_fixed && bounds.max_col == clamped.max_col;
    if !(top || bottom || left || right) {
        return None;
    }

    let mut cells = Vec::new();
    let cols = clamped.min_col..=clamped.max_col;
    let rows = clamped.min_row..=clamped.max_row;
    if bottom {
        cells.extend(cols.clone().map(|col| TileCoord::from_cell(col, bounds.max_row, zoom, part)));
    }
    if top {
        cells.extend(cols.map(|col| TileCoord::from_cell(col, bounds.min_row, zoom, part)));
    }
    if right {
        cells.extend(rows.clone().map(|row| TileCoord::from_cell(bounds.max_col, row, zoom, part)));
    }
    if left {
        cells.extend(rows.map(|row| TileCoord::from_cell(bounds.min_col, row, zoom, part)));
    }
    Some(cells)
}

/// Push each scrolling edge out by one tile, stopping at the document edge.
fn grow(border: &mut Border, limit: &TileRange) {
    let bounds = &mut border.bounds;
    if !border.x_fixed {
        if bounds.min_col > limit.min_col {
            bounds.min_col -= 1;
        }
        if bounds.max_col < limit.max_col {
            bounds.max_col += 1;
        }
    }
    if !border.y_fixed {
        if bounds.min_row > limit.min_row {
            bounds.min_row -= 1;
        }
        if bounds.max_row < limit.max_row {
            bounds.max_row += 1;
        }
    }
}
