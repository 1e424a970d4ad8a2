//! Tile cache and fetch scheduler.
//!
//! Tiles live in a [`SlotMap`] arena and are found through an integer index
//! keyed by [`TileCoord`]. The cache decides which coordinates need fetching,
//! groups them into rectangular `tilecombine` runs, applies arriving content,
//! and prunes what the current view no longer wants.
//!
//! RETENTION
//! =========
//!
//! A tile survives a prune pass when it is current, active, or in flight near
//! the viewport. An active tile that is not ready keeps its closest coarser
//! stand-in (up to [`PARENT_RETAIN_LEVELS`] levels out) or, failing that, its
//! finer ones (up to [`CHILD_RETAIN_LEVELS`] levels in), so something can be
//! drawn while the real content is on its way. Coverage is computed from twips
//! areas, so levels need not nest exactly.
//!
//! INVALIDATION
//! ============
//!
//! `invalidate` only bumps counters. A request records how many invalidations
//! it covers; the response settles that many, leaving any that arrived after
//! the request outstanding.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use slotmap::SlotMap;
use wire::Rect;
use wire::request::{Request, TileBatch, TileSlot};

use crate::consts::{CHILD_RETAIN_LEVELS, MAX_ZOOM, MIN_ZOOM, PARENT_RETAIN_LEVELS, TILE_SIZE};
use crate::content::ContentCache;
use crate::coords::{Pane, TileRange, tile_twips};
use crate::tile::{Bitmap, InFlight, Tile, TileCoord};

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

slotmap::new_key_type! {
    pub struct TileKey;
}

/// What happened to an arriving tile message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOutcome {
    /// No entry for the coordinate; the response is late and was dropped.
    Stale,
    /// Same revision as the settled entry; nothing changed.
    Duplicate,
    /// "Unchanged" arrived for a tile with no pixels; a full re-fetch is queued.
    NeedsKeyframe,
    /// Content stored. `visible` is true when the tile is in a visible pane.
    Applied { visible: bool },
}

/// Tunables for [`TileCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which an unanswered request may be re-issued.
    pub retry_ms: u64,
    /// Tiles around the visible range that stay current.
    pub retain_margin: i64,
    pub content_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewSnapshot {
    zoom: i32,
    part: i32,
    visible: Vec<TileRange>,
    window: Vec<TileRange>,
}

impl ViewSnapshot {
    fn classify(&self, tile: &mut Tile) {
        let same = tile.coord.zoom == self.zoom && tile.coord.part == self.part;
        let (col, row) = (tile.coord.col(), tile.coord.row());
        tile.active = same && self.visible.iter().any(|r| r.contains(col, row));
        tile.current = same && tile.is_ready() && self.in_window(col, row);
    }

    fn in_window(&self, col: i64, row: i64) -> bool {
        self.window.iter().any(|r| r.contains(col, row))
    }

    fn wants(&self, coord: &TileCoord) -> bool {
        coord.zoom == self.zoom && coord.part == self.part && self.in_window(coord.col(), coord.row())
    }
}

/// Visible tile ranges of `panes`, clamped to `limit` (or to non-negative
/// cells when the document size is unknown). Empty ranges are dropped.
#[must_use]
pub fn visible_ranges(panes: &[Pane], limit: Option<TileRange>) -> Vec<TileRange> {
    let limit = limit.unwrap_or(TileRange::new(0, 0, i64::MAX, i64::MAX));
    panes
        .iter()
        .map(|pane| TileRange::from_pixels(&pane.rect).intersect(&limit))
        .filter(|range| !range.is_empty())
        .collect()
}

pub struct TileCache {
    tiles: SlotMap<TileKey, Tile>,
    index: HashMap<TileCoord, TileKey>,
    content: ContentCache,
    view: Option<ViewSnapshot>,
    config: CacheConfig,
    prune_suppressed: bool,
    all_loaded_reported: bool,
    keyframes: Vec<TileCoord>,
}

impl TileCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            tiles: SlotMap::with_key(),
            index: HashMap::new(),
            content: ContentCache::new(config.content_capacity),
            view: None,
            config,
            prune_suppressed: false,
            all_loaded_reported: false,
            keyframes: Vec::new(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn get(&self, coord: &TileCoord) -> Option<&Tile> {
        self.index.get(coord).and_then(|key| self.tiles.get(*key))
    }

    #[must_use]
    pub fn bitmap(&self, coord: &TileCoord) -> Option<&Bitmap> {
        self.get(coord).and_then(|tile| tile.bitmap.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Coordinates of visible tiles with drawable pixels, row-major.
    #[must_use]
    pub fn drawable_active(&self) -> Vec<TileCoord> {
        let mut coords: Vec<_> = self
            .tiles
            .values()
            .filter(|tile| tile.active && tile.bitmap.is_some())
            .map(|tile| tile.coord)
            .collect();
        coords.sort_by_key(TileCoord::row_major);
        coords
    }

    /// Visible tiles still waiting for settled content.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.tiles.values().filter(|tile| tile.active && !tile.is_ready()).count()
    }

    /// Whether any visible tile has a request in flight.
    #[must_use]
    pub fn has_foreground_requests(&self) -> bool {
        self.tiles.values().any(|tile| tile.active && tile.in_flight.is_some())
    }

    /// Whether every cell of `ranges` at `zoom`/`part` holds a ready tile.
    #[must_use]
    pub fn all_ready_in(&self, ranges: &[TileRange], zoom: i32, part: i32) -> bool {
        ranges.iter().all(|range| {
            range
                .cells()
                .all(|(col, row)| self.get(&TileCoord::from_cell(col, row, zoom, part)).is_some_and(Tile::is_ready))
        })
    }

    /// Whether `coord` would need a fetch right now.
    #[must_use]
    pub fn needs_fetch(&self, coord: &TileCoord, now: u64) -> bool {
        self.get(coord).is_none_or(|tile| tile.needs_fetch(now, self.config.retry_ms))
    }

    // --- View ---

    /// Mark tiles against the view and return the visible coordinates that
    /// need fetching, row-major.
    pub fn ensure_visible(
        &mut self,
        panes: &[Pane],
        zoom: i32,
        part: i32,
        limit: Option<TileRange>,
        now: u64,
    ) -> Vec<TileCoord> {
        let visible = visible_ranges(panes, limit);
        let bound = limit.unwrap_or(TileRange::new(0, 0, i64::MAX, i64::MAX));
        let window = visible
            .iter()
            .map(|range| range.expand(self.config.retain_margin).intersect(&bound))
            .collect();
        let view = ViewSnapshot { zoom, part, visible, window };
        for tile in self.tiles.values_mut() {
            view.classify(tile);
        }
        let missing = self.missing_in(&view.visible, zoom, part, now);
        let moved = self
            .view
            .as_ref()
            .is_none_or(|old| old.zoom != zoom || old.part != part || old.visible != view.visible);
        if moved {
            self.all_loaded_reported = false;
        }
        self.view = Some(view);
        missing
    }

    /// Coordinates inside `ranges` that need fetching, without touching flags.
    #[must_use]
    pub fn missing_in(&self, ranges: &[TileRange], zoom: i32, part: i32, now: u64) -> Vec<TileCoord> {
        let mut seen = HashSet::new();
        let mut missing: Vec<_> = ranges
            .iter()
            .flat_map(TileRange::cells)
            .map(|(col, row)| TileCoord::from_cell(col, row, zoom, part))
            .filter(|coord| seen.insert(*coord) && self.needs_fetch(coord, now))
            .collect();
        missing.sort_by_key(TileCoord::row_major);
        missing
    }

    // --- Requests ---

    /// Build fetch requests for `coords`, creating entries as needed.
    /// Coordinates that do not need a fetch are skipped.
    pub fn request_tiles(&mut self, coords: &[TileCoord], now: u64) -> Vec<Request> {
        let mut groups: BTreeMap<(i32, i32), BTreeSet<(i64, i64)>> = BTreeMap::new();
        let mut foreground = false;
        for coord in coords {
            let key = self.entry(*coord);
            let Some(tile) = self.tiles.get(key) else {
                continue;
            };
            if tile.needs_fetch(now, self.config.retry_ms) {
                foreground |= tile.active;
                groups
                    .entry((coord.part, coord.zoom))
                    .or_default()
                    .insert((coord.row(), coord.col()));
            }
        }

        let mut requests = Vec::new();
        for ((part, zoom), cells) in groups {
            let twips = tile_twips(zoom);
            for run in rectangle_runs(cells) {
                let slots: Vec<TileSlot> = run
                    .iter()
                    .map(|&(row, col)| {
                        let old_wire_id = self.mark_in_flight(TileCoord::from_cell(col, row, zoom, part), now);
                        TileSlot { x: col * twips, y: row * twips, old_wire_id }
                    })
                    .collect();
                let batch = TileBatch { part, pixel_size: pixel_size(), tile_twips: twips, slots };
                requests.push(if batch.slots.len() == 1 {
                    Request::Tile(batch)
                } else {
                    Request::TileCombine(batch)
                });
            }
        }
        if foreground {
            self.all_loaded_reported = false;
        }
        requests
    }

    /// Drain coordinates whose "unchanged" reply found no pixels to keep.
    pub fn take_keyframes(&mut self) -> Vec<TileCoord> {
        std::mem::take(&mut self.keyframes)
    }

    fn entry(&mut self, coord: TileCoord) -> TileKey {
        if let Some(key) = self.index.get(&coord) {
            return *key;
        }
        let mut tile = Tile::new(coord);
        if let Some((wire_id, bitmap)) = self.content.take(&coord) {
            tile.wire_id = wire_id;
            tile.bitmap = Some(bitmap);
        }
        if let Some(view) = &self.view {
            view.classify(&mut tile);
        }
        let key = self.tiles.insert(tile);
        self.index.insert(coord, key);
        key
    }

    fn mark_in_flight(&mut self, coord: TileCoord, now: u64) -> u64 {
        let Some(tile) = self.index.get(&coord).and_then(|key| self.tiles.get_mut(*key)) else {
            return 0;
        };
        tile.in_flight = Some(InFlight { requested_at: now, covers_invalid: tile.invalid_count });
        tile.wire_id
    }

    // --- Responses ---

    /// Apply an arriving tile. `bitmap` is `None` when the kernel answered
    /// "unchanged".
    pub fn on_tile_content(
        &mut self,
        coord: TileCoord,
        wire_id: u64,
        bitmap: Option<Bitmap>,
        now: u64,
    ) -> ContentOutcome {
        let Some(tile) = self.index.get(&coord).and_then(|key| self.tiles.get_mut(*key)) else {
            return ContentOutcome::Stale;
        };
        if tile.in_flight.is_none() && tile.loaded.is_some() && tile.wire_id == wire_id {
            return ContentOutcome::Duplicate;
        }

        let settles = tile.in_flight.take().map_or(1, |flight| flight.covers_invalid);
        tile.invalid_count = tile.invalid_count.saturating_sub(settles);
        match bitmap {
            Some(pixels) => tile.bitmap = Some(pixels),
            None if tile.bitmap.is_none() => {
                tile.wire_id = 0;
                tile.loaded = None;
                self.keyframes.push(coord);
                return ContentOutcome::NeedsKeyframe;
            }
            None => {}
        }
        tile.wire_id = wire_id;
        tile.loaded = Some(now);
        if let Some(view) = &self.view {
            view.classify(tile);
        }
        ContentOutcome::Applied { visible: tile.active }
    }

    /// True exactly once after every visible tile has settled content.
    pub fn take_all_loaded(&mut self) -> bool {
        if self.all_loaded_reported {
            return false;
        }
        let mut any_active = false;
        for tile in self.tiles.values().filter(|tile| tile.active) {
            if !tile.is_ready() {
                return false;
            }
            any_active = true;
        }
        self.all_loaded_reported = any_active;
        any_active
    }

    // --- Invalidation ---

    /// Bump `invalid_count` on every tile of `part` overlapping `area`
    /// (`None` means the whole part). Returns how many tiles were touched.
    pub fn invalidate(&mut self, area: Option<&Rect>, part: i32) -> usize {
        let mut touched = 0;
        for tile in self.tiles.values_mut() {
            if tile.coord.part != part {
                continue;
            }
            if area.is_none_or(|rect| rect.intersects(&tile.coord.twips_rect())) {
                tile.invalid_count += 1;
                tile.current = false;
                touched += 1;
            }
        }
        touched
    }

    /// Forget every revision after a reconnect: all tiles become invalid with
    /// no revision, and evicted content is discarded.
    pub fn reset_revisions(&mut self) {
        for tile in self.tiles.values_mut() {
            tile.wire_id = 0;
            tile.in_flight = None;
            tile.invalid_count += 1;
            tile.current = false;
        }
        self.content.clear();
        self.keyframes.clear();
        self.all_loaded_reported = false;
    }

    // --- Cancellation ---

    /// Cancel outstanding requests after a view change. Only acts when some
    /// request lies outside `keep`. Unsettled tiles outside `keep` are
    /// dropped; those inside lose their in-flight mark so the next request
    /// batch includes them.
    pub fn cancel_outstanding(&mut self, keep: &[TileRange], zoom: i32, part: i32) -> Option<Request> {
        let inside = |coord: &TileCoord| {
            coord.zoom == zoom && coord.part == part && keep.iter().any(|range| range.contains(coord.col(), coord.row()))
        };
        if !self.tiles.values().any(|tile| tile.in_flight.is_some() && !inside(&tile.coord)) {
            return None;
        }
        let mut dropped = Vec::new();
        for (key, tile) in &mut self.tiles {
            tile.in_flight = None;
            if !inside(&tile.coord) && !tile.is_ready() {
                dropped.push(key);
            }
        }
        for key in dropped {
            self.evict(key);
        }
        Some(Request::CancelTiles)
    }

    // --- Pruning ---

    pub fn set_prune_suppressed(&mut self, suppressed: bool) {
        self.prune_suppressed = suppressed;
    }

    #[must_use]
    pub fn is_prune_suppressed(&self) -> bool {
        self.prune_suppressed
    }

    /// Evict tiles the view no longer wants. Returns the number evicted.
    pub fn prune(&mut self) -> usize {
        if self.prune_suppressed {
            return 0;
        }
        let Some(view) = self.view.as_ref() else {
            return 0;
        };

        let mut retain: HashSet<TileKey> = HashSet::new();
        let mut uncovered = Vec::new();
        for (key, tile) in &self.tiles {
            if tile.current || tile.active || (tile.in_flight.is_some() && view.wants(&tile.coord)) {
                retain.insert(key);
            }
            if tile.active && !tile.is_ready() {
                uncovered.push(tile.coord);
            }
        }
        for coord in uncovered {
            if !self.retain_ancestors(&coord, &mut retain) {
                self.retain_descendants(&coord, &mut retain);
            }
        }

        let evict: Vec<TileKey> = self.tiles.keys().filter(|key| !retain.contains(key)).collect();
        let count = evict.len();
        for key in evict {
            self.evict(key);
        }
        count
    }

    fn retain_ancestors(&self, coord: &TileCoord, retain: &mut HashSet<TileKey>) -> bool {
        let area = coord.twips_rect();
        let lowest = (coord.zoom - PARENT_RETAIN_LEVELS).max(MIN_ZOOM);
        for zoom in (lowest..coord.zoom).rev() {
            let found = self.drawable_covering(&area, zoom, coord.part);
            if !found.is_empty() {
                retain.extend(found);
                return true;
            }
        }
        false
    }

    fn retain_descendants(&self, coord: &TileCoord, retain: &mut HashSet<TileKey>) -> bool {
        let area = coord.twips_rect();
        let highest = (coord.zoom + CHILD_RETAIN_LEVELS).min(MAX_ZOOM);
        let mut found_any = false;
        for zoom in coord.zoom + 1..=highest {
            let found = self.drawable_covering(&area, zoom, coord.part);
            found_any |= !found.is_empty();
            retain.extend(found);
        }
        found_any
    }

    /// Keys of tiles at `zoom` overlapping `area` that have pixels to draw.
    fn drawable_covering(&self, area: &Rect, zoom: i32, part: i32) -> Vec<TileKey> {
        let size = tile_twips(zoom);
        let range = TileRange::new(
            area.x.div_euclid(size),
            area.y.div_euclid(size),
            (area.right() - 1).div_euclid(size),
            (area.bottom() - 1).div_euclid(size),
        );
        range
            .cells()
            .filter_map(|(col, row)| self.index.get(&TileCoord::from_cell(col, row, zoom, part)).copied())
            .filter(|key| self.tiles.get(*key).is_some_and(|tile| tile.bitmap.is_some()))
            .collect()
    }

    fn evict(&mut self, key: TileKey) {
        let Some(tile) = self.tiles.remove(key) else {
            return;
        };
        self.index.remove(&tile.coord);
        if let (Some(bitmap), Some(_)) = (tile.bitmap, tile.loaded) {
            self.content.insert(tile.coord, tile.wire_id, bitmap);
        }
    }
}

/// Split `(row, col)` cells into rectangles: from the lowest unclaimed cell,
/// extend right as far as possible, then down while every column of the run
/// is present. Each run is returned row-major.
pub(crate) fn rectangle_runs(mut cells: BTreeSet<(i64, i64)>) -> Vec<Vec<(i64, i64)>> {
    let mut runs = Vec::new();
    while let Some(&(row, col)) = cells.first() {
        let mut width = 1;
        while cells.contains(&(row, col + width)) {
            width += 1;
        }
        let mut height = 1;
        while (0..width).all(|dx| cells.contains(&(row + height, col + dx))) {
            height += 1;
        }
        let mut run = Vec::new();
        for dy in 0..height {
            for dx in 0..width {
                cells.remove(&(row + dy, col + dx));
                run.push((row + dy, col + dx));
            }
        }
        runs.push(run);
    }
    runs
}

fn pixel_size() -> u32 {
    u32::try_from(TILE_SIZE).unwrap_or(256)
}
