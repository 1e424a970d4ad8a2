//! Owned engine state.
//!
//! Every piece of mutable state lives in [`EngineState`]; handlers receive it
//! by `&mut` and return effects. There are no globals and no back-references.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use wire::request::Request;
use wire::{Rect, ViewId};

use crate::cache::{TileCache, visible_ranges};
use crate::config::EngineConfig;
use crate::consts::{DEFAULT_ZOOM, TILE_SIZE};
use crate::coords::{Pane, PixelRect, TileRange, Transform};
use crate::effect::Effect;
use crate::overlay::OverlayState;
use crate::prefetch::{PrefetchPane, PrefetchView, Prefetcher};
use crate::replay::{DocKind, ReplayStore};
use crate::sheet::SheetGeometry;
use crate::zoom::ZoomMachine;

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

/// What the kernel has told us about the document and this view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocInfo {
    pub kind: DocKind,
    pub parts: i32,
    pub current_part: i32,
    /// Document size in twips; zero until the first `status:`.
    pub width_twips: i64,
    pub height_twips: i64,
    pub own_view: Option<ViewId>,
    /// Edit permission. Read-only views hide the own cursor and prefetch more.
    pub edit: bool,
}

impl Default for DocInfo {
    fn default() -> Self {
        Self {
            kind: DocKind::Text,
            parts: 1,
            current_part: 0,
            width_twips: 0,
            height_twips: 0,
            own_view: None,
            edit: false,
        }
    }
}

/// Geometry last refreshed, used to detect view changes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Refreshed {
    zoom: i32,
    part: i32,
    ranges: Vec<TileRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub zoom: i32,
    pub panes: Vec<Pane>,
    last_visible_area: Option<Rect>,
    last_client_zoom: Option<i32>,
    last_refresh: Option<Refreshed>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            panes: Vec::new(),
            last_visible_area: None,
            last_client_zoom: None,
            last_refresh: None,
        }
    }
}

impl ViewState {
    /// Forget what was announced so the next refresh re-sends it.
    pub fn forget_announcements(&mut self) {
        self.last_visible_area = None;
        self.last_client_zoom = None;
        self.last_refresh = None;
    }
}

pub struct EngineState {
    pub config: EngineConfig,
    pub doc: DocInfo,
    pub view: ViewState,
    pub cache: TileCache,
    pub overlay: OverlayState,
    pub replay: ReplayStore,
    pub zoom: ZoomMachine,
    pub prefetch: Prefetcher,
    /// Row and column geometry of the current sheet. Present but incomplete
    /// while a request is outstanding.
    pub sheet: Option<SheetGeometry>,
    /// Latest value per `.uno:` command from state echoes.
    pub commands: BTreeMap<String, serde_json::Value>,
    /// Open dialog window ids.
    pub dialogs: BTreeSet<u64>,
    /// Clock reading for the current turn.
    pub now_ms: u64,
}

impl EngineState {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cache: TileCache::new(config.cache()),
            zoom: ZoomMachine::new(config.finish_polls),
            prefetch: Prefetcher::new(config.prefetch_idle_ms, config.prefetch_interval_ms),
            config,
            doc: DocInfo::default(),
            view: ViewState::default(),
            overlay: OverlayState::new(),
            replay: ReplayStore::default(),
            sheet: None,
            commands: BTreeMap::new(),
            dialogs: BTreeSet::new(),
            now_ms: 0,
        }
    }

    // --- Geometry ---

    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::new(self.view.zoom, self.config.dpi_scale)
    }

    /// Document tile range at the current zoom, once the size is known.
    #[must_use]
    pub fn tile_limit(&self) -> Option<TileRange> {
        self.transform().document_tiles(self.doc.width_twips, self.doc.height_twips)
    }

    #[must_use]
    pub fn visible_ranges(&self) -> Vec<TileRange> {
        visible_ranges(&self.view.panes, self.tile_limit())
    }

    /// Union of all panes in core pixels.
    #[must_use]
    pub fn viewport(&self) -> Option<PixelRect> {
        let mut panes = self.view.panes.iter().map(|pane| pane.rect);
        let first = panes.next()?;
        Some(panes.fold(first, |acc, rect| acc.union(&rect)))
    }

    #[must_use]
    pub fn prefetch_view(&self) -> PrefetchView {
        let limit = self.tile_limit();
        let bound = limit.unwrap_or(TileRange::new(0, 0, i64::MAX, i64::MAX));
        let panes = self
            .view
            .panes
            .iter()
            .map(|pane| PrefetchPane {
                range: TileRange::from_pixels(&pane.rect).intersect(&bound),
                x_fixed: pane.x_fixed,
                y_fixed: pane.y_fixed,
            })
            .filter(|pane| !pane.range.is_empty())
            .collect();
        let view_tiles = self.viewport().map_or(0, |rect| {
            let range = TileRange::from_pixels(&rect);
            range.columns() * range.rows()
        });
        PrefetchView {
            zoom: self.view.zoom,
            part: self.doc.current_part,
            panes,
            editing: self.doc.edit,
            limit,
            view_tiles,
        }
    }

    // --- Spreadsheet projection ---

    fn current_sheet(&self) -> Option<&SheetGeometry> {
        if self.doc.kind != DocKind::Spreadsheet {
            return None;
        }
        self.sheet.as_ref().filter(|sheet| sheet.part() == self.doc.current_part)
    }

    /// Tile-twips bounds of a cell area a spreadsheet reports in print twips.
    /// Other documents report tile twips already and pass through.
    #[must_use]
    pub fn sheet_area(&self, rect: Rect) -> Rect {
        self.current_sheet().map_or(rect, |sheet| sheet.area_to_tile(&rect, self.view.zoom))
    }

    /// Tile-twips position of a spreadsheet anchor point, once the sheet's
    /// geometry is known.
    #[must_use]
    pub fn sheet_point(&self, x: i64, y: i64) -> Option<(i64, i64)> {
        self.current_sheet()
            .filter(|sheet| sheet.is_complete())
            .map(|sheet| sheet.point_to_tile(x, y, self.view.zoom))
    }

    /// Ask for the current sheet's geometry unless it is known or already
    /// asked for.
    pub fn request_sheet_geometry(&mut self) -> Option<Effect> {
        if self.doc.kind != DocKind::Spreadsheet {
            return None;
        }
        let part = self.doc.current_part;
        if self.sheet.as_ref().is_some_and(|sheet| sheet.part() == part) {
            return None;
        }
        debug!(part, "requesting sheet geometry");
        self.sheet = Some(SheetGeometry::new(part));
        Some(Effect::Send(Request::SheetGeometry { columns: false, rows: false }))
    }

    // --- Refresh ---

    /// Bring the kernel and the cache in line with the current view: announce
    /// geometry changes, cancel requests for an abandoned view, fetch what is
    /// missing, prune, and restart the prefetch debounce. Does nothing while
    /// a zoom animation holds fetches back.
    pub fn refresh_view(&mut self) -> Vec<Effect> {
        if self.zoom.blocks_fetch() || self.view.panes.is_empty() {
            return Vec::new();
        }
        let zoom = self.view.zoom;
        let part = self.doc.current_part;
        let now = self.now_ms;
        let limit = self.tile_limit();
        let ranges = self.visible_ranges();
        let mut effects = Vec::new();

        let refreshed = Refreshed { zoom, part, ranges: ranges.clone() };
        let view_changed = self.view.last_refresh.as_ref() != Some(&refreshed);
        let abandoned = self.view.last_refresh.as_ref().is_some_and(|last| {
            last.zoom != zoom
                || last.part != part
                || !last.ranges.iter().any(|old| ranges.iter().any(|new| !old.intersect(new).is_empty()))
        });
        if abandoned {
            if let Some(cancel) = self.cache.cancel_outstanding(&ranges, zoom, part) {
                debug!(zoom, part, "view abandoned, cancelling tiles");
                effects.push(Effect::Send(cancel));
            }
        }
        self.view.last_refresh = Some(refreshed);

        effects.extend(self.announce());

        let missing = self.cache.ensure_visible(&self.view.panes, zoom, part, limit, now);
        effects.extend(self.cache.request_tiles(&missing, now).into_iter().map(Effect::Send));
        if view_changed {
            effects.extend(self.cache.drawable_active().into_iter().map(Effect::Paint));
        }

        self.cache.prune();
        self.prefetch.reset(now);
        effects.push(Effect::DrawOverlays);
        effects
    }

    /// `clientzoom` and `clientvisiblearea`, each only when it changed.
    fn announce(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        let transform = self.transform();
        if self.view.last_client_zoom != Some(self.view.zoom) {
            let twips = crate::coords::tile_twips(self.view.zoom);
            let pixels = u32::try_from(TILE_SIZE).unwrap_or(256);
            effects.push(Effect::Send(Request::ClientZoom {
                tile_pixel_width: pixels,
                tile_pixel_height: pixels,
                tile_twip_width: twips,
                tile_twip_height: twips,
            }));
            self.view.last_client_zoom = Some(self.view.zoom);
        }
        if let Some(viewport) = self.viewport() {
            let area = transform.core_rect_to_twips(&viewport);
            if self.view.last_visible_area != Some(area) {
                effects.push(Effect::Send(Request::ClientVisibleArea {
                    x: area.x,
                    y: area.y,
                    width: area.width,
                    height: area.height,
                }));
                self.view.last_visible_area = Some(area);
            }
        }
        effects
    }

    /// Re-request tiles whose "unchanged" reply found nothing to keep.
    pub fn request_keyframes(&mut self) -> Vec<Effect> {
        let coords = self.cache.take_keyframes();
        if coords.is_empty() {
            return Vec::new();
        }
        debug!(count = coords.len(), "re-fetching keyframes");
        self.cache.request_tiles(&coords, self.now_ms).into_iter().map(Effect::Send).collect()
    }

    /// Paint every visible tile that has pixels.
    #[must_use]
    pub fn repaint(&self) -> Vec<Effect> {
        self.cache.drawable_active().into_iter().map(Effect::Paint).collect()
    }
}
