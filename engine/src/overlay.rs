//! Cursor, selection and collaborator-marker state.
//!
//! Everything is stored in twips. Pixel geometry is produced on demand by
//! [`OverlayState::shapes`] for the current transform, so nothing here needs
//! fixing up after a zoom.
//!
//! Each marker follows `Hidden -> Visible -> Hidden`: an empty rectangle hides
//! it, a non-empty one shows it at the new bounds. Removing a view from the
//! roster deletes its markers outright.

use std::collections::BTreeMap;

use wire::payload::{ReferenceMark, SearchHit, ViewInfo};
use wire::rect::GraphicSelection;
use wire::{Rect, ViewId};

use crate::coords::{PixelRect, Transform};

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

/// Marker visibility as driven by position messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Hidden,
    Visible,
}

/// A positioned marker: a cursor, cell cursor or graphic selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub state: Visibility,
    pub bounds: Rect,
    pub part: i32,
    /// Kernel-side visibility flag (`viewcursorvisible:`), independent of
    /// position.
    pub shown: bool,
}

impl Default for Marker {
    fn default() -> Self {
        Self { state: Visibility::Hidden, bounds: Rect::default(), part: 0, shown: true }
    }
}

impl Marker {
    /// Apply a position message. Returns the resulting state.
    pub fn update(&mut self, rect: Rect, part: i32) -> Visibility {
        self.part = part;
        if rect.is_empty() {
            self.state = Visibility::Hidden;
        } else {
            self.state = Visibility::Visible;
            self.bounds = rect;
        }
        self.state
    }

    #[must_use]
    pub fn is_drawn(&self) -> bool {
        self.state == Visibility::Visible && self.shown
    }
}

/// A remote text selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewSelectionState {
    pub rects: Vec<Rect>,
    pub part: i32,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    OwnCursor,
    TextSelection,
    SelectionStart,
    SelectionEnd,
    GraphicSelection,
    CellCursor,
    CellSelection,
    ReferenceMark,
    SearchHit,
    ViewCursor(ViewId),
    ViewSelection(ViewId),
    ViewGraphicSelection(ViewId),
    ViewCellCursor(ViewId),
}

/// One renderable overlay rectangle in core pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayShape {
    pub kind: OverlayKind,
    pub rect: PixelRect,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct OverlayState {
    pub cursor: Marker,
    /// `cursorvisible:` from the kernel.
    pub kernel_cursor_visible: bool,
    /// The editing surface has input focus.
    pub focused: bool,
    pub modal_open: bool,

    pub text_selection: Vec<Rect>,
    pub selection_start: Option<Rect>,
    pub selection_end: Option<Rect>,
    pub graphic_selection: Option<GraphicSelection>,
    pub cell_cursor: Option<Rect>,
    pub cell_selection_area: Option<Rect>,
    pub reference_marks: Vec<ReferenceMark>,
    pub search_hits: Vec<SearchHit>,

    pub view_cursors: BTreeMap<ViewId, Marker>,
    pub view_selections: BTreeMap<ViewId, ViewSelectionState>,
    pub view_graphic_selections: BTreeMap<ViewId, Marker>,
    pub view_cell_cursors: BTreeMap<ViewId, Marker>,
    pub roster: BTreeMap<ViewId, ViewInfo>,

    /// Remote markers are hidden while a zoom animation runs.
    pub suppressed: bool,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self {
            cursor: Marker::default(),
            kernel_cursor_visible: true,
            focused: true,
            modal_open: false,
            text_selection: Vec::new(),
            selection_start: None,
            selection_end: None,
            graphic_selection: None,
            cell_cursor: None,
            cell_selection_area: None,
            reference_marks: Vec::new(),
            search_hits: Vec::new(),
            view_cursors: BTreeMap::new(),
            view_selections: BTreeMap::new(),
            view_graphic_selections: BTreeMap::new(),
            view_cell_cursors: BTreeMap::new(),
            roster: BTreeMap::new(),
            suppressed: false,
        }
    }
}

impl OverlayState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The own cursor is drawn only when the kernel says visible, the surface
    /// has focus, no modal dialog is open and the view may edit.
    #[must_use]
    pub fn own_cursor_drawn(&self, edit: bool) -> bool {
        edit && self.kernel_cursor_visible
            && self.focused
            && !self.modal_open
            && self.cursor.state == Visibility::Visible
    }

    // --- Roster ---

    #[must_use]
    pub fn knows_view(&self, view: ViewId) -> bool {
        self.roster.contains_key(&view)
    }

    /// Replace the roster. Returns the views that joined and the ids that
    /// left; departed views lose every marker.
    pub fn apply_roster(&mut self, views: Vec<ViewInfo>) -> (Vec<ViewInfo>, Vec<ViewId>) {
        let next: BTreeMap<ViewId, ViewInfo> = views.into_iter().map(|info| (info.id, info)).collect();
        let added = next.values().filter(|info| !self.roster.contains_key(&info.id)).cloned().collect();
        let removed: Vec<ViewId> = self.roster.keys().filter(|id| !next.contains_key(id)).copied().collect();
        for view in &removed {
            self.remove_view(*view);
        }
        self.roster = next;
        (added, removed)
    }

    pub fn remove_view(&mut self, view: ViewId) {
        self.view_cursors.remove(&view);
        self.view_selections.remove(&view);
        self.view_graphic_selections.remove(&view);
        self.view_cell_cursors.remove(&view);
        self.roster.remove(&view);
    }

    // --- Remote markers ---

    pub fn update_view_cursor(&mut self, view: ViewId, rect: Rect, part: i32) -> Visibility {
        self.view_cursors.entry(view).or_default().update(rect, part)
    }

    pub fn set_view_cursor_shown(&mut self, view: ViewId, shown: bool) {
        self.view_cursors.entry(view).or_default().shown = shown;
    }

    pub fn update_view_selection(&mut self, view: ViewId, rects: Vec<Rect>, part: i32) {
        if rects.is_empty() {
            self.view_selections.remove(&view);
        } else {
            self.view_selections.insert(view, ViewSelectionState { rects, part });
        }
    }

    pub fn update_view_graphic_selection(&mut self, view: ViewId, rect: Rect, part: i32) -> Visibility {
        self.view_graphic_selections.entry(view).or_default().update(rect, part)
    }

    pub fn update_view_cell_cursor(&mut self, view: ViewId, rect: Rect, part: i32) -> Visibility {
        self.view_cell_cursors.entry(view).or_default().update(rect, part)
    }

    // --- Geometry ---

    /// Overlay rectangles for `part` under `transform`.
    #[must_use]
    pub fn shapes(&self, transform: &Transform, part: i32, edit: bool) -> Vec<OverlayShape> {
        let mut shapes = Vec::new();
        let mut push = |kind: OverlayKind, rect: &Rect| {
            shapes.push(OverlayShape { kind, rect: transform.twips_rect_to_core(rect) });
        };

        if self.own_cursor_drawn(edit) {
            push(OverlayKind::OwnCursor, &self.cursor.bounds);
        }
        for rect in &self.text_selection {
            push(OverlayKind::TextSelection, rect);
        }
        if !self.text_selection.is_empty() {
            if let Some(rect) = &self.selection_start {
                push(OverlayKind::SelectionStart, rect);
            }
            if let Some(rect) = &self.selection_end {
                push(OverlayKind::SelectionEnd, rect);
            }
        }
        if let Some(selection) = &self.graphic_selection {
            push(OverlayKind::GraphicSelection, &selection.rect);
        }
        if let Some(rect) = &self.cell_cursor {
            push(OverlayKind::CellCursor, rect);
        }
        if let Some(rect) = &self.cell_selection_area {
            push(OverlayKind::CellSelection, rect);
        }
        for mark in self.reference_marks.iter().filter(|m| m.part == part) {
            push(OverlayKind::ReferenceMark, &mark.rect);
        }
        for hit in self.search_hits.iter().filter(|h| h.part == part) {
            for rect in &hit.rects {
                push(OverlayKind::SearchHit, rect);
            }
        }

        if self.suppressed {
            return shapes;
        }
        for (view, marker) in &self.view_cursors {
            if marker.is_drawn() && marker.part == part {
                push(OverlayKind::ViewCursor(*view), &marker.bounds);
            }
        }
        for (view, selection) in &self.view_selections {
            if selection.part == part {
                for rect in &selection.rects {
                    push(OverlayKind::ViewSelection(*view), rect);
                }
            }
        }
        for (view, marker) in &self.view_graphic_selections {
            if marker.is_drawn() && marker.part == part {
                push(OverlayKind::ViewGraphicSelection(*view), &marker.bounds);
            }
        }
        for (view, marker) in &self.view_cell_cursors {
            if marker.is_drawn() && marker.part == part {
                push(OverlayKind::ViewCellCursor(*view), &marker.bounds);
            }
        }
        shapes
    }
}
