//! Own and remote selections, reference marks and search highlights.
//!
//! None of these touch the tile cache. Each stores twips geometry on the
//! overlay state and asks for an overlay redraw. Spreadsheet cell areas
//! arrive in print twips and are projected onto tile twips on the way in.

use wire::payload::{ReferenceMark, SearchResults, ViewCursor, ViewSelection};
use wire::rect::{GraphicSelection, parse_point};
use wire::{Inbound, Rect};

use super::{HandlerError, remote_view};
use crate::effect::{Effect, Event};
use crate::state::EngineState;

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

// =============================================================================
// OWN VIEW
// =============================================================================

/// `textselection:` with a rectangle list; empty clears the selection and
/// its handles.
pub fn on_text_selection(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let rects = selection_rects(state, &msg.payload)?;
    if rects.is_empty() {
        state.overlay.selection_start = None;
        state.overlay.selection_end = None;
    }
    state.overlay.text_selection.clone_from(&rects);
    Ok(vec![Effect::Emit(Event::SelectionChanged { view_id: None, rects }), Effect::DrawOverlays])
}

pub fn on_selection_start(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    state.overlay.selection_start = optional_rect(&msg.payload)?;
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_selection_end(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    state.overlay.selection_end = optional_rect(&msg.payload)?;
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_graphic_selection(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    state.overlay.graphic_selection = GraphicSelection::parse(&msg.payload)?;
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_cell_cursor(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    state.overlay.cell_cursor = optional_rect(&msg.payload)?.map(|rect| state.sheet_area(rect));
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_cell_selection_area(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    state.overlay.cell_selection_area = optional_rect(&msg.payload)?.map(|rect| state.sheet_area(rect));
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_reference_marks(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let marks = ReferenceMark::parse_all(msg)?;
    state.overlay.reference_marks = marks
        .into_iter()
        .map(|mark| ReferenceMark { rect: state.sheet_area(mark.rect), ..mark })
        .collect();
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_reference_clear(state: &mut EngineState, _msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    state.overlay.reference_marks.clear();
    Ok(vec![Effect::DrawOverlays])
}

// =============================================================================
// REMOTE VIEWS
// =============================================================================

pub fn on_view_selection(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let selection: ViewSelection = msg.json()?;
    let rects = selection_rects(state, &selection.selection)?;
    if !remote_view(state, msg, selection.view_id)? {
        return Ok(Vec::new());
    }
    state.overlay.update_view_selection(selection.view_id, rects.clone(), selection.part);
    Ok(vec![
        Effect::Emit(Event::SelectionChanged { view_id: Some(selection.view_id), rects }),
        Effect::DrawOverlays,
    ])
}

pub fn on_view_graphic_selection(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let selection: ViewSelection = msg.json()?;
    let rect = GraphicSelection::parse(&selection.selection)?.map(|graphic| graphic.rect).unwrap_or_default();
    if !remote_view(state, msg, selection.view_id)? {
        return Ok(Vec::new());
    }
    state.overlay.update_view_graphic_selection(selection.view_id, rect, selection.part);
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_view_cell_cursor(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let cursor = ViewCursor::parse(msg)?;
    if !remote_view(state, msg, cursor.view_id)? {
        return Ok(Vec::new());
    }
    let rect = if cursor.rect.is_empty() { cursor.rect } else { state.sheet_area(cursor.rect) };
    state.overlay.update_view_cell_cursor(cursor.view_id, rect, cursor.part);
    Ok(vec![Effect::DrawOverlays])
}

// =============================================================================
// SEARCH
// =============================================================================

/// Replace the highlight set with the new results.
pub fn on_search_results(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let results = SearchResults::parse(msg)?;
    let count = results.hits.iter().map(|hit| hit.rects.len()).sum();
    state.overlay.search_hits = results.hits;
    Ok(vec![
        Effect::Emit(Event::SearchResults {
            search_string: results.search_string,
            count,
            highlight_all: results.highlight_all,
        }),
        Effect::DrawOverlays,
    ])
}

pub fn on_search_not_found(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    state.overlay.search_hits.clear();
    Ok(vec![
        Effect::Emit(Event::SearchResults {
            search_string: msg.payload.trim().to_owned(),
            count: 0,
            highlight_all: false,
        }),
        Effect::DrawOverlays,
    ])
}

/// Rectangles of a text selection. Spreadsheets send cell ranges in print
/// twips, or in-cell rectangles against a cell anchor as `rects::x, y`.
fn selection_rects(state: &EngineState, payload: &str) -> Result<Vec<Rect>, HandlerError> {
    if let Some((rects, anchor)) = payload.split_once("::") {
        let (x, y) = parse_point(anchor)?;
        let (x, y) = state.sheet_point(x, y).unwrap_or((x, y));
        return Ok(Rect::parse_list(rects)?.iter().map(|rect| rect.translate(x, y)).collect());
    }
    Ok(Rect::parse_list(payload)?.into_iter().map(|rect| state.sheet_area(rect)).collect())
}

/// A rectangle, or `None` for `EMPTY`, blank or all-zero input.
fn optional_rect(payload: &str) -> Result<Option<Rect>, HandlerError> {
    let payload = payload.trim();
    if payload.is_empty() || payload.starts_with("EMPTY") {
        return Ok(None);
    }
    let rect = Rect::parse(payload)?;
    Ok((!rect.is_empty()).then_some(rect))
}
