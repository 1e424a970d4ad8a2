use super::*;
use crate::config::EngineConfig;
use crate::sheet::SheetGeometry;
use wire::payload::{DimensionData, SheetGeometryData, SizeSpan, ViewInfo};

fn state_with_view(id: i32) -> EngineState {
    let mut state = EngineState::new(EngineConfig::default());
    state.overlay.apply_roster(vec![ViewInfo {
        id,
        user_id: String::new(),
        user_name: "Remote".into(),
        color: 0xff_0000,
        read_only: false,
    }]);
    state
}

// =============================================================================
// Own selections
// =============================================================================

#[test]
fn text_selection_stores_rectangles() {
    let mut state = state_with_view(3);
    let msg = Inbound::new("textselection", "0, 0, 100, 20; 0, 20, 50, 20");
    let effects = on_text_selection(&mut state, &msg).expect("handled");
    let rects = vec![Rect::new(0, 0, 100, 20), Rect::new(0, 20, 50, 20)];
    assert_eq!(effects[0], Effect::Emit(Event::SelectionChanged { view_id: None, rects: rects.clone() }));
    assert_eq!(state.overlay.text_selection, rects);
}

#[test]
fn empty_text_selection_clears_handles() {
    let mut state = state_with_view(3);
    on_selection_start(&mut state, &Inbound::new("textselectionstart", "0, 0, 10, 20")).expect("start");
    on_selection_end(&mut state, &Inbound::new("textselectionend", "90, 0, 10, 20")).expect("end");
    on_text_selection(&mut state, &Inbound::new("textselection", "")).expect("clear");

    assert!(state.overlay.text_selection.is_empty());
    assert_eq!(state.overlay.selection_start, None);
    assert_eq!(state.overlay.selection_end, None);
}

#[test]
fn graphic_selection_keeps_angle_and_clears_on_empty() {
    let mut state = state_with_view(3);
    on_graphic_selection(&mut state, &Inbound::new("graphicselection", "10, 20, 30, 40, 9000")).expect("set");
    let selection = state.overlay.graphic_selection.expect("selection");
    assert_eq!(selection.rect, Rect::new(10, 20, 30, 40));
    assert_eq!(selection.angle, Some(9000));

    on_graphic_selection(&mut state, &Inbound::new("graphicselection", "EMPTY")).expect("clear");
    assert!(state.overlay.graphic_selection.is_none());
}

#[test]
fn cell_cursor_empty_clears() {
    let mut state = state_with_view(3);
    on_cell_cursor(&mut state, &Inbound::new("cellcursor", "0, 0, 1280, 256")).expect("set");
    assert_eq!(state.overlay.cell_cursor, Some(Rect::new(0, 0, 1280, 256)));
    on_cell_cursor(&mut state, &Inbound::new("cellcursor", "EMPTY")).expect("clear");
    assert_eq!(state.overlay.cell_cursor, None);
}

#[test]
fn reference_marks_replace_and_clear() {
    let mut state = state_with_view(3);
    let msg = Inbound::new("referencemarks", r#"{"marks":[{"rectangle":"0, 0, 10, 10","part":"1"}]}"#);
    on_reference_marks(&mut state, &msg).expect("marks");
    assert_eq!(state.overlay.reference_marks.len(), 1);
    on_reference_clear(&mut state, &Inbound::new("referenceclear", "")).expect("clear");
    assert!(state.overlay.reference_marks.is_empty());
}

#[test]
fn malformed_rectangle_is_a_parse_error() {
    let mut state = state_with_view(3);
    let msg = Inbound::new("textselection", "0, 0, x, 20");
    assert!(matches!(on_text_selection(&mut state, &msg), Err(HandlerError::Parse(_))));
}

// =============================================================================
// Remote selections
// =============================================================================

#[test]
fn remote_selection_is_stored_per_view() {
    let mut state = state_with_view(3);
    let msg = Inbound::new("textviewselection", r#"{"viewId":"3","part":"0","selection":"5, 5, 10, 10"}"#);
    let effects = on_view_selection(&mut state, &msg).expect("handled");
    assert_eq!(
        effects[0],
        Effect::Emit(Event::SelectionChanged { view_id: Some(3), rects: vec![Rect::new(5, 5, 10, 10)] })
    );
    assert_eq!(state.overlay.view_selections[&3].rects.len(), 1);
    assert!(state.replay.has_view(3));
}

#[test]
fn empty_remote_selection_removes_it() {
    let mut state = state_with_view(3);
    on_view_selection(&mut state, &Inbound::new("textviewselection", r#"{"viewId":3,"selection":"1, 1, 1, 1"}"#))
        .expect("set");
    on_view_selection(&mut state, &Inbound::new("textviewselection", r#"{"viewId":3,"selection":""}"#))
        .expect("clear");
    assert!(state.overlay.view_selections.is_empty());
}

#[test]
fn remote_graphic_selection_and_cell_cursor() {
    let mut state = state_with_view(3);
    state.replay.set_doc_kind(crate::replay::DocKind::Spreadsheet);

    let graphic = Inbound::new("graphicviewselection", r#"{"viewId":3,"part":0,"selection":"1, 2, 3, 4"}"#);
    on_view_graphic_selection(&mut state, &graphic).expect("graphic");
    assert!(state.overlay.view_graphic_selections[&3].is_drawn());

    let cell = Inbound::new("cellviewcursor", r#"{"viewId":3,"part":0,"rectangle":"0, 0, 1280, 256"}"#);
    on_view_cell_cursor(&mut state, &cell).expect("cell");
    assert_eq!(state.overlay.view_cell_cursors[&3].bounds, Rect::new(0, 0, 1280, 256));
    assert_eq!(state.replay.replay_view(3).len(), 2);
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn search_results_replace_highlights() {
    let mut state = state_with_view(3);
    let msg = Inbound::new(
        "searchresultselection",
        r#"{"searchString":"foo","highlightAll":"true","searchResultSelection":[{"part":"0","rectangles":"1, 1, 5, 5; 10, 1, 5, 5"}]}"#,
    );
    let effects = on_search_results(&mut state, &msg).expect("handled");
    assert_eq!(effects[0], Effect::Emit(Event::SearchResults { search_string: "foo".into(), count: 2, highlight_all: true }));
    assert_eq!(state.overlay.search_hits.len(), 1);

    let effects = on_search_not_found(&mut state, &Inbound::new("searchnotfound", "foo")).expect("handled");
    assert_eq!(effects[0], Effect::Emit(Event::SearchResults { search_string: "foo".into(), count: 0, highlight_all: false }));
    assert!(state.overlay.search_hits.is_empty());
}

// =============================================================================
// Spreadsheet cells
// =============================================================================

/// A sheet of 1280x256 twip cells with known geometry.
fn sheet_state() -> EngineState {
    let mut state = state_with_view(3);
    state.doc.kind = crate::replay::DocKind::Spreadsheet;
    let axis = |size, last| DimensionData { sizes: Some(vec![SizeSpan { size, last }]), ..DimensionData::default() };
    let mut sheet = SheetGeometry::new(0);
    sheet.update(
        &SheetGeometryData { columns: Some(axis(1280, 1023)), rows: Some(axis(256, 1_048_575)), ..SheetGeometryData::default() },
        0,
    );
    state.sheet = Some(sheet);
    state
}

#[test]
fn cell_ranges_are_projected_onto_tile_twips() {
    let mut state = sheet_state();
    on_cell_cursor(&mut state, &Inbound::new("cellcursor", "1280, 256, 1279, 255")).expect("cursor");
    on_text_selection(&mut state, &Inbound::new("textselection", "0, 0, 2559, 511")).expect("selection");

    assert_eq!(state.overlay.cell_cursor, Some(Rect::new(1275, 255, 1275, 255)));
    assert_eq!(state.overlay.text_selection, vec![Rect::new(0, 0, 2550, 510)]);
}

#[test]
fn in_cell_selection_is_offset_from_its_anchor() {
    let mut state = sheet_state();
    let msg = Inbound::new("textselection", "10, 20, 30, 40; 50, 20, 10, 40::1280, 256");
    on_text_selection(&mut state, &msg).expect("selection");
    assert_eq!(state.overlay.text_selection, vec![Rect::new(1285, 275, 30, 40), Rect::new(1325, 275, 10, 40)]);
}

#[test]
fn text_documents_keep_kernel_twips() {
    let mut state = state_with_view(3);
    on_cell_cursor(&mut state, &Inbound::new("cellcursor", "1280, 256, 1279, 255")).expect("cursor");
    assert_eq!(state.overlay.cell_cursor, Some(Rect::new(1280, 256, 1279, 255)));
}
