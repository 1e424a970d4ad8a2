use super::*;
use crate::config::EngineConfig;
use wire::Rect;
use wire::payload::ViewInfo;

fn state_with_views(views: &[i32]) -> EngineState {
    let mut state = EngineState::new(EngineConfig::default());
    state.doc.own_view = Some(0);
    state.overlay.apply_roster(
        views
            .iter()
            .map(|id| ViewInfo {
                id: *id,
                user_id: format!("u{id}"),
                user_name: format!("User {id}"),
                color: 0,
                read_only: false,
            })
            .collect(),
    );
    state
}

// =============================================================================
// Own cursor
// =============================================================================

#[test]
fn zero_rectangle_hides_and_next_rectangle_shows() {
    let mut state = state_with_views(&[0]);
    let hidden = on_invalidate_cursor(&mut state, &Inbound::new("invalidatecursor", "0, 0, 0, 0")).expect("handled");
    assert_eq!(hidden[0], Effect::Emit(Event::CursorChanged { visible: false, rect: Rect::default() }));
    assert_eq!(state.overlay.cursor.state, Visibility::Hidden);

    let msg = Inbound::new("invalidatecursor", r#"{"viewId":"0","rectangle":"100, 200, 0, 300"}"#);
    let shown = on_invalidate_cursor(&mut state, &msg).expect("handled");
    let rect = Rect::new(100, 200, 0, 300);
    assert_eq!(shown[0], Effect::Emit(Event::CursorChanged { visible: true, rect }));
    assert_eq!(state.overlay.cursor.state, Visibility::Visible);
    assert_eq!(state.overlay.cursor.bounds, rect);
}

#[test]
fn cursor_visible_flag_follows_kernel() {
    let mut state = state_with_views(&[0]);
    on_cursor_visible(&mut state, &Inbound::new("cursorvisible", "false")).expect("handled");
    assert!(!state.overlay.kernel_cursor_visible);
    on_cursor_visible(&mut state, &Inbound::new("cursorvisible", "true")).expect("handled");
    assert!(state.overlay.kernel_cursor_visible);
}

// =============================================================================
// Remote cursors
// =============================================================================

#[test]
fn remote_cursor_updates_marker_and_replay() {
    let mut state = state_with_views(&[0, 4]);
    let msg = Inbound::new("invalidateviewcursor", r#"{"viewId":4,"rectangle":"10, 10, 0, 200","part":"0"}"#);
    assert_eq!(on_view_cursor(&mut state, &msg).expect("handled"), vec![Effect::DrawOverlays]);
    assert!(state.overlay.view_cursors[&4].is_drawn());
    assert_eq!(state.replay.replay_view(4), vec![msg]);
}

#[test]
fn remote_cursor_for_unknown_view_is_kept_for_replay() {
    let mut state = state_with_views(&[0]);
    let msg = Inbound::new("invalidateviewcursor", r#"{"viewId":7,"rectangle":"10, 10, 0, 200"}"#);
    assert!(matches!(on_view_cursor(&mut state, &msg), Err(HandlerError::UnknownView(7))));
    assert!(state.overlay.view_cursors.is_empty());
    assert!(state.replay.has_view(7));
}

#[test]
fn own_view_id_in_remote_message_is_ignored() {
    let mut state = state_with_views(&[0]);
    let msg = Inbound::new("invalidateviewcursor", r#"{"viewId":0,"rectangle":"10, 10, 0, 200"}"#);
    assert!(on_view_cursor(&mut state, &msg).expect("handled").is_empty());
    assert!(state.replay.is_empty());
}

#[test]
fn view_cursor_visibility_toggles_drawing() {
    let mut state = state_with_views(&[0, 4]);
    let msg = Inbound::new("invalidateviewcursor", r#"{"viewId":4,"rectangle":"10, 10, 0, 200"}"#);
    on_view_cursor(&mut state, &msg).expect("handled");

    on_view_cursor_visible(&mut state, &Inbound::new("viewcursorvisible", r#"{"viewId":4,"visible":"false"}"#))
        .expect("handled");
    assert!(!state.overlay.view_cursors[&4].is_drawn());
}

#[test]
fn malformed_remote_cursor_is_a_parse_error() {
    let mut state = state_with_views(&[0, 4]);
    let msg = Inbound::new("invalidateviewcursor", "{not json");
    assert!(matches!(on_view_cursor(&mut state, &msg), Err(HandlerError::Parse(_))));
}
