use super::*;
use crate::config::EngineConfig;

fn roster(json: &str) -> Inbound {
    Inbound::new("viewinfo", json)
}

#[test]
fn joining_views_are_announced() {
    let mut state = EngineState::new(EngineConfig::default());
    let effects = on_view_info(
        &mut state,
        &roster(r#"[{"id":0,"userid":"a","username":"Ada","color":255,"readonly":"false"}]"#),
    )
    .expect("handled");
    assert_eq!(
        effects,
        vec![
            Effect::Emit(Event::ViewAdded { view_id: 0, user_name: "Ada".into(), color: 255, read_only: false }),
            Effect::DrawOverlays,
        ]
    );
    assert!(state.overlay.knows_view(0));
}

#[test]
fn departing_view_loses_markers_and_replay_slots() {
    let mut state = EngineState::new(EngineConfig::default());
    on_view_info(&mut state, &roster(r#"[{"id":0},{"id":2}]"#)).expect("join");
    state.overlay.update_view_cursor(2, wire::Rect::new(0, 0, 0, 100), 0);
    state.replay.save(&Inbound::new("invalidateviewcursor", r#"{"viewId":2,"rectangle":"0, 0, 0, 100"}"#), Some(2));

    let effects = on_view_info(&mut state, &roster(r#"[{"id":0}]"#)).expect("leave");
    assert_eq!(effects, vec![Effect::Emit(Event::ViewRemoved { view_id: 2 }), Effect::DrawOverlays]);
    assert!(state.overlay.view_cursors.is_empty());
    assert!(!state.replay.has_view(2));
}

#[test]
fn early_updates_are_replayed_when_view_joins() {
    let mut state = EngineState::new(EngineConfig::default());
    state.replay.save(&Inbound::new("textviewselection", r#"{"viewId":5,"selection":"1, 1, 1, 1"}"#), Some(5));

    let effects = on_view_info(&mut state, &roster(r#"[{"id":5,"username":"Bo"}]"#)).expect("join");
    assert_eq!(effects[0], Effect::Schedule(Task::ReplayView(5)));
}

#[test]
fn malformed_roster_is_a_parse_error() {
    let mut state = EngineState::new(EngineConfig::default());
    assert!(matches!(on_view_info(&mut state, &roster("{}")), Err(HandlerError::Parse(_))));
}
