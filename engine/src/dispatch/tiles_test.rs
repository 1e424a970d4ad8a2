use super::*;
use crate::config::EngineConfig;
use crate::coords::{Pane, PixelRect};

fn viewing_state(width: f64, height: f64) -> EngineState {
    let mut state = EngineState::new(EngineConfig::default());
    state.view.panes = vec![Pane::new(PixelRect::new(0.0, 0.0, width, height))];
    state.now_ms = 500;
    state.refresh_view();
    state
}

fn tile_msg(x: i64, y: i64, twips: i64, wid: u64, pixels: &[u8]) -> Inbound {
    let mut frame = format!(
        "tile: nviewid=0 part=0 width=256 height=256 tileposx={x} tileposy={y} \
         tilewidth={twips} tileheight={twips} wid={wid}\n"
    )
    .into_bytes();
    frame.extend_from_slice(pixels);
    Inbound::parse_binary(&frame).expect("frame")
}

// =============================================================================
// tile:
// =============================================================================

#[test]
fn requested_tile_paints_and_reports_loaded() {
    let mut state = viewing_state(100.0, 100.0);
    let effects = on_tile(&mut state, &tile_msg(0, 0, 3840, 5, b"png")).expect("handled");
    let coord = TileCoord::from_cell(0, 0, 10, 0);
    assert_eq!(
        effects,
        vec![
            Effect::Ack(5),
            Effect::Paint(coord),
            Effect::Emit(Event::TileReady { coord }),
            Effect::Emit(Event::AllTilesLoaded),
        ]
    );
    assert_eq!(state.cache.bitmap(&coord).map(|b| b.len()), Some(3));
}

#[test]
fn unknown_tile_is_only_acknowledged() {
    let mut state = viewing_state(100.0, 100.0);
    let effects = on_tile(&mut state, &tile_msg(38_400, 0, 3840, 9, b"png")).expect("handled");
    assert_eq!(effects, vec![Effect::Ack(9)]);
    assert!(state.cache.get(&TileCoord::from_cell(10, 0, 10, 0)).is_none());
}

#[test]
fn duplicate_tile_is_only_acknowledged() {
    let mut state = viewing_state(100.0, 100.0);
    on_tile(&mut state, &tile_msg(0, 0, 3840, 5, b"png")).expect("first");
    let effects = on_tile(&mut state, &tile_msg(0, 0, 3840, 5, b"png")).expect("second");
    assert_eq!(effects, vec![Effect::Ack(5)]);
}

#[test]
fn unchanged_tile_without_pixels_schedules_keyframe() {
    let mut state = viewing_state(100.0, 100.0);
    let effects = on_tile(&mut state, &tile_msg(0, 0, 3840, 5, b"")).expect("handled");
    assert_eq!(effects, vec![Effect::Ack(5), Effect::Schedule(Task::RequestKeyframes)]);
}

#[test]
fn zoom_is_recovered_from_tile_width() {
    let mut state = EngineState::new(EngineConfig::default());
    state.view.zoom = 11;
    state.view.panes = vec![Pane::new(PixelRect::new(0.0, 0.0, 100.0, 100.0))];
    state.refresh_view();

    let effects = on_tile(&mut state, &tile_msg(0, 0, 3200, 2, b"png")).expect("handled");
    assert!(effects.contains(&Effect::Paint(TileCoord::from_cell(0, 0, 11, 0))));
}

#[test]
fn tile_without_width_is_a_parse_error() {
    let mut state = viewing_state(100.0, 100.0);
    let msg = Inbound::new("tile", "part=0 tileposx=0 tileposy=0");
    assert!(matches!(on_tile(&mut state, &msg), Err(HandlerError::Parse(_))));
}

// =============================================================================
// invalidatetiles:
// =============================================================================

#[test]
fn area_invalidation_on_current_part_schedules_refresh() {
    let mut state = viewing_state(512.0, 512.0);
    let msg = Inbound::new("invalidatetiles", "part=0 x=0 y=0 width=100 height=100");
    let effects = on_invalidate_tiles(&mut state, &msg).expect("handled");

    assert!(matches!(effects[0], Effect::Invalidate(_)));
    assert_eq!(effects[1], Effect::Schedule(Task::RefreshView));
    let touched: Vec<_> = state.cache.tiles().filter(|t| t.invalid_count > 0).collect();
    assert_eq!(touched.len(), 1);
}

#[test]
fn invalidation_of_other_part_only_marks_tiles() {
    let mut state = viewing_state(512.0, 512.0);
    let msg = Inbound::new("invalidatetiles", "EMPTY, 3");
    assert!(on_invalidate_tiles(&mut state, &msg).expect("handled").is_empty());
}

#[test]
fn empty_invalidation_defaults_to_current_part() {
    let mut state = viewing_state(512.0, 512.0);
    let effects = on_invalidate_tiles(&mut state, &Inbound::new("invalidatetiles", "EMPTY")).expect("handled");
    assert_eq!(effects.last(), Some(&Effect::Schedule(Task::RefreshView)));
    assert!(state.cache.tiles().all(|t| t.invalid_count == 1));
}
