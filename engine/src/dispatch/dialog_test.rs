use super::*;
use crate::config::EngineConfig;

fn window(id: u64, action: &str) -> Inbound {
    Inbound::new("window", &format!(r#"{{"id":"{id}","action":"{action}"}}"#))
}

#[test]
fn open_dialog_is_modal_until_closed() {
    let mut state = EngineState::new(EngineConfig::default());
    let effects = on_window(&mut state, &window(7, "created")).expect("created");
    assert_eq!(effects, vec![Effect::Emit(Event::DialogOpened { id: 7 }), Effect::DrawOverlays]);
    assert!(state.overlay.modal_open);

    on_window(&mut state, &window(8, "created")).expect("second");
    on_window(&mut state, &window(7, "close")).expect("close first");
    assert!(state.overlay.modal_open);

    let effects = on_window(&mut state, &window(8, "close")).expect("close second");
    assert_eq!(effects[0], Effect::Emit(Event::DialogClosed { id: 8 }));
    assert!(!state.overlay.modal_open);
}

#[test]
fn repeated_or_unknown_actions_do_nothing() {
    let mut state = EngineState::new(EngineConfig::default());
    on_window(&mut state, &window(1, "created")).expect("created");
    assert!(on_window(&mut state, &window(1, "created")).expect("again").is_empty());
    assert!(on_window(&mut state, &window(1, "invalidate")).expect("invalidate").is_empty());
    assert!(on_window(&mut state, &window(2, "close")).expect("unknown close").is_empty());
}

#[test]
fn window_paint_forwards_pixels() {
    let mut state = EngineState::new(EngineConfig::default());
    let msg = Inbound::parse_binary(b"windowpaint: id=3 width=10 height=10\nPIXELS").expect("frame");
    let effects = on_window_paint(&mut state, &msg).expect("handled");
    assert_eq!(effects, vec![Effect::PaintDialog { id: 3, bitmap: Bitmap::from(&b"PIXELS"[..]) }]);
}

#[test]
fn window_paint_without_pixels_is_ignored() {
    let mut state = EngineState::new(EngineConfig::default());
    let msg = Inbound::new("windowpaint", "id=3");
    assert!(on_window_paint(&mut state, &msg).expect("handled").is_empty());
}
