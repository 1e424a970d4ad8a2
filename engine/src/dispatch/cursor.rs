//! Own and remote cursor positions.

use wire::Inbound;
use wire::payload::{CursorUpdate, ViewCursor, ViewVisibility};

use super::{HandlerError, remote_view};
use crate::effect::{Effect, Event};
use crate::overlay::Visibility;
use crate::state::EngineState;

#[cfg(test)]
#[path = "cursor_test.rs"]
mod cursor_test;

/// Own cursor. A spreadsheet in-cell cursor is placed against its projected
/// cell anchor when the sheet geometry is known.
pub fn on_invalidate_cursor(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let update = CursorUpdate::parse(msg)?;
    let anchored = update
        .anchored
        .and_then(|anchored| Some((anchored.rect, state.sheet_point(anchored.anchor.0, anchored.anchor.1)?)));
    let rect = match anchored {
        Some((rect, (x, y))) => rect.translate(x, y),
        None => update.rect,
    };
    let visibility = state.overlay.cursor.update(rect, state.doc.current_part);
    Ok(vec![
        Effect::Emit(Event::CursorChanged { visible: visibility == Visibility::Visible, rect }),
        Effect::DrawOverlays,
    ])
}

/// `cursorvisible: true|false`.
pub fn on_cursor_visible(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    state.overlay.kernel_cursor_visible = msg.payload.trim() == "true";
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_view_cursor(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let cursor = ViewCursor::parse(msg)?;
    if !remote_view(state, msg, cursor.view_id)? {
        return Ok(Vec::new());
    }
    state.overlay.update_view_cursor(cursor.view_id, cursor.rect, cursor.part);
    Ok(vec![Effect::DrawOverlays])
}

pub fn on_view_cursor_visible(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let flag: ViewVisibility = msg.json()?;
    if state.doc.own_view == Some(flag.view_id) {
        return Ok(Vec::new());
    }
    if !state.overlay.knows_view(flag.view_id) {
        return Err(HandlerError::UnknownView(flag.view_id));
    }
    state.overlay.set_view_cursor_shown(flag.view_id, flag.visible);
    Ok(vec![Effect::DrawOverlays])
}
