//! Dialog windows: `window:` lifecycle and `windowpaint:` pixels.
//!
//! An open dialog is modal for the document: the own cursor is hidden until
//! every dialog has closed.

use tracing::{debug, trace};
use wire::Inbound;
use wire::payload::{WindowAction, WindowPaint};

use super::HandlerError;
use crate::effect::{Effect, Event};
use crate::state::EngineState;
use crate::tile::Bitmap;

#[cfg(test)]
#[path = "dialog_test.rs"]
mod dialog_test;

pub fn on_window(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let window: WindowAction = msg.json()?;
    let event = match window.action.as_str() {
        "created" => {
            if !state.dialogs.insert(window.id) {
                return Ok(Vec::new());
            }
            Event::DialogOpened { id: window.id }
        }
        "close" => {
            if !state.dialogs.remove(&window.id) {
                return Ok(Vec::new());
            }
            Event::DialogClosed { id: window.id }
        }
        action => {
            trace!(id = window.id, action, "window action");
            return Ok(Vec::new());
        }
    };
    state.overlay.modal_open = !state.dialogs.is_empty();
    Ok(vec![Effect::Emit(event), Effect::DrawOverlays])
}

pub fn on_window_paint(_state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let paint = WindowPaint::parse(&msg.tokens())?;
    let Some(pixels) = msg.attachment.as_deref() else {
        debug!(id = paint.id, "windowpaint without pixels");
        return Ok(Vec::new());
    };
    trace!(id = paint.id, width = paint.width, height = paint.height, bytes = pixels.len(), "dialog paint");
    Ok(vec![Effect::PaintDialog { id: paint.id, bitmap: Bitmap::from(pixels) }])
}
