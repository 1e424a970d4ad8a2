//! Inbound message dispatch.
//!
//! DESIGN
//! ======
//! A table maps each message type tag to a plain handler function. Handlers
//! take the owned [`EngineState`] by `&mut`, parse their payload and return
//! [`Effect`]s. They never draw, never send and never re-enter the table;
//! follow-up work comes back as `Effect::Schedule` and runs after the turn.
//!
//! REPLAY
//! ======
//! Own-view types registered with the replay store are saved here once their
//! handler accepts them, so a malformed update never displaces a good one.
//! Remote-view types are saved by their handlers once the view id is known.
//!
//! ERRORS
//! ======
//! Nothing propagates out of [`Dispatcher::dispatch`]. Malformed payloads are
//! logged and dropped; updates for views missing from the roster are logged
//! at debug level and picked up again when the view joins.

pub mod cursor;
pub mod dialog;
pub mod selection;
pub mod status;
pub mod tiles;
pub mod views;

use std::collections::HashMap;

use tracing::{debug, trace, warn};
use wire::{Inbound, ParseError, ViewId};

use crate::effect::Effect;
use crate::state::EngineState;


/// Signature shared by every message handler.
pub type Handler = fn(&mut EngineState, &Inbound) -> Result<Vec<Effect>, HandlerError>;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Update for a view the roster does not list (yet).
    #[error("view {0} is not in the roster")]
    UnknownView(ViewId),
}

pub struct Dispatcher {
    table: HashMap<&'static str, Handler>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// A dispatcher with every built-in handler registered.
    #[must_use]
    pub fn new() -> Self {
        let mut dispatcher = Self { table: HashMap::new() };
        let builtin: [(&'static str, Handler); 30] = [
            ("tile", tiles::on_tile),
            ("invalidatetiles", tiles::on_invalidate_tiles),
            ("invalidatecursor", cursor::on_invalidate_cursor),
            ("cursorvisible", cursor::on_cursor_visible),
            ("invalidateviewcursor", cursor::on_view_cursor),
            ("viewcursorvisible", cursor::on_view_cursor_visible),
            ("textselection", selection::on_text_selection),
            ("textselectionstart", selection::on_selection_start),
            ("textselectionend", selection::on_selection_end),
            ("graphicselection", selection::on_graphic_selection),
            ("cellcursor", selection::on_cell_cursor),
            ("cellselectionarea", selection::on_cell_selection_area),
            ("referencemarks", selection::on_reference_marks),
            ("textviewselection", selection::on_view_selection),
            ("graphicviewselection", selection::on_view_graphic_selection),
            ("cellviewcursor", selection::on_view_cell_cursor),
            ("searchresultselection", selection::on_search_results),
            ("searchnotfound", selection::on_search_not_found),
            ("viewinfo", views::on_view_info),
            ("window", dialog::on_window),
            ("windowpaint", dialog::on_window_paint),
            ("error", status::on_error),
            ("status", status::on_status),
            ("statusupdate", status::on_status),
            ("setpart", status::on_set_part),
            ("invalidatesheetgeometry", status::on_sheet_geometry),
            ("statechanged", status::on_state_changed),
            ("commandvalues", status::on_state_changed),
            ("referenceclear", selection::on_reference_clear),
            ("perm", status::on_permission),
        ];
        for (kind, handler) in builtin {
            dispatcher.register(kind, handler);
        }
        dispatcher
    }

    /// Install or replace the handler for `kind`.
    pub fn register(&mut self, kind: &'static str, handler: Handler) {
        self.table.insert(kind, handler);
    }

    #[must_use]
    pub fn handles(&self, kind: &str) -> bool {
        self.table.contains_key(kind)
    }

    /// Route one message. Unknown types are ignored.
    pub fn dispatch(&self, state: &mut EngineState, msg: &Inbound) -> Vec<Effect> {
        let Some(handler) = self.table.get(msg.kind.as_str()) else {
            trace!(kind = %msg.kind, "ignoring unhandled message type");
            return Vec::new();
        };
        match handler(state, msg) {
            Ok(effects) => {
                if state.replay.is_own_type(&msg.kind) {
                    state.replay.save(msg, None);
                }
                effects
            }
            Err(HandlerError::UnknownView(view)) => {
                debug!(kind = %msg.kind, view, "update for view not in roster, kept for replay");
                Vec::new()
            }
            Err(e) => {
                warn!(kind = %msg.kind, error = %e, message = %msg.raw(), "dropping malformed message");
                Vec::new()
            }
        }
    }
}

/// Bookkeeping shared by remote-view handlers: save `msg` for replay under
/// `view`, then check the roster. `Ok(false)` means the message concerns
/// this view and should be ignored.
pub(crate) fn remote_view(state: &mut EngineState, msg: &Inbound, view: ViewId) -> Result<bool, HandlerError> {
    if state.doc.own_view == Some(view) {
        return Ok(false);
    }
    state.replay.save(msg, Some(view));
    if state.overlay.knows_view(view) {
        Ok(true)
    } else {
        Err(HandlerError::UnknownView(view))
    }
}
