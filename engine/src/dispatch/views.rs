//! `viewinfo:` roster updates.

use tracing::info;
use wire::Inbound;
use wire::payload::ViewInfo;

use super::HandlerError;
use crate::effect::{Effect, Event, Task};
use crate::state::EngineState;

#[cfg(test)]
#[path = "views_test.rs"]
mod views_test;

/// Replace the roster. Joining views with stored updates get them replayed;
/// departed views lose their markers and replay slots.
pub fn on_view_info(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let roster: Vec<ViewInfo> = msg.json()?;
    let (added, removed) = state.overlay.apply_roster(roster);

    let mut effects = Vec::new();
    for view in added {
        info!(view = view.id, user = %view.user_name, "view joined");
        if state.replay.has_view(view.id) {
            effects.push(Effect::Schedule(Task::ReplayView(view.id)));
        }
        effects.push(Effect::Emit(Event::ViewAdded {
            view_id: view.id,
            user_name: view.user_name,
            color: view.color,
            read_only: view.read_only,
        }));
    }
    for view_id in removed {
        info!(view = view_id, "view left");
        state.replay.remove_view(view_id);
        effects.push(Effect::Emit(Event::ViewRemoved { view_id }));
    }
    effects.push(Effect::DrawOverlays);
    Ok(effects)
}
