//! Document status, part switches, sheet geometry, permissions, state
//! echoes and errors.

use tracing::{debug, info, warn};
use wire::payload::{KernelError, SheetGeometryData, StateChange, Status};
use wire::{Inbound, Request};

use super::HandlerError;
use crate::effect::{Effect, Event, Task};
use crate::replay::DocKind;
use crate::sheet::SheetGeometry;
use crate::state::EngineState;

#[cfg(test)]
#[path = "status_test.rs"]
mod status_test;

/// `status:` and `statusupdate:`. Records document kind, size, parts and the
/// own view id, then refreshes the view.
pub fn on_status(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let status = Status::parse(&msg.tokens())?;
    let kind = DocKind::from_status(&status.doc_type);
    info!(
        kind = ?kind,
        parts = status.parts,
        current = status.current_part,
        width = status.width,
        height = status.height,
        "document status"
    );
    state.doc.kind = kind;
    state.replay.set_doc_kind(kind);
    state.doc.parts = status.parts.max(1);
    state.doc.width_twips = status.width;
    state.doc.height_twips = status.height;
    if status.view_id.is_some() {
        state.doc.own_view = status.view_id;
    }
    Ok(switch_part(state, status.current_part, true))
}

/// `setpart: part=N`.
pub fn on_set_part(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let part: i32 = msg.tokens().number("part")?;
    Ok(switch_part(state, part, false))
}

/// `invalidatesheetgeometry: [columns] [rows] [all] ...`: row or column
/// sizes changed. Fetch them again; the reply re-projects stored positions.
pub fn on_sheet_geometry(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let words: Vec<&str> = msg.payload.split_whitespace().collect();
    let all = words.contains(&"all");
    let part = state.doc.current_part;
    state.sheet.get_or_insert_with(|| SheetGeometry::new(part));
    Ok(vec![Effect::Send(Request::SheetGeometry {
        columns: all || words.contains(&"columns"),
        rows: all || words.contains(&"rows"),
    })])
}

/// `perm: edit|readonly|view`.
pub fn on_permission(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let edit = msg.payload.trim() == "edit";
    if edit == state.doc.edit {
        return Ok(Vec::new());
    }
    state.doc.edit = edit;
    Ok(vec![Effect::Schedule(Task::RefreshView), Effect::DrawOverlays])
}

/// `statechanged:` and `commandvalues:`. A sheet geometry reply is stored
/// instead of echoed.
pub fn on_state_changed(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    if let Some(geometry) = SheetGeometryData::parse(msg)? {
        return Ok(apply_sheet_geometry(state, &geometry));
    }
    let change = StateChange::parse(msg)?;
    state.commands.insert(change.command.clone(), change.value.clone());
    Ok(vec![Effect::Emit(Event::StateChanged { command: change.command, value: change.value })])
}

pub fn on_error(_state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let error = KernelError::parse(&msg.tokens());
    warn!(cmd = %error.command, kind = %error.kind, code = ?error.code, "kernel reported error");
    Ok(vec![Effect::Emit(Event::KernelError { command: error.command, kind: error.kind, code: error.code })])
}

/// Merge a geometry reply into the current sheet. Anything that changed is
/// re-projected by replaying stored positions; a repeat of the same reply is
/// ignored.
fn apply_sheet_geometry(state: &mut EngineState, data: &SheetGeometryData) -> Vec<Effect> {
    let part = state.doc.current_part;
    let sheet = state.sheet.get_or_insert_with(|| SheetGeometry::new(part));
    let before = sheet.clone();
    sheet.update(data, part);
    if *sheet == before {
        debug!(part, "sheet geometry unchanged");
        return Vec::new();
    }
    info!(part, complete = sheet.is_complete(), "sheet geometry updated");
    vec![Effect::Schedule(Task::Replay { part_changed: false }), Effect::Schedule(Task::RefreshView)]
}

/// Move to `part`. A real change replays stored overlays without the old
/// part's graphic selection, and a spreadsheet asks for the new sheet's
/// geometry. `always_refresh` forces a refresh even when the part is
/// unchanged, for size updates.
fn switch_part(state: &mut EngineState, part: i32, always_refresh: bool) -> Vec<Effect> {
    let changed = part != state.doc.current_part;
    state.doc.current_part = part;
    let mut effects = Vec::new();
    if changed || always_refresh {
        effects.push(Effect::Schedule(Task::RefreshView));
    }
    if changed {
        info!(part, "switched part");
        effects.push(Effect::Schedule(Task::Replay { part_changed: true }));
    }
    effects.extend(state.request_sheet_geometry());
    effects
}
