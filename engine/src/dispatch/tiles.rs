//! `tile:` and `invalidatetiles:`.

use tracing::debug;
use wire::Inbound;
use wire::payload::{InvalidateTarget, Invalidation, TileHeader};

use super::HandlerError;
use crate::cache::ContentOutcome;
use crate::coords::zoom_for_tile_twips;
use crate::effect::{Effect, Event, Task};
use crate::state::EngineState;
use crate::tile::{Bitmap, TileCoord};

#[cfg(test)]
#[path = "tiles_test.rs"]
mod tiles_test;

/// Store arriving tile content. Every parsed tile is acknowledged, whether or
/// not the cache still wants it.
pub fn on_tile(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let header = TileHeader::parse(&msg.tokens())?;
    let zoom = zoom_for_tile_twips(header.tile_width);
    let coord = TileCoord::from_twips(header.pos_x, header.pos_y, header.tile_width, zoom, header.part);
    let bitmap = msg.attachment.as_deref().map(Bitmap::from);

    let mut effects = vec![Effect::Ack(header.wire_id)];
    match state.cache.on_tile_content(coord, header.wire_id, bitmap, state.now_ms) {
        ContentOutcome::Stale => {
            debug!(tile = %coord.key(), wid = header.wire_id, "tile no longer cached, ignoring");
        }
        ContentOutcome::Duplicate => {
            debug!(tile = %coord.key(), wid = header.wire_id, "duplicate tile");
        }
        ContentOutcome::NeedsKeyframe => {
            debug!(tile = %coord.key(), "unchanged reply without pixels, re-fetching");
            effects.push(Effect::Schedule(Task::RequestKeyframes));
        }
        ContentOutcome::Applied { visible } => {
            if visible {
                effects.push(Effect::Paint(coord));
            }
            effects.push(Effect::Emit(Event::TileReady { coord }));
            if state.cache.take_all_loaded() {
                effects.push(Effect::Emit(Event::AllTilesLoaded));
            }
        }
    }
    Ok(effects)
}

/// Mark tiles stale. Nothing is fetched here; a refresh of the current part
/// re-requests whatever is visible.
pub fn on_invalidate_tiles(state: &mut EngineState, msg: &Inbound) -> Result<Vec<Effect>, HandlerError> {
    let invalidation = Invalidation::parse(&msg.payload)?;
    let part = invalidation.part.unwrap_or(state.doc.current_part);
    let area = match invalidation.target {
        InvalidateTarget::Everything => None,
        InvalidateTarget::Area(rect) => Some(rect),
    };
    let touched = state.cache.invalidate(area.as_ref(), part);
    debug!(part, touched, wid = ?invalidation.wire_id, "tiles invalidated");

    if part != state.doc.current_part {
        return Ok(Vec::new());
    }
    let mut effects = Vec::new();
    let dirty = match area {
        Some(rect) => Some(state.transform().twips_rect_to_core(&rect)),
        None => state.viewport(),
    };
    if let Some(rect) = dirty {
        effects.push(Effect::Invalidate(rect));
    }
    effects.push(Effect::Schedule(Task::RefreshView));
    Ok(effects)
}
