//! The engine facade: owns the state, the handler table, the render surface
//! and the clock, and executes the effects handlers return.
//!
//! Every public entry point is one *turn*: read the clock, mutate state,
//! then drain effects. Scheduled tasks run after the turn's direct effects,
//! once per distinct task, and may queue further effects of their own.
//! Tile acknowledgements are batched into a single `tileprocessed` and
//! overlays are drawn at most once per turn.

use std::collections::VecDeque;

use tracing::{debug, info, warn};
use wire::Inbound;
use wire::request::Request;

use crate::cache::visible_ranges;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::coords::{Pane, Point, Transform, clamp_zoom, zoom_scale};
use crate::dispatch::Dispatcher;
use crate::effect::{Effect, Event, Task};
use crate::state::EngineState;
use crate::surface::RenderSurface;
use crate::zoom::{ZoomGesture, ZoomStep};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// What a turn produced for the host: requests to send, events for UI
/// collaborators, and whether another animation frame is wanted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    pub requests: Vec<Request>,
    pub events: Vec<Event>,
    pub wants_frame: bool,
}

pub struct Engine<S: RenderSurface> {
    state: EngineState,
    dispatcher: Dispatcher,
    surface: S,
    clock: Box<dyn Clock>,
}

impl<S: RenderSurface> Engine<S> {
    #[must_use]
    pub fn new(config: EngineConfig, surface: S, clock: Box<dyn Clock>) -> Self {
        Self { state: EngineState::new(config), dispatcher: Dispatcher::new(), surface, clock }
    }

    #[must_use]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Handler table, for registering extra message types.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    pub fn handle_text(&mut self, text: &str) -> Output {
        match Inbound::parse_text(text) {
            Ok(msg) => self.handle_message(&msg),
            Err(e) => {
                warn!(error = %e, "dropping unparseable text frame");
                Output::default()
            }
        }
    }

    pub fn handle_binary(&mut self, bytes: &[u8]) -> Output {
        match Inbound::parse_binary(bytes) {
            Ok(msg) => self.handle_message(&msg),
            Err(e) => {
                warn!(error = %e, len = bytes.len(), "dropping unparseable binary frame");
                Output::default()
            }
        }
    }

    pub fn handle_message(&mut self, msg: &Inbound) -> Output {
        self.begin_turn();
        let effects = self.dispatcher.dispatch(&mut self.state, msg);
        self.run_effects(effects)
    }

    // =========================================================================
    // VIEW
    // =========================================================================

    /// Replace the pane layout (scroll or resize).
    pub fn set_viewport(&mut self, panes: Vec<Pane>) -> Output {
        self.begin_turn();
        self.state.view.panes = panes;
        self.run_effects(vec![Effect::Schedule(Task::RefreshView)])
    }

    /// Jump to `zoom` without animation. Panes keep their pixel origin.
    pub fn set_zoom(&mut self, zoom: i32) -> Output {
        self.begin_turn();
        let zoom = clamp_zoom(zoom);
        if zoom == self.state.view.zoom || self.state.zoom.is_active() {
            return Output::default();
        }
        self.state.view.zoom = zoom;
        self.run_effects(vec![
            Effect::Schedule(Task::RefreshView),
            Effect::Schedule(Task::Replay { part_changed: false }),
        ])
    }

    pub fn set_focus(&mut self, focused: bool) -> Output {
        self.begin_turn();
        self.state.overlay.focused = focused;
        self.run_effects(vec![Effect::DrawOverlays])
    }

    /// Edit permission hides or shows the own cursor and changes how far the
    /// prefetcher reaches.
    pub fn set_edit_permission(&mut self, edit: bool) -> Output {
        self.begin_turn();
        self.state.doc.edit = edit;
        self.run_effects(vec![Effect::Schedule(Task::RefreshView), Effect::DrawOverlays])
    }

    /// The transport came back: forget replay entries and revisions, then
    /// announce the view and re-request what is visible.
    pub fn on_reconnect(&mut self) -> Output {
        self.begin_turn();
        info!(tiles = self.state.cache.len(), "resynchronizing after reconnect");
        self.state.replay.clear();
        self.state.sheet = None;
        self.state.cache.reset_revisions();
        self.state.view.forget_announcements();
        self.run_effects(vec![Effect::Schedule(Task::RefreshView)])
    }

    // =========================================================================
    // ZOOM
    // =========================================================================

    /// Start a zoom gesture toward `target`, anchored at `center` (core px).
    /// Target tiles are requested immediately.
    pub fn begin_zoom_gesture(&mut self, target: i32, center: Point) -> Output {
        self.begin_turn();
        let gesture = ZoomGesture { target: clamp_zoom(target), center };
        let mut effects = Vec::new();
        if self.state.zoom.begin(self.state.view.zoom, gesture) {
            effects.extend(self.start_zoom(gesture));
        } else {
            debug!(target = gesture.target, "zoom queued behind finishing animation");
        }
        effects.push(Effect::RequestFrame);
        self.run_effects(effects)
    }

    pub fn update_zoom_gesture(&mut self, scale: f64, center: Point) -> Output {
        self.begin_turn();
        self.state.zoom.update(scale, center);
        self.run_effects(vec![Effect::RequestFrame])
    }

    pub fn end_zoom_gesture(&mut self) -> Output {
        self.begin_turn();
        self.state.zoom.end();
        self.run_effects(vec![Effect::RequestFrame])
    }

    /// Animated zoom without a live gesture.
    pub fn zoom_to(&mut self, target: i32, center: Point) -> Output {
        let mut output = self.begin_zoom_gesture(target, center);
        let ended = self.end_zoom_gesture();
        output.requests.extend(ended.requests);
        output.events.extend(ended.events);
        output
    }

    /// Advance the zoom animation by one frame.
    pub fn frame(&mut self) -> Output {
        self.begin_turn();
        let ready = self.state.cache.all_ready_in(
            &self.state.visible_ranges(),
            self.state.view.zoom,
            self.state.doc.current_part,
        );
        let effects = match self.state.zoom.frame(ready) {
            ZoomStep::Idle => Vec::new(),
            ZoomStep::DrawScaled { scale, center } => vec![Effect::DrawScaled { scale, center }, Effect::RequestFrame],
            ZoomStep::Settle { zoom, center } => {
                let mut effects = self.settle_zoom(zoom, center);
                effects.push(Effect::RequestFrame);
                effects
            }
            ZoomStep::Waiting => vec![Effect::RequestFrame],
            ZoomStep::Finished { timed_out, next } => self.finish_zoom(timed_out, next),
        };
        self.run_effects(effects)
    }

    fn start_zoom(&mut self, gesture: ZoomGesture) -> Vec<Effect> {
        self.state.overlay.suppressed = true;
        self.state.cache.set_prune_suppressed(true);

        let factor = zoom_scale(self.state.view.zoom, gesture.target);
        let panes: Vec<Pane> = self
            .state
            .view
            .panes
            .iter()
            .map(|pane| pane.zoomed_about(gesture.center, factor))
            .collect();
        let transform = Transform::new(gesture.target, self.state.config.dpi_scale);
        let limit = transform.document_tiles(self.state.doc.width_twips, self.state.doc.height_twips);
        let ranges = visible_ranges(&panes, limit);
        let now = self.state.now_ms;
        let missing = self.state.cache.missing_in(&ranges, gesture.target, self.state.doc.current_part, now);
        debug!(target = gesture.target, tiles = missing.len(), "zoom started, fetching target tiles");
        self.state.cache.request_tiles(&missing, now).into_iter().map(Effect::Send).collect()
    }

    fn settle_zoom(&mut self, zoom: i32, center: Point) -> Vec<Effect> {
        let factor = zoom_scale(self.state.view.zoom, zoom);
        self.state.view.panes =
            self.state.view.panes.iter().map(|pane| pane.zoomed_about(center, factor)).collect();
        self.state.view.zoom = zoom;
        self.state.refresh_view()
    }

    fn finish_zoom(&mut self, timed_out: bool, next: Option<ZoomGesture>) -> Vec<Effect> {
        self.state.overlay.suppressed = false;
        self.state.cache.set_prune_suppressed(false);
        let evicted = self.state.cache.prune();
        debug!(zoom = self.state.view.zoom, evicted, timed_out, "zoom finished");

        let mut effects = self.state.repaint();
        effects.push(Effect::Schedule(Task::Replay { part_changed: false }));
        effects.push(Effect::DrawOverlays);
        if timed_out {
            let message = format!("zoom {} settled before all tiles arrived", self.state.view.zoom);
            warn!(zoom = self.state.view.zoom, outstanding = self.state.cache.outstanding(), "{message}");
            effects.push(Effect::Emit(Event::Diagnostic { message }));
        }
        if let Some(gesture) = next {
            if self.state.zoom.begin(self.state.view.zoom, gesture) {
                effects.extend(self.start_zoom(gesture));
                self.state.zoom.end();
                effects.push(Effect::RequestFrame);
            }
        }
        effects
    }

    // =========================================================================
    // PREFETCH
    // =========================================================================

    /// Run a background prefetch pass if one is due.
    pub fn tick(&mut self) -> Output {
        self.begin_turn();
        if self.state.zoom.is_active() || self.state.prefetch.is_dormant() {
            return Output::default();
        }
        let view = self.state.prefetch_view();
        let now = self.state.now_ms;
        let busy = self.state.cache.has_foreground_requests();
        let cache = &self.state.cache;
        let coords = self.state.prefetch.tick(now, &view, |coord| cache.needs_fetch(coord, now), busy);
        if coords.is_empty() {
            return Output::default();
        }
        debug!(tiles = coords.len(), "prefetching");
        let requests = self.state.cache.request_tiles(&coords, now);
        self.run_effects(requests.into_iter().map(Effect::Send).collect())
    }

    // =========================================================================
    // EFFECTS
    // =========================================================================

    /// Execute `effects` and every task they schedule.
    pub fn run_effects(&mut self, effects: Vec<Effect>) -> Output {
        let mut output = Output::default();
        let mut queue: VecDeque<Effect> = effects.into();
        let mut pending: VecDeque<Task> = VecDeque::new();
        let mut ran: Vec<Task> = Vec::new();
        let mut acks = Vec::new();
        let mut draw_overlays = false;

        loop {
            while let Some(effect) = queue.pop_front() {
                match effect {
                    Effect::Send(request) => output.requests.push(request),
                    Effect::Ack(wire_id) => acks.push(wire_id),
                    Effect::Paint(coord) => {
                        if let Some(bitmap) = self.state.cache.bitmap(&coord) {
                            self.surface.paint_tile(&coord, bitmap);
                        }
                    }
                    Effect::Invalidate(rect) => self.surface.invalidate_rect(&rect),
                    Effect::DrawScaled { scale, center } => self.surface.draw_scaled(scale, center),
                    Effect::DrawOverlays => draw_overlays = true,
                    Effect::PaintDialog { id, bitmap } => self.surface.paint_dialog(id, &bitmap),
                    Effect::Emit(event) => output.events.push(event),
                    Effect::Schedule(task) => {
                        if !ran.contains(&task) && !pending.contains(&task) {
                            pending.push_back(task);
                        }
                    }
                    Effect::RequestFrame => output.wants_frame = true,
                }
            }
            let Some(task) = pending.pop_front() else {
                break;
            };
            ran.push(task);
            queue.extend(self.run_task(task));
        }

        if !acks.is_empty() {
            output.requests.push(Request::TileProcessed { wire_ids: acks });
        }
        if draw_overlays {
            let shapes = self.state.overlay.shapes(&self.state.transform(), self.state.doc.current_part, self.state.doc.edit);
            self.surface.draw_overlays(&shapes);
        }
        output
    }

    fn run_task(&mut self, task: Task) -> Vec<Effect> {
        match task {
            Task::RefreshView => self.state.refresh_view(),
            Task::Replay { part_changed } => {
                let messages = self.state.replay.replay_all(part_changed);
                self.replay(&messages)
            }
            Task::ReplayView(view) => {
                let messages = self.state.replay.replay_view(view);
                self.replay(&messages)
            }
            Task::RequestKeyframes => self.state.request_keyframes(),
        }
    }

    fn replay(&mut self, messages: &[Inbound]) -> Vec<Effect> {
        debug!(count = messages.len(), "replaying stored messages");
        let mut effects = Vec::new();
        for msg in messages {
            effects.extend(self.dispatcher.dispatch(&mut self.state, msg));
        }
        effects
    }

    fn begin_turn(&mut self) {
        self.state.now_ms = self.clock.now_ms();
    }
}
