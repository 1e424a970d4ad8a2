//! Zoom animation state machine.
//!
//! `Idle -> Animating -> Finishing -> Idle`, stepped by [`ZoomMachine::frame`].
//!
//! While animating, each frame redraws resident bitmaps at the gesture's
//! scale and no tiles are fetched. Gesture end starts a fixed
//! [`FINISH_STEPS`]-frame convergence to the exact target scale, followed by a
//! `Settle` step where the engine switches zoom and fetches. The machine then
//! polls until the target tiles are ready or the poll budget runs out.

use crate::consts::FINISH_STEPS;
use crate::coords::{Point, zoom_scale};

#[cfg(test)]
#[path = "zoom_test.rs"]
mod zoom_test;

/// A requested zoom: target level and the core-pixel point that stays fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomGesture {
    pub target: i32,
    pub center: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Animating {
        from: i32,
        gesture: ZoomGesture,
        scale: f64,
    },
    Finishing {
        from_scale: f64,
        to_scale: f64,
        step: u32,
        gesture: ZoomGesture,
        settled: bool,
        polls_left: u32,
    },
}

/// What the engine should do for this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomStep {
    /// Nothing animating.
    Idle,
    DrawScaled { scale: f64, center: Point },
    /// Switch the view to `zoom` and fetch its tiles.
    Settle { zoom: i32, center: Point },
    /// Target tiles still outstanding.
    Waiting,
    /// Back to idle. `next` is a gesture that arrived while finishing.
    Finished { timed_out: bool, next: Option<ZoomGesture> },
}

#[derive(Debug, Clone)]
pub struct ZoomMachine {
    phase: Phase,
    queued: Option<ZoomGesture>,
    finish_polls: u32,
}

impl ZoomMachine {
    #[must_use]
    pub fn new(finish_polls: u32) -> Self {
        Self { phase: Phase::Idle, queued: None, finish_polls: finish_polls.max(1) }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    #[must_use]
    pub fn is_finishing(&self) -> bool {
        matches!(self.phase, Phase::Finishing { .. })
    }

    /// Tile fetches wait until the new zoom has settled.
    #[must_use]
    pub fn blocks_fetch(&self) -> bool {
        match self.phase {
            Phase::Idle => false,
            Phase::Animating { .. } => true,
            Phase::Finishing { settled, .. } => !settled,
        }
    }

    /// Target of the running gesture.
    #[must_use]
    pub fn target(&self) -> Option<ZoomGesture> {
        match self.phase {
            Phase::Idle => None,
            Phase::Animating { gesture, .. } | Phase::Finishing { gesture, .. } => Some(gesture),
        }
    }

    /// Start or retarget a gesture from zoom level `from`. A gesture arriving
    /// while finishing is queued; returns false in that case.
    pub fn begin(&mut self, from: i32, gesture: ZoomGesture) -> bool {
        match &mut self.phase {
            Phase::Idle => {
                self.phase = Phase::Animating { from, gesture, scale: 1.0 };
                true
            }
            Phase::Animating { gesture: current, .. } => {
                *current = gesture;
                true
            }
            Phase::Finishing { .. } => {
                self.queued = Some(gesture);
                false
            }
        }
    }

    /// Update the live gesture scale and center.
    pub fn update(&mut self, scale: f64, center: Point) {
        if let Phase::Animating { gesture, scale: current, .. } = &mut self.phase {
            *current = scale;
            gesture.center = center;
        }
    }

    /// Gesture released: converge on the target scale.
    pub fn end(&mut self) {
        if let Phase::Animating { from, gesture, scale } = self.phase {
            self.phase = Phase::Finishing {
                from_scale: scale,
                to_scale: zoom_scale(from, gesture.target),
                step: 0,
                gesture,
                settled: false,
                polls_left: self.finish_polls,
            };
        }
    }

    /// Advance one frame. `tiles_ready` reports whether every visible tile at
    /// the settled zoom is loaded; it is ignored before settling.
    pub fn frame(&mut self, tiles_ready: bool) -> ZoomStep {
        match &mut self.phase {
            Phase::Idle => ZoomStep::Idle,
            Phase::Animating { gesture, scale, .. } => ZoomStep::DrawScaled { scale: *scale, center: gesture.center },
            Phase::Finishing { from_scale, to_scale, step, gesture, settled, polls_left } => {
                if *step < FINISH_STEPS {
                    *step += 1;
                    let scale = *from_scale + (*to_scale - *from_scale) * f64::from(*step) / f64::from(FINISH_STEPS);
                    return ZoomStep::DrawScaled { scale, center: gesture.center };
                }
                if !*settled {
                    *settled = true;
                    return ZoomStep::Settle { zoom: gesture.target, center: gesture.center };
                }
                if tiles_ready {
                    return self.finish(false);
                }
                *polls_left = polls_left.saturating_sub(1);
                if *polls_left == 0 {
                    return self.finish(true);
                }
                ZoomStep::Waiting
            }
        }
    }

    fn finish(&mut self, timed_out: bool) -> ZoomStep {
        self.phase = Phase::Idle;
        ZoomStep::Finished { timed_out, next: self.queued.take() }
    }
}
