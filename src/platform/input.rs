//! Input sampling
//!
//! Raw device events arrive at any time between frames. The sampler keeps a
//! persistent held-state plus one-shot edges, and hands the simulation an
//! immutable [`InputSnapshot`] once per frame.
//!
//! - **Held (level-triggered):** true every frame the key is physically down.
//! - **Just pressed (edge-triggered):** true only in the first snapshot taken
//!   after the press. A press and release inside one frame still shows up as
//!   just pressed, so quick taps are never lost.

use std::collections::{BTreeSet, HashSet};

use glam::Vec2;

use crate::renderer::surface::SurfaceMetrics;

/// Pointer (mouse or first touch) state in surface-local coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub pos: Vec2,
    pub pressed: bool,
    /// Press edge since the previous snapshot
    pub just_pressed: bool,
    /// Release edge since the previous snapshot
    pub just_released: bool,
    /// Whether any pointer position has been reported yet
    pub seen: bool,
}

/// Frame-local, immutable view of the input
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    held: BTreeSet<String>,
    just_pressed: BTreeSet<String>,
    pub pointer: PointerState,
}

impl InputSnapshot {
    pub fn is_held(&self, code: &str) -> bool {
        self.held.contains(code)
    }

    pub fn any_held(&self, codes: &[&str]) -> bool {
        codes.iter().any(|c| self.held.contains(*c))
    }

    pub fn just_pressed(&self, code: &str) -> bool {
        self.just_pressed.contains(code)
    }

    pub fn any_just_pressed(&self, codes: &[&str]) -> bool {
        codes.iter().any(|c| self.just_pressed.contains(*c))
    }

    pub fn held_keys(&self) -> impl Iterator<Item = &str> {
        self.held.iter().map(String::as_str)
    }

    /// -1/0/+1 per axis from two opposing key sets (e.g. arrows + WASD)
    pub fn axis(&self, negative: &[&str], positive: &[&str]) -> f32 {
        let mut v = 0.0;
        if self.any_held(negative) {
            v -= 1.0;
        }
        if self.any_held(positive) {
            v += 1.0;
        }
        v
    }
}

/// Accumulates raw events between frames
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    held: HashSet<String>,
    just_pressed: HashSet<String>,
    pointer: PointerState,
    active_touch: Option<i32>,
    surface: SurfaceMetrics,
}

impl InputSampler {
    pub fn new(surface: SurfaceMetrics) -> Self {
        Self {
            surface,
            ..Default::default()
        }
    }

    /// Update the surface geometry used for coordinate transforms
    pub fn set_surface(&mut self, surface: SurfaceMetrics) {
        self.surface = surface;
    }

    pub fn surface(&self) -> &SurfaceMetrics {
        &self.surface
    }

    pub fn on_key_down(&mut self, code: &str) {
        // Auto-repeat keydowns do not re-trigger the edge
        if self.held.insert(code.to_owned()) {
            self.just_pressed.insert(code.to_owned());
        }
    }

    pub fn on_key_up(&mut self, code: &str) {
        self.held.remove(code);
    }

    /// Viewport coordinates
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.pointer.pos = self.surface.viewport_to_local(x, y);
        self.pointer.seen = true;
    }

    pub fn on_pointer_down(&mut self, x: f32, y: f32) {
        self.on_pointer_move(x, y);
        if !self.pointer.pressed {
            self.pointer.pressed = true;
            self.pointer.just_pressed = true;
        }
    }

    pub fn on_pointer_up(&mut self, x: f32, y: f32) {
        self.on_pointer_move(x, y);
        if self.pointer.pressed {
            self.pointer.pressed = false;
            self.pointer.just_released = true;
        }
    }

    /// The first active touch drives the pointer; later touches are ignored
    pub fn on_touch_start(&mut self, id: i32, x: f32, y: f32) {
        if self.active_touch.is_some() {
            return;
        }
        self.active_touch = Some(id);
        self.on_pointer_down(x, y);
    }

    pub fn on_touch_move(&mut self, id: i32, x: f32, y: f32) {
        if self.active_touch == Some(id) {
            self.on_pointer_move(x, y);
        }
    }

    /// Also used for touchcancel
    pub fn on_touch_end(&mut self, id: i32, x: f32, y: f32) {
        if self.active_touch == Some(id) {
            self.active_touch = None;
            self.on_pointer_up(x, y);
        }
    }

    /// Take this frame's snapshot, clearing the one-shot edges
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            held: self.held.iter().cloned().collect(),
            just_pressed: self.just_pressed.drain().collect(),
            pointer: self.pointer,
        };
        self.pointer.just_pressed = false;
        self.pointer.just_released = false;
        snapshot
    }

    /// Drop all held state (reset, focus loss, listeners detached)
    pub fn clear(&mut self) {
        self.held.clear();
        self.just_pressed.clear();
        self.pointer.pressed = false;
        self.pointer.just_pressed = false;
        self.pointer.just_released = false;
        self.active_touch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::surface::ViewportRect;

    #[test]
    fn test_key_down_sets_held_and_edge() {
        let mut input = InputSampler::default();
        input.on_key_down("ArrowLeft");
        let snap = input.snapshot();
        assert!(snap.is_held("ArrowLeft"));
        assert!(snap.just_pressed("ArrowLeft"));
    }

    #[test]
    fn test_consecutive_snapshots_agree_on_held() {
        let mut input = InputSampler::default();
        input.on_key_down("Space");
        let first = input.snapshot();
        let second = input.snapshot();
        assert!(first.is_held("Space") && second.is_held("Space"));
        assert!(first.just_pressed("Space"));
        assert!(!second.just_pressed("Space"));
    }

    #[test]
    fn test_tap_inside_one_frame_is_not_lost() {
        let mut input = InputSampler::default();
        input.on_key_down("Space");
        input.on_key_up("Space");
        let snap = input.snapshot();
        assert!(!snap.is_held("Space"));
        assert!(snap.just_pressed("Space"));
    }

    #[test]
    fn test_repeat_does_not_retrigger() {
        let mut input = InputSampler::default();
        input.on_key_down("KeyW");
        input.snapshot();
        input.on_key_down("KeyW");
        assert!(!input.snapshot().just_pressed("KeyW"));
    }

    #[test]
    fn test_axis_from_opposing_keys() {
        let mut input = InputSampler::default();
        input.on_key_down("KeyA");
        let snap = input.snapshot();
        assert_eq!(snap.axis(&["ArrowLeft", "KeyA"], &["ArrowRight", "KeyD"]), -1.0);
        input.on_key_down("ArrowRight");
        let snap = input.snapshot();
        assert_eq!(snap.axis(&["ArrowLeft", "KeyA"], &["ArrowRight", "KeyD"]), 0.0);
    }

    #[test]
    fn test_pointer_transformed_to_surface() {
        let metrics = SurfaceMetrics::new(400.0, 400.0).with_rect(ViewportRect {
            left: 10.0,
            top: 20.0,
            width: 200.0,
            height: 200.0,
        });
        let mut input = InputSampler::new(metrics);
        input.on_pointer_down(60.0, 70.0);
        let snap = input.snapshot();
        assert_eq!(snap.pointer.pos, Vec2::new(100.0, 100.0));
        assert!(snap.pointer.pressed && snap.pointer.just_pressed && snap.pointer.seen);

        input.on_pointer_up(60.0, 70.0);
        let snap = input.snapshot();
        assert!(!snap.pointer.pressed && snap.pointer.just_released);
        assert!(!input.snapshot().pointer.just_released);
    }

    #[test]
    fn test_second_touch_is_ignored() {
        let mut input = InputSampler::default();
        input.on_touch_start(1, 10.0, 10.0);
        input.on_touch_start(2, 300.0, 300.0);
        input.on_touch_move(2, 310.0, 310.0);
        assert_eq!(input.snapshot().pointer.pos, Vec2::new(10.0, 10.0));

        // Ending the ignored touch does not release the pointer
        input.on_touch_end(2, 310.0, 310.0);
        assert!(input.snapshot().pointer.pressed);

        input.on_touch_move(1, 20.0, 30.0);
        input.on_touch_end(1, 20.0, 30.0);
        let snap = input.snapshot();
        assert_eq!(snap.pointer.pos, Vec2::new(20.0, 30.0));
        assert!(!snap.pointer.pressed);

        // A new touch can take over once the first ended
        input.on_touch_start(2, 50.0, 50.0);
        assert_eq!(input.snapshot().pointer.pos, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut input = InputSampler::default();
        input.on_key_down("KeyD");
        input.on_touch_start(3, 1.0, 1.0);
        input.clear();
        let snap = input.snapshot();
        assert!(!snap.is_held("KeyD"));
        assert!(!snap.just_pressed("KeyD"));
        assert!(!snap.pointer.pressed);
        input.on_touch_start(4, 2.0, 2.0);
        assert!(input.snapshot().pointer.pressed);
    }
}
