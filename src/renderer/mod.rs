//! Renderer contract
//!
//! Renderers only ever see a [`FrameView`] of a finished simulation step.
//! They cannot mutate simulation state, and a failing renderer never stalls
//! the simulation: the engine logs the error and skips drawing that frame.

pub mod draw_list;
pub mod surface;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

pub use draw_list::{DrawCommand, DrawList, RecordingRenderer};
pub use surface::{SurfaceMetrics, ViewportRect};

use thiserror::Error;

use crate::sim::{Bounds, Entity, GameState, ParticleSystem};

#[derive(Debug, Error)]
pub enum RenderError {
    /// Drawing context could not be obtained this frame
    #[error("drawing surface unavailable")]
    SurfaceUnavailable,
    #[error("render backend error: {0}")]
    Backend(String),
}

/// Appearance hook implemented by entity payloads
pub trait Paint {
    /// Packed 0xRRGGBB fill color
    fn color(&self) -> u32 {
        0xffffff
    }

    /// Draw layer hint; higher draws later within the same frame
    fn layer(&self) -> u8 {
        0
    }
}

impl Paint for () {}

/// Read-only snapshot handed to a renderer
#[derive(Debug)]
pub struct FrameView<'a, T> {
    pub state: GameState,
    /// All entities in insertion order; renderers skip inactive ones
    pub entities: &'a [Entity<T>],
    pub particles: &'a ParticleSystem,
    pub bounds: Bounds,
    pub score: u64,
    pub lives: u32,
    pub elapsed_ms: f64,
}

impl<T> FrameView<'_, T> {
    /// Active entities, back to front
    pub fn active_entities(&self) -> impl Iterator<Item = &Entity<T>> {
        self.entities.iter().filter(|e| e.is_active())
    }
}

pub trait Renderer<T> {
    fn render(&mut self, view: &FrameView<'_, T>) -> Result<(), RenderError>;
}
