//! Backend-neutral draw commands
//!
//! A frame is flattened into a list of primitive commands in draw order.
//! The canvas backend replays it; headless hosts and tests record it.

use glam::Vec2;

use super::{FrameView, Paint, RenderError, Renderer};
use crate::sim::Shape;

/// Background fill
pub const CLEAR_COLOR: u32 = 0x10121a;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        color: u32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: u32,
        alpha: f32,
    },
    Rect {
        pos: Vec2,
        size: Vec2,
        color: u32,
        alpha: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Flatten a frame: clear, entities (stable by layer, then insertion
    /// order), then particles on top
    pub fn build<T: Paint>(view: &FrameView<'_, T>) -> Self {
        let mut commands = Vec::with_capacity(1 + view.entities.len() + view.particles.len());
        commands.push(DrawCommand::Clear { color: CLEAR_COLOR });

        let mut entities: Vec<_> = view.active_entities().collect();
        // Stable sort keeps insertion order within a layer
        entities.sort_by_key(|e| e.data.layer());

        for entity in entities {
            let color = entity.data.color();
            commands.push(match entity.shape() {
                Shape::Circle { radius } => DrawCommand::Circle {
                    center: entity.pos,
                    radius,
                    color,
                    alpha: 1.0,
                },
                Shape::Rect { width, height } => DrawCommand::Rect {
                    pos: entity.pos,
                    size: Vec2::new(width, height),
                    color,
                    alpha: 1.0,
                },
            });
        }

        for p in view.particles.iter() {
            commands.push(DrawCommand::Circle {
                center: p.pos,
                radius: p.size * 0.5,
                color: p.color,
                alpha: p.alpha(),
            });
        }

        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Keeps the last frame's draw list. Used headless and in tests; can be
/// told to report an unavailable surface.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub last: DrawList,
    pub frames: u64,
    pub surface_available: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            last: DrawList::default(),
            frames: 0,
            surface_available: true,
        }
    }
}

impl<T: Paint> Renderer<T> for RecordingRenderer {
    fn render(&mut self, view: &FrameView<'_, T>) -> Result<(), RenderError> {
        if !self.surface_available {
            return Err(RenderError::SurfaceUnavailable);
        }
        self.last = DrawList::build(view);
        self.frames += 1;
        Ok(())
    }
}

/// Split 0xRRGGBB into 0-255 channels
pub fn rgb(color: u32) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    )
}
