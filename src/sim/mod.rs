//! Simulation module
//!
//! Everything a frame tick mutates lives here. This module must stay free of
//! rendering and platform dependencies:
//! - Clamped delta-time only
//! - Seeded RNG only
//! - Stable iteration order (insertion / entity id)

pub mod collision;
pub mod entity;
pub mod particles;
pub mod state;
pub mod tick;
pub mod timers;
pub mod world;

pub use collision::{
    Axis, Bounds, CollisionKind, CollisionPair, Wall, circle_circle_intersect,
    circle_rect_intersect, find_pairs, rect_rect_intersect, reflect_about_normal,
    reflect_velocity, segment_point_distance, shapes_intersect, wall_contact,
};
pub use entity::{
    BounceOutcome, Entity, EntityDescriptor, EntityId, EntityManager, Lifecycle, Shape,
};
pub use particles::{Burst, Particle, ParticleSystem};
pub use state::GameState;
pub use tick::{FrameContext, GameRules, tick};
pub use timers::DelayedEffects;
pub use world::{Walls, World};
