//! Slice Dash: slice launched fruit, avoid bombs
//!
//! Targets are thrown up from below the floor and fall back under gravity.
//! Dragging the pointer cuts along the segment between consecutive samples.
//! A fruit that falls back out unsliced, or a sliced bomb, costs a life.

use glam::Vec2;
use rand::Rng;

use crate::renderer::Paint;
use crate::sim::{
    Bounds, Burst, CollisionPair, Entity, EntityDescriptor, EntityId, FrameContext, GameRules,
    World, segment_point_distance,
};

pub const START_LIVES: u32 = 3;
/// Downward acceleration on every target (px/s²)
pub const GRAVITY: f32 = 520.0;
pub const FRUIT_RADIUS: f32 = 18.0;
const BOMB_RADIUS: f32 = 16.0;
const BOMB_CHANCE: f64 = 0.15;
const FRUIT_COLORS: [u32; 4] = [0xe53935, 0xfdd835, 0x7cb342, 0xfb8c00];

const FIRST_LAUNCH: f32 = 0.6;
pub const LAUNCH_INTERVAL: f32 = 1.1;
/// Apex height as a fraction of the surface height
const APEX_RANGE: std::ops::Range<f32> = 0.45..0.8;

pub const SLICE_POINTS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Fruit { color: u32 },
    Bomb,
}

impl Paint for Target {
    fn color(&self) -> u32 {
        match self {
            Target::Fruit { color } => *color,
            Target::Bomb => 0x9e9e9e,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceEffect {
    Launch,
}

#[derive(Debug, Clone, Default)]
pub struct SliceDash {
    /// Pointer position at the previous tick while the button is held
    last_pointer: Option<Vec2>,
}

impl SliceDash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Throw one to three targets up from below the floor
    fn launch(&self, world: &mut World<Target, SliceEffect>) {
        let b = world.bounds;
        let center_x = (b.min.x + b.max.x) * 0.5;
        let count = world.rng().random_range(1..=3);

        for _ in 0..count {
            let rng = world.rng();
            let x = b.min.x + b.width() * rng.random_range(0.2..0.8);
            let apex = b.height() * rng.random_range(APEX_RANGE);
            let drift = rng.random_range(0.2..0.5);
            let target = if rng.random_bool(BOMB_CHANCE) {
                Target::Bomb
            } else {
                Target::Fruit {
                    color: FRUIT_COLORS[rng.random_range(0..FRUIT_COLORS.len())],
                }
            };

            let radius = match target {
                Target::Bomb => BOMB_RADIUS,
                Target::Fruit { .. } => FRUIT_RADIUS,
            };
            // v² = 2gh for the chosen apex; drift pulls toward the middle
            let vel = Vec2::new((center_x - x) * drift, -(2.0 * GRAVITY * apex).sqrt());
            world.entities.spawn(
                EntityDescriptor::circle(Vec2::new(x, b.max.y + radius), radius, target)
                    .with_velocity(vel)
                    .with_force(Vec2::new(0.0, GRAVITY)),
            );
        }
    }

    fn slice(&self, world: &mut World<Target, SliceEffect>, from: Vec2, to: Vec2) {
        let hits: Vec<(EntityId, Vec2, Target)> = world
            .entities
            .iter()
            .filter(|e| e.is_active())
            .filter(|e| segment_point_distance(e.pos, from, to) <= e.shape().half_extents().x)
            .map(|e| (e.id, e.pos, e.data))
            .collect();

        for (id, pos, target) in hits {
            world.entities.mark_expired(id);
            match target {
                Target::Fruit { color } => {
                    world.add_score(SLICE_POINTS);
                    world.burst(
                        pos,
                        &Burst {
                            count: 14,
                            color,
                            ..Burst::default()
                        },
                    );
                }
                Target::Bomb => {
                    world.lose_life();
                    world.burst(
                        pos,
                        &Burst {
                            count: 30,
                            speed: 120.0..260.0,
                            color: 0xffffff,
                            ..Burst::default()
                        },
                    );
                    log::debug!("slice_dash: bomb sliced, {} lives left", world.lives);
                }
            }
        }
    }
}

/// Below the floor and still falling
fn fell_out(entity: &Entity<Target>, bounds: &Bounds) -> bool {
    entity.vel.y > 0.0 && entity.pos.y - entity.shape().half_extents().y > bounds.max.y
}

impl GameRules for SliceDash {
    type Data = Target;
    type Effect = SliceEffect;

    fn name(&self) -> &'static str {
        "slice_dash"
    }

    fn setup(&mut self, world: &mut World<Target, SliceEffect>) {
        world.lives = START_LIVES;
        self.last_pointer = None;
        world.timers.schedule(FIRST_LAUNCH, SliceEffect::Launch);
    }

    fn step(&mut self, world: &mut World<Target, SliceEffect>, ctx: &FrameContext) {
        let pointer = ctx.input.pointer;
        if pointer.pressed {
            if let Some(from) = self.last_pointer {
                self.slice(world, from, pointer.pos);
            }
            self.last_pointer = Some(pointer.pos);
        } else {
            self.last_pointer = None;
        }

        let bounds = world.bounds;
        let missed: Vec<EntityId> = world
            .entities
            .iter()
            .filter(|e| {
                e.is_active() && matches!(e.data, Target::Fruit { .. }) && fell_out(e, &bounds)
            })
            .map(|e| e.id)
            .collect();
        for id in missed {
            world.entities.mark_expired(id);
            world.lose_life();
        }
    }

    fn collides(&self, _a: &Entity<Target>, _b: &Entity<Target>) -> bool {
        false
    }

    fn resolve(
        &mut self,
        _world: &mut World<Target, SliceEffect>,
        _pairs: &[CollisionPair],
        _ctx: &FrameContext,
    ) {
    }

    fn on_effect(&mut self, world: &mut World<Target, SliceEffect>, effect: SliceEffect) {
        match effect {
            SliceEffect::Launch => {
                self.launch(world);
                world.timers.schedule(LAUNCH_INTERVAL, SliceEffect::Launch);
            }
        }
    }

    /// Fruit is left for `step` to count as missed
    fn should_expire(&self, entity: &Entity<Target>, bounds: &Bounds) -> bool {
        entity.data == Target::Bomb && fell_out(entity, bounds)
    }

    fn is_terminal(&self, world: &World<Target, SliceEffect>) -> bool {
        world.lives == 0
    }
}
