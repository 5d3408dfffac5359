//! Per-instance simulation state
//!
//! One `World` per mounted game. It is the single writer of its entity
//! collection; nothing is shared across games or instances.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{Bounds, Wall, wall_contact};
use super::entity::{BounceOutcome, Entity, EntityId, EntityManager};
use super::particles::{Burst, ParticleSystem};
use super::state::GameState;
use super::timers::DelayedEffects;
use crate::events::GameEvent;

/// Which walls reflect in [`World::bounce_off_walls`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walls {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl Walls {
    pub const ALL: Walls = Walls {
        left: true,
        right: true,
        top: true,
        bottom: true,
    };

    /// Side and top walls only (ball games where the floor loses a life)
    pub const NO_FLOOR: Walls = Walls {
        left: true,
        right: true,
        top: true,
        bottom: false,
    };

    pub fn contains(&self, wall: Wall) -> bool {
        match wall {
            Wall::Left => self.left,
            Wall::Right => self.right,
            Wall::Top => self.top,
            Wall::Bottom => self.bottom,
        }
    }
}

/// Complete state of one game session
#[derive(Debug, Clone)]
pub struct World<T, E = ()> {
    pub state: GameState,
    pub entities: EntityManager<T>,
    pub particles: ParticleSystem,
    pub timers: DelayedEffects<E>,
    pub bounds: Bounds,
    pub score: u64,
    pub lives: u32,
    /// Simulation steps executed since the last reset
    pub time_ticks: u64,
    seed: u64,
    rng: Pcg32,
    events: Vec<GameEvent>,
}

impl<T, E> World<T, E> {
    pub fn new(bounds: Bounds, seed: u64, max_particles: usize) -> Self {
        Self {
            state: GameState::Idle,
            entities: EntityManager::new(),
            particles: ParticleSystem::new(max_particles),
            timers: DelayedEffects::new(),
            bounds,
            score: 0,
            lives: 0,
            time_ticks: 0,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seeded RNG for spawn rules and particles
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Emit a particle burst using the world RNG
    pub fn burst(&mut self, origin: Vec2, burst: &Burst) {
        self.particles.emit_burst(&mut self.rng, origin, burst);
    }

    /// Integrate entities and particles. No-op unless Running, so a stray
    /// frame racing a stop call cannot move anything.
    pub fn advance(&mut self, dt: f32) {
        if !self.state.is_running() {
            return;
        }
        self.entities.advance(dt);
        self.particles.advance(dt);
    }

    /// Single removal pass: expired flags, elapsed ttl, and `predicate`
    pub fn expire_pass<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Entity<T>, &Bounds) -> bool,
    {
        let bounds = self.bounds;
        let removed = self
            .entities
            .expire(|e| !e.is_active() || e.ttl_exceeded() || predicate(e, &bounds));
        self.particles.expire();
        removed
    }

    /// Reflect entities accepted by `filter` off the enabled walls.
    /// Returns each contact with its outcome, in entity order.
    pub fn bounce_off_walls<F>(
        &mut self,
        walls: Walls,
        mut filter: F,
    ) -> Vec<(EntityId, BounceOutcome)>
    where
        F: FnMut(&Entity<T>) -> bool,
    {
        let bounds = self.bounds;
        let mut contacts = Vec::new();
        for entity in self.entities.iter_mut() {
            if !entity.is_active() || !filter(entity) {
                continue;
            }
            let Some(wall) = wall_contact(entity.pos, entity.vel, entity.shape(), &bounds) else {
                continue;
            };
            if walls.contains(wall) {
                contacts.push((entity.id, entity.bounce(wall.axis())));
            }
        }
        contacts
    }

    pub fn add_score(&mut self, delta: u64) {
        if delta == 0 {
            return;
        }
        self.score = self.score.saturating_add(delta);
        self.events.push(GameEvent::ScoreChanged {
            delta: delta as i64,
            total: self.score,
        });
    }

    /// Remove one life, returning how many remain
    pub fn lose_life(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(GameEvent::LifeLost {
            remaining: self.lives,
        });
        self.lives
    }

    pub fn start(&mut self) -> bool {
        self.transition(GameState::start)
    }

    pub fn pause(&mut self) -> bool {
        self.transition(GameState::pause)
    }

    pub fn resume(&mut self) -> bool {
        self.transition(GameState::resume)
    }

    /// Running -> GameOver, announcing the final score
    pub fn finish(&mut self) -> bool {
        let applied = self.transition(GameState::finish);
        if applied {
            self.events.push(GameEvent::GameOver { score: self.score });
        }
        applied
    }

    /// Back to Idle with a fresh session: entities, particles, score and
    /// pending delayed effects are all dropped.
    pub fn reset(&mut self, seed: u64) {
        self.transition(GameState::reset);
        self.entities.clear();
        self.particles.clear();
        self.timers.invalidate();
        self.score = 0;
        self.lives = 0;
        self.time_ticks = 0;
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
    }

    /// Take queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn transition(&mut self, apply: fn(&mut GameState) -> bool) -> bool {
        let from = self.state;
        let applied = apply(&mut self.state);
        if applied {
            self.events.push(GameEvent::StateChanged {
                from,
                to: self.state,
            });
        }
        applied
    }
}
