//! One simulation step
//!
//! The shape of a step is the same for every game; only the [`GameRules`]
//! differ:
//!
//! 1. fire due delayed effects
//! 2. `rules.step` (input, spawning, per-entity logic)
//! 3. integrate entities and particles by `dt`
//! 4. collision pairs -> `rules.resolve`
//! 5. terminal check
//! 6. single expire pass

use super::collision::{Bounds, CollisionPair, find_pairs};
use super::entity::Entity;
use super::world::World;
use crate::platform::input::InputSnapshot;

/// Per-tick value passed to the rules; never stored
#[derive(Debug, Clone)]
pub struct FrameContext {
    /// Seconds since the previous tick, already clamped
    pub dt: f32,
    /// Simulated milliseconds since the session started
    pub elapsed_ms: f64,
    pub input: InputSnapshot,
}

/// Game-specific Simulation Step rules
pub trait GameRules {
    /// Payload carried by every entity
    type Data;
    /// Delayed effect type (use `()` when the game has none)
    type Effect;

    /// Stable name, used as the best-score key
    fn name(&self) -> &'static str;

    /// Populate a freshly reset world (lives, initial entities)
    fn setup(&mut self, world: &mut World<Self::Data, Self::Effect>);

    /// Input handling and spawning, before integration
    fn step(&mut self, world: &mut World<Self::Data, Self::Effect>, ctx: &FrameContext);

    /// Whether a pair is worth testing at all
    fn collides(&self, _a: &Entity<Self::Data>, _b: &Entity<Self::Data>) -> bool {
        true
    }

    /// Resolve this tick's overlaps (called every tick, `pairs` may be empty)
    fn resolve(
        &mut self,
        world: &mut World<Self::Data, Self::Effect>,
        pairs: &[CollisionPair],
        ctx: &FrameContext,
    );

    /// Apply a delayed effect that came due while Running
    fn on_effect(&mut self, _world: &mut World<Self::Data, Self::Effect>, _effect: Self::Effect) {}

    /// Extra removal predicate for the expire pass
    fn should_expire(&self, _entity: &Entity<Self::Data>, _bounds: &Bounds) -> bool {
        false
    }

    /// Lose/win condition; true moves the session to GameOver
    fn is_terminal(&self, world: &World<Self::Data, Self::Effect>) -> bool;
}

/// Advance `world` by one tick. Does nothing unless the world is Running.
pub fn tick<R: GameRules>(
    world: &mut World<R::Data, R::Effect>,
    rules: &mut R,
    ctx: &FrameContext,
) {
    if !world.state.is_running() {
        return;
    }

    for effect in world.timers.poll(ctx.elapsed_ms) {
        // An earlier effect may have ended the run
        if !world.state.is_running() {
            log::debug!("dropping delayed effect, session no longer running");
            continue;
        }
        rules.on_effect(world, effect);
    }

    rules.step(world, ctx);
    world.advance(ctx.dt);

    let pairs = find_pairs(world.entities.as_slice(), |a, b| rules.collides(a, b));
    rules.resolve(world, &pairs, ctx);

    if world.state.is_running() && rules.is_terminal(world) {
        log::info!("{}: game over with score {}", rules.name(), world.score);
        world.finish();
    }

    world.expire_pass(|e, bounds| rules.should_expire(e, bounds));
    world.time_ticks += 1;
}
