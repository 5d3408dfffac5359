//! Bullet Dodge: survive ricocheting bullets
//!
//! Bullets enter from the edges aimed roughly at the player and ricochet off
//! the walls [`BULLET_BOUNCES`] times before burning out. The spawn interval
//! shrinks every [`RAMP_EVERY`] seconds. Score accrues per second survived.

use glam::Vec2;
use rand::Rng;

use super::{DOWN_KEYS, LEFT_KEYS, RIGHT_KEYS, UP_KEYS};
use crate::renderer::Paint;
use crate::sim::{
    BounceOutcome, Bounds, Burst, CollisionPair, Entity, EntityDescriptor, EntityId, FrameContext,
    GameRules, Walls, World,
};

pub const START_LIVES: u32 = 1;
pub const PLAYER_RADIUS: f32 = 10.0;
const PLAYER_SPEED: f32 = 260.0;

pub const BULLET_RADIUS: f32 = 5.0;
pub const BULLET_BOUNCES: u32 = 2;
const BULLET_MIN_SPEED: f32 = 140.0;
const BULLET_MAX_SPEED: f32 = 220.0;
/// Random spread around the aim line (radians)
const BULLET_AIM_JITTER: f32 = 0.3;

const FIRST_SPAWN: f32 = 0.5;
pub const START_INTERVAL: f32 = 1.2;
const MIN_INTERVAL: f32 = 0.25;
pub const RAMP_EVERY: f32 = 5.0;
const RAMP_FACTOR: f32 = 0.85;

pub const POINTS_PER_SECOND: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    Player,
    Bullet,
}

impl Paint for Body {
    fn color(&self) -> u32 {
        match self {
            Body::Player => 0x4fc3f7,
            Body::Bullet => 0xff7043,
        }
    }

    fn layer(&self) -> u8 {
        match self {
            Body::Player => 1,
            Body::Bullet => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DodgeEffect {
    SpawnBullet,
    RampUp,
}

#[derive(Debug, Clone)]
pub struct BulletDodge {
    player: Option<EntityId>,
    spawn_interval: f32,
    /// Fractional survival points not yet awarded
    score_carry: f32,
}

impl Default for BulletDodge {
    fn default() -> Self {
        Self {
            player: None,
            spawn_interval: START_INTERVAL,
            score_carry: 0.0,
        }
    }
}

fn sparks(color: u32) -> Burst {
    Burst {
        count: 8,
        speed: 40.0..120.0,
        life: 0.2..0.4,
        color,
        ..Burst::default()
    }
}

impl BulletDodge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn spawn_interval(&self) -> f32 {
        self.spawn_interval
    }

    fn spawn_bullet(&self, world: &mut World<Body, DodgeEffect>) -> EntityId {
        let b = world.bounds;
        let target = self
            .player
            .and_then(|id| world.entities.get(id))
            .map_or((b.min + b.max) * 0.5, |p| p.pos);

        let rng = world.rng();
        let t: f32 = rng.random();
        let pos = match rng.random_range(0..4u8) {
            0 => Vec2::new(b.min.x + BULLET_RADIUS, b.min.y + t * b.height()),
            1 => Vec2::new(b.max.x - BULLET_RADIUS, b.min.y + t * b.height()),
            2 => Vec2::new(b.min.x + t * b.width(), b.min.y + BULLET_RADIUS),
            _ => Vec2::new(b.min.x + t * b.width(), b.max.y - BULLET_RADIUS),
        };
        let speed = rng.random_range(BULLET_MIN_SPEED..BULLET_MAX_SPEED);
        let jitter = rng.random_range(-BULLET_AIM_JITTER..BULLET_AIM_JITTER);

        let aim = (target - pos).try_normalize().unwrap_or(Vec2::X);
        let vel = Vec2::from_angle(jitter).rotate(aim) * speed;
        world.entities.spawn(
            EntityDescriptor::circle(pos, BULLET_RADIUS, Body::Bullet)
                .with_velocity(vel)
                .with_max_bounces(BULLET_BOUNCES),
        )
    }

    fn move_player(&self, world: &mut World<Body, DodgeEffect>, ctx: &FrameContext) {
        let bounds = world.bounds;
        let Some(player) = self.player.and_then(|id| world.entities.get_mut(id)) else {
            return;
        };
        let dir = Vec2::new(
            ctx.input.axis(LEFT_KEYS, RIGHT_KEYS),
            ctx.input.axis(UP_KEYS, DOWN_KEYS),
        );
        let reach = PLAYER_SPEED * ctx.dt;
        let pointer = ctx.input.pointer;

        let next = if dir == Vec2::ZERO && pointer.pressed {
            let to = pointer.pos - player.pos;
            if to.length() <= reach {
                pointer.pos
            } else {
                player.pos + to.normalize() * reach
            }
        } else {
            player.pos + dir.normalize_or_zero() * reach
        };

        let margin = Vec2::splat(PLAYER_RADIUS);
        let lo = bounds.min + margin;
        let hi = (bounds.max - margin).max(lo);
        player.pos = next.clamp(lo, hi);
    }
}

impl GameRules for BulletDodge {
    type Data = Body;
    type Effect = DodgeEffect;

    fn name(&self) -> &'static str {
        "bullet_dodge"
    }

    fn setup(&mut self, world: &mut World<Body, DodgeEffect>) {
        let b = world.bounds;
        world.lives = START_LIVES;
        self.spawn_interval = START_INTERVAL;
        self.score_carry = 0.0;
        self.player = Some(world.entities.spawn(EntityDescriptor::circle(
            (b.min + b.max) * 0.5,
            PLAYER_RADIUS,
            Body::Player,
        )));
        world.timers.schedule(FIRST_SPAWN, DodgeEffect::SpawnBullet);
        world.timers.schedule(RAMP_EVERY, DodgeEffect::RampUp);
    }

    fn step(&mut self, world: &mut World<Body, DodgeEffect>, ctx: &FrameContext) {
        self.move_player(world, ctx);

        for (id, outcome) in world.bounce_off_walls(Walls::ALL, |e| e.data == Body::Bullet) {
            if outcome == BounceOutcome::Exhausted {
                if let Some(pos) = world.entities.get(id).map(|e| e.pos) {
                    world.burst(pos, &sparks(Body::Bullet.color()));
                }
            }
        }

        self.score_carry += ctx.dt * POINTS_PER_SECOND;
        let whole = self.score_carry.floor();
        if whole >= 1.0 {
            self.score_carry -= whole;
            world.add_score(whole as u64);
        }
    }

    fn collides(&self, a: &Entity<Body>, b: &Entity<Body>) -> bool {
        (a.data == Body::Player) != (b.data == Body::Player)
    }

    fn resolve(
        &mut self,
        world: &mut World<Body, DodgeEffect>,
        pairs: &[CollisionPair],
        _ctx: &FrameContext,
    ) {
        let Some(player) = self.player else {
            return;
        };
        for pair in pairs {
            let bullet = if pair.a == player { pair.b } else { pair.a };
            world.entities.mark_expired(bullet);
            let pos = world.entities.get(player).map(|e| e.pos);
            world.lose_life();
            if let Some(pos) = pos {
                world.burst(
                    pos,
                    &Burst {
                        count: 24,
                        color: Body::Player.color(),
                        ..Burst::default()
                    },
                );
            }
            log::debug!("bullet_dodge: player hit, {} lives left", world.lives);
        }
    }

    fn on_effect(&mut self, world: &mut World<Body, DodgeEffect>, effect: DodgeEffect) {
        match effect {
            DodgeEffect::SpawnBullet => {
                self.spawn_bullet(world);
                world.timers.schedule(self.spawn_interval, DodgeEffect::SpawnBullet);
            }
            DodgeEffect::RampUp => {
                self.spawn_interval = (self.spawn_interval * RAMP_FACTOR).max(MIN_INTERVAL);
                log::debug!("bullet_dodge: spawn interval now {:.2}s", self.spawn_interval);
                world.timers.schedule(RAMP_EVERY, DodgeEffect::RampUp);
            }
        }
    }

    fn should_expire(&self, entity: &Entity<Body>, bounds: &Bounds) -> bool {
        entity.data == Body::Bullet
            && bounds.is_outside(entity.pos, entity.shape(), 2.0 * BULLET_RADIUS)
    }

    fn is_terminal(&self, world: &World<Body, DodgeEffect>) -> bool {
        world.lives == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::input::{InputSampler, InputSnapshot};
    use crate::sim::{GameState, tick};

    fn setup() -> (World<Body, DodgeEffect>, BulletDodge) {
        let mut world = World::new(Bounds::from_size(400.0, 400.0), 11, 64);
        let mut rules = BulletDodge::new();
        rules.setup(&mut world);
        world.start();
        (world, rules)
    }

    fn ctx(dt: f32, elapsed_ms: f64) -> FrameContext {
        FrameContext {
            dt,
            elapsed_ms,
            input: InputSnapshot::default(),
        }
    }

    #[test]
    fn test_bullet_reflects_twice_then_burns_out() {
        let (mut world, mut rules) = setup();
        let id = world.entities.spawn(
            EntityDescriptor::circle(Vec2::new(396.0, 300.0), BULLET_RADIUS, Body::Bullet)
                .with_velocity(Vec2::new(100.0, 0.0))
                .with_max_bounces(2),
        );

        for (i, used) in [1u32, 2].into_iter().enumerate() {
            tick(&mut world, &mut rules, &ctx(0.001, i as f64));
            let bullet = world.entities.get(id).unwrap();
            assert_eq!(bullet.bounces_used(), Some(used));
            assert!(bullet.vel.x < 0.0);
            // Aim it back into the wall for the next contact
            world.entities.get_mut(id).unwrap().vel.x = 100.0;
        }

        tick(&mut world, &mut rules, &ctx(0.001, 3.0));
        assert!(world.entities.get(id).is_none());
        assert!(!world.particles.is_empty());
    }

    #[test]
    fn test_hit_ends_run() {
        let (mut world, mut rules) = setup();
        let player = world.entities.get(rules.player().unwrap()).unwrap().pos;
        world.entities.spawn(
            EntityDescriptor::circle(player + Vec2::new(8.0, 0.0), BULLET_RADIUS, Body::Bullet)
                .with_max_bounces(BULLET_BOUNCES),
        );
        tick(&mut world, &mut rules, &ctx(0.016, 16.0));
        assert_eq!(world.lives, 0);
        assert_eq!(world.state, GameState::GameOver);
    }

    #[test]
    fn test_survival_scores_points() {
        let (mut world, mut rules) = setup();
        for i in 1..=20u32 {
            tick(&mut world, &mut rules, &ctx(0.05, f64::from(i) * 50.0));
        }
        assert_eq!(world.state, GameState::Running);
        assert!((9..=10).contains(&world.score));
    }

    #[test]
    fn test_spawn_effect_aims_bounded_bullet() {
        let (mut world, mut rules) = setup();
        rules.on_effect(&mut world, DodgeEffect::SpawnBullet);
        let bullet = world
            .entities
            .iter()
            .find(|e| e.data == Body::Bullet)
            .unwrap();
        assert_eq!(bullet.bounces_used(), Some(0));
        assert!(bullet.vel.length() >= BULLET_MIN_SPEED);
        assert!(!world.bounds.is_outside(bullet.pos, bullet.shape(), 0.0));
        // Initial spawn and ramp, plus the rescheduled spawn
        assert_eq!(world.timers.len(), 3);
    }

    #[test]
    fn test_ramp_up_shortens_interval() {
        let (mut world, mut rules) = setup();
        rules.on_effect(&mut world, DodgeEffect::RampUp);
        assert!((rules.spawn_interval() - START_INTERVAL * 0.85).abs() < 1e-6);
        for _ in 0..50 {
            rules.on_effect(&mut world, DodgeEffect::RampUp);
        }
        assert_eq!(rules.spawn_interval(), 0.25);
    }

    #[test]
    fn test_player_moves_toward_pointer() {
        let (mut world, mut rules) = setup();
        let mut input = InputSampler::default();
        input.on_pointer_down(200.0, 100.0);
        let frame = FrameContext {
            dt: 0.05,
            elapsed_ms: 50.0,
            input: input.snapshot(),
        };
        tick(&mut world, &mut rules, &frame);
        let pos = world.entities.get(rules.player().unwrap()).unwrap().pos;
        assert!((pos - Vec2::new(200.0, 200.0 - PLAYER_SPEED * 0.05)).length() < 1e-3);
    }
}
