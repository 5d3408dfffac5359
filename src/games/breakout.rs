//! Breakout: paddle, ball, brick wall
//!
//! The floor is open. Losing the ball costs a life and the next ball is
//! served after [`SERVE_DELAY`]. Clearing every brick also ends the run.

use glam::Vec2;
use rand::Rng;

use super::{LEFT_KEYS, RIGHT_KEYS};
use crate::renderer::Paint;
use crate::sim::{
    Axis, Bounds, Burst, CollisionPair, Entity, EntityDescriptor, EntityId, FrameContext,
    GameRules, Walls, World, reflect_velocity,
};

pub const START_LIVES: u32 = 3;
pub const PADDLE_WIDTH: f32 = 80.0;
pub const PADDLE_HEIGHT: f32 = 12.0;
const PADDLE_SPEED: f32 = 420.0;
/// Distance from the paddle's top edge to the floor
const PADDLE_FLOOR_GAP: f32 = 40.0;

pub const BALL_RADIUS: f32 = 6.0;
pub const BALL_SPEED: f32 = 320.0;
/// Largest serve/paddle deflection from vertical (radians)
const MAX_BOUNCE_ANGLE: f32 = 1.0;

const BRICK_COLS: usize = 8;
const BRICK_HEIGHT: f32 = 18.0;
const BRICK_GAP: f32 = 4.0;
const BRICK_TOP: f32 = 60.0;
const ROW_COLORS: [u32; 5] = [0xef5350, 0xffa726, 0xffee58, 0x66bb6a, 0x42a5f5];
pub const BRICK_POINTS: u64 = 10;

/// Seconds between a lost ball and the next serve
pub const SERVE_DELAY: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Piece {
    Paddle,
    Ball,
    Brick { color: u32 },
}

impl Paint for Piece {
    fn color(&self) -> u32 {
        match self {
            Piece::Paddle => 0xeceff1,
            Piece::Ball => 0xffffff,
            Piece::Brick { color } => *color,
        }
    }

    fn layer(&self) -> u8 {
        match self {
            Piece::Ball => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakoutEffect {
    ServeBall,
}

#[derive(Debug, Clone, Default)]
pub struct Breakout {
    paddle: Option<EntityId>,
    ball: Option<EntityId>,
}

impl Breakout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paddle(&self) -> Option<EntityId> {
        self.paddle
    }

    pub fn ball(&self) -> Option<EntityId> {
        self.ball
    }

    pub fn bricks_left(world: &World<Piece, BreakoutEffect>) -> usize {
        world
            .entities
            .iter()
            .filter(|e| e.is_active() && matches!(e.data, Piece::Brick { .. }))
            .count()
    }

    fn spawn_bricks(world: &mut World<Piece, BreakoutEffect>) {
        let b = world.bounds;
        let cols = BRICK_COLS as f32;
        let width = ((b.width() - BRICK_GAP * (cols + 1.0)) / cols).max(1.0);
        for (row, color) in ROW_COLORS.iter().enumerate() {
            for col in 0..BRICK_COLS {
                let pos = Vec2::new(
                    b.min.x + BRICK_GAP + col as f32 * (width + BRICK_GAP),
                    b.min.y + BRICK_TOP + row as f32 * (BRICK_HEIGHT + BRICK_GAP),
                );
                world.entities.spawn(EntityDescriptor::rect(
                    pos,
                    width,
                    BRICK_HEIGHT,
                    Piece::Brick { color: *color },
                ));
            }
        }
    }

    fn serve(&mut self, world: &mut World<Piece, BreakoutEffect>) {
        if self.ball.is_some() {
            return;
        }
        let Some(paddle) = self.paddle.and_then(|id| world.entities.get(id)) else {
            return;
        };
        let origin = paddle.pos + Vec2::new(PADDLE_WIDTH * 0.5, -BALL_RADIUS * 2.0);
        let angle = world.rng().random_range(-0.5..0.5) * MAX_BOUNCE_ANGLE;
        let vel = Vec2::new(angle.sin(), -angle.cos()) * BALL_SPEED;
        self.ball = Some(
            world.entities.spawn(
                EntityDescriptor::circle(origin, BALL_RADIUS, Piece::Ball).with_velocity(vel),
            ),
        );
        log::debug!("breakout: ball served");
    }
}

impl GameRules for Breakout {
    type Data = Piece;
    type Effect = BreakoutEffect;

    fn name(&self) -> &'static str {
        "breakout"
    }

    fn setup(&mut self, world: &mut World<Piece, BreakoutEffect>) {
        let b = world.bounds;
        world.lives = START_LIVES;
        self.ball = None;
        self.paddle = Some(world.entities.spawn(EntityDescriptor::rect(
            Vec2::new(
                b.min.x + (b.width() - PADDLE_WIDTH) * 0.5,
                b.max.y - PADDLE_FLOOR_GAP,
            ),
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
            Piece::Paddle,
        )));
        Self::spawn_bricks(world);
        world.timers.schedule(SERVE_DELAY, BreakoutEffect::ServeBall);
    }

    fn step(&mut self, world: &mut World<Piece, BreakoutEffect>, ctx: &FrameContext) {
        let bounds = world.bounds;

        if let Some(paddle) = self.paddle.and_then(|id| world.entities.get_mut(id)) {
            let axis = ctx.input.axis(LEFT_KEYS, RIGHT_KEYS);
            let pointer = ctx.input.pointer;
            let x = if axis == 0.0 && pointer.seen {
                pointer.pos.x - PADDLE_WIDTH * 0.5
            } else {
                paddle.pos.x + axis * PADDLE_SPEED * ctx.dt
            };
            paddle.pos.x = x.clamp(bounds.min.x, (bounds.max.x - PADDLE_WIDTH).max(bounds.min.x));
        }

        world.bounce_off_walls(Walls::NO_FLOOR, |e| e.data == Piece::Ball);

        if let Some(id) = self.ball {
            let lost = world
                .entities
                .get(id)
                .is_none_or(|ball| ball.pos.y - BALL_RADIUS > bounds.max.y);
            if lost {
                world.entities.mark_expired(id);
                self.ball = None;
                if world.lose_life() > 0 {
                    world.timers.schedule(SERVE_DELAY, BreakoutEffect::ServeBall);
                }
            }
        }
    }

    fn collides(&self, a: &Entity<Piece>, b: &Entity<Piece>) -> bool {
        a.data == Piece::Ball || b.data == Piece::Ball
    }

    fn resolve(
        &mut self,
        world: &mut World<Piece, BreakoutEffect>,
        pairs: &[CollisionPair],
        _ctx: &FrameContext,
    ) {
        let Some(ball_id) = self.ball else {
            return;
        };
        // One brick reflection per tick, even when the ball straddles two
        let mut reflected = false;

        for pair in pairs {
            let other = if pair.a == ball_id {
                pair.b
            } else if pair.b == ball_id {
                pair.a
            } else {
                continue;
            };
            let (Some(target), Some(ball)) =
                (world.entities.get(other), world.entities.get(ball_id))
            else {
                continue;
            };
            let (target_pos, target_size, piece) =
                (target.pos, target.shape().half_extents() * 2.0, target.data);
            let (ball_pos, ball_vel) = (ball.pos, ball.vel);

            match piece {
                Piece::Paddle => {
                    if ball_vel.y <= 0.0 {
                        continue;
                    }
                    // -1 at the paddle's left edge, +1 at its right edge
                    let half = target_size.x * 0.5;
                    let offset = ((ball_pos.x - (target_pos.x + half)) / half).clamp(-1.0, 1.0);
                    let angle = offset * MAX_BOUNCE_ANGLE;
                    let speed = ball_vel.length().max(BALL_SPEED);
                    if let Some(ball) = world.entities.get_mut(ball_id) {
                        ball.vel = Vec2::new(angle.sin(), -angle.cos()) * speed;
                    }
                }
                Piece::Brick { color } => {
                    if !reflected {
                        let over_face = ball_pos.x >= target_pos.x
                            && ball_pos.x <= target_pos.x + target_size.x;
                        let axis = if over_face { Axis::Vertical } else { Axis::Horizontal };
                        if let Some(ball) = world.entities.get_mut(ball_id) {
                            ball.vel = reflect_velocity(ball.vel, axis);
                        }
                        reflected = true;
                    }
                    world.entities.mark_expired(other);
                    world.add_score(BRICK_POINTS);
                    world.burst(
                        target_pos + target_size * 0.5,
                        &Burst {
                            count: 10,
                            color,
                            ..Burst::default()
                        },
                    );
                }
                Piece::Ball => {}
            }
        }
    }

    fn on_effect(&mut self, world: &mut World<Piece, BreakoutEffect>, effect: BreakoutEffect) {
        match effect {
            BreakoutEffect::ServeBall => self.serve(world),
        }
    }

    fn should_expire(&self, entity: &Entity<Piece>, bounds: &Bounds) -> bool {
        bounds.is_outside(entity.pos, entity.shape(), 100.0)
    }

    fn is_terminal(&self, world: &World<Piece, BreakoutEffect>) -> bool {
        world.lives == 0 || Self::bricks_left(world) == 0
    }
}
