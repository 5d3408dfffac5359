//! End-to-end sessions driven the way a host drives them: a scheduler, a
//! fixed timer and a recording renderer around one `Engine`.

use arcade_loop::engine::{EventLog, SessionSummary};
use arcade_loop::games::{Breakout, BulletDodge, SliceDash};
use arcade_loop::platform::{FixedIntervalTimer, FrameLoop, ManualScheduler};
use arcade_loop::renderer::{Paint, RecordingRenderer};
use arcade_loop::sim::{
    BounceOutcome, CollisionPair, EntityDescriptor, FrameContext, GameState, Walls, World,
};
use arcade_loop::{BestScores, Engine, EngineConfig, GameEvent, GameRules};
use glam::Vec2;

fn seeded(seed: u64) -> EngineConfig {
    EngineConfig::default().with_seed(seed)
}

/// Run frames until the loop stops, the session ends or `max_ms` passes
fn drive<R>(engine: &mut Engine<R>, max_ms: f64) -> RecordingRenderer
where
    R: GameRules,
    R::Data: Paint,
{
    let mut timer = FixedIntervalTimer::new(16);
    let mut frame_loop = FrameLoop::new(ManualScheduler::new(timer.cadence()));
    let mut renderer = RecordingRenderer::new();

    engine.start(timer.next_timestamp());
    frame_loop.start();
    while let Some(generation) = frame_loop.scheduler_mut().take_pending() {
        if !frame_loop.accepts(generation) {
            continue;
        }
        let ts = timer.next_timestamp();
        let active = engine.frame(ts, Some(&mut renderer));
        frame_loop.frame_done(active && engine.state() != GameState::GameOver && ts < max_ms);
    }
    renderer
}

fn session<R>(rules: R, seed: u64, max_ms: f64) -> SessionSummary
where
    R: GameRules,
    R::Data: Paint,
{
    let mut engine = Engine::new(rules, seeded(seed));
    drive(&mut engine, max_ms);
    engine.summary()
}

#[test]
fn same_seed_replays_identically() {
    let a = session(BulletDodge::new(), 7, 20_000.0);
    let b = session(BulletDodge::new(), 7, 20_000.0);
    assert_eq!(a.score, b.score);
    assert_eq!(a.lives, b.lives);
    assert_eq!(a.ticks, b.ticks);
    assert_eq!(a.state, b.state);

    let a = session(Breakout::new(), 3, 10_000.0);
    let b = session(Breakout::new(), 3, 10_000.0);
    assert_eq!(a.score, b.score);
    assert_eq!(a.ticks, b.ticks);
}

#[test]
fn unattended_slice_dash_runs_out_of_lives() {
    let log = EventLog::default();
    let mut engine = Engine::new(SliceDash::new(), seeded(11)).with_observer(log.clone());
    let renderer = drive(&mut engine, 120_000.0);

    assert_eq!(engine.state(), GameState::GameOver);
    assert_eq!(engine.world().lives, 0);
    assert!(renderer.frames > 0);

    let events = log.take();
    let lost = events
        .iter()
        .filter(|e| matches!(e, GameEvent::LifeLost { .. }))
        .count();
    assert!(lost >= 3);
    assert!(matches!(events.last(), Some(GameEvent::GameOver { .. })));

    // A finished session stays put
    let frozen = engine.summary();
    engine.advance(0.05);
    assert!(engine.frame(1e9, None));
    assert_eq!(engine.summary().ticks, frozen.ticks);
}

#[test]
fn best_score_survives_a_lower_rerun() {
    let mut best = BestScores::new();
    assert!(!best.record("bullet_dodge", 0));

    let first = session(BulletDodge::new(), 5, 5_000.0);
    assert!(first.score > 0);
    assert!(best.record(first.game, first.score));
    assert!(!best.record(first.game, first.score / 2));
    assert_eq!(best.best("bullet_dodge"), Some(first.score));
}

#[test]
fn frames_are_clamped_across_a_long_pause_in_timestamps() {
    let mut engine = Engine::new(Breakout::new(), seeded(2));
    engine.start(0.0);
    engine.frame(0.0, None);
    engine.frame(60_000.0, None);
    assert!(engine.clock().elapsed_ms() <= f64::from(engine.config().max_dt) * 1000.0 + 1e-6);
}

#[test]
fn stop_then_start_continues_the_same_session() {
    let mut engine = Engine::new(BulletDodge::new(), seeded(9));
    let mut timer = FixedIntervalTimer::new(16);
    engine.start(timer.next_timestamp());
    for _ in 0..30 {
        engine.frame(timer.next_timestamp(), None);
    }
    engine.stop();
    let paused = engine.summary();
    assert_eq!(paused.state, GameState::Paused);
    assert!(!engine.frame(timer.next_timestamp(), None));

    engine.start(timer.next_timestamp() + 30_000.0);
    assert_eq!(engine.state(), GameState::Running);
    assert_eq!(engine.summary().ticks, paused.ticks);
    assert_eq!(engine.summary().score, paused.score);
}

/// Bouncing puck whose only rule is the wall budget
struct Puck;

impl GameRules for Puck {
    type Data = ();
    type Effect = ();

    fn name(&self) -> &'static str {
        "puck"
    }

    fn setup(&mut self, world: &mut World<()>) {
        world.lives = 1;
        world.entities.spawn(
            EntityDescriptor::circle(Vec2::new(50.0, 50.0), 5.0, ())
                .with_velocity(Vec2::new(1000.0, 0.0))
                .with_max_bounces(2),
        );
    }

    fn step(&mut self, world: &mut World<()>, _ctx: &FrameContext) {
        for (_, outcome) in world.bounce_off_walls(Walls::ALL, |_| true) {
            if outcome == BounceOutcome::Exhausted {
                world.lose_life();
            }
        }
    }

    fn resolve(&mut self, _world: &mut World<()>, _pairs: &[CollisionPair], _ctx: &FrameContext) {}

    fn is_terminal(&self, world: &World<()>) -> bool {
        world.lives == 0
    }
}

#[test]
fn bounce_budget_of_two_removes_on_third_contact() {
    let config = EngineConfig {
        logical_width: 100.0,
        logical_height: 100.0,
        ..seeded(1)
    };
    let mut engine = Engine::new(Puck, config);
    engine.start(0.0);

    let mut reflections = 0;
    let mut last_vx = 1000.0_f32;
    for _ in 0..200 {
        engine.advance(0.01);
        if let Some(puck) = engine.world().entities.as_slice().first() {
            if puck.is_active() && puck.vel.x.signum() != last_vx.signum() {
                reflections += 1;
                last_vx = puck.vel.x;
            }
        }
        if engine.state() == GameState::GameOver {
            break;
        }
    }

    assert_eq!(reflections, 2);
    assert_eq!(engine.state(), GameState::GameOver);
    assert_eq!(engine.world().entities.active_count(), 0);
}
