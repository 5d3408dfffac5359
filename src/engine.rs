//! Game loop engine
//!
//! One [`Engine`] per mounted game. Each scheduled frame callback runs one
//! tick: clock delta, input snapshot, simulation step, render, then event
//! dispatch. The host owns scheduling and calls [`Engine::frame`]; the engine
//! only reports whether another frame should be requested.

use serde::Serialize;

use crate::events::{GameEvent, GameObserver};
use crate::platform::input::InputSampler;
use crate::platform::time::{Clock, ClockTick, entropy_seed};
use crate::renderer::{FrameView, Renderer, SurfaceMetrics};
use crate::settings::EngineConfig;
use crate::sim::{self, Bounds, FrameContext, GameState, World};

pub use crate::sim::GameRules;

/// Serializable summary of a session, for logs and host UIs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub game: &'static str,
    pub state: GameState,
    pub score: u64,
    pub lives: u32,
    pub ticks: u64,
    pub elapsed_ms: f64,
    pub seed: u64,
    pub active_entities: usize,
}

pub struct Engine<R: GameRules> {
    config: EngineConfig,
    clock: Clock,
    input: InputSampler,
    world: World<R::Data, R::Effect>,
    rules: R,
    observer: Option<Box<dyn GameObserver>>,
    /// Whether frames are being requested (between start and stop)
    loop_active: bool,
    /// Paused by the page being hidden rather than by the player
    auto_paused: bool,
    /// `stop` was called and no `start` followed yet; nothing is drawn
    halted: bool,
    /// Consecutive frames the renderer failed
    render_failures: u32,
}

impl<R: GameRules> Engine<R> {
    pub fn new(rules: R, config: EngineConfig) -> Self {
        let config = config.validated();
        let seed = config.seed.unwrap_or_else(entropy_seed);
        let bounds = Bounds::from_size(config.logical_width, config.logical_height);
        let surface = SurfaceMetrics::new(config.logical_width, config.logical_height);

        let mut engine = Self {
            clock: Clock::new(config.max_dt),
            input: InputSampler::new(surface),
            world: World::new(bounds, seed, config.max_particles),
            rules,
            observer: None,
            loop_active: false,
            auto_paused: false,
            halted: false,
            render_failures: 0,
            config,
        };
        engine.populate();
        log::info!("{}: engine created (seed {})", engine.rules.name(), seed);
        engine
    }

    pub fn with_observer(mut self, observer: impl GameObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn set_observer(&mut self, observer: Box<dyn GameObserver>) {
        self.observer = Some(observer);
    }

    /// Begin the frame loop at `timestamp_ms`. Starts an Idle session or
    /// resumes a paused one; a finished session needs [`Engine::reset`].
    pub fn start(&mut self, timestamp_ms: f64) {
        match self.world.state {
            GameState::Idle => {
                self.world.start();
            }
            GameState::Paused => {
                self.world.resume();
            }
            GameState::Running | GameState::GameOver => {}
        }
        self.auto_paused = false;
        self.halted = false;
        self.clock.start(timestamp_ms);
        if !self.loop_active {
            self.loop_active = true;
            log::info!("{}: loop started", self.rules.name());
        }
        self.dispatch_events();
    }

    /// Stop the loop. A running session is paused so `start` can pick it up
    /// again. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.world.state == GameState::Running {
            self.world.pause();
        }
        self.clock.stop();
        self.input.clear();
        self.auto_paused = false;
        self.halted = true;
        if self.loop_active {
            self.loop_active = false;
            log::info!("{}: loop stopped", self.rules.name());
        }
        self.dispatch_events();
    }

    /// Back to Idle with a fresh world. The loop keeps running if it was, so
    /// the reset board is drawn.
    pub fn reset(&mut self) {
        let seed = self.config.seed.unwrap_or_else(entropy_seed);
        self.world.reset(seed);
        self.input.clear();
        self.clock.restart();
        self.auto_paused = false;
        self.render_failures = 0;
        self.populate();
        log::info!("{}: reset (seed {})", self.rules.name(), seed);
        self.dispatch_events();
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.world.pause();
        self.dispatch_events();
        paused
    }

    pub fn resume(&mut self) -> bool {
        let resumed = self.world.resume();
        if resumed {
            // The paused interval is not simulated
            self.clock.rebase();
        }
        self.dispatch_events();
        resumed
    }

    /// Page visibility changed. Held keys are dropped on hide since their
    /// key-up events will never arrive.
    pub fn on_visibility_change(&mut self, hidden: bool) {
        if hidden {
            self.input.clear();
            if self.config.pause_on_hidden && self.world.state == GameState::Running {
                self.auto_paused = self.world.pause();
                log::debug!("{}: auto-paused (hidden)", self.rules.name());
            }
        } else {
            if std::mem::take(&mut self.auto_paused) && self.loop_active {
                self.world.resume();
                log::debug!("{}: auto-resumed", self.rules.name());
            }
            self.clock.rebase();
        }
        self.dispatch_events();
    }

    /// Window lost focus
    pub fn on_blur(&mut self) {
        self.input.clear();
    }

    /// One scheduled frame at `timestamp_ms`. Returns whether the host
    /// should request another frame.
    pub fn frame(
        &mut self,
        timestamp_ms: f64,
        renderer: Option<&mut dyn Renderer<R::Data>>,
    ) -> bool {
        if !self.loop_active {
            return false;
        }

        if self.world.state.is_running() {
            let tick = self.clock.tick(timestamp_ms);
            self.step(tick);
        } else {
            // Nothing simulates, but edges must not pile up until start
            self.input.snapshot();
            self.clock.rebase();
        }

        if let Some(renderer) = renderer {
            self.render(renderer);
        }
        self.dispatch_events();
        self.loop_active
    }

    /// Simulate `dt` seconds (clamped) without a timestamp. No-op unless
    /// the session is Running.
    pub fn advance(&mut self, dt: f32) {
        if !self.world.state.is_running() {
            return;
        }
        let tick = self.clock.step(dt);
        self.step(tick);
        self.dispatch_events();
    }

    /// Draw the current state outside the loop (e.g. the board before the
    /// first `start`, or after a reset while running). Does nothing between
    /// `stop` and the next `start`. Failures are logged, never returned.
    pub fn render(&mut self, renderer: &mut dyn Renderer<R::Data>) {
        if self.halted {
            return;
        }
        let result = renderer.render(&self.view());
        match result {
            Ok(()) => {
                if self.render_failures > 0 {
                    log::info!("renderer recovered after {} failed frames", self.render_failures);
                }
                self.render_failures = 0;
            }
            Err(e) => {
                if self.render_failures == 0 {
                    log::warn!("skipping render: {}", e);
                }
                self.render_failures = self.render_failures.saturating_add(1);
            }
        }
    }

    pub fn view(&self) -> FrameView<'_, R::Data> {
        FrameView {
            state: self.world.state,
            entities: self.world.entities.as_slice(),
            particles: &self.world.particles,
            bounds: self.world.bounds,
            score: self.world.score,
            lives: self.world.lives,
            elapsed_ms: self.clock.elapsed_ms(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            game: self.rules.name(),
            state: self.world.state,
            score: self.world.score,
            lives: self.world.lives,
            ticks: self.world.time_ticks,
            elapsed_ms: self.clock.elapsed_ms(),
            seed: self.world.seed(),
            active_entities: self.world.entities.active_count(),
        }
    }

    /// Surface moved or resized on the page
    pub fn set_surface(&mut self, surface: SurfaceMetrics) {
        self.input.set_surface(surface);
    }

    pub fn surface(&self) -> &SurfaceMetrics {
        self.input.surface()
    }

    pub fn state(&self) -> GameState {
        self.world.state
    }

    pub fn is_loop_active(&self) -> bool {
        self.loop_active
    }

    pub fn render_failures(&self) -> u32 {
        self.render_failures
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn world(&self) -> &World<R::Data, R::Effect> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World<R::Data, R::Effect> {
        &mut self.world
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut R {
        &mut self.rules
    }

    /// Feed raw device events here
    pub fn input_mut(&mut self) -> &mut InputSampler {
        &mut self.input
    }

    fn populate(&mut self) {
        self.rules.setup(&mut self.world);
        if let Some(lives) = self.config.lives {
            self.world.lives = lives;
        }
    }

    fn step(&mut self, tick: ClockTick) {
        let ctx = FrameContext {
            dt: tick.dt,
            elapsed_ms: tick.elapsed_ms,
            input: self.input.snapshot(),
        };
        sim::tick(&mut self.world, &mut self.rules, &ctx);
    }

    fn dispatch_events(&mut self) {
        for event in self.world.drain_events() {
            log::debug!("{}: {:?}", self.rules.name(), event);
            if let Some(observer) = self.observer.as_mut() {
                observer.on_event(&event);
            }
        }
    }
}

impl<R: GameRules> std::fmt::Debug for Engine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("game", &self.rules.name())
            .field("state", &self.world.state)
            .field("loop_active", &self.loop_active)
            .field("elapsed_ms", &self.clock.elapsed_ms())
            .finish_non_exhaustive()
    }
}

/// Collects events into a shared buffer; handy for hosts that poll
#[derive(Debug, Clone, Default)]
pub struct EventLog(pub std::rc::Rc<std::cell::RefCell<Vec<GameEvent>>>);

impl EventLog {
    pub fn take(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl GameObserver for EventLog {
    fn on_event(&mut self, event: &GameEvent) {
        self.0.borrow_mut().push(event.clone());
    }
}
