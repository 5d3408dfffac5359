//! Arcade Loop entry point
//!
//! Web: mounts the selected game (`?game=breakout|bullet_dodge|slice_dash`)
//! on `#canvas` and wires the `#start`, `#stop` and `#reset` buttons.
//! Native: runs a game headless on a fixed timer and prints the session
//! summary as JSON.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_host {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent,
        VisibilityState, Window,
    };

    use arcade_loop::games::{Breakout, BulletDodge, GameKind, SliceDash};
    use arcade_loop::platform::FrameLoop;
    use arcade_loop::platform::web::{ListenerSet, RafScheduler, performance_now};
    use arcade_loop::renderer::canvas::Canvas2dRenderer;
    use arcade_loop::renderer::{Paint, SurfaceMetrics, ViewportRect};
    use arcade_loop::{BestScores, Engine, EngineConfig, GameRules};

    /// Keys whose default browser action (scrolling) is suppressed
    const CAPTURED_KEYS: &[&str] = &["ArrowLeft", "ArrowRight", "ArrowUp", "ArrowDown", "Space"];

    /// Lifecycle of whichever game is mounted
    trait Controls {
        fn start(&self);
        fn stop(&self);
        fn reset(&self);
    }

    /// Everything one mounted game owns
    struct Host<R: GameRules> {
        window: Window,
        document: Document,
        canvas: HtmlCanvasElement,
        engine: Engine<R>,
        renderer: Canvas2dRenderer,
        frame_loop: FrameLoop<RafScheduler>,
        listeners: ListenerSet,
    }

    struct WebGame<R: GameRules> {
        host: Rc<RefCell<Host<R>>>,
    }

    fn with_engine<R: GameRules>(weak: &Weak<RefCell<Host<R>>>, f: impl FnOnce(&mut Engine<R>)) {
        if let Some(rc) = weak.upgrade() {
            if let Ok(mut host) = rc.try_borrow_mut() {
                f(&mut host.engine);
            }
        }
    }

    /// Call `f(id, x, y)` for every touch that changed in `event`
    fn for_each_touch(event: &Event, mut f: impl FnMut(i32, f32, f32)) {
        let Some(touch_event) = event.dyn_ref::<TouchEvent>() else {
            return;
        };
        // Keeps the browser from scrolling and synthesizing mouse events
        event.prevent_default();
        let touches = touch_event.changed_touches();
        for i in 0..touches.length() {
            if let Some(t) = touches.get(i) {
                f(t.identifier(), t.client_x() as f32, t.client_y() as f32);
            }
        }
    }

    impl<R> Host<R>
    where
        R: GameRules + 'static,
        R::Data: Paint + 'static,
        R::Effect: 'static,
    {
        fn on_frame(weak: &Weak<RefCell<Self>>, timestamp_ms: f64, generation: u32) {
            let Some(rc) = weak.upgrade() else {
                return;
            };
            let Ok(mut host) = rc.try_borrow_mut() else {
                log::warn!("frame callback while host is busy, skipping");
                return;
            };
            host.frame(timestamp_ms, generation);
        }

        fn frame(&mut self, timestamp_ms: f64, generation: u32) {
            self.frame_loop.scheduler_mut().fired();
            if !self.frame_loop.accepts(generation) {
                log::trace!("dropping frame from loop generation {}", generation);
                return;
            }
            self.sync_surface();
            let keep_going = self.engine.frame(timestamp_ms, Some(&mut self.renderer));
            self.frame_loop.frame_done(keep_going);
        }

        /// Pick up layout and devicePixelRatio changes
        fn sync_surface(&mut self) {
            let rect = self.canvas.get_bounding_client_rect();
            let logical = self.engine.surface().logical;
            let metrics = SurfaceMetrics::new(logical.x, logical.y)
                .with_rect(ViewportRect {
                    left: rect.left() as f32,
                    top: rect.top() as f32,
                    width: rect.width() as f32,
                    height: rect.height() as f32,
                })
                .with_device_pixel_ratio(self.window.device_pixel_ratio() as f32);
            self.engine.set_surface(metrics);
            self.renderer.set_metrics(metrics);
        }

        /// One paint outside the frame loop; the engine ignores it while
        /// stopped
        fn redraw(&mut self) {
            self.sync_surface();
            self.engine.render(&mut self.renderer);
        }

        fn attach_listeners(rc: &Rc<RefCell<Self>>) {
            let weak = Rc::downgrade(rc);
            let mut host = rc.borrow_mut();
            if !host.listeners.is_empty() {
                return;
            }
            let window: EventTarget = host.window.clone().into();
            let canvas: EventTarget = host.canvas.clone().into();
            let document = host.document.clone();
            let document_target: EventTarget = document.clone().into();
            let listeners = &mut host.listeners;

            let w = weak.clone();
            listeners.add(&window, "keydown", move |event: Event| {
                let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let code = key.code();
                if CAPTURED_KEYS.contains(&code.as_str()) {
                    event.prevent_default();
                }
                with_engine(&w, |engine| engine.input_mut().on_key_down(&code));
            });

            let w = weak.clone();
            listeners.add(&window, "keyup", move |event: Event| {
                if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                    let code = key.code();
                    with_engine(&w, |engine| engine.input_mut().on_key_up(&code));
                }
            });

            let w = weak.clone();
            listeners.add(&window, "blur", move |_event: Event| {
                with_engine(&w, |engine| engine.on_blur());
            });

            let w = weak.clone();
            listeners.add(&document_target, "visibilitychange", move |_event: Event| {
                let hidden = document.visibility_state() == VisibilityState::Hidden;
                with_engine(&w, |engine| engine.on_visibility_change(hidden));
            });

            let w = weak.clone();
            listeners.add(&canvas, "mousemove", move |event: Event| {
                if let Some(m) = event.dyn_ref::<MouseEvent>() {
                    let (x, y) = (m.client_x() as f32, m.client_y() as f32);
                    with_engine(&w, |engine| engine.input_mut().on_pointer_move(x, y));
                }
            });

            let w = weak.clone();
            listeners.add(&canvas, "mousedown", move |event: Event| {
                if let Some(m) = event.dyn_ref::<MouseEvent>() {
                    let (x, y) = (m.client_x() as f32, m.client_y() as f32);
                    with_engine(&w, |engine| engine.input_mut().on_pointer_down(x, y));
                }
            });

            // On the window so a release outside the canvas still lands
            let w = weak.clone();
            listeners.add(&window, "mouseup", move |event: Event| {
                if let Some(m) = event.dyn_ref::<MouseEvent>() {
                    let (x, y) = (m.client_x() as f32, m.client_y() as f32);
                    with_engine(&w, |engine| engine.input_mut().on_pointer_up(x, y));
                }
            });

            let w = weak.clone();
            listeners.add(&canvas, "touchstart", move |event: Event| {
                for_each_touch(&event, |id, x, y| {
                    with_engine(&w, |engine| engine.input_mut().on_touch_start(id, x, y));
                });
            });

            let w = weak.clone();
            listeners.add(&canvas, "touchmove", move |event: Event| {
                for_each_touch(&event, |id, x, y| {
                    with_engine(&w, |engine| engine.input_mut().on_touch_move(id, x, y));
                });
            });

            for name in ["touchend", "touchcancel"] {
                let w = weak.clone();
                listeners.add(&canvas, name, move |event: Event| {
                    for_each_touch(&event, |id, x, y| {
                        with_engine(&w, |engine| engine.input_mut().on_touch_end(id, x, y));
                    });
                });
            }

            log::debug!("{} listeners attached", listeners.len());
        }
    }

    impl<R> WebGame<R>
    where
        R: GameRules + 'static,
        R::Data: Paint + 'static,
        R::Effect: 'static,
    {
        fn mount(
            window: &Window,
            canvas: HtmlCanvasElement,
            rules: R,
            config: EngineConfig,
        ) -> Result<Self, JsValue> {
            let document = window
                .document()
                .ok_or_else(|| JsValue::from_str("no document"))?;
            let game = rules.name();
            let engine = Engine::new(rules, config).with_observer(BestScores::tracker(game));
            let metrics = *engine.surface();
            let interval_ms = engine.config().fallback_interval_ms;

            let host = Rc::new_cyclic(|weak: &Weak<RefCell<Host<R>>>| {
                let weak = weak.clone();
                let on_frame: Rc<dyn Fn(f64, u32)> =
                    Rc::new(move |ts, generation| Host::on_frame(&weak, ts, generation));
                RefCell::new(Host {
                    window: window.clone(),
                    document,
                    renderer: Canvas2dRenderer::new(canvas.clone(), metrics),
                    canvas,
                    engine,
                    frame_loop: FrameLoop::new(RafScheduler::new(
                        window.clone(),
                        interval_ms,
                        on_frame,
                    )),
                    listeners: ListenerSet::new(),
                })
            });
            host.borrow_mut().redraw();
            log::info!("{} mounted", game);
            Ok(Self { host })
        }
    }

    impl<R> Controls for WebGame<R>
    where
        R: GameRules + 'static,
        R::Data: Paint + 'static,
        R::Effect: 'static,
    {
        fn start(&self) {
            Host::attach_listeners(&self.host);
            let mut host = self.host.borrow_mut();
            let now = performance_now(&host.window);
            host.engine.start(now);
            host.frame_loop.start();
        }

        fn stop(&self) {
            let mut host = self.host.borrow_mut();
            host.frame_loop.stop();
            host.listeners.clear();
            host.engine.stop();
        }

        fn reset(&self) {
            let mut host = self.host.borrow_mut();
            host.engine.reset();
            host.redraw();
        }
    }

    /// `?game=` query parameter, defaulting to Breakout
    fn selected_game(window: &Window) -> GameKind {
        window
            .location()
            .search()
            .ok()
            .and_then(|query| {
                query
                    .trim_start_matches('?')
                    .split('&')
                    .find_map(|pair| pair.strip_prefix("game=").and_then(GameKind::from_name))
            })
            .unwrap_or_default()
    }

    fn bind_button(document: &Document, id: &str, action: impl Fn() + 'static) {
        let Some(button) = document.get_element_by_id(id) else {
            log::warn!("no #{} button, control unavailable", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| action());
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        // Buttons live as long as the page
        closure.forget();
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no #canvas element"))?
            .dyn_into()
            .map_err(|_| JsValue::from_str("#canvas is not a canvas"))?;

        let kind = selected_game(&window);
        let config = EngineConfig::load();
        log::info!("Arcade Loop starting {}", kind.name());

        let controls: Rc<dyn Controls> = match kind {
            GameKind::Breakout => {
                Rc::new(WebGame::mount(&window, canvas, Breakout::new(), config)?)
            }
            GameKind::BulletDodge => {
                Rc::new(WebGame::mount(&window, canvas, BulletDodge::new(), config)?)
            }
            GameKind::SliceDash => {
                Rc::new(WebGame::mount(&window, canvas, SliceDash::new(), config)?)
            }
        };

        let c = controls.clone();
        bind_button(&document, "start", move || c.start());
        let c = controls.clone();
        bind_button(&document, "stop", move || c.stop());
        bind_button(&document, "reset", move || controls.reset());

        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    web_host::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use arcade_loop::engine::SessionSummary;
    use arcade_loop::platform::{FixedIntervalTimer, FrameLoop, ManualScheduler};
    use arcade_loop::renderer::{Paint, RecordingRenderer};
    use arcade_loop::sim::GameState;
    use arcade_loop::{Engine, EngineConfig, GameEvent, GameRules};

    /// Drive one session on a fixed timer until game over or `max_seconds`
    /// of frame time
    pub fn run<R>(rules: R, config: EngineConfig, max_seconds: f64) -> SessionSummary
    where
        R: GameRules,
        R::Data: Paint,
    {
        let game = rules.name();
        let mut engine = Engine::new(rules, config).with_observer(move |event: &GameEvent| {
            if let GameEvent::GameOver { score } = event {
                log::info!("{}: game over, score {}", game, score);
            }
        });

        let mut timer = FixedIntervalTimer::new(engine.config().fallback_interval_ms);
        let mut frame_loop = FrameLoop::new(ManualScheduler::new(timer.cadence()));
        let mut renderer = RecordingRenderer::new();
        let max_ms = max_seconds * 1000.0;

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
        engine.stop();

        log::info!(
            "{}: {} frames rendered, {} draw commands in the last",
            game,
            renderer.frames,
            renderer.last.len()
        );
        engine.summary()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use arcade_loop::EngineConfig;
    use arcade_loop::games::{Breakout, BulletDodge, GameKind, SliceDash};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let kind = match args.next() {
        None => GameKind::default(),
        Some(name) => match GameKind::from_name(&name) {
            Some(kind) => kind,
            None => {
                log::error!(
                    "unknown game '{}', expected breakout, bullet_dodge or slice_dash",
                    name
                );
                std::process::exit(2);
            }
        },
    };
    let max_seconds = args.next().and_then(|s| s.parse::<f64>().ok()).unwrap_or(120.0);
    let config = EngineConfig::load();

    log::info!("Arcade Loop (native, headless) running {} for up to {}s", kind.name(), max_seconds);
    let summary = match kind {
        GameKind::Breakout => headless::run(Breakout::new(), config, max_seconds),
        GameKind::BulletDodge => headless::run(BulletDodge::new(), config, max_seconds),
        GameKind::SliceDash => headless::run(SliceDash::new(), config, max_seconds),
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("could not serialize summary: {}", e),
    }
}
