//! Browser plumbing
//!
//! [`RafScheduler`] drives frames with `requestAnimationFrame`, dropping to a
//! fixed `setInterval` when that is unavailable. [`ListenerSet`] owns DOM
//! listeners so they can be detached again; nothing here leaks closures.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, Window};

use super::scheduler::{Cadence, FrameScheduler};

/// Milliseconds on the same time base as `requestAnimationFrame` timestamps
pub fn performance_now(window: &Window) -> f64 {
    window
        .performance()
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handle {
    Raf(i32),
    Interval(i32),
}

pub struct RafScheduler {
    window: Window,
    on_frame: Closure<dyn FnMut(f64)>,
    on_interval: Closure<dyn FnMut()>,
    handle: Option<Handle>,
    /// Loop generation of the latest request, read back by the callbacks
    stamp: Rc<Cell<u32>>,
    interval_ms: u32,
    /// Set once rAF failed; the interval is used from then on
    fell_back: bool,
}

impl RafScheduler {
    /// `frame` receives each frame's timestamp in milliseconds and the loop
    /// generation the frame was requested under
    pub fn new(window: Window, interval_ms: u32, frame: Rc<dyn Fn(f64, u32)>) -> Self {
        let stamp = Rc::new(Cell::new(0));
        let on_frame = {
            let frame = frame.clone();
            let stamp = stamp.clone();
            Closure::<dyn FnMut(f64)>::new(move |ts: f64| frame(ts, stamp.get()))
        };
        let on_interval = {
            let window = window.clone();
            let stamp = stamp.clone();
            Closure::<dyn FnMut()>::new(move || frame(performance_now(&window), stamp.get()))
        };
        Self {
            window,
            on_frame,
            on_interval,
            handle: None,
            stamp,
            interval_ms: interval_ms.max(1),
            fell_back: false,
        }
    }

    /// Call at the top of every callback: a fired rAF request is spent,
    /// an interval keeps running
    pub fn fired(&mut self) {
        if matches!(self.handle, Some(Handle::Raf(_))) {
            self.handle = None;
        }
    }

    fn request_interval(&mut self) {
        if matches!(self.handle, Some(Handle::Interval(_))) {
            return;
        }
        let timeout = i32::try_from(self.interval_ms).unwrap_or(i32::MAX);
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                self.on_interval.as_ref().unchecked_ref(),
                timeout,
            ) {
            Ok(id) => self.handle = Some(Handle::Interval(id)),
            Err(e) => log::error!("no frame scheduling available: {:?}", e),
        }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self, generation: u32) -> Cadence {
        self.stamp.set(generation);
        if !self.fell_back {
            match self
                .window
                .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
            {
                Ok(id) => {
                    self.handle = Some(Handle::Raf(id));
                    return Cadence::DisplaySync;
                }
                Err(e) => {
                    log::warn!(
                        "requestAnimationFrame failed ({:?}), using a {}ms timer",
                        e,
                        self.interval_ms
                    );
                    self.fell_back = true;
                }
            }
        }
        self.request_interval();
        Cadence::FixedInterval {
            interval_ms: self.interval_ms,
        }
    }

    fn cancel(&mut self) {
        match self.handle.take() {
            Some(Handle::Raf(id)) => {
                let _ = self.window.cancel_animation_frame(id);
            }
            Some(Handle::Interval(id)) => self.window.clear_interval_with_handle(id),
            None => {}
        }
    }

    fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// DOM listeners scoped to one game instance
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<(EventTarget, &'static str, Closure<dyn FnMut(Event)>)>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, target: &EventTarget, event: &'static str, handler: F)
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        match target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
            Ok(()) => self.listeners.push((target.clone(), event, closure)),
            Err(e) => log::warn!("could not listen for {}: {:?}", event, e),
        }
    }

    /// Detach everything; idempotent
    pub fn clear(&mut self) {
        for (target, event, closure) in self.listeners.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        self.clear();
    }
}
