//! Frame clock
//!
//! Turns raw frame timestamps (milliseconds, as delivered by the display
//! callback) into a clamped delta-time in seconds plus cumulative simulated
//! time. The clamp keeps a backgrounded tab from producing one huge step.

use crate::consts::DEFAULT_MAX_DT;

/// Output of one clock tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTick {
    /// Seconds to simulate, in `[0, max_dt]`
    pub dt: f32,
    /// Simulated milliseconds since the last reset
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone)]
pub struct Clock {
    max_dt: f32,
    last_ms: Option<f64>,
    elapsed_ms: f64,
    running: bool,
    frame_count: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DT)
    }
}

impl Clock {
    pub fn new(max_dt: f32) -> Self {
        let max_dt = if max_dt.is_finite() && max_dt > 0.0 {
            max_dt
        } else {
            log::warn!("invalid max_dt {}, using {}", max_dt, DEFAULT_MAX_DT);
            DEFAULT_MAX_DT
        };
        Self {
            max_dt,
            last_ms: None,
            elapsed_ms: 0.0,
            running: false,
            frame_count: 0,
        }
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Begin ticking with `timestamp_ms` as the baseline
    pub fn start(&mut self, timestamp_ms: f64) {
        self.running = true;
        self.last_ms = timestamp_ms.is_finite().then_some(timestamp_ms);
    }

    /// Compute the delta since the previous timestamp
    pub fn tick(&mut self, timestamp_ms: f64) -> ClockTick {
        if !self.running || !timestamp_ms.is_finite() {
            return self.current(0.0);
        }
        let dt = match self.last_ms {
            // First frame after start/rebase only establishes the baseline
            None => 0.0,
            Some(last) => self.clamp_dt(((timestamp_ms - last) / 1000.0) as f32),
        };
        self.last_ms = Some(match self.last_ms {
            Some(last) => last.max(timestamp_ms),
            None => timestamp_ms,
        });
        self.accumulate(dt)
    }

    /// Advance by an explicit number of seconds (fixed-interval driving, tests)
    pub fn step(&mut self, dt: f32) -> ClockTick {
        let dt = self.clamp_dt(dt);
        self.accumulate(dt)
    }

    /// Forget the baseline so the next tick yields zero dt (used on resume)
    pub fn rebase(&mut self) {
        self.last_ms = None;
    }

    /// Idempotent
    pub fn stop(&mut self) {
        self.running = false;
        self.last_ms = None;
    }

    /// Stop and zero the elapsed time
    pub fn reset(&mut self) {
        self.stop();
        self.elapsed_ms = 0.0;
        self.frame_count = 0;
    }

    /// Zero the elapsed time but keep running; the next tick sets a new
    /// baseline in whatever time base the caller is using
    pub fn restart(&mut self) {
        let running = self.running;
        self.reset();
        self.running = running;
    }

    fn clamp_dt(&self, dt: f32) -> f32 {
        if dt.is_finite() {
            dt.clamp(0.0, self.max_dt)
        } else {
            0.0
        }
    }

    fn accumulate(&mut self, dt: f32) -> ClockTick {
        self.elapsed_ms += f64::from(dt) * 1000.0;
        self.frame_count += 1;
        self.current(dt)
    }

    fn current(&self, dt: f32) -> ClockTick {
        ClockTick {
            dt,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// Milliseconds from the platform's wall clock
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Seed for runs that were not given one explicitly
pub fn entropy_seed() -> u64 {
    now_ms() as u64
}
