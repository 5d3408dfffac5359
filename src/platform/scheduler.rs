//! Frame scheduling
//!
//! A [`FrameScheduler`] asks the platform for the next frame callback. The
//! browser implementation lives in `platform::web`; the headless ones here
//! are driven by the host (tests, native demo).
//!
//! [`FrameLoop`] pairs a scheduler with a loop generation so that once
//! `stop` returns, callbacks that were already in flight are recognised as
//! stale and ignored.

use crate::consts::FALLBACK_INTERVAL_MS;

/// How frames are being delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Display refresh (requestAnimationFrame)
    DisplaySync,
    /// Fixed timer fallback
    FixedInterval { interval_ms: u32 },
}

pub trait FrameScheduler {
    /// Ask for one more frame callback. The callback must hand `generation`
    /// back so the loop can tell a stale delivery from a live one.
    fn request_frame(&mut self, generation: u32) -> Cadence;
    /// Cancel the pending callback, if any. Must be idempotent.
    fn cancel(&mut self);
    fn is_pending(&self) -> bool;
}

/// Owns a scheduler and the loop generation used to reject stale callbacks
#[derive(Debug)]
pub struct FrameLoop<S: FrameScheduler> {
    scheduler: S,
    generation: u32,
    active: bool,
}

impl<S: FrameScheduler> FrameLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            generation: 0,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Start requesting frames. Returns the new loop generation.
    pub fn start(&mut self) -> u32 {
        if !self.active {
            self.active = true;
            self.generation = self.generation.wrapping_add(1);
            let cadence = self.scheduler.request_frame(self.generation);
            log::debug!("frame loop {} started ({:?})", self.generation, cadence);
        }
        self.generation
    }

    /// Cancel the pending callback; safe to call repeatedly
    pub fn stop(&mut self) {
        self.scheduler.cancel();
        if self.active {
            self.active = false;
            self.generation = self.generation.wrapping_add(1);
            log::debug!("frame loop stopped");
        }
    }

    /// Whether a callback stamped with `generation` should still run
    pub fn accepts(&self, generation: u32) -> bool {
        self.active && generation == self.generation
    }

    /// Schedule the next frame after a callback finished
    pub fn frame_done(&mut self, keep_going: bool) {
        if self.active && keep_going {
            self.scheduler.request_frame(self.generation);
        } else if !keep_going {
            self.stop();
        }
    }
}

/// Host-pumped scheduler: records requests, the host delivers timestamps
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    cadence: Cadence,
    pending: Option<u32>,
    requests: u64,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new(Cadence::DisplaySync)
    }
}

impl ManualScheduler {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            pending: None,
            requests: 0,
        }
    }

    /// Consume the pending request, returning the generation it was
    /// stamped with
    pub fn take_pending(&mut self) -> Option<u32> {
        self.pending.take()
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self, generation: u32) -> Cadence {
        self.pending = Some(generation);
        self.requests += 1;
        self.cadence
    }

    fn cancel(&mut self) {
        self.pending = None;
    }

    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Timestamps for the fixed-interval fallback
#[derive(Debug, Clone)]
pub struct FixedIntervalTimer {
    interval_ms: u32,
    next_ms: f64,
}

impl Default for FixedIntervalTimer {
    fn default() -> Self {
        Self::new(FALLBACK_INTERVAL_MS)
    }
}

impl FixedIntervalTimer {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_ms: 0.0,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn cadence(&self) -> Cadence {
        Cadence::FixedInterval {
            interval_ms: self.interval_ms,
        }
    }

    /// Next synthetic frame timestamp
    pub fn next_timestamp(&mut self) -> f64 {
        let now = self.next_ms;
        self.next_ms += f64::from(self.interval_ms);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_rejects_in_flight_callbacks() {
        let mut frame_loop = FrameLoop::new(ManualScheduler::default());
        let generation = frame_loop.start();
        assert!(frame_loop.scheduler().is_pending());
        assert!(frame_loop.accepts(generation));

        frame_loop.stop();
        assert!(!frame_loop.scheduler().is_pending());
        assert!(!frame_loop.accepts(generation));

        // Restart issues a new generation; the old callback stays stale
        let restarted = frame_loop.start();
        assert_ne!(generation, restarted);
        assert!(!frame_loop.accepts(generation));
        assert!(frame_loop.accepts(restarted));
    }

    #[test]
    fn test_requests_carry_the_loop_generation() {
        let mut frame_loop = FrameLoop::new(ManualScheduler::default());
        let first = frame_loop.start();
        let stale = frame_loop.scheduler_mut().take_pending();
        assert_eq!(stale, Some(first));

        // The delivery lands after a stop/start cycle
        frame_loop.stop();
        let second = frame_loop.start();
        assert!(!stale.is_some_and(|g| frame_loop.accepts(g)));

        let live = frame_loop.scheduler_mut().take_pending();
        assert_eq!(live, Some(second));
        assert!(live.is_some_and(|g| frame_loop.accepts(g)));
        frame_loop.frame_done(true);
        assert_eq!(frame_loop.scheduler_mut().take_pending(), Some(second));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut frame_loop = FrameLoop::new(ManualScheduler::default());
        frame_loop.stop();
        frame_loop.start();
        frame_loop.stop();
        let generation = frame_loop.generation();
        frame_loop.stop();
        assert_eq!(frame_loop.generation(), generation);
        assert!(!frame_loop.is_active());
    }

    #[test]
    fn test_frame_done_reschedules() {
        let mut frame_loop = FrameLoop::new(ManualScheduler::default());
        frame_loop.start();
        assert!(frame_loop.scheduler_mut().take_pending().is_some());
        frame_loop.frame_done(true);
        assert!(frame_loop.scheduler_mut().take_pending().is_some());
        assert_eq!(frame_loop.scheduler().requests(), 2);

        frame_loop.frame_done(false);
        assert!(!frame_loop.is_active());
        assert!(!frame_loop.scheduler().is_pending());
    }

    #[test]
    fn test_start_twice_keeps_one_request() {
        let mut frame_loop = FrameLoop::new(ManualScheduler::default());
        let a = frame_loop.start();
        let b = frame_loop.start();
        assert_eq!(a, b);
        assert_eq!(frame_loop.scheduler().requests(), 1);
    }

    #[test]
    fn test_fixed_interval_timestamps() {
        let mut timer = FixedIntervalTimer::new(0);
        assert_eq!(timer.interval_ms(), 1);
        let mut timer = FixedIntervalTimer::default();
        assert_eq!(timer.next_timestamp(), 0.0);
        assert_eq!(timer.next_timestamp(), 16.0);
        assert_eq!(
            timer.cadence(),
            Cadence::FixedInterval {
                interval_ms: FALLBACK_INTERVAL_MS
            }
        );
    }
}
