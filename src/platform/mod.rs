//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time and frame scheduling
//! - Input events
//! - DOM listener lifetimes (web only)

pub mod input;
pub mod scheduler;
pub mod time;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{InputSampler, InputSnapshot, PointerState};
pub use scheduler::{Cadence, FixedIntervalTimer, FrameLoop, FrameScheduler, ManualScheduler};
pub use time::{Clock, ClockTick, entropy_seed, now_ms};
