//! Arcade Loop - a real-time 2D arcade game loop engine
//!
//! Core modules:
//! - `platform`: Clock, frame scheduling and input sampling
//! - `sim`: Entities, particles, collision utilities and the session state machine
//! - `engine`: Composes the stages into one frame tick per scheduled callback
//! - `renderer`: Read-only renderer contract and high-DPI surface handling
//! - `games`: Rule sets for the bundled arcade games
//! - `settings`: Engine configuration
//! - `highscores`: Best score per game

pub mod engine;
pub mod events;
pub mod games;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use engine::{Engine, GameRules};
pub use events::{GameEvent, GameObserver};
pub use highscores::BestScores;
pub use settings::EngineConfig;

/// Engine configuration constants
pub mod consts {
    /// Largest delta-time a single tick may simulate (seconds)
    pub const DEFAULT_MAX_DT: f32 = 0.05;
    /// Timer interval used when display-synced scheduling is unavailable
    pub const FALLBACK_INTERVAL_MS: u32 = 16;
    /// Default particle cap per world
    pub const DEFAULT_MAX_PARTICLES: usize = 256;

    /// Default logical surface size (device-independent pixels)
    pub const DEFAULT_SURFACE_WIDTH: f32 = 480.0;
    pub const DEFAULT_SURFACE_HEIGHT: f32 = 640.0;
}
