//! Engine configuration
//!
//! Persisted in LocalStorage on the web so a tuned setup survives reloads.
//! Out-of-range values never fail a load; [`EngineConfig::validated`]
//! clamps them back into range with a warning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    DEFAULT_MAX_DT, DEFAULT_MAX_PARTICLES, DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH,
    FALLBACK_INTERVAL_MS,
};

/// Hard ceiling for the per-tick delta, however it is configured (seconds)
pub const MAX_DT_CEILING: f32 = 0.25;
/// Upper bound for the particle cap
pub const MAX_PARTICLES_CEILING: usize = 4096;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest dt simulated by one tick (seconds)
    pub max_dt: f32,
    /// Timer interval when display-synced frames are unavailable
    pub fallback_interval_ms: u32,
    /// Particle cap; 0 disables particles
    pub max_particles: usize,
    pub logical_width: f32,
    pub logical_height: f32,
    /// Fixed RNG seed; `None` seeds from the clock on every reset
    pub seed: Option<u64>,
    /// Pause automatically when the page is hidden
    pub pause_on_hidden: bool,
    /// Overrides the game's starting lives
    pub lives: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_dt: DEFAULT_MAX_DT,
            fallback_interval_ms: FALLBACK_INTERVAL_MS,
            max_particles: DEFAULT_MAX_PARTICLES,
            logical_width: DEFAULT_SURFACE_WIDTH,
            logical_height: DEFAULT_SURFACE_HEIGHT,
            seed: None,
            pause_on_hidden: true,
            lives: None,
        }
    }
}

impl EngineConfig {
    /// Parse JSON and reject values that cannot be clamped into meaning
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config.validated())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.logical_width = width;
        self.logical_height = height;
        self
    }

    /// NaN sizes are unrecoverable; everything else is clamped
    fn check(&self) -> Result<(), ConfigError> {
        if self.logical_width.is_nan() || self.logical_height.is_nan() {
            return Err(ConfigError::Invalid("surface size is NaN".into()));
        }
        if self.logical_width <= 0.0 || self.logical_height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "surface size must be positive, got {}x{}",
                self.logical_width, self.logical_height
            )));
        }
        Ok(())
    }

    /// Copy with every field pulled back into its usable range
    pub fn validated(&self) -> Self {
        let mut c = self.clone();

        if !(c.max_dt.is_finite() && c.max_dt > 0.0) {
            log::warn!("max_dt {} invalid, using {}", c.max_dt, DEFAULT_MAX_DT);
            c.max_dt = DEFAULT_MAX_DT;
        } else if c.max_dt > MAX_DT_CEILING {
            log::warn!("max_dt {} too large, clamping to {}", c.max_dt, MAX_DT_CEILING);
            c.max_dt = MAX_DT_CEILING;
        }

        if c.fallback_interval_ms == 0 {
            log::warn!("fallback_interval_ms 0, using {}", FALLBACK_INTERVAL_MS);
            c.fallback_interval_ms = FALLBACK_INTERVAL_MS;
        }

        if c.max_particles > MAX_PARTICLES_CEILING {
            log::warn!("max_particles {} clamped to {}", c.max_particles, MAX_PARTICLES_CEILING);
            c.max_particles = MAX_PARTICLES_CEILING;
        }

        if !(c.logical_width.is_finite() && c.logical_width > 0.0) {
            c.logical_width = DEFAULT_SURFACE_WIDTH;
        }
        if !(c.logical_height.is_finite() && c.logical_height > 0.0) {
            c.logical_height = DEFAULT_SURFACE_HEIGHT;
        }

        c
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "arcade_loop_config";

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded engine config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {}", e),
                }
            }
        }

        log::info!("Using default engine config");
        Self::default()
    }

    /// Save config to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Engine config saved");
                }
                Err(e) => log::warn!("Could not save config: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{"seed": 9, "max_particles": 10}"#).unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.max_particles, 10);
        assert_eq!(config.max_dt, DEFAULT_MAX_DT);
        assert!(config.pause_on_hidden);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_non_positive_size_is_invalid() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"logical_width": 0.0}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_validated_clamps() {
        let config = EngineConfig {
            max_dt: 3.0,
            fallback_interval_ms: 0,
            max_particles: usize::MAX,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.max_dt, MAX_DT_CEILING);
        assert_eq!(config.fallback_interval_ms, FALLBACK_INTERVAL_MS);
        assert_eq!(config.max_particles, MAX_PARTICLES_CEILING);

        let config = EngineConfig {
            max_dt: -1.0,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.max_dt, DEFAULT_MAX_DT);
    }

    #[test]
    fn test_json_survives_save_format() {
        let config = EngineConfig::default().with_seed(3).with_size(320.0, 240.0);
        let back = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
