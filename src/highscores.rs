//! Best score per game
//!
//! One integer per game name, persisted to LocalStorage on the web.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::events::{GameEvent, GameObserver};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BestScores {
    pub scores: BTreeMap<String, u64>,
}

impl BestScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "arcade_loop_best_scores";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self, game: &str) -> Option<u64> {
        self.scores.get(game).copied()
    }

    /// Record a finished run. Returns true when it is a new best.
    pub fn record(&mut self, game: &str, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        match self.scores.get_mut(game) {
            Some(best) if *best >= score => false,
            Some(best) => {
                *best = score;
                true
            }
            None => {
                self.scores.insert(game.to_owned(), score);
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Observer that records every game-over score for `game` and persists
    /// new bests
    pub fn tracker(game: &'static str) -> BestScoreTracker {
        BestScoreTracker {
            game,
            scores: Self::load(),
        }
    }

    /// Load best scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(scores) = serde_json::from_str::<BestScores>(&json) {
                    log::info!("Loaded best scores for {} games", scores.scores.len());
                    return scores;
                }
            }
        }

        log::info!("No best scores found, starting fresh");
        Self::new()
    }

    /// Save best scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Best scores saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// See [`BestScores::tracker`]
#[derive(Debug, Clone)]
pub struct BestScoreTracker {
    game: &'static str,
    scores: BestScores,
}

impl BestScoreTracker {
    pub fn best(&self) -> Option<u64> {
        self.scores.best(self.game)
    }
}

impl GameObserver for BestScoreTracker {
    fn on_event(&mut self, event: &GameEvent) {
        if let GameEvent::GameOver { score } = event {
            if self.scores.record(self.game, *score) {
                log::info!("{}: new best score {}", self.game, score);
                self.scores.save();
            }
        }
    }
}
