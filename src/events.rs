//! State-change notifications surfaced to the host UI
//!
//! The engine never persists anything itself; hosts subscribe with a
//! [`GameObserver`] and decide what to do with score and game-over events.

use serde::{Deserialize, Serialize};

use crate::sim::GameState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    StateChanged { from: GameState, to: GameState },
    ScoreChanged { delta: i64, total: u64 },
    LifeLost { remaining: u32 },
    GameOver { score: u64 },
}

/// Receives engine events in the order they happened
pub trait GameObserver {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F> GameObserver for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}
