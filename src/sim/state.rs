//! Session state machine
//!
//! `Idle -[start]-> Running -[terminal]-> GameOver -[reset]-> Idle`, with
//! `Running <-> Paused` via explicit pause/resume.

use serde::{Deserialize, Serialize};

/// Current state of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Mounted, waiting for `start`
    #[default]
    Idle,
    /// Active gameplay; the only state in which the simulation step runs
    Running,
    /// Stopped by explicit user action (or visibility loss)
    Paused,
    /// Run ended by a terminal condition
    GameOver,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "Idle",
            GameState::Running => "Running",
            GameState::Paused => "Paused",
            GameState::GameOver => "GameOver",
        }
    }

    pub fn is_running(&self) -> bool {
        *self == GameState::Running
    }

    /// Idle -> Running
    pub fn start(&mut self) -> bool {
        self.transition(GameState::Idle, GameState::Running)
    }

    /// Running -> Paused
    pub fn pause(&mut self) -> bool {
        self.transition(GameState::Running, GameState::Paused)
    }

    /// Paused -> Running
    pub fn resume(&mut self) -> bool {
        self.transition(GameState::Paused, GameState::Running)
    }

    /// Running -> GameOver
    pub fn finish(&mut self) -> bool {
        self.transition(GameState::Running, GameState::GameOver)
    }

    /// Any state -> Idle. Returns false if already idle.
    pub fn reset(&mut self) -> bool {
        if *self == GameState::Idle {
            return false;
        }
        log::debug!("state {} -> Idle (reset)", self.as_str());
        *self = GameState::Idle;
        true
    }

    fn transition(&mut self, from: GameState, to: GameState) -> bool {
        if *self != from {
            log::debug!(
                "ignored transition {} -> {} (current {})",
                from.as_str(),
                to.as_str(),
                self.as_str()
            );
            return false;
        }
        log::debug!("state {} -> {}", from.as_str(), to.as_str());
        *self = to;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_session_cycle() {
        let mut state = GameState::default();
        assert_eq!(state, GameState::Idle);
        assert!(state.start());
        assert!(state.pause());
        assert!(state.resume());
        assert!(state.finish());
        assert_eq!(state, GameState::GameOver);
        assert!(state.reset());
        assert_eq!(state, GameState::Idle);
    }

    #[test]
    fn test_invalid_transitions_are_ignored() {
        let mut state = GameState::Idle;
        assert!(!state.pause());
        assert!(!state.finish());
        assert!(!state.resume());
        assert_eq!(state, GameState::Idle);

        state.start();
        // Running only leaves for Idle through reset
        assert!(!state.start());
        assert_eq!(state, GameState::Running);

        state.finish();
        assert!(!state.resume());
        assert!(!state.start());
        assert_eq!(state, GameState::GameOver);
    }

    #[test]
    fn test_reset_from_idle_is_noop() {
        let mut state = GameState::Idle;
        assert!(!state.reset());
    }
}
