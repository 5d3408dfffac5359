//! Fire-once delayed effects ("show message for 1.8s then continue")
//!
//! Every effect is stamped with the generation current at scheduling time.
//! `invalidate` bumps the generation, so effects queued before a reset are
//! dropped silently instead of firing into a new session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pending<E> {
    due_ms: f64,
    generation: u32,
    effect: E,
}

/// Queue of effects due at a simulated time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayedEffects<E> {
    pending: Vec<Pending<E>>,
    generation: u32,
    now_ms: f64,
}

impl<E> Default for DelayedEffects<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> DelayedEffects<E> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            generation: 0,
            now_ms: 0.0,
        }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Queue `effect` to fire `delay_s` seconds after the last polled time
    pub fn schedule(&mut self, delay_s: f32, effect: E) {
        let delay_ms = if delay_s.is_finite() {
            f64::from(delay_s.max(0.0) * 1000.0)
        } else {
            0.0
        };
        self.pending.push(Pending {
            due_ms: self.now_ms + delay_ms,
            generation: self.generation,
            effect,
        });
    }

    /// Take every effect due at `elapsed_ms`, in scheduling order
    pub fn poll(&mut self, elapsed_ms: f64) -> Vec<E> {
        self.now_ms = elapsed_ms;
        let generation = self.generation;

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            let p = &self.pending[i];
            if p.generation != generation {
                log::trace!("dropping stale delayed effect (generation {})", p.generation);
                self.pending.remove(i);
            } else if p.due_ms <= elapsed_ms {
                due.push(self.pending.remove(i).effect);
            } else {
                i += 1;
            }
        }
        due
    }

    /// Mark everything queued so far as stale and restart the time base.
    /// Stale entries are discarded on the next poll.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.now_ms = 0.0;
    }

    /// Live effects still waiting; stale ones are not counted
    pub fn len(&self) -> usize {
        self.pending
            .iter()
            .filter(|p| p.generation == self.generation)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_fires_once_when_due() {
        let mut timers = DelayedEffects::new();
        timers.schedule(1.8, "next ball");
        assert!(timers.poll(1000.0).is_empty());
        assert_eq!(timers.poll(1800.0), vec!["next ball"]);
        assert!(timers.poll(5000.0).is_empty());
    }

    #[test]
    fn test_delay_is_relative_to_last_poll() {
        let mut timers = DelayedEffects::new();
        timers.poll(500.0);
        timers.schedule(0.5, 1);
        assert!(timers.poll(900.0).is_empty());
        assert_eq!(timers.poll(1000.0), vec![1]);
    }

    #[test]
    fn test_invalidate_drops_stale_effects() {
        let mut timers = DelayedEffects::new();
        timers.schedule(0.1, "old");
        let before = timers.generation();
        timers.invalidate();
        assert_ne!(timers.generation(), before);
        assert!(timers.is_empty());
        timers.schedule(0.2, "new");
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.poll(1000.0), vec!["new"]);
    }

    #[test]
    fn test_decimal_delay_fires_on_the_exact_millisecond() {
        let mut timers = DelayedEffects::new();
        timers.schedule(0.1, "tenth");
        timers.schedule(0.3, "third");
        assert_eq!(timers.poll(100.0), vec!["tenth"]);
        assert_eq!(timers.poll(300.0), vec!["third"]);
    }

    #[test]
    fn test_multiple_due_keep_order() {
        let mut timers = DelayedEffects::new();
        timers.schedule(0.3, 'b');
        timers.schedule(0.1, 'a');
        timers.schedule(2.0, 'c');
        assert_eq!(timers.poll(500.0), vec!['b', 'a']);
        assert_eq!(timers.len(), 1);
    }
}
