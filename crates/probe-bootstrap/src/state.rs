//! The one-way load gate.

use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether the agent has started.
///
/// Moves from not-started to started exactly once; there is no way back.
#[derive(Debug, Default)]
pub struct LoadState {
    started: AtomicBool,
}

impl LoadState {
    /// Create a gate in the not-started state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to move to started.
    ///
    /// Returns `true` for exactly one caller, however many race.
    pub fn start(&self) -> bool {
        self.started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether some caller has already started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use super::*;

    #[test]
    fn test_start_once() {
        let state = LoadState::new();
        assert!(!state.is_started());
        assert!(state.start());
        assert!(state.is_started());
        assert!(!state.start());
        assert!(state.is_started());
    }

    #[test]
    fn test_concurrent_racers_have_one_winner() {
        const RACERS: usize = 16;
        let state = Arc::new(LoadState::new());
        let barrier = Arc::new(Barrier::new(RACERS));

        let handles: Vec<_> = (0..RACERS)
            .map(|_| {
                let state = Arc::clone(&state);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    state.start()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
