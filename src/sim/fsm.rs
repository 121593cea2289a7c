//! Minimal finite state machine over a closed state enum
//!
//! Owners drive transitions through `set_state` on their behaviour trait,
//! which calls exit/enter hooks around `Fsm::enter`. The machine itself only
//! tracks the current state and how long it has been held.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fsm<S> {
    state: S,
    /// Seconds since the last transition
    timer: f32,
    /// Number of transitions taken so far
    transitions: u32,
}

impl<S: Copy + PartialEq> Fsm<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: initial,
            timer: 0.0,
            transitions: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> S {
        self.state
    }

    #[inline]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    #[inline]
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    #[inline]
    pub fn is(&self, state: S) -> bool {
        self.state == state
    }

    /// Advance the state timer
    pub fn tick(&mut self, dt: f32) {
        self.timer += dt;
    }

    /// Commit a transition. Returns false (and leaves the timer alone) when
    /// `next` is already the current state.
    pub fn enter(&mut self, next: S) -> bool {
        if next == self.state {
            return false;
        }
        self.state = next;
        self.timer = 0.0;
        self.transitions += 1;
        true
    }
}
