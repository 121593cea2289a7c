//! Cowboy QTE: a quick-draw duel
//!
//! After an unpredictable delay the "draw" signal shows. Clicking before it
//! loses on the spot; clicking within the reaction window after it wins.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{InputEvent, MiniGame, QteCore};
use crate::sim::SimRng;
use crate::tuning;

pub const MIN_DELAY: f32 = 1.0;
pub const MAX_DELAY: f32 = 2.5;
/// Head room so the QTE clock never ends the duel before the window does
const TIME_SLACK: f32 = 0.5;

/// QTE time limit for a given reaction window
pub fn time_limit(window: f32) -> f32 {
    MAX_DELAY + window + TIME_SLACK
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CowboyQte {
    /// Seconds before the draw signal
    pub delay: f32,
    /// Seconds allowed after the signal
    pub window: f32,
    pub timer: f32,
    /// How fast the player drew, once they have
    pub reaction: Option<f32>,
}

impl CowboyQte {
    pub fn new(depth: i32, rng: &mut SimRng) -> Self {
        Self::with_timing(
            rng.random_range(MIN_DELAY..MAX_DELAY),
            tuning::cowboy_reaction_window(depth),
        )
    }

    pub fn with_timing(delay: f32, window: f32) -> Self {
        Self {
            delay,
            window,
            timer: 0.0,
            reaction: None,
        }
    }

    /// Draw signal is showing
    pub fn drawn(&self) -> bool {
        self.timer >= self.delay
    }
}

impl MiniGame for CowboyQte {
    fn update(&mut self, dt: f32, core: &mut QteCore, _rng: &mut SimRng) {
        self.timer += dt;
        if self.timer > self.delay + self.window {
            log::debug!("Cowboy duel: too slow");
            core.fail();
        }
    }

    fn on_input(&mut self, event: &InputEvent, core: &mut QteCore) {
        if !matches!(event, InputEvent::MouseDown(_)) {
            return;
        }
        if self.drawn() {
            self.reaction = Some(self.timer - self.delay);
            core.succeed();
        } else {
            log::debug!("Cowboy duel: drew early");
            core.fail();
        }
    }
}
