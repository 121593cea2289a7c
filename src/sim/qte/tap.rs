//! Tap QTE: mash the mouse button enough times before the clock runs out
//!
//! Also the interaction used to power generators.

use serde::{Deserialize, Serialize};

use super::{InputEvent, MiniGame, QteCore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapQte {
    pub taps: u32,
    pub target: u32,
}

impl TapQte {
    pub fn new(target: u32) -> Self {
        Self {
            taps: 0,
            target: target.max(1),
        }
    }

    /// Fill fraction for the tap meter
    pub fn fill(&self) -> f32 {
        (self.taps as f32 / self.target as f32).min(1.0)
    }
}

impl MiniGame for TapQte {
    fn on_input(&mut self, event: &InputEvent, core: &mut QteCore) {
        if let InputEvent::MouseDown(_) = event {
            self.taps += 1;
            if self.taps >= self.target {
                core.succeed();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::qte::{Key, QteResult};

    #[test]
    fn test_reaching_target_succeeds() {
        let mut game = TapQte::new(3);
        let mut core = QteCore::new(4.0);
        for _ in 0..2 {
            game.on_input(&InputEvent::MouseDown(Vec2::ZERO), &mut core);
        }
        assert_eq!(core.result(), QteResult::Pending);
        assert!((game.fill() - 2.0 / 3.0).abs() < 1e-6);
        game.on_input(&InputEvent::MouseDown(Vec2::ZERO), &mut core);
        assert_eq!(core.result(), QteResult::Success);
    }

    #[test]
    fn test_only_mouse_down_counts() {
        let mut game = TapQte::new(2);
        let mut core = QteCore::new(4.0);
        game.on_input(&InputEvent::MouseUp(Vec2::ZERO), &mut core);
        game.on_input(&InputEvent::MouseMove(Vec2::ZERO), &mut core);
        game.on_input(&InputEvent::KeyDown(Key::Space), &mut core);
        assert_eq!(game.taps, 0);
    }

    #[test]
    fn test_zero_target_clamped() {
        assert_eq!(TapQte::new(0).target, 1);
    }
}
