//! Heart QTE: click each heart as it crosses the beat line
//!
//! Hearts scroll left to right in a single lane. Clicks are judged against
//! the first heart not yet caught; a click outside the tolerance, or a heart
//! scrolling past uncaught, loses.

use serde::{Deserialize, Serialize};

use super::{InputEvent, Key, MiniGame, QteCore};
use crate::sim::SimRng;
use crate::tuning;

/// Beat line position (QTE view space)
pub const HIT_LINE_X: f32 = 540.0;
/// Allowed distance from the line when clicking
pub const TOLERANCE: f32 = 36.0;
/// Where the first heart starts
pub const START_X: f32 = 140.0;
/// Gap between consecutive hearts
pub const SPACING: f32 = 150.0;
/// Extra seconds on the clock after the last heart passes
const TIME_SLACK: f32 = 0.5;

/// QTE time limit that lets every heart reach and clear the line
pub fn time_limit(count: u32, speed: f32) -> f32 {
    let last_x = START_X - count.saturating_sub(1) as f32 * SPACING;
    let travel = HIT_LINE_X + TOLERANCE - last_x;
    travel / speed.max(1.0) + TIME_SLACK
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartNote {
    pub x: f32,
    pub caught: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartQte {
    pub hearts: Vec<HeartNote>,
    /// Scroll speed (pixels/s)
    pub speed: f32,
}

impl HeartQte {
    pub fn new(depth: i32) -> Self {
        let count = tuning::heart_count(depth);
        let xs = (0..count).map(|i| START_X - i as f32 * SPACING);
        Self::with_hearts(tuning::heart_scroll_speed(depth), xs)
    }

    pub fn with_hearts(speed: f32, xs: impl IntoIterator<Item = f32>) -> Self {
        Self {
            hearts: xs.into_iter().map(|x| HeartNote { x, caught: false }).collect(),
            speed,
        }
    }

    /// The heart the next click is judged against
    pub fn next(&self) -> Option<&HeartNote> {
        self.hearts.iter().find(|h| !h.caught)
    }

    pub fn caught(&self) -> usize {
        self.hearts.iter().filter(|h| h.caught).count()
    }

    fn click(&mut self, core: &mut QteCore) {
        let Some(heart) = self.hearts.iter_mut().find(|h| !h.caught) else {
            return;
        };
        if (heart.x - HIT_LINE_X).abs() <= TOLERANCE {
            heart.caught = true;
            if self.hearts.iter().all(|h| h.caught) {
                core.succeed();
            }
        } else {
            log::debug!("Heart QTE: off-beat click at x={:.0}", heart.x);
            core.fail();
        }
    }
}

impl MiniGame for HeartQte {
    fn update(&mut self, dt: f32, core: &mut QteCore, _rng: &mut SimRng) {
        for heart in &mut self.hearts {
            heart.x += self.speed * dt;
        }
        if self.next().is_some_and(|h| h.x > HIT_LINE_X + TOLERANCE) {
            core.fail();
        }
    }

    fn on_input(&mut self, event: &InputEvent, core: &mut QteCore) {
        match event {
            InputEvent::MouseDown(_) | InputEvent::KeyDown(Key::Space) => self.click(core),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::qte::QteResult;
    use crate::sim::seeded_rng;

    const DT: f32 = 1.0 / 60.0;

    fn run(game: &mut HeartQte, core: &mut QteCore, frames: usize) {
        let mut rng = seeded_rng(0);
        for _ in 0..frames {
            core.tick(DT);
            if core.completed() {
                return;
            }
            game.update(DT, core, &mut rng);
        }
    }

    fn click(game: &mut HeartQte, core: &mut QteCore) {
        game.on_input(&InputEvent::MouseDown(Vec2::ZERO), core);
    }

    #[test]
    fn test_click_near_line_then_finish() {
        let mut game = HeartQte::with_hearts(100.0, [520.0, 370.0]);
        let mut core = QteCore::new(10.0);

        // 0.1s later the first heart sits at ~530, inside the tolerance
        run(&mut game, &mut core, 6);
        assert!((game.hearts[0].x - 530.0).abs() < 0.5);
        click(&mut game, &mut core);
        assert_eq!(core.result(), QteResult::Pending);
        assert_eq!(game.caught(), 1);

        // The second heart arrives 1.5s after the first
        run(&mut game, &mut core, 90);
        click(&mut game, &mut core);
        assert_eq!(core.result(), QteResult::Success);
    }

    #[test]
    fn test_early_click_fails_immediately() {
        let mut game = HeartQte::with_hearts(100.0, [400.0]);
        let mut core = QteCore::new(10.0);
        click(&mut game, &mut core);
        assert_eq!(core.result(), QteResult::Fail);
    }

    #[test]
    fn test_letting_heart_pass_fails() {
        let mut game = HeartQte::with_hearts(100.0, [520.0]);
        let mut core = QteCore::new(10.0);
        // 57px to the far edge of the window: ~0.57s
        run(&mut game, &mut core, 40);
        assert_eq!(core.result(), QteResult::Fail);
        assert!(core.elapsed < 1.0);
    }

    #[test]
    fn test_time_limit_covers_every_heart() {
        for depth in [1, 10, 30] {
            let mut game = HeartQte::new(depth);
            let mut core = QteCore::new(time_limit(tuning::heart_count(depth), game.speed));
            // Perfect play: click each heart the frame it reaches the line
            let mut rng = seeded_rng(0);
            while !core.completed() {
                core.tick(DT);
                if core.completed() {
                    break;
                }
                game.update(DT, &mut core, &mut rng);
                if game.next().is_some_and(|h| h.x >= HIT_LINE_X) {
                    click(&mut game, &mut core);
                }
            }
            assert_eq!(core.result(), QteResult::Success, "depth {}", depth);
        }
    }
}
