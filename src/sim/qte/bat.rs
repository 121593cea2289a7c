//! Bat QTE: click a target bouncing around the frame
//!
//! The target speeds up the longer the QTE runs. Misses cost nothing but time.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{InputEvent, MiniGame, QteCore};
use crate::consts::{QTE_VIEW_H, QTE_VIEW_W};
use crate::sim::{SimRng, random_unit};
use crate::tuning;

/// Target radius before the depth scale is applied
pub const BASE_RADIUS: f32 = 28.0;
/// Extra forgiveness around the drawn target
pub const HIT_PADDING: f32 = 8.0;
pub const BASE_SPEED: f32 = 180.0;
/// Fractional speed gained per second of elapsed QTE time
pub const SPEED_RAMP: f32 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatQte {
    pub pos: Vec2,
    pub dir: Vec2,
    pub radius: f32,
    pub misses: u32,
}

impl BatQte {
    pub fn new(depth: i32, rng: &mut SimRng) -> Self {
        let mut dir = random_unit(rng);
        // Avoid near-axis starts that would bounce in a straight line
        if dir.x.abs() < 0.2 || dir.y.abs() < 0.2 {
            dir = Vec2::new(dir.x.signum(), dir.y.signum()).normalize();
        }
        Self {
            pos: Vec2::new(QTE_VIEW_W, QTE_VIEW_H) / 2.0,
            dir,
            radius: BASE_RADIUS * tuning::bat_target_scale(depth),
            misses: 0,
        }
    }

    #[inline]
    pub fn hit_radius(&self) -> f32 {
        self.radius + HIT_PADDING
    }

    pub fn speed(&self, elapsed: f32) -> f32 {
        BASE_SPEED * (1.0 + SPEED_RAMP * elapsed)
    }
}

impl MiniGame for BatQte {
    fn update(&mut self, dt: f32, core: &mut QteCore, _rng: &mut SimRng) {
        self.pos += self.dir * self.speed(core.elapsed) * dt;

        let min = Vec2::splat(self.radius);
        let max = Vec2::new(QTE_VIEW_W, QTE_VIEW_H) - self.radius;
        if self.pos.x < min.x || self.pos.x > max.x {
            self.dir.x = -self.dir.x;
        }
        if self.pos.y < min.y || self.pos.y > max.y {
            self.dir.y = -self.dir.y;
        }
        self.pos = self.pos.clamp(min, max);
    }

    fn on_input(&mut self, event: &InputEvent, core: &mut QteCore) {
        if let InputEvent::MouseDown(p) = *event {
            if p.distance(self.pos) <= self.hit_radius() {
                core.succeed();
            } else {
                self.misses += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::qte::QteResult;
    use crate::sim::seeded_rng;

    #[test]
    fn test_click_on_target_succeeds() {
        let mut rng = seeded_rng(4);
        let mut game = BatQte::new(1, &mut rng);
        let mut core = QteCore::new(4.0);
        for _ in 0..30 {
            core.tick(1.0 / 60.0);
            game.update(1.0 / 60.0, &mut core, &mut rng);
        }
        let edge = game.pos + Vec2::new(game.hit_radius() - 0.5, 0.0);
        game.on_input(&InputEvent::MouseDown(edge), &mut core);
        assert_eq!(core.result(), QteResult::Success);
    }

    #[test]
    fn test_miss_is_not_a_fail() {
        let mut rng = seeded_rng(4);
        let mut game = BatQte::new(1, &mut rng);
        let mut core = QteCore::new(4.0);
        let far = game.pos + Vec2::new(game.hit_radius() + 20.0, 0.0);
        game.on_input(&InputEvent::MouseDown(far), &mut core);
        assert_eq!(core.result(), QteResult::Pending);
        assert_eq!(game.misses, 1);
    }

    #[test]
    fn test_target_stays_in_frame_and_speeds_up() {
        let mut rng = seeded_rng(9);
        let mut game = BatQte::new(5, &mut rng);
        let mut core = QteCore::new(100.0);
        for _ in 0..600 {
            core.tick(1.0 / 60.0);
            game.update(1.0 / 60.0, &mut core, &mut rng);
            assert!(game.pos.x >= game.radius && game.pos.x <= QTE_VIEW_W - game.radius);
            assert!(game.pos.y >= game.radius && game.pos.y <= QTE_VIEW_H - game.radius);
        }
        assert!(game.speed(2.0) > game.speed(0.0));
    }

    #[test]
    fn test_target_shrinks_with_depth() {
        let mut rng = seeded_rng(1);
        let shallow = BatQte::new(1, &mut rng);
        let deep = BatQte::new(25, &mut rng);
        assert!((shallow.radius - BASE_RADIUS * 2.0).abs() < 1e-4);
        assert!(deep.radius < shallow.radius);
    }
}
