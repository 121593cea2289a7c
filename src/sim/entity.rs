//! Shared entity body: position, size and the active flag

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Rect;

/// Common body for anything that lives in the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Centre position
    pub pos: Vec2,
    /// Full width/height
    pub size: Vec2,
    /// Inactive entities are skipped by collision checks and eligible for reuse
    pub active: bool,
}

impl Entity {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            active: true,
        }
    }

    /// Bounding box centred on `pos`
    pub fn rect(&self) -> Rect {
        Rect::centered(self.pos, self.size)
    }

    /// Radius of the inscribed circle
    pub fn radius(&self) -> f32 {
        self.size.x.min(self.size.y) / 2.0
    }
}

/// Exponential knockback decay with a hard snap to zero
///
/// `v *= exp(-rate * dt)`; once the speed drops under `snap` it becomes
/// exactly zero so bodies never drift by sub-pixels forever.
pub fn decay_knockback(vel: &mut Vec2, dt: f32, rate: f32, snap: f32) {
    if *vel == Vec2::ZERO {
        return;
    }
    *vel *= (-rate * dt).exp();
    if vel.length_squared() < snap * snap {
        *vel = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{KNOCKBACK_DECAY, KNOCKBACK_SNAP, SIM_DT};
    use proptest::prelude::*;

    #[test]
    fn test_rect_is_centered() {
        let e = Entity::new(Vec2::new(50.0, 40.0), Vec2::new(20.0, 10.0));
        let r = e.rect();
        assert_eq!(r, Rect::new(40.0, 35.0, 20.0, 10.0));
        assert_eq!(e.radius(), 5.0);
    }

    proptest! {
        #[test]
        fn prop_knockback_reaches_exact_zero(
            vx in -2000.0f32..2000.0,
            vy in -2000.0f32..2000.0,
        ) {
            let mut v = Vec2::new(vx, vy);
            // ln(2000*sqrt2) / (5/60) is about 95 frames
            for _ in 0..120 {
                decay_knockback(&mut v, SIM_DT, KNOCKBACK_DECAY, KNOCKBACK_SNAP);
            }
            prop_assert_eq!(v, Vec2::ZERO);
        }
    }
}
