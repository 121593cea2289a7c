//! Spinning top QTE: wind the mouse around the top three full turns
//!
//! The swept angle is sampled once per frame. Net rotation counts, so
//! reversing direction unwinds progress. Near the centre the angle is
//! meaningless and is ignored.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{InputEvent, MiniGame, QteCore};
use crate::consts::{QTE_VIEW_H, QTE_VIEW_W};
use crate::sim::SimRng;

pub const DEAD_ZONE: f32 = 30.0;
pub const TURNS_REQUIRED: f32 = 3.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinningTopQte {
    pub center: Vec2,
    pub mouse: Option<Vec2>,
    last_angle: Option<f32>,
    /// Net swept angle (radians, signed)
    pub swept: f32,
}

impl Default for SpinningTopQte {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinningTopQte {
    pub fn new() -> Self {
        Self {
            center: Vec2::new(QTE_VIEW_W, QTE_VIEW_H) / 2.0,
            mouse: None,
            last_angle: None,
            swept: 0.0,
        }
    }

    /// Completed turns, in either direction
    pub fn turns(&self) -> f32 {
        self.swept.abs() / TAU
    }
}

impl MiniGame for SpinningTopQte {
    fn update(&mut self, _dt: f32, core: &mut QteCore, _rng: &mut SimRng) {
        let Some(mouse) = self.mouse else {
            return;
        };
        let d = mouse - self.center;
        if d.length() < DEAD_ZONE {
            self.last_angle = None;
            return;
        }

        let angle = d.y.atan2(d.x);
        if let Some(prev) = self.last_angle {
            self.swept += crate::normalize_angle(angle - prev);
        }
        self.last_angle = Some(angle);

        if self.turns() >= TURNS_REQUIRED {
            core.succeed();
        }
    }

    fn on_input(&mut self, event: &InputEvent, _core: &mut QteCore) {
        match *event {
            InputEvent::MouseMove(p) | InputEvent::MouseDown(p) => self.mouse = Some(p),
            _ => {}
        }
    }
}
