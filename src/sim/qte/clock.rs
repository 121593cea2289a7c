//! Clock QTE: set the hands to the time shown
//!
//! The first click locks the hour hand, the second the minute hand. Nothing
//! is judged until the second click, then both hands must be in tolerance.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{InputEvent, MiniGame, QteCore};
use crate::consts::{QTE_VIEW_H, QTE_VIEW_W};
use crate::sim::SimRng;
use crate::tuning;

/// Clicks closer than this to the dial centre have no direction
pub const CENTER_DEAD_ZONE: f32 = 10.0;

/// Dial angle of a point in degrees: 0 at twelve o'clock, clockwise, [0, 360)
pub fn dial_angle(center: Vec2, p: Vec2) -> f32 {
    let d = p - center;
    d.x.atan2(-d.y).to_degrees().rem_euclid(360.0)
}

/// Smallest difference between two dial angles (degrees)
pub fn angle_diff(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockQte {
    pub center: Vec2,
    /// 1-12
    pub hour: u32,
    /// 0-55 in steps of five
    pub minute: u32,
    pub tolerance: f32,
    /// Hour-hand angle from the first click
    pub locked_hour: Option<f32>,
}

impl ClockQte {
    pub fn new(depth: i32, rng: &mut SimRng) -> Self {
        let hour = rng.random_range(1..=12);
        let minute = rng.random_range(0..12) * 5;
        Self::with_target(hour, minute, tuning::clock_tolerance_degrees(depth))
    }

    pub fn with_target(hour: u32, minute: u32, tolerance: f32) -> Self {
        Self {
            center: Vec2::new(QTE_VIEW_W, QTE_VIEW_H) / 2.0,
            hour: hour.clamp(1, 12),
            minute: minute.min(59),
            tolerance,
            locked_hour: None,
        }
    }

    /// Where the hour hand should point (degrees)
    pub fn hour_angle(&self) -> f32 {
        ((self.hour % 12) as f32 + self.minute as f32 / 60.0) * 30.0
    }

    /// Where the minute hand should point (degrees)
    pub fn minute_angle(&self) -> f32 {
        self.minute as f32 * 6.0
    }
}

impl MiniGame for ClockQte {
    fn on_input(&mut self, event: &InputEvent, core: &mut QteCore) {
        let InputEvent::MouseDown(p) = *event else {
            return;
        };
        if p.distance(self.center) < CENTER_DEAD_ZONE {
            return;
        }
        let angle = dial_angle(self.center, p);

        match self.locked_hour {
            None => self.locked_hour = Some(angle),
            Some(hour) => {
                let hour_ok = angle_diff(hour, self.hour_angle()) <= self.tolerance;
                let minute_ok = angle_diff(angle, self.minute_angle()) <= self.tolerance;
                if hour_ok && minute_ok {
                    core.succeed();
                } else {
                    log::debug!(
                        "Clock QTE: set {:.0}/{:.0}, wanted {:.0}/{:.0}",
                        hour,
                        angle,
                        self.hour_angle(),
                        self.minute_angle()
                    );
                    core.fail();
                }
            }
        }
    }
}
