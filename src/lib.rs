//! QTE Crawler - a room-crawling arcade game
//!
//! Core modules:
//! - `sim`: Deterministic encounter core (collision, enemy FSMs, bullets, QTEs, arbitration)
//! - `tuning`: Difficulty curves and data-driven game balance
//! - `settings`: Player preferences
//! - `feedback`: Audio/particle/camera notifications the core emits

pub mod feedback;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use feedback::{EventLog, Feedback, FeedbackEvent, NullFeedback, Sfx};
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one gameplay frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Player movement speed (pixels/s)
    pub const PLAYER_SPEED: f32 = 200.0;
    /// Dash speed multiplier and duration
    pub const PLAYER_DASH_MULT: f32 = 2.6;
    pub const PLAYER_DASH_TIME: f32 = 0.18;
    /// Player collider radii
    pub const PLAYER_WALL_RADIUS: f32 = 12.0;
    pub const PLAYER_BULLET_RADIUS: f32 = 6.0;
    /// Player body size used for QTE overlap (AABB)
    pub const PLAYER_SIZE: f32 = 24.0;
    /// Invulnerability after taking a hit
    pub const PLAYER_INVULN_TIME: f32 = 1.0;
    pub const PLAYER_START_LIVES: u8 = 3;

    /// Default enemy body size
    pub const ENEMY_SIZE: f32 = 32.0;

    /// Default bullet radius and lifetime
    pub const BULLET_RADIUS: f32 = 5.0;
    pub const BULLET_LIFETIME: f32 = 4.0;
    /// Time a soft-capped bullet takes to fade out
    pub const BULLET_FADE_TIME: f32 = 0.25;

    /// Knockback decay rate (v *= exp(-rate * dt))
    pub const KNOCKBACK_DECAY: f32 = 5.0;
    /// Knockback below this speed snaps to zero (pixels/s)
    pub const KNOCKBACK_SNAP: f32 = 1.0;

    /// QTE viewport (mini-games run in their own screen space)
    pub const QTE_VIEW_W: f32 = 960.0;
    pub const QTE_VIEW_H: f32 = 540.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for an angle (radians, screen space)
#[inline]
pub fn from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Direction from `from` to `to`, or `fallback` when the points coincide
#[inline]
pub fn direction_or(from: Vec2, to: Vec2, fallback: Vec2) -> Vec2 {
    let delta = to - from;
    if delta.length_squared() > 1e-12 {
        delta.normalize()
    } else {
        fallback
    }
}
