//! Difficulty curves and data-driven game balance
//!
//! Every curve is a pure function of the level depth. Depths below 1 clamp to
//! the depth-1 tuning. `Tuning` holds the named encounter tunables and can be
//! loaded from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::qte::{QteKind, cowboy, heart};

#[inline]
fn depth_index(depth: i32) -> i32 {
    depth.max(1) - 1
}

/// Enemy difficulty multiplier (>= 1)
pub fn difficulty_multiplier(depth: i32) -> f32 {
    (1.0 + 0.08 * depth_index(depth) as f32).min(2.5)
}

/// Seconds on the level clock; non-increasing, never below 30
pub fn level_time_limit(depth: i32) -> f32 {
    (90.0 - 4.0 * depth_index(depth) as f32).max(30.0)
}

/// Taps needed to power a generator; non-decreasing, at most 15
pub fn generator_tap_target(depth: i32) -> u32 {
    (6 + depth_index(depth) as u32 / 2).min(15)
}

/// Taps needed for the Tap QTE
pub fn tap_target(depth: i32) -> u32 {
    (8 + depth_index(depth) as u32 / 2).min(20)
}

/// Bat QTE target scale: 2x at depth 1 down to 2/3x from depth 20
pub fn bat_target_scale(depth: i32) -> f32 {
    let t = (depth_index(depth) as f32 / 19.0).min(1.0);
    2.0 + (2.0 / 3.0 - 2.0) * t
}

pub fn gopher_hits_required(depth: i32) -> u32 {
    (3 + depth_index(depth) as u32 / 3).min(8)
}

/// Total pops the gopher grid may show before running dry
pub fn gopher_max_pops(depth: i32) -> u32 {
    gopher_hits_required(depth) + 5
}

/// Seconds between gopher pops
pub fn gopher_pop_interval(depth: i32) -> f32 {
    (0.7 - 0.02 * depth_index(depth) as f32).max(0.4)
}

pub fn letter_word_length(depth: i32) -> usize {
    (3 + depth_index(depth) as usize / 3).min(8)
}

pub fn heart_count(depth: i32) -> u32 {
    (3 + depth_index(depth) as u32 / 4).min(7)
}

/// Heart scroll speed (pixels/s)
pub fn heart_scroll_speed(depth: i32) -> f32 {
    (100.0 + 10.0 * depth_index(depth) as f32).min(260.0)
}

/// Seconds the player has to click after the draw signal
pub fn cowboy_reaction_window(depth: i32) -> f32 {
    (0.6 - 0.015 * depth_index(depth) as f32).max(0.35)
}

/// Allowed hand error for the Clock QTE (degrees)
pub fn clock_tolerance_degrees(depth: i32) -> f32 {
    (24.0 - depth_index(depth) as f32).max(10.0)
}

/// Enemies spawned per room
pub fn enemy_count(depth: i32) -> u32 {
    (3 + depth.max(1) as u32 / 2).min(12)
}

/// QTE time limit scale: tighter with depth, never below 60%
pub fn qte_time_scale(depth: i32) -> f32 {
    (1.0 - 0.02 * depth_index(depth) as f32).max(0.6)
}

/// QTE time limit in seconds
///
/// Cowboy and Heart derive their limit from their own timing so the clock
/// never cuts off a duel or a rhythm lane early.
pub fn qte_time_limit(kind: QteKind, depth: i32) -> f32 {
    let scale = qte_time_scale(depth);
    match kind {
        QteKind::Bat => 4.0 * scale,
        QteKind::Gopher => 7.0 * scale,
        QteKind::SpinningTop => 5.0 * scale,
        QteKind::Letter => (2.5 + 0.6 * letter_word_length(depth) as f32) * scale,
        QteKind::Cowboy => cowboy::time_limit(cowboy_reaction_window(depth)),
        QteKind::Controller => 12.0 * scale,
        QteKind::Heart => heart::time_limit(heart_count(depth), heart_scroll_speed(depth)),
        QteKind::Clock => 8.0 * scale,
        QteKind::Tap => 4.0 * scale,
        QteKind::Timeout => 3.0 * scale,
    }
}

/// Errors from loading tunables
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Named encounter tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Frames during which a bullet hit can be undone by a QTE trigger
    pub qte_priority_frames: u64,
    /// QTE success blast radius (pixels)
    pub blast_radius: f32,
    /// Knockback impulse applied to enemies caught in the blast
    pub blast_knockback: f32,
    /// Bullets alive before the oldest start fading
    pub bullet_soft_cap: usize,
    /// Lives the Heart bonus can raise the player to
    pub heart_life_cap: u8,
    /// Seconds added to the level clock by a Clock kill
    pub clock_time_bonus: f32,
    /// Frames of hitstop after a QTE success
    pub hitstop_frames: u32,
    /// Knockback applied to player and enemy after a failed QTE
    pub qte_fail_knockback: f32,
    /// Enemy kind name -> QTE name overrides
    pub qte_overrides: BTreeMap<String, String>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            qte_priority_frames: 3,
            blast_radius: 240.0,
            blast_knockback: 420.0,
            bullet_soft_cap: 200,
            heart_life_cap: 5,
            clock_time_bonus: 5.0,
            hitstop_frames: 6,
            qte_fail_knockback: 360.0,
            qte_overrides: BTreeMap::new(),
        }
    }
}

impl Tuning {
    /// Parse and validate tunables from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.blast_radius.is_finite() && self.blast_radius > 0.0) {
            return Err(TuningError::Invalid {
                field: "blast_radius",
                reason: format!("must be positive, got {}", self.blast_radius),
            });
        }
        if self.bullet_soft_cap == 0 {
            return Err(TuningError::Invalid {
                field: "bullet_soft_cap",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.heart_life_cap == 0 {
            return Err(TuningError::Invalid {
                field: "heart_life_cap",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.clock_time_bonus.is_finite() && self.clock_time_bonus >= 0.0) {
            return Err(TuningError::Invalid {
                field: "clock_time_bonus",
                reason: format!("must be non-negative, got {}", self.clock_time_bonus),
            });
        }
        Ok(())
    }

    /// Load from JSON, logging and falling back to defaults on error
    pub fn load_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(err) => {
                log::warn!("Using default tuning: {}", err);
                Self::default()
            }
        }
    }
}
