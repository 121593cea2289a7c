//! The player body as seen by the encounter core
//!
//! Movement input comes from the shell; the core only needs position,
//! velocity, collider radii and the damage/undo/life hooks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collider, Rect, move_and_slide};
use super::entity::{Entity, decay_knockback};
use crate::consts::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Entity,
    /// Velocity from input this frame (used for predictive aim)
    pub vel: Vec2,
    pub wall_radius: f32,
    pub bullet_radius: f32,
    pub lives: u8,
    pub max_lives: u8,
    /// Remaining invulnerability (seconds)
    pub invuln_timer: f32,
    /// Remaining dash time (seconds)
    pub dash_timer: f32,
    dash_dir: Vec2,
    pub dead: bool,
    pub knockback: Vec2,
    /// Lives before the last undoable hit
    #[serde(skip)]
    last_damage: Option<u8>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            body: Entity::new(pos, Vec2::splat(PLAYER_SIZE)),
            vel: Vec2::ZERO,
            wall_radius: PLAYER_WALL_RADIUS,
            bullet_radius: PLAYER_BULLET_RADIUS,
            lives: PLAYER_START_LIVES,
            max_lives: PLAYER_START_LIVES,
            invuln_timer: 0.0,
            dash_timer: 0.0,
            dash_dir: Vec2::ZERO,
            dead: false,
            knockback: Vec2::ZERO,
            last_damage: None,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    #[inline]
    pub fn invulnerable(&self) -> bool {
        self.invuln_timer > 0.0
    }

    #[inline]
    pub fn dashing(&self) -> bool {
        self.dash_timer > 0.0
    }

    /// Whether a hit would currently cost a life
    pub fn damageable(&self) -> bool {
        !self.dead && !self.invulnerable() && !self.dashing()
    }

    /// Take one damage tick. Returns true if a life was lost.
    pub fn damage(&mut self) -> bool {
        if !self.damageable() {
            return false;
        }
        let lives_before = self.lives;
        self.lives = self.lives.saturating_sub(1);
        self.invuln_timer = PLAYER_INVULN_TIME;
        if self.lives == 0 {
            // Death is final: a fatal hit cannot be undone
            self.dead = true;
            self.last_damage = None;
        } else {
            self.last_damage = Some(lives_before);
        }
        true
    }

    /// Revert the most recent non-fatal damage tick: life restored,
    /// invulnerability cleared
    pub fn undo_damage(&mut self) {
        if let Some(lives) = self.last_damage.take() {
            self.lives = lives;
            self.invuln_timer = 0.0;
        }
    }

    /// Grant a life up to `max_lives`. Returns false when already full.
    pub fn add_life(&mut self, cap: u8) -> bool {
        let cap = cap.max(self.max_lives);
        if self.lives >= cap {
            return false;
        }
        self.lives += 1;
        self.max_lives = self.max_lives.max(self.lives);
        true
    }

    /// Push the player away from a point
    pub fn apply_knockback(&mut self, from: Vec2, force: f32, fallback: Vec2) {
        let dir = crate::direction_or(from, self.body.pos, fallback);
        self.knockback = dir * force;
    }

    /// Start a dash in the given direction (ignored while already dashing)
    pub fn dash(&mut self, dir: Vec2) {
        if self.dashing() || dir == Vec2::ZERO {
            return;
        }
        self.dash_dir = dir.normalize();
        self.dash_timer = PLAYER_DASH_TIME;
    }

    /// Move from input and knockback, sliding along walls
    pub fn update(&mut self, dt: f32, move_dir: Vec2, walls: &[Rect]) {
        if self.dead {
            self.vel = Vec2::ZERO;
            return;
        }

        self.invuln_timer = (self.invuln_timer - dt).max(0.0);

        self.vel = if self.dashing() {
            self.dash_timer = (self.dash_timer - dt).max(0.0);
            self.dash_dir * PLAYER_SPEED * PLAYER_DASH_MULT
        } else {
            move_dir.normalize_or_zero() * PLAYER_SPEED
        };

        let delta = (self.vel + self.knockback) * dt;
        let collider = Collider::Circle {
            radius: self.wall_radius,
        };
        move_and_slide(&mut self.body, delta, walls, collider);
        decay_knockback(&mut self.knockback, dt, KNOCKBACK_DECAY, KNOCKBACK_SNAP);
    }
}
