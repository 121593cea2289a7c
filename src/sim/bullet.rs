//! Pooled enemy projectiles
//!
//! Every enemy fires into one shared pool. Slots are reused in index order
//! and the pool grows instead of refusing a spawn. Above the soft cap the
//! oldest bullets fade out rather than vanishing.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, circle_vs_aabb, circle_vs_circle};
use super::entity::Entity;
use crate::consts::*;

/// Default simultaneous bullet budget before fading kicks in
pub const DEFAULT_SOFT_CAP: usize = 200;

/// Stable reference to a spawned bullet
///
/// The generation changes every time a slot is reused, so a handle never
/// aliases a newer bullet that happens to occupy the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletHandle {
    pub index: usize,
    pub generation: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Entity,
    pub radius: f32,
    pub vel: Vec2,
    /// Seconds alive
    pub lifetime: f32,
    pub max_lifetime: f32,
    /// Opacity (0-1)
    pub alpha: f32,
    pub fading: bool,
    /// Tint for the renderer (usually the firing enemy's color)
    pub color: u32,
    generation: u32,
}

impl Bullet {
    fn inactive() -> Self {
        Self {
            body: Entity {
                pos: Vec2::ZERO,
                size: Vec2::ZERO,
                active: false,
            },
            radius: 0.0,
            vel: Vec2::ZERO,
            lifetime: 0.0,
            max_lifetime: 0.0,
            alpha: 0.0,
            fading: false,
            color: 0,
            generation: 0,
        }
    }

    #[inline]
    pub fn active(&self) -> bool {
        self.body.active
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.body.pos
    }

    /// Active and not on its way out
    #[inline]
    pub fn harmful(&self) -> bool {
        self.body.active && !self.fading
    }

    fn deactivate(&mut self) {
        self.body.active = false;
        self.fading = false;
    }
}

/// Spawn parameters beyond position and velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletSpec {
    pub radius: f32,
    pub lifetime: f32,
    pub color: u32,
}

impl Default for BulletSpec {
    fn default() -> Self {
        Self {
            radius: BULLET_RADIUS,
            lifetime: BULLET_LIFETIME,
            color: 0xffffff,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletPool {
    bullets: Vec<Bullet>,
    pub soft_cap: usize,
}

impl Default for BulletPool {
    fn default() -> Self {
        Self::new(DEFAULT_SOFT_CAP)
    }
}

impl BulletPool {
    pub fn new(soft_cap: usize) -> Self {
        Self {
            bullets: Vec::with_capacity(soft_cap),
            soft_cap,
        }
    }

    /// Activate a bullet, reusing the first inactive slot or growing the pool
    pub fn spawn(&mut self, pos: Vec2, vel: Vec2, spec: BulletSpec) -> BulletHandle {
        let index = match self.bullets.iter().position(|b| !b.active()) {
            Some(i) => i,
            None => {
                self.bullets.push(Bullet::inactive());
                if self.bullets.len().is_power_of_two() {
                    log::debug!("Bullet pool grew to {} slots", self.bullets.len());
                }
                self.bullets.len() - 1
            }
        };

        let bullet = &mut self.bullets[index];
        let generation = bullet.generation.wrapping_add(1);
        *bullet = Bullet {
            body: Entity::new(pos, Vec2::splat(spec.radius * 2.0)),
            radius: spec.radius,
            vel,
            lifetime: 0.0,
            max_lifetime: spec.lifetime,
            alpha: 1.0,
            fading: false,
            color: spec.color,
            generation,
        };

        BulletHandle { index, generation }
    }

    /// Move, age and fade every active bullet, then enforce the soft cap
    pub fn update(&mut self, dt: f32, walls: &[Rect]) {
        for bullet in self.bullets.iter_mut().filter(|b| b.active()) {
            bullet.body.pos += bullet.vel * dt;
            bullet.lifetime += dt;

            if bullet.lifetime >= bullet.max_lifetime {
                bullet.deactivate();
                continue;
            }

            if walls
                .iter()
                .any(|w| circle_vs_aabb(bullet.body.pos, bullet.radius, w).overlaps)
            {
                bullet.deactivate();
                continue;
            }

            if bullet.fading {
                bullet.alpha -= dt / BULLET_FADE_TIME;
                if bullet.alpha <= 0.0 {
                    bullet.alpha = 0.0;
                    bullet.deactivate();
                }
            }
        }

        self.enforce_soft_cap();
    }

    /// Mark the oldest surplus bullets as fading
    fn enforce_soft_cap(&mut self) {
        let live: Vec<usize> = self
            .bullets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.harmful())
            .map(|(i, _)| i)
            .collect();

        if live.len() <= self.soft_cap {
            return;
        }

        let excess = live.len() - self.soft_cap;
        let mut oldest = live;
        // Stable: equal ages keep slot order, so earlier spawns fade first
        oldest.sort_by(|&a, &b| {
            self.bullets[b]
                .lifetime
                .partial_cmp(&self.bullets[a].lifetime)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for &i in oldest.iter().take(excess) {
            self.bullets[i].fading = true;
        }
        log::trace!("Soft cap exceeded, fading {} bullets", excess);
    }

    /// Deactivate a bullet by handle (no-op for stale handles)
    pub fn kill(&mut self, handle: BulletHandle) {
        if let Some(bullet) = self.get_mut(handle) {
            bullet.deactivate();
        }
    }

    /// Destroy every active bullet within `radius` of `center`
    pub fn destroy_in_radius(&mut self, center: Vec2, radius: f32) -> usize {
        let mut destroyed = 0;
        for bullet in self.bullets.iter_mut().filter(|b| b.active()) {
            if bullet.body.pos.distance_squared(center) <= radius * radius {
                bullet.deactivate();
                destroyed += 1;
            }
        }
        destroyed
    }

    /// Deactivate every harmful bullet overlapping the circle; returns how many
    pub fn collide_circle(&mut self, center: Vec2, radius: f32) -> usize {
        let mut hits = 0;
        for bullet in self.bullets.iter_mut().filter(|b| b.harmful()) {
            if circle_vs_circle(bullet.body.pos, bullet.radius, center, radius).hit {
                bullet.deactivate();
                hits += 1;
            }
        }
        hits
    }

    pub fn get(&self, handle: BulletHandle) -> Option<&Bullet> {
        self.bullets
            .get(handle.index)
            .filter(|b| b.generation == handle.generation)
    }

    fn get_mut(&mut self, handle: BulletHandle) -> Option<&mut Bullet> {
        self.bullets
            .get_mut(handle.index)
            .filter(|b| b.generation == handle.generation)
    }

    /// True while the handle's bullet is still in flight
    pub fn is_alive(&self, handle: BulletHandle) -> bool {
        self.get(handle).is_some_and(|b| b.active())
    }

    /// Last known position of the handle's bullet, if its slot was not reused
    pub fn last_position(&self, handle: BulletHandle) -> Option<Vec2> {
        self.get(handle).map(|b| b.body.pos)
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Bullet> {
        self.bullets.iter().filter(|b| b.active())
    }

    pub fn active_count(&self) -> usize {
        self.bullets.iter().filter(|b| b.active()).count()
    }

    /// Total slots, active or not
    pub fn capacity(&self) -> usize {
        self.bullets.len()
    }

    pub fn clear(&mut self) {
        for bullet in &mut self.bullets {
            bullet.deactivate();
        }
    }
}
