//! Deterministic encounter simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (injected, never global)
//! - Stable iteration order (spawn order is authoritative)
//! - No rendering or platform dependencies; feedback goes through `Feedback`

pub mod bullet;
pub mod collision;
pub mod encounter;
pub mod enemy;
pub mod entity;
pub mod fsm;
pub mod player;
pub mod qte;

use glam::Vec2;
use rand::Rng;

pub use bullet::{Bullet, BulletHandle, BulletPool, BulletSpec};
pub use collision::{
    AabbPush, CircleHit, Collider, Rect, aabb_vs_aabb, circle_vs_aabb, circle_vs_circle,
    move_and_slide, resolve_wall_collision,
};
pub use encounter::{Encounter, EncounterEvent, FrameInput, Generator, LevelSetup};
pub use enemy::{Behavior, Enemy, EnemyKind};
pub use entity::Entity;
pub use fsm::Fsm;
pub use player::Player;
pub use qte::{InputEvent, Key, Qte, QteKind, QteResult, QteSubject};

/// Seedable random source used by every system
pub type SimRng = rand_pcg::Pcg32;

/// Build the simulation RNG from a seed
pub fn seeded_rng(seed: u64) -> SimRng {
    use rand::SeedableRng;
    SimRng::seed_from_u64(seed)
}

/// Uniformly random unit vector
pub fn random_unit(rng: &mut SimRng) -> Vec2 {
    crate::from_angle(rng.random_range(0.0..std::f32::consts::TAU))
}
