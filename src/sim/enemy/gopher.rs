//! Gopher: burrow, relocate, emerge, fire a ring, idle, burrow again
//!
//! Relocation happens the moment it goes underground so the emerge
//! indicator points at the real spot. For a short grace window right after
//! burrowing it can still be caught.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{EnemyBrain, EnemyCtx, StateMachine};
use crate::sim::bullet::BulletSpec;
use crate::sim::collision::{Collider, Rect, move_and_slide};
use crate::sim::entity::Entity;
use crate::sim::fsm::Fsm;

pub const UNDERGROUND_TIME: f32 = 1.2;
pub const EMERGE_TIME: f32 = 0.6;
pub const IDLE_TIME: f32 = 1.0;
pub const BURROW_TIME: f32 = 0.4;
/// Hittable window right after going underground
pub const BURROW_GRACE: f32 = 0.15;
pub const RING_BULLET_SPEED: f32 = 140.0;
const RING_BASE_COUNT: f32 = 6.0;
const RING_MAX_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GopherState {
    Underground,
    Emerging,
    Fire,
    Idle,
    Burrowing,
}

impl GopherState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GopherState::Underground => "underground",
            GopherState::Emerging => "emerging",
            GopherState::Fire => "fire",
            GopherState::Idle => "idle",
            GopherState::Burrowing => "burrowing",
        }
    }
}

/// Bullets in one ring for a difficulty multiplier
pub fn ring_count(difficulty: f32) -> usize {
    ((RING_BASE_COUNT + 2.0 * (difficulty - 1.0)).round() as usize).clamp(6, RING_MAX_COUNT)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gopher {
    fsm: Fsm<GopherState>,
    /// Area it may resurface in
    pub room: Rect,
    relocate_pending: bool,
    /// Rings fired so far
    pub volleys: u32,
}

impl Gopher {
    pub fn new(room: Rect) -> Self {
        Self {
            fsm: Fsm::new(GopherState::Underground),
            room,
            relocate_pending: false,
            volleys: 0,
        }
    }

    fn relocate(&mut self, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let half = body.size / 2.0;
        let min = Vec2::new(self.room.left(), self.room.top()) + half;
        let max = Vec2::new(self.room.right(), self.room.bottom()) - half;
        if min.x < max.x && min.y < max.y {
            body.pos = Vec2::new(
                ctx.rng.random_range(min.x..max.x),
                ctx.rng.random_range(min.y..max.y),
            );
            move_and_slide(body, Vec2::ZERO, ctx.walls, Collider::Box);
        }
        self.relocate_pending = false;
    }

    fn fire_ring(&mut self, body: &Entity, ctx: &mut EnemyCtx<'_>) {
        let count = ring_count(ctx.difficulty);
        let speed = RING_BULLET_SPEED * ctx.speed_scale();
        let spec = BulletSpec {
            color: ctx.color,
            ..Default::default()
        };
        for i in 0..count {
            let theta = i as f32 / count as f32 * std::f32::consts::TAU;
            let dir = crate::from_angle(theta);
            ctx.bullets.spawn(body.pos, dir * speed, spec);
        }
        self.volleys += 1;
    }
}

impl StateMachine for Gopher {
    type State = GopherState;

    fn fsm(&self) -> &Fsm<GopherState> {
        &self.fsm
    }

    fn fsm_mut(&mut self) -> &mut Fsm<GopherState> {
        &mut self.fsm
    }

    fn on_enter(&mut self, to: GopherState, _body: &mut Entity) {
        if to == GopherState::Underground {
            self.relocate_pending = true;
        }
    }
}

impl EnemyBrain for Gopher {
    fn think(&mut self, _dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let t = self.fsm.timer();
        match self.fsm.state() {
            GopherState::Underground if t >= UNDERGROUND_TIME => {
                self.set_state(GopherState::Emerging, body)
            }
            GopherState::Emerging if t >= EMERGE_TIME => self.set_state(GopherState::Fire, body),
            GopherState::Fire => {
                // Single frame: fire, then idle straight away
                self.fire_ring(body, ctx);
                self.set_state(GopherState::Idle, body);
            }
            GopherState::Idle if t >= IDLE_TIME => self.set_state(GopherState::Burrowing, body),
            GopherState::Burrowing if t >= BURROW_TIME => {
                self.set_state(GopherState::Underground, body)
            }
            _ => {}
        }

        if self.relocate_pending {
            self.relocate(body, ctx);
        }
    }

    fn reset_to_idle(&mut self, body: &mut Entity) {
        self.set_state(GopherState::Idle, body);
    }

    fn tick_timer(&mut self, dt: f32) {
        self.fsm.tick(dt);
    }

    fn state_name(&self) -> &'static str {
        self.fsm.state().as_str()
    }

    fn state_timer(&self) -> f32 {
        self.fsm.timer()
    }

    fn qte_blocked(&self) -> bool {
        self.fsm.is(GopherState::Underground) && self.fsm.timer() >= BURROW_GRACE
    }

    fn is_anticipating(&self) -> bool {
        self.fsm.is(GopherState::Emerging)
    }
}
