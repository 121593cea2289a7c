//! Clock: traces a figure-8 around its spawn point, dropping stationary traps

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{EnemyBrain, EnemyCtx, StateMachine};
use crate::sim::bullet::BulletSpec;
use crate::sim::collision::{Collider, move_and_slide};
use crate::sim::entity::Entity;
use crate::sim::fsm::Fsm;

/// Half-width of the figure-8 (pixels)
pub const LOOP_AMPLITUDE: f32 = 80.0;
/// Phase speed at difficulty 1 (radians/s)
pub const LOOP_RATE: f32 = 0.8;
/// Seconds between traps at difficulty 1
pub const TRAP_INTERVAL: f32 = 1.5;
pub const TRAP_LIFETIME: f32 = 5.0;
pub const TRAP_RADIUS: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    Idle,
}

impl ClockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockState::Idle => "idle",
        }
    }
}

/// Offset from the centre along the lemniscate at phase `t`
pub fn lemniscate(t: f32, amplitude: f32) -> Vec2 {
    Vec2::new(amplitude * t.sin(), amplitude * t.sin() * t.cos())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    fsm: Fsm<ClockState>,
    pub center: Vec2,
    pub phase: f32,
    trap_timer: f32,
    pub traps_dropped: u32,
}

impl Clock {
    pub fn new(center: Vec2) -> Self {
        Self {
            fsm: Fsm::new(ClockState::Idle),
            center,
            phase: 0.0,
            trap_timer: 0.0,
            traps_dropped: 0,
        }
    }

    fn drop_trap(&mut self, body: &Entity, ctx: &mut EnemyCtx<'_>) {
        let spec = BulletSpec {
            radius: TRAP_RADIUS,
            lifetime: TRAP_LIFETIME,
            color: ctx.color,
        };
        ctx.bullets.spawn(body.pos, Vec2::ZERO, spec);
        self.traps_dropped += 1;
    }
}

impl StateMachine for Clock {
    type State = ClockState;

    fn fsm(&self) -> &Fsm<ClockState> {
        &self.fsm
    }

    fn fsm_mut(&mut self) -> &mut Fsm<ClockState> {
        &mut self.fsm
    }
}

impl EnemyBrain for Clock {
    fn think(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let scale = ctx.speed_scale();
        self.phase = (self.phase + LOOP_RATE * scale * dt) % std::f32::consts::TAU;
        let target = self.center + lemniscate(self.phase, LOOP_AMPLITUDE);
        move_and_slide(body, target - body.pos, ctx.walls, Collider::Box);

        self.trap_timer += dt;
        let interval = TRAP_INTERVAL / scale;
        if self.trap_timer >= interval {
            self.trap_timer -= interval;
            self.drop_trap(body, ctx);
        }
    }

    fn reset_to_idle(&mut self, body: &mut Entity) {
        self.set_state(ClockState::Idle, body);
        // Re-centre on wherever we were pushed so the loop resumes from here
        self.center = body.pos - lemniscate(self.phase, LOOP_AMPLITUDE);
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
}
