//! Controller: flash, then a four-way burst alternating cardinal and diagonal

use serde::{Deserialize, Serialize};

use super::{EnemyBrain, EnemyCtx, StateMachine};
use crate::sim::bullet::BulletSpec;
use crate::sim::entity::Entity;
use crate::sim::fsm::Fsm;

pub const IDLE_TIME: f32 = 1.5;
pub const FLASH_TIME: f32 = 0.5;
pub const BURST_SPEED: f32 = 170.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    Idle,
    Flash,
    Firing,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "idle",
            ControllerState::Flash => "flash",
            ControllerState::Firing => "firing",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controller {
    fsm: Fsm<ControllerState>,
    /// Next burst uses the diagonals
    pub diagonal: bool,
    pub bursts: u32,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            fsm: Fsm::new(ControllerState::Idle),
            diagonal: false,
            bursts: 0,
        }
    }

    /// Burst directions (radians) for the current pattern
    pub fn burst_angles(&self) -> [f32; 4] {
        use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
        let offset = if self.diagonal { FRAC_PI_4 } else { 0.0 };
        [0.0, 1.0, 2.0, 3.0].map(|i| offset + i * FRAC_PI_2)
    }

    fn burst(&mut self, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let speed = BURST_SPEED * ctx.speed_scale();
        let spec = BulletSpec {
            color: ctx.color,
            ..Default::default()
        };
        for theta in self.burst_angles() {
            ctx.bullets.spawn(body.pos, crate::from_angle(theta) * speed, spec);
        }
        self.bursts += 1;
        self.set_state(ControllerState::Idle, body);
    }
}

impl StateMachine for Controller {
    type State = ControllerState;

    fn fsm(&self) -> &Fsm<ControllerState> {
        &self.fsm
    }

    fn fsm_mut(&mut self) -> &mut Fsm<ControllerState> {
        &mut self.fsm
    }

    fn on_exit(&mut self, from: ControllerState, _body: &mut Entity) {
        if from == ControllerState::Firing {
            self.diagonal = !self.diagonal;
        }
    }
}

impl EnemyBrain for Controller {
    fn think(&mut self, _dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let t = self.fsm.timer();
        match self.fsm.state() {
            ControllerState::Idle if t >= IDLE_TIME => self.set_state(ControllerState::Flash, body),
            ControllerState::Flash if t >= FLASH_TIME => {
                // Firing is instant: the burst goes out this frame
                self.set_state(ControllerState::Firing, body);
                self.burst(body, ctx);
            }
            _ => {}
        }
    }

    fn reset_to_idle(&mut self, body: &mut Entity) {
        self.set_state(ControllerState::Idle, body);
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

    fn is_anticipating(&self) -> bool {
        self.fsm.is(ControllerState::Flash)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::enemy::test_support::*;
    use crate::sim::enemy::{Behavior, Enemy, EnemyKind};

    fn controller(e: &Enemy) -> &Controller {
        match &e.behavior {
            Behavior::Controller(c) => c,
            _ => unreachable!(),
        }
    }

    fn bullet_dirs(arena: &Arena) -> Vec<Vec2> {
        arena.bullets.iter_active().map(|b| b.vel.normalize()).collect()
    }

    #[test]
    fn test_bursts_alternate_patterns() {
        let mut arena = Arena::new(Vec2::new(700.0, 500.0));
        let mut e = enemy(EnemyKind::Controller, Vec2::new(400.0, 300.0));

        arena.step(&mut e, frames(IDLE_TIME + FLASH_TIME) + 2);
        assert_eq!(controller(&e).bursts, 1);
        assert_eq!(controller(&e).state(), ControllerState::Idle);
        let dirs = bullet_dirs(&arena);
        assert_eq!(dirs.len(), 4);
        for d in &dirs {
            // Cardinal: one component is zero
            assert!(d.x.abs() < 1e-4 || d.y.abs() < 1e-4, "{:?}", d);
        }

        arena.bullets.clear();
        arena.step(&mut e, frames(IDLE_TIME + FLASH_TIME) + 2);
        assert_eq!(controller(&e).bursts, 2);
        let dirs = bullet_dirs(&arena);
        assert_eq!(dirs.len(), 4);
        for d in &dirs {
            assert!((d.x.abs() - d.y.abs()).abs() < 1e-4, "{:?}", d);
        }
    }

    #[test]
    fn test_knockback_in_flash_skips_burst() {
        let mut arena = Arena::new(Vec2::new(700.0, 500.0));
        let mut e = enemy(EnemyKind::Controller, Vec2::new(400.0, 300.0));
        arena.step(&mut e, frames(IDLE_TIME) + 2);
        assert!(e.is_anticipating());

        e.apply_knockback(Vec2::new(380.0, 300.0), 200.0, &mut arena.rng);
        assert_eq!(e.state_name(), "idle");
        arena.step(&mut e, frames(FLASH_TIME) + 1);
        assert_eq!(controller(&e).bursts, 0);
        assert!(!controller(&e).diagonal);
    }
}
