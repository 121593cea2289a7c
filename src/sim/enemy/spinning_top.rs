//! Spinning top: drift, wind up, spray a bullet spiral, topple over

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{EnemyBrain, EnemyCtx, StateMachine};
use crate::sim::bullet::BulletSpec;
use crate::sim::collision::{Collider, move_and_slide};
use crate::sim::entity::Entity;
use crate::sim::fsm::Fsm;

pub const IDLE_TIME: f32 = 1.5;
pub const WIND_TIME: f32 = 0.6;
pub const FIRE_TIME: f32 = 2.0;
pub const TOPPLE_TIME: f32 = 1.0;
pub const SHOT_INTERVAL: f32 = 0.1;
/// Spiral step between consecutive shots
pub const SPIRAL_STEP: f32 = std::f32::consts::PI / 12.0;
pub const SPIRAL_BULLET_SPEED: f32 = 150.0;
const DRIFT_SPEED: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinningTopState {
    Idle,
    Winding,
    Firing,
    Toppling,
}

impl SpinningTopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinningTopState::Idle => "idle",
            SpinningTopState::Winding => "winding",
            SpinningTopState::Firing => "firing",
            SpinningTopState::Toppling => "toppling",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpinningTop {
    fsm: Fsm<SpinningTopState>,
    /// Direction of the next spiral shot (radians)
    pub spiral_angle: f32,
    shot_timer: f32,
    pub shots_fired: u32,
}

impl Default for SpinningTop {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinningTop {
    pub fn new() -> Self {
        Self {
            fsm: Fsm::new(SpinningTopState::Idle),
            spiral_angle: 0.0,
            shot_timer: 0.0,
            shots_fired: 0,
        }
    }

    fn drift(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let dir = crate::direction_or(body.pos, ctx.player.pos(), Vec2::ZERO);
        let speed = DRIFT_SPEED * ctx.speed_scale();
        move_and_slide(body, dir * speed * dt, ctx.walls, Collider::Box);
    }

    fn spray(&mut self, dt: f32, body: &Entity, ctx: &mut EnemyCtx<'_>) {
        self.shot_timer -= dt;
        let speed = SPIRAL_BULLET_SPEED * ctx.speed_scale();
        let spec = BulletSpec {
            color: ctx.color,
            ..Default::default()
        };
        while self.shot_timer <= 0.0 {
            let dir = crate::from_angle(self.spiral_angle);
            ctx.bullets.spawn(body.pos, dir * speed, spec);
            self.spiral_angle = crate::normalize_angle(self.spiral_angle + SPIRAL_STEP);
            self.shots_fired += 1;
            self.shot_timer += SHOT_INTERVAL;
        }
    }
}

impl StateMachine for SpinningTop {
    type State = SpinningTopState;

    fn fsm(&self) -> &Fsm<SpinningTopState> {
        &self.fsm
    }

    fn fsm_mut(&mut self) -> &mut Fsm<SpinningTopState> {
        &mut self.fsm
    }

    fn on_enter(&mut self, to: SpinningTopState, _body: &mut Entity) {
        if to == SpinningTopState::Firing {
            // First shot goes out on the first firing frame
            self.shot_timer = 0.0;
        }
    }
}

impl EnemyBrain for SpinningTop {
    fn think(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let t = self.fsm.timer();
        match self.fsm.state() {
            SpinningTopState::Idle => {
                self.drift(dt, body, ctx);
                if t >= IDLE_TIME {
                    self.set_state(SpinningTopState::Winding, body);
                }
            }
            SpinningTopState::Winding if t >= WIND_TIME => {
                self.set_state(SpinningTopState::Firing, body)
            }
            SpinningTopState::Firing => {
                if t >= FIRE_TIME {
                    self.set_state(SpinningTopState::Toppling, body);
                } else {
                    self.spray(dt, body, ctx);
                }
            }
            SpinningTopState::Toppling if t >= TOPPLE_TIME => {
                self.set_state(SpinningTopState::Idle, body)
            }
            _ => {}
        }
    }

    fn reset_to_idle(&mut self, body: &mut Entity) {
        self.set_state(SpinningTopState::Idle, body);
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
        self.fsm.is(SpinningTopState::Winding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::test_support::*;
    use crate::sim::enemy::{Behavior, Enemy, EnemyKind};

    fn top(e: &Enemy) -> &SpinningTop {
        match &e.behavior {
            Behavior::SpinningTop(t) => t,
            _ => unreachable!(),
        }
    }

    fn force(e: &mut Enemy, state: SpinningTopState) {
        if let Behavior::SpinningTop(t) = &mut e.behavior {
            t.set_state(state, &mut e.body);
        }
    }

    #[test]
    fn test_cycle_order() {
        let mut arena = Arena::new(Vec2::new(700.0, 500.0));
        let mut e = enemy(EnemyKind::SpinningTop, Vec2::new(200.0, 200.0));
        let mut seen = vec![top(&e).state()];
        for _ in 0..frames(IDLE_TIME + WIND_TIME + FIRE_TIME + TOPPLE_TIME) + 10 {
            arena.step(&mut e, 1);
            let s = top(&e).state();
            if seen.last() != Some(&s) {
                seen.push(s);
            }
        }
        assert_eq!(
            seen,
            vec![
                SpinningTopState::Idle,
                SpinningTopState::Winding,
                SpinningTopState::Firing,
                SpinningTopState::Toppling,
                SpinningTopState::Idle,
            ]
        );
    }

    #[test]
    fn test_spiral_rate_and_rotation() {
        let mut arena = Arena::new(Vec2::new(700.0, 500.0));
        let mut e = enemy(EnemyKind::SpinningTop, Vec2::new(400.0, 300.0));
        force(&mut e, SpinningTopState::Firing);

        arena.step(&mut e, frames(FIRE_TIME) + 1);
        assert_eq!(top(&e).state(), SpinningTopState::Toppling);
        // One shot per 0.1s over 2s, give or take the boundary frame
        let shots = top(&e).shots_fired;
        assert!((19..=21).contains(&shots), "shots = {}", shots);

        let expected = crate::normalize_angle(shots as f32 * SPIRAL_STEP);
        assert!((crate::normalize_angle(top(&e).spiral_angle - expected)).abs() < 1e-3);
    }

    #[test]
    fn test_idle_drifts_toward_player() {
        let mut arena = Arena::new(Vec2::new(700.0, 300.0));
        let mut e = enemy(EnemyKind::SpinningTop, Vec2::new(200.0, 300.0));
        arena.step(&mut e, 30);
        assert!(e.pos().x > 200.0);
        assert!(e.pos().x < 200.0 + DRIFT_SPEED);
    }

    #[test]
    fn test_winding_is_anticipation() {
        let mut e = enemy(EnemyKind::SpinningTop, Vec2::new(200.0, 300.0));
        assert!(!e.is_anticipating());
        force(&mut e, SpinningTopState::Winding);
        assert!(e.is_anticipating());
        assert!(e.can_trigger_qte());
    }
}
