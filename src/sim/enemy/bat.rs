//! Bat: random-walk flutter, short windup, straight-line lunge
//!
//! The lunge is aimed when the windup ends, at wherever the player is at
//! that moment. A lunging bat cannot be QTE'd; it is a projectile until it
//! runs out of travel or hits a wall.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{EnemyBrain, EnemyCtx, StateMachine};
use crate::sim::collision::{Collider, move_and_slide};
use crate::sim::entity::Entity;
use crate::sim::fsm::Fsm;
use crate::sim::random_unit;

pub const BAT_SPEED: f32 = 90.0;
pub const LUNGE_MULT: f32 = 3.0;
pub const FLUTTER_MIN: f32 = 2.0;
pub const FLUTTER_MAX: f32 = 4.0;
pub const WINDUP_TIME: f32 = 0.5;
pub const MAX_LUNGE_DISTANCE: f32 = 220.0;
/// Seconds between flutter heading changes
const WANDER_INTERVAL: f32 = 0.4;
/// Max random aim error (radians)
const LUNGE_JITTER: f32 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatState {
    Flutter,
    Windup,
    Lunge,
}

impl BatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatState::Flutter => "flutter",
            BatState::Windup => "windup",
            BatState::Lunge => "lunge",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bat {
    fsm: Fsm<BatState>,
    /// Chosen lazily on the first flutter frame
    flutter_duration: Option<f32>,
    wander_dir: Vec2,
    wander_timer: f32,
    pub lunge_dir: Vec2,
    pub lunge_traveled: f32,
}

impl Default for Bat {
    fn default() -> Self {
        Self::new()
    }
}

impl Bat {
    pub fn new() -> Self {
        Self {
            fsm: Fsm::new(BatState::Flutter),
            flutter_duration: None,
            wander_dir: Vec2::ZERO,
            wander_timer: 0.0,
            lunge_dir: Vec2::ZERO,
            lunge_traveled: 0.0,
        }
    }

    fn flutter(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let duration = *self
            .flutter_duration
            .get_or_insert_with(|| ctx.rng.random_range(FLUTTER_MIN..FLUTTER_MAX));

        self.wander_timer -= dt;
        if self.wander_timer <= 0.0 || self.wander_dir == Vec2::ZERO {
            self.wander_dir = random_unit(ctx.rng);
            self.wander_timer = WANDER_INTERVAL;
        }

        let speed = BAT_SPEED * ctx.speed_scale();
        if move_and_slide(body, self.wander_dir * speed * dt, ctx.walls, Collider::Box) {
            // Bounce off walls instead of grinding along them
            self.wander_dir = -self.wander_dir;
        }

        if self.fsm.timer() >= duration {
            self.set_state(BatState::Windup, body);
        }
    }

    fn windup(&mut self, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        if self.fsm.timer() < WINDUP_TIME {
            return;
        }
        let fallback = random_unit(ctx.rng);
        let aim = crate::direction_or(body.pos, ctx.player.pos(), fallback);
        let jitter = ctx.rng.random_range(-LUNGE_JITTER..LUNGE_JITTER);
        self.lunge_dir = Vec2::from_angle(jitter).rotate(aim);
        self.set_state(BatState::Lunge, body);
    }

    fn lunge(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let speed = BAT_SPEED * LUNGE_MULT * ctx.speed_scale();
        let before = body.pos;
        let hit_wall = move_and_slide(body, self.lunge_dir * speed * dt, ctx.walls, Collider::Box);
        self.lunge_traveled += body.pos.distance(before);

        if hit_wall || self.lunge_traveled >= MAX_LUNGE_DISTANCE {
            self.set_state(BatState::Flutter, body);
        }
    }
}

impl StateMachine for Bat {
    type State = BatState;

    fn fsm(&self) -> &Fsm<BatState> {
        &self.fsm
    }

    fn fsm_mut(&mut self) -> &mut Fsm<BatState> {
        &mut self.fsm
    }

    fn on_enter(&mut self, to: BatState, _body: &mut Entity) {
        match to {
            BatState::Flutter => {
                self.flutter_duration = None;
                self.wander_timer = 0.0;
            }
            BatState::Lunge => self.lunge_traveled = 0.0,
            BatState::Windup => {}
        }
    }

    fn on_exit(&mut self, from: BatState, _body: &mut Entity) {
        if from == BatState::Lunge {
            self.lunge_dir = Vec2::ZERO;
        }
    }
}

impl EnemyBrain for Bat {
    fn think(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        match self.fsm.state() {
            BatState::Flutter => self.flutter(dt, body, ctx),
            BatState::Windup => self.windup(body, ctx),
            BatState::Lunge => self.lunge(dt, body, ctx),
        }
    }

    fn reset_to_idle(&mut self, body: &mut Entity) {
        self.set_state(BatState::Flutter, body);
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
        self.fsm.is(BatState::Lunge)
    }

    fn is_anticipating(&self) -> bool {
        self.fsm.is(BatState::Windup)
    }

    fn is_lunging(&self) -> bool {
        self.fsm.is(BatState::Lunge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::test_support::*;
    use crate::sim::enemy::{Behavior, Enemy, EnemyKind};

    fn bat(e: &Enemy) -> &Bat {
        match &e.behavior {
            Behavior::Bat(b) => b,
            _ => unreachable!(),
        }
    }

    fn force(e: &mut Enemy, state: BatState) {
        if let Behavior::Bat(b) = &mut e.behavior {
            b.set_state(state, &mut e.body);
        }
    }

    fn run_until(arena: &mut Arena, e: &mut Enemy, state: BatState, max_frames: usize) -> bool {
        for _ in 0..max_frames {
            arena.step(e, 1);
            if bat(e).state() == state {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_flutter_is_qteable_lunge_is_not() {
        let mut arena = Arena::new(Vec2::new(600.0, 300.0));
        let mut e = enemy(EnemyKind::Bat, Vec2::new(300.0, 300.0));
        assert_eq!(e.state_name(), "flutter");
        assert!(e.active());
        assert!(e.can_trigger_qte());

        let budget = frames(FLUTTER_MAX + WINDUP_TIME) + 2;
        assert!(run_until(&mut arena, &mut e, BatState::Lunge, budget));
        assert!(!e.can_trigger_qte());
        assert!(e.is_lunging());
    }

    #[test]
    fn test_windup_aims_at_player() {
        let mut arena = Arena::new(Vec2::new(600.0, 300.0));
        let mut e = enemy(EnemyKind::Bat, Vec2::new(300.0, 300.0));
        force(&mut e, BatState::Windup);
        assert!(e.is_anticipating());
        assert!(run_until(&mut arena, &mut e, BatState::Lunge, frames(WINDUP_TIME) + 2));

        let to_player = (arena.player.pos() - e.pos()).normalize();
        assert!(bat(&e).lunge_dir.dot(to_player) > 0.95);
    }

    #[test]
    fn test_lunge_ends_after_max_distance() {
        let mut arena = Arena::new(Vec2::new(700.0, 300.0));
        let mut e = enemy(EnemyKind::Bat, Vec2::new(200.0, 300.0));
        force(&mut e, BatState::Windup);
        assert!(run_until(&mut arena, &mut e, BatState::Lunge, frames(WINDUP_TIME) + 2));
        let start = e.pos();
        assert!(run_until(&mut arena, &mut e, BatState::Flutter, 120));

        let step = BAT_SPEED * LUNGE_MULT / 60.0;
        let traveled = e.pos().distance(start);
        assert!(traveled >= MAX_LUNGE_DISTANCE - 1e-2);
        assert!(traveled <= MAX_LUNGE_DISTANCE + step + 1e-2);
    }

    #[test]
    fn test_wall_hit_cancels_lunge() {
        let mut arena = Arena::new(Vec2::new(30.0, 300.0));
        let mut e = enemy(EnemyKind::Bat, Vec2::new(90.0, 300.0));
        force(&mut e, BatState::Windup);
        assert!(run_until(&mut arena, &mut e, BatState::Lunge, frames(WINDUP_TIME) + 2));
        // The left wall is well inside the max lunge distance
        assert!(run_until(&mut arena, &mut e, BatState::Flutter, 60));
        assert!(e.pos().x - e.body.size.x / 2.0 <= 20.0 + 1e-3);
    }

    #[test]
    fn test_knockback_interrupts_lunge() {
        let mut arena = Arena::new(Vec2::new(600.0, 300.0));
        let mut e = enemy(EnemyKind::Bat, Vec2::new(300.0, 300.0));
        force(&mut e, BatState::Lunge);
        assert!(!e.can_trigger_qte());

        e.apply_knockback(arena.player.pos(), 300.0, &mut arena.rng);
        assert_eq!(e.state_name(), "flutter");
        assert_eq!(e.state_timer(), 0.0);
        assert!(e.can_trigger_qte());
    }
}
