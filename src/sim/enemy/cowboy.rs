//! Cowboy: keep a range band, telegraph, fire one leading shot, cool down

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{EnemyBrain, EnemyCtx, StateMachine};
use crate::sim::bullet::BulletSpec;
use crate::sim::collision::{Collider, move_and_slide};
use crate::sim::entity::Entity;
use crate::sim::fsm::Fsm;

pub const RUN_SPEED: f32 = 110.0;
pub const RUN_MIN: f32 = 2.0;
pub const RUN_MAX: f32 = 3.5;
pub const TELEGRAPH_TIME: f32 = 0.6;
pub const COOLDOWN_TIME: f32 = 0.5;
pub const COWBOY_BULLET_SPEED: f32 = 260.0;
/// Preferred distance band from the player
pub const BAND_NEAR: f32 = 170.0;
pub const BAND_FAR: f32 = 270.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CowboyState {
    Running,
    Telegraph,
    Firing,
    Cooldown,
}

impl CowboyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CowboyState::Running => "running",
            CowboyState::Telegraph => "telegraph",
            CowboyState::Firing => "firing",
            CowboyState::Cooldown => "cooldown",
        }
    }
}

/// Point to shoot at so a bullet of `speed` meets a target moving at `vel`
///
/// Uses the straight-line travel time to the target's current position,
/// which is what the player can read and dodge.
pub fn lead_target(from: Vec2, target: Vec2, vel: Vec2, speed: f32) -> Vec2 {
    if speed <= 0.0 {
        return target;
    }
    let t = from.distance(target) / speed;
    target + vel * t
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cowboy {
    fsm: Fsm<CowboyState>,
    /// Chosen lazily on the first running frame
    run_duration: Option<f32>,
    /// +1 or -1: which way to circle while inside the band
    strafe_sign: f32,
    pub last_aim: Vec2,
}

impl Default for Cowboy {
    fn default() -> Self {
        Self::new()
    }
}

impl Cowboy {
    pub fn new() -> Self {
        Self {
            fsm: Fsm::new(CowboyState::Running),
            run_duration: None,
            strafe_sign: 1.0,
            last_aim: Vec2::ZERO,
        }
    }

    /// Movement direction for keeping the band
    pub fn band_direction(&self, pos: Vec2, player: Vec2) -> Vec2 {
        let to_player = player - pos;
        let dist = to_player.length();
        if dist < 1e-6 {
            return Vec2::X;
        }
        let toward = to_player / dist;
        if dist < BAND_NEAR {
            -toward
        } else if dist > BAND_FAR {
            toward
        } else {
            toward.perp() * self.strafe_sign
        }
    }

    fn run(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        if self.run_duration.is_none() {
            self.run_duration = Some(ctx.rng.random_range(RUN_MIN..RUN_MAX));
            self.strafe_sign = if ctx.rng.random::<bool>() { 1.0 } else { -1.0 };
        }

        let dir = self.band_direction(body.pos, ctx.player.pos());
        let speed = RUN_SPEED * ctx.speed_scale();
        if move_and_slide(body, dir * speed * dt, ctx.walls, Collider::Box) {
            // Cornered while strafing: circle the other way
            self.strafe_sign = -self.strafe_sign;
        }

        if self.run_duration.is_some_and(|d| self.fsm.timer() >= d) {
            self.set_state(CowboyState::Telegraph, body);
        }
    }

    fn fire(&mut self, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let speed = COWBOY_BULLET_SPEED * ctx.speed_scale();
        let target = lead_target(body.pos, ctx.player.pos(), ctx.player.vel, speed);
        self.last_aim = crate::direction_or(body.pos, target, Vec2::X);
        let spec = BulletSpec {
            color: ctx.color,
            ..Default::default()
        };
        ctx.bullets.spawn(body.pos, self.last_aim * speed, spec);
        self.set_state(CowboyState::Cooldown, body);
    }
}

impl StateMachine for Cowboy {
    type State = CowboyState;

    fn fsm(&self) -> &Fsm<CowboyState> {
        &self.fsm
    }

    fn fsm_mut(&mut self) -> &mut Fsm<CowboyState> {
        &mut self.fsm
    }

    fn on_enter(&mut self, to: CowboyState, _body: &mut Entity) {
        if to == CowboyState::Running {
            self.run_duration = None;
        }
    }
}

impl EnemyBrain for Cowboy {
    fn think(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let t = self.fsm.timer();
        match self.fsm.state() {
            CowboyState::Running => self.run(dt, body, ctx),
            CowboyState::Telegraph if t >= TELEGRAPH_TIME => {
                self.set_state(CowboyState::Firing, body)
            }
            CowboyState::Firing => self.fire(body, ctx),
            CowboyState::Cooldown if t >= COOLDOWN_TIME => {
                self.set_state(CowboyState::Running, body)
            }
            _ => {}
        }
    }

    fn reset_to_idle(&mut self, body: &mut Entity) {
        self.set_state(CowboyState::Running, body);
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
        self.fsm.is(CowboyState::Telegraph)
    }
}
