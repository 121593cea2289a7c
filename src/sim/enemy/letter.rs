//! Letter: aim, fire one bullet, wait for it, teleport to where it ended
//!
//! A Letter owns at most one bullet in flight. It does not aim again until
//! the pool reports that bullet inactive.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{EnemyBrain, EnemyCtx, StateMachine};
use crate::sim::bullet::{BulletHandle, BulletSpec};
use crate::sim::collision::{Collider, move_and_slide};
use crate::sim::entity::Entity;
use crate::sim::fsm::Fsm;

pub const AIM_TIME: f32 = 1.0;
/// Telegraph starts this far into aiming
pub const AIM_TELL: f32 = 0.6;
pub const TELEPORT_TIME: f32 = 0.25;
pub const LETTER_BULLET_SPEED: f32 = 220.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LetterState {
    Aiming,
    Firing,
    Waiting,
    Teleporting,
}

impl LetterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterState::Aiming => "aiming",
            LetterState::Firing => "firing",
            LetterState::Waiting => "waiting",
            LetterState::Teleporting => "teleporting",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Letter {
    fsm: Fsm<LetterState>,
    pub aim_dir: Vec2,
    /// The one bullet this letter has in flight
    pub in_flight: Option<BulletHandle>,
    /// Where the in-flight bullet was last seen alive; its pool slot may be
    /// reused by another shooter before this letter notices it died
    last_seen: Option<Vec2>,
    teleport_to: Option<Vec2>,
    pub shots_fired: u32,
}

impl Default for Letter {
    fn default() -> Self {
        Self::new()
    }
}

impl Letter {
    pub fn new() -> Self {
        Self {
            fsm: Fsm::new(LetterState::Aiming),
            aim_dir: Vec2::X,
            in_flight: None,
            last_seen: None,
            teleport_to: None,
            shots_fired: 0,
        }
    }

    fn bullet_alive(&self, ctx: &EnemyCtx<'_>) -> bool {
        self.in_flight.is_some_and(|h| ctx.bullets.is_alive(h))
    }

    fn track_bullet(&mut self, ctx: &EnemyCtx<'_>) {
        if let Some(bullet) = self
            .in_flight
            .and_then(|h| ctx.bullets.get(h))
            .filter(|b| b.active())
        {
            self.last_seen = Some(bullet.pos());
        }
    }

    fn aim(&mut self, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        self.aim_dir = crate::direction_or(body.pos, ctx.player.pos(), self.aim_dir);
        if self.fsm.timer() < AIM_TIME {
            return;
        }
        if self.bullet_alive(ctx) {
            // Knockback can land us back in aiming with a shot still out
            self.set_state(LetterState::Waiting, body);
        } else {
            self.set_state(LetterState::Firing, body);
        }
    }

    fn fire(&mut self, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let speed = LETTER_BULLET_SPEED * ctx.speed_scale();
        let spec = BulletSpec {
            color: ctx.color,
            ..Default::default()
        };
        self.in_flight = Some(ctx.bullets.spawn(body.pos, self.aim_dir * speed, spec));
        self.last_seen = Some(body.pos);
        self.shots_fired += 1;
        self.set_state(LetterState::Waiting, body);
    }

    fn wait(&mut self, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        if self.bullet_alive(ctx) {
            return;
        }
        let exact = self
            .in_flight
            .take()
            .and_then(|h| ctx.bullets.last_position(h));
        self.teleport_to = exact.or(self.last_seen.take());
        self.set_state(LetterState::Teleporting, body);
    }

    fn teleport(&mut self, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        if self.fsm.timer() < TELEPORT_TIME {
            return;
        }
        if let Some(target) = self.teleport_to.take() {
            body.pos = target;
            move_and_slide(body, Vec2::ZERO, ctx.walls, Collider::Box);
        }
        self.set_state(LetterState::Aiming, body);
    }
}

impl StateMachine for Letter {
    type State = LetterState;

    fn fsm(&self) -> &Fsm<LetterState> {
        &self.fsm
    }

    fn fsm_mut(&mut self) -> &mut Fsm<LetterState> {
        &mut self.fsm
    }

    fn on_exit(&mut self, from: LetterState, _body: &mut Entity) {
        if from == LetterState::Teleporting {
            self.teleport_to = None;
        }
    }
}

impl EnemyBrain for Letter {
    fn think(&mut self, _dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        self.track_bullet(ctx);
        match self.fsm.state() {
            LetterState::Aiming => self.aim(body, ctx),
            LetterState::Firing => self.fire(body, ctx),
            LetterState::Waiting => self.wait(body, ctx),
            LetterState::Teleporting => self.teleport(body, ctx),
        }
    }

    fn reset_to_idle(&mut self, body: &mut Entity) {
        self.set_state(LetterState::Aiming, body);
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
        self.fsm.is(LetterState::Aiming) && self.fsm.timer() >= AIM_TELL
    }
}
