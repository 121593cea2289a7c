//! Heart: never attacks, runs away or follows a waypoint path

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::{EnemyBrain, EnemyCtx, StateMachine};
use crate::consts::PLAYER_SPEED;
use crate::sim::collision::{Collider, move_and_slide};
use crate::sim::entity::Entity;
use crate::sim::fsm::Fsm;

/// Fraction of player speed the heart moves at
pub const FLEE_SPEED_FRACTION: f32 = 0.6;
/// Distance at which a waypoint counts as reached
pub const WAYPOINT_REACH: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartState {
    Fleeing,
    Pathfinding,
}

impl HeartState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeartState::Fleeing => "fleeing",
            HeartState::Pathfinding => "pathfinding",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heart {
    fsm: Fsm<HeartState>,
    /// Remaining waypoints, nearest first
    pub path: VecDeque<Vec2>,
}

impl Default for Heart {
    fn default() -> Self {
        Self::new()
    }
}

impl Heart {
    pub fn new() -> Self {
        Self {
            fsm: Fsm::new(HeartState::Fleeing),
            path: VecDeque::new(),
        }
    }

    /// Follow a precomputed path (e.g. toward a target room), then flee
    pub fn set_path(&mut self, waypoints: impl IntoIterator<Item = Vec2>, body: &mut Entity) {
        self.path = waypoints.into_iter().collect();
        if self.path.is_empty() {
            self.set_state(HeartState::Fleeing, body);
        } else {
            self.set_state(HeartState::Pathfinding, body);
        }
    }

    fn speed() -> f32 {
        PLAYER_SPEED * FLEE_SPEED_FRACTION
    }

    fn flee(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let away = crate::direction_or(ctx.player.pos(), body.pos, Vec2::X);
        move_and_slide(body, away * Self::speed() * dt, ctx.walls, Collider::Box);
    }

    fn follow(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        let mut budget = Self::speed() * dt;
        while budget > 0.0 {
            let Some(&next) = self.path.front() else {
                break;
            };
            let dist = body.pos.distance(next);
            if dist <= WAYPOINT_REACH {
                self.path.pop_front();
                continue;
            }
            let step = budget.min(dist);
            let dir = (next - body.pos) / dist;
            move_and_slide(body, dir * step, ctx.walls, Collider::Box);
            budget -= step;
            if body.pos.distance(next) > WAYPOINT_REACH {
                break;
            }
        }

        if self.path.is_empty() {
            self.set_state(HeartState::Fleeing, body);
        }
    }
}

impl StateMachine for Heart {
    type State = HeartState;

    fn fsm(&self) -> &Fsm<HeartState> {
        &self.fsm
    }

    fn fsm_mut(&mut self) -> &mut Fsm<HeartState> {
        &mut self.fsm
    }
}

impl EnemyBrain for Heart {
    fn think(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>) {
        match self.fsm.state() {
            HeartState::Fleeing => self.flee(dt, body, ctx),
            HeartState::Pathfinding => self.follow(dt, body, ctx),
        }
    }

    fn reset_to_idle(&mut self, body: &mut Entity) {
        let next = if self.path.is_empty() {
            HeartState::Fleeing
        } else {
            HeartState::Pathfinding
        };
        self.set_state(next, body);
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
