//! Enemies: a shared body plus one typed state machine per kind
//!
//! `Enemy` carries everything common to all kinds (position, knockback,
//! falling entrance, stun). The kind-specific behaviour lives in `Behavior`,
//! each variant driving its own closed state enum through `StateMachine`.

pub mod bat;
pub mod clock;
pub mod controller;
pub mod cowboy;
pub mod gopher;
pub mod heart;
pub mod letter;
pub mod spinning_top;

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bullet::BulletPool;
use super::collision::{Collider, Rect, move_and_slide};
use super::entity::{Entity, decay_knockback};
use super::fsm::Fsm;
use super::player::Player;
use super::qte::QteKind;
use super::{SimRng, random_unit};
use crate::consts::*;

pub use bat::{Bat, BatState};
pub use clock::{Clock, ClockState};
pub use controller::{Controller, ControllerState};
pub use cowboy::{Cowboy, CowboyState};
pub use gopher::{Gopher, GopherState};
pub use heart::{Heart, HeartState};
pub use letter::{Letter, LetterState};
pub use spinning_top::{SpinningTop, SpinningTopState};

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Bat,
    Gopher,
    SpinningTop,
    Letter,
    Cowboy,
    Controller,
    Heart,
    Clock,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 8] = [
        EnemyKind::Bat,
        EnemyKind::Gopher,
        EnemyKind::SpinningTop,
        EnemyKind::Letter,
        EnemyKind::Cowboy,
        EnemyKind::Controller,
        EnemyKind::Heart,
        EnemyKind::Clock,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Bat => "bat",
            EnemyKind::Gopher => "gopher",
            EnemyKind::SpinningTop => "spinningTop",
            EnemyKind::Letter => "letter",
            EnemyKind::Cowboy => "cowboy",
            EnemyKind::Controller => "controller",
            EnemyKind::Heart => "heart",
            EnemyKind::Clock => "clock",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// QTE used unless an override says otherwise
    pub fn default_qte(&self) -> QteKind {
        match self {
            EnemyKind::Bat => QteKind::Bat,
            EnemyKind::Gopher => QteKind::Gopher,
            EnemyKind::SpinningTop => QteKind::SpinningTop,
            EnemyKind::Letter => QteKind::Letter,
            EnemyKind::Cowboy => QteKind::Cowboy,
            EnemyKind::Controller => QteKind::Controller,
            EnemyKind::Heart => QteKind::Heart,
            EnemyKind::Clock => QteKind::Clock,
        }
    }

    /// Tint used for bullets, death bursts and the QTE frame
    pub fn color(&self) -> u32 {
        match self {
            EnemyKind::Bat => 0x8e5cff,
            EnemyKind::Gopher => 0xb8793a,
            EnemyKind::SpinningTop => 0xff5c8a,
            EnemyKind::Letter => 0xf2f2f2,
            EnemyKind::Cowboy => 0xe0a040,
            EnemyKind::Controller => 0x5cc8ff,
            EnemyKind::Heart => 0xff3355,
            EnemyKind::Clock => 0xffe066,
        }
    }

    /// Display name shown on the QTE frame
    pub fn label(&self) -> &'static str {
        match self {
            EnemyKind::Bat => "Bat",
            EnemyKind::Gopher => "Gopher",
            EnemyKind::SpinningTop => "Spinning Top",
            EnemyKind::Letter => "Letter",
            EnemyKind::Cowboy => "Cowboy",
            EnemyKind::Controller => "Controller",
            EnemyKind::Heart => "Heart",
            EnemyKind::Clock => "Clock",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Speed multiplier derived from the difficulty multiplier
#[inline]
pub fn speed_scale(difficulty: f32) -> f32 {
    1.0 + (difficulty.max(1.0) - 1.0) * 0.5
}

/// Everything an enemy may touch during its update
pub struct EnemyCtx<'a> {
    pub walls: &'a [Rect],
    pub player: &'a Player,
    pub bullets: &'a mut BulletPool,
    pub rng: &'a mut SimRng,
    pub difficulty: f32,
    pub color: u32,
}

impl EnemyCtx<'_> {
    #[inline]
    pub fn speed_scale(&self) -> f32 {
        speed_scale(self.difficulty)
    }
}

/// Transition machinery shared by every enemy state enum
///
/// `set_state` is a no-op for the current state; otherwise it runs the exit
/// hook, commits (resetting the state timer), then runs the enter hook.
pub trait StateMachine {
    type State: Copy + PartialEq + fmt::Debug;

    fn fsm(&self) -> &Fsm<Self::State>;
    fn fsm_mut(&mut self) -> &mut Fsm<Self::State>;

    fn on_exit(&mut self, _from: Self::State, _body: &mut Entity) {}
    fn on_enter(&mut self, _to: Self::State, _body: &mut Entity) {}

    fn set_state(&mut self, next: Self::State, body: &mut Entity) {
        let current = self.fsm().state();
        if current == next {
            return;
        }
        log::trace!("{:?} -> {:?}", current, next);
        self.on_exit(current, body);
        self.fsm_mut().enter(next);
        self.on_enter(next, body);
    }

    #[inline]
    fn state(&self) -> Self::State {
        self.fsm().state()
    }

    #[inline]
    fn state_timer(&self) -> f32 {
        self.fsm().timer()
    }
}

/// Per-kind behaviour driven by `Enemy::update`
pub trait EnemyBrain {
    /// One frame of behaviour; the state timer has already been advanced
    fn think(&mut self, dt: f32, body: &mut Entity, ctx: &mut EnemyCtx<'_>);
    /// Interrupt whatever is happening and return to the default state
    fn reset_to_idle(&mut self, body: &mut Entity);
    fn tick_timer(&mut self, dt: f32);
    fn state_name(&self) -> &'static str;
    fn state_timer(&self) -> f32;
    /// Kind-specific exclusions from QTE triggering
    fn qte_blocked(&self) -> bool {
        false
    }
    fn is_anticipating(&self) -> bool {
        false
    }
    /// Acts as a projectile against the player
    fn is_lunging(&self) -> bool {
        false
    }
}

/// Kind-specific state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Behavior {
    Bat(Bat),
    Gopher(Gopher),
    SpinningTop(SpinningTop),
    Letter(Letter),
    Cowboy(Cowboy),
    Controller(Controller),
    Heart(Heart),
    Clock(Clock),
}

impl Behavior {
    pub fn for_kind(kind: EnemyKind, spawn: Vec2, room: Rect) -> Self {
        match kind {
            EnemyKind::Bat => Behavior::Bat(Bat::new()),
            EnemyKind::Gopher => Behavior::Gopher(Gopher::new(room)),
            EnemyKind::SpinningTop => Behavior::SpinningTop(SpinningTop::new()),
            EnemyKind::Letter => Behavior::Letter(Letter::new()),
            EnemyKind::Cowboy => Behavior::Cowboy(Cowboy::new()),
            EnemyKind::Controller => Behavior::Controller(Controller::new()),
            EnemyKind::Heart => Behavior::Heart(Heart::new()),
            EnemyKind::Clock => Behavior::Clock(Clock::new(spawn)),
        }
    }

    pub fn brain(&self) -> &dyn EnemyBrain {
        match self {
            Behavior::Bat(b) => b,
            Behavior::Gopher(b) => b,
            Behavior::SpinningTop(b) => b,
            Behavior::Letter(b) => b,
            Behavior::Cowboy(b) => b,
            Behavior::Controller(b) => b,
            Behavior::Heart(b) => b,
            Behavior::Clock(b) => b,
        }
    }

    pub fn brain_mut(&mut self) -> &mut dyn EnemyBrain {
        match self {
            Behavior::Bat(b) => b,
            Behavior::Gopher(b) => b,
            Behavior::SpinningTop(b) => b,
            Behavior::Letter(b) => b,
            Behavior::Cowboy(b) => b,
            Behavior::Controller(b) => b,
            Behavior::Heart(b) => b,
            Behavior::Clock(b) => b,
        }
    }
}

/// An enemy in the room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    /// QTE started on contact (defaults to the kind's own)
    pub qte_type: QteKind,
    /// Difficulty multiplier (>= 1)
    pub difficulty: f32,
    pub body: Entity,
    pub knockback: Vec2,
    /// Remaining stun (seconds)
    pub stun_timer: f32,
    pub falling: bool,
    pub fall_timer: f32,
    pub fall_duration: f32,
    /// Set for the frame the fall completes; the encounter clears it
    pub just_landed: bool,
    /// Last observed `is_anticipating`, for edge detection
    anticipation_seen: bool,
    pub behavior: Behavior,
}

impl Enemy {
    pub fn new(id: u32, kind: EnemyKind, pos: Vec2, difficulty: f32, room: Rect) -> Self {
        Self {
            id,
            kind,
            qte_type: kind.default_qte(),
            difficulty: difficulty.max(1.0),
            body: Entity::new(pos, Vec2::splat(ENEMY_SIZE)),
            knockback: Vec2::ZERO,
            stun_timer: 0.0,
            falling: false,
            fall_timer: 0.0,
            fall_duration: 0.0,
            just_landed: false,
            anticipation_seen: false,
            behavior: Behavior::for_kind(kind, pos, room),
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

    #[inline]
    pub fn rect(&self) -> Rect {
        self.body.rect()
    }

    #[inline]
    pub fn stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    /// Current state tag ("stunned" overrides the behaviour's own)
    pub fn state_name(&self) -> &'static str {
        if self.stunned() {
            "stunned"
        } else {
            self.behavior.brain().state_name()
        }
    }

    pub fn state_timer(&self) -> f32 {
        self.behavior.brain().state_timer()
    }

    /// Whether touching this enemy starts a QTE
    pub fn can_trigger_qte(&self) -> bool {
        self.active()
            && !self.stunned()
            && !self.falling
            && !self.just_landed
            && !self.behavior.brain().qte_blocked()
    }

    pub fn is_anticipating(&self) -> bool {
        self.active() && !self.falling && self.behavior.brain().is_anticipating()
    }

    pub fn is_lunging(&self) -> bool {
        self.active() && self.behavior.brain().is_lunging()
    }

    /// True exactly once per false->true edge of `is_anticipating`
    pub fn poll_anticipation(&mut self) -> bool {
        let now = self.is_anticipating();
        let edge = now && !self.anticipation_seen;
        self.anticipation_seen = now;
        edge
    }

    /// Kill the enemy (idempotent)
    pub fn take_damage(&mut self) {
        self.body.active = false;
    }

    pub fn stun(&mut self, seconds: f32) {
        self.stun_timer = self.stun_timer.max(seconds);
    }

    /// Shove away from a point and interrupt the current behaviour
    pub fn apply_knockback(&mut self, from: Vec2, force: f32, rng: &mut SimRng) {
        let fallback = random_unit(rng);
        let dir = crate::direction_or(from, self.body.pos, fallback);
        self.knockback = dir * force;
        self.reset_to_idle();
    }

    pub fn reset_to_idle(&mut self) {
        self.behavior.brain_mut().reset_to_idle(&mut self.body);
    }

    /// Begin a drop-from-above entrance
    pub fn start_fall(&mut self, duration: f32) {
        self.falling = true;
        self.fall_timer = 0.0;
        self.fall_duration = duration.max(0.0);
        self.just_landed = false;
    }

    pub fn clear_landing(&mut self) {
        self.just_landed = false;
    }

    /// Advance one frame
    pub fn update(
        &mut self,
        dt: f32,
        walls: &[Rect],
        player: &Player,
        bullets: &mut BulletPool,
        rng: &mut SimRng,
    ) {
        if !self.body.active {
            return;
        }

        if self.falling {
            self.fall_timer += dt;
            if self.fall_timer >= self.fall_duration {
                self.falling = false;
                self.just_landed = true;
            }
            return;
        }

        if self.knockback != Vec2::ZERO {
            move_and_slide(&mut self.body, self.knockback * dt, walls, Collider::Box);
            decay_knockback(&mut self.knockback, dt, KNOCKBACK_DECAY, KNOCKBACK_SNAP);
        }

        if self.stun_timer > 0.0 {
            self.stun_timer = (self.stun_timer - dt).max(0.0);
            return;
        }

        let mut ctx = EnemyCtx {
            walls,
            player,
            bullets,
            rng,
            difficulty: self.difficulty,
            color: self.kind.color(),
        };
        let brain = self.behavior.brain_mut();
        brain.tick_timer(dt);
        brain.think(dt, &mut self.body, &mut ctx);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::sim::seeded_rng;

    #[test]
    fn test_take_damage_is_idempotent() {
        let mut e = enemy(EnemyKind::Clock, Vec2::new(200.0, 200.0));
        e.take_damage();
        e.take_damage();
        assert!(!e.active());
        assert!(!e.can_trigger_qte());
    }

    #[test]
    fn test_falling_enemy_ignores_updates_and_blocks_qte() {
        let mut arena = Arena::new(Vec2::new(600.0, 400.0));
        let mut e = enemy(EnemyKind::Controller, Vec2::new(200.0, 200.0));
        e.start_fall(0.5);
        assert!(!e.can_trigger_qte());

        arena.step(&mut e, frames(0.25));
        assert!(e.falling);
        assert_eq!(e.state_timer(), 0.0);

        arena.step(&mut e, frames(0.3));
        assert!(!e.falling);
        assert!(e.just_landed);
        assert!(!e.can_trigger_qte());

        e.clear_landing();
        assert!(e.can_trigger_qte());
    }

    #[test]
    fn test_stunned_blocks_qte_and_behavior() {
        let mut arena = Arena::new(Vec2::new(600.0, 400.0));
        let mut e = enemy(EnemyKind::Controller, Vec2::new(200.0, 200.0));
        e.stun(0.5);
        assert_eq!(e.state_name(), "stunned");
        assert!(!e.can_trigger_qte());
        arena.step(&mut e, frames(0.25));
        assert_eq!(e.state_timer(), 0.0);
        arena.step(&mut e, frames(0.3));
        assert!(!e.stunned());
        assert!(e.can_trigger_qte());
    }

    #[test]
    fn test_knockback_pushes_away_and_decays_to_zero() {
        let mut arena = Arena::new(Vec2::new(600.0, 400.0));
        let mut e = enemy(EnemyKind::Controller, Vec2::new(300.0, 300.0));
        let mut rng = seeded_rng(1);
        e.apply_knockback(Vec2::new(250.0, 300.0), 400.0, &mut rng);
        assert!(e.knockback.x > 0.0);
        assert_eq!(e.knockback.y, 0.0);

        arena.step(&mut e, 200);
        assert_eq!(e.knockback, Vec2::ZERO);
        assert!(e.pos().x > 300.0);
    }

    #[test]
    fn test_knockback_from_coincident_point_is_finite() {
        let mut e = enemy(EnemyKind::Heart, Vec2::new(300.0, 300.0));
        let mut rng = seeded_rng(3);
        e.apply_knockback(Vec2::new(300.0, 300.0), 400.0, &mut rng);
        assert!(e.knockback.is_finite());
        assert!((e.knockback.length() - 400.0).abs() < 1e-2);
    }

    #[test]
    fn test_anticipation_edge_fires_once() {
        let mut arena = Arena::new(Vec2::new(600.0, 400.0));
        let mut e = enemy(EnemyKind::Controller, Vec2::new(200.0, 200.0));
        let mut edges = 0;
        // Two full controller cycles
        for _ in 0..frames(4.0) {
            arena.step(&mut e, 1);
            if e.poll_anticipation() {
                edges += 1;
            }
        }
        assert_eq!(edges, 2);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EnemyKind::ALL {
            assert_eq!(EnemyKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EnemyKind::from_name("SPINNINGTOP"), Some(EnemyKind::SpinningTop));
        assert_eq!(EnemyKind::from_name("dragon"), None);
    }
}
