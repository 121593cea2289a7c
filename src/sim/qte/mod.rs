//! Quick time events: short timed mini-games that resolve an encounter
//!
//! Every QTE shares a `QteCore`: a countdown that fails the event on expiry
//! and a succeed/fail latch that only ever closes once. The mini-game itself
//! is a `Game` variant that reads raw input and decides when to close the
//! latch. Mini-games run in their own `QTE_VIEW_W x QTE_VIEW_H` screen space.

pub mod bat;
pub mod clock;
pub mod controller;
pub mod cowboy;
pub mod gopher;
pub mod heart;
pub mod letter;
pub mod spinning_top;
pub mod tap;

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::SimRng;
use super::enemy::{Enemy, EnemyKind};
use crate::tuning;

pub use bat::BatQte;
pub use clock::ClockQte;
pub use controller::ControllerQte;
pub use cowboy::CowboyQte;
pub use gopher::GopherQte;
pub use heart::HeartQte;
pub use letter::LetterQte;
pub use spinning_top::SpinningTopQte;
pub use tap::TapQte;

/// Outcome of a QTE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QteResult {
    #[default]
    Pending,
    Success,
    Fail,
}

/// Keys the mini-games care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Escape,
}

/// Raw input delivered to the active QTE (positions in QTE view space)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseDown(Vec2),
    MouseMove(Vec2),
    MouseUp(Vec2),
}

/// Mini-game types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QteKind {
    Bat,
    Gopher,
    SpinningTop,
    Letter,
    Cowboy,
    Controller,
    Heart,
    Clock,
    Tap,
    /// Generic fallback: nothing to do, fails when time runs out
    Timeout,
}

impl QteKind {
    pub const ALL: [QteKind; 10] = [
        QteKind::Bat,
        QteKind::Gopher,
        QteKind::SpinningTop,
        QteKind::Letter,
        QteKind::Cowboy,
        QteKind::Controller,
        QteKind::Heart,
        QteKind::Clock,
        QteKind::Tap,
        QteKind::Timeout,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QteKind::Bat => "bat",
            QteKind::Gopher => "gopher",
            QteKind::SpinningTop => "spinningTop",
            QteKind::Letter => "letter",
            QteKind::Cowboy => "cowboy",
            QteKind::Controller => "controller",
            QteKind::Heart => "heart",
            QteKind::Clock => "clock",
            QteKind::Tap => "tap",
            QteKind::Timeout => "timeout",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Resolve a configured name, falling back to the timeout-only QTE
    pub fn parse(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("No QTE named {:?}, using timeout fallback", name);
            QteKind::Timeout
        })
    }
}

impl fmt::Display for QteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Generator seen as a QTE trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorProxy {
    /// Index into the encounter's generator list
    pub index: usize,
    pub color: u32,
}

/// What started a QTE: only what the QTE frame needs to show
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum QteSubject {
    Enemy {
        id: u32,
        kind: EnemyKind,
        qte_type: QteKind,
        color: u32,
    },
    Generator(GeneratorProxy),
}

impl QteSubject {
    pub fn from_enemy(enemy: &Enemy) -> Self {
        QteSubject::Enemy {
            id: enemy.id,
            kind: enemy.kind,
            qte_type: enemy.qte_type,
            color: enemy.kind.color(),
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            QteSubject::Enemy { color, .. } => *color,
            QteSubject::Generator(g) => g.color,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QteSubject::Enemy { kind, .. } => kind.label(),
            QteSubject::Generator(_) => "Generator",
        }
    }

    pub fn qte_type(&self) -> QteKind {
        match self {
            QteSubject::Enemy { qte_type, .. } => *qte_type,
            QteSubject::Generator(_) => QteKind::Tap,
        }
    }
}

/// Countdown plus a one-shot success/fail latch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QteCore {
    pub time_limit: f32,
    pub elapsed: f32,
    completed: bool,
    result: QteResult,
    reported: bool,
}

impl QteCore {
    pub fn new(time_limit: f32) -> Self {
        Self {
            time_limit: time_limit.max(0.0),
            elapsed: 0.0,
            completed: false,
            result: QteResult::Pending,
            reported: false,
        }
    }

    #[inline]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[inline]
    pub fn result(&self) -> QteResult {
        self.result
    }

    /// Advance the clock; fails the QTE once the limit is reached
    pub fn tick(&mut self, dt: f32) {
        if self.completed {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.time_limit {
            self.fail();
        }
    }

    /// Close the latch as a win. Returns false if it was already closed.
    pub fn succeed(&mut self) -> bool {
        self.close(QteResult::Success)
    }

    /// Close the latch as a loss. Returns false if it was already closed.
    pub fn fail(&mut self) -> bool {
        self.close(QteResult::Fail)
    }

    fn close(&mut self, result: QteResult) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.result = result;
        true
    }

    /// The outcome, handed out exactly once after completion
    pub fn take_outcome(&mut self) -> Option<QteResult> {
        if self.completed && !self.reported {
            self.reported = true;
            Some(self.result)
        } else {
            None
        }
    }

    pub fn remaining(&self) -> f32 {
        (self.time_limit - self.elapsed).max(0.0)
    }

    /// Time bar fill, 1 at the start down to 0 at the limit
    pub fn progress(&self) -> f32 {
        if self.time_limit <= 0.0 {
            return 0.0;
        }
        (1.0 - self.elapsed / self.time_limit).clamp(0.0, 1.0)
    }
}

/// Per-mini-game rules
pub trait MiniGame {
    /// One frame; the core clock has already been advanced and is still open
    fn update(&mut self, _dt: f32, _core: &mut QteCore, _rng: &mut SimRng) {}
    fn on_input(&mut self, event: &InputEvent, core: &mut QteCore);
}

/// The mini-game behind a QTE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Game {
    Bat(BatQte),
    Gopher(GopherQte),
    SpinningTop(SpinningTopQte),
    Letter(LetterQte),
    Cowboy(CowboyQte),
    Controller(ControllerQte),
    Heart(HeartQte),
    Clock(ClockQte),
    Tap(TapQte),
    Timeout,
}

impl Game {
    fn build(kind: QteKind, subject: &QteSubject, depth: i32, rng: &mut SimRng) -> Self {
        match kind {
            QteKind::Bat => Game::Bat(BatQte::new(depth, rng)),
            QteKind::Gopher => Game::Gopher(GopherQte::new(depth)),
            QteKind::SpinningTop => Game::SpinningTop(SpinningTopQte::new()),
            QteKind::Letter => Game::Letter(LetterQte::new(depth, rng)),
            QteKind::Cowboy => Game::Cowboy(CowboyQte::new(depth, rng)),
            QteKind::Controller => Game::Controller(ControllerQte::new(rng)),
            QteKind::Heart => Game::Heart(HeartQte::new(depth)),
            QteKind::Clock => Game::Clock(ClockQte::new(depth, rng)),
            QteKind::Tap => {
                let target = match subject {
                    QteSubject::Generator(_) => tuning::generator_tap_target(depth),
                    QteSubject::Enemy { .. } => tuning::tap_target(depth),
                };
                Game::Tap(TapQte::new(target))
            }
            QteKind::Timeout => Game::Timeout,
        }
    }

    fn mini_game(&mut self) -> Option<&mut dyn MiniGame> {
        match self {
            Game::Bat(g) => Some(g),
            Game::Gopher(g) => Some(g),
            Game::SpinningTop(g) => Some(g),
            Game::Letter(g) => Some(g),
            Game::Cowboy(g) => Some(g),
            Game::Controller(g) => Some(g),
            Game::Heart(g) => Some(g),
            Game::Clock(g) => Some(g),
            Game::Tap(g) => Some(g),
            Game::Timeout => None,
        }
    }
}

/// A running QTE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Qte {
    pub kind: QteKind,
    pub core: QteCore,
    pub game: Game,
    pub subject: QteSubject,
}

impl Qte {
    /// Build the QTE a subject asks for, scaled to `depth`
    ///
    /// `assist` (>= 1) stretches the time limit for players who want it.
    pub fn for_subject(subject: QteSubject, depth: i32, rng: &mut SimRng, assist: f32) -> Self {
        let kind = subject.qte_type();
        let time_limit = tuning::qte_time_limit(kind, depth) * assist.max(1.0);
        Self {
            kind,
            core: QteCore::new(time_limit),
            game: Game::build(kind, &subject, depth, rng),
            subject,
        }
    }

    /// Wrap a ready-made game (fixtures, replays)
    pub fn with_game(kind: QteKind, subject: QteSubject, game: Game, time_limit: f32) -> Self {
        Self {
            kind,
            core: QteCore::new(time_limit),
            game,
            subject,
        }
    }

    #[inline]
    pub fn completed(&self) -> bool {
        self.core.completed()
    }

    #[inline]
    pub fn result(&self) -> QteResult {
        self.core.result()
    }

    pub fn update(&mut self, dt: f32, rng: &mut SimRng) {
        if self.core.completed() {
            return;
        }
        self.core.tick(dt);
        if self.core.completed() {
            return;
        }
        if let Some(game) = self.game.mini_game() {
            game.update(dt, &mut self.core, rng);
        }
    }

    pub fn on_input(&mut self, event: &InputEvent) {
        if self.core.completed() {
            return;
        }
        if let Some(game) = self.game.mini_game() {
            game.on_input(event, &mut self.core);
        }
    }

    pub fn take_outcome(&mut self) -> Option<QteResult> {
        self.core.take_outcome()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::sim::seeded_rng;

    fn enemy_subject(kind: EnemyKind, qte_type: QteKind) -> QteSubject {
        QteSubject::Enemy {
            id: 1,
            kind,
            qte_type,
            color: kind.color(),
        }
    }

    #[test]
    fn test_core_times_out() {
        let mut core = QteCore::new(1.0);
        for _ in 0..59 {
            core.tick(1.0 / 60.0);
        }
        assert_eq!(core.result(), QteResult::Pending);
        core.tick(1.0 / 60.0);
        core.tick(1.0 / 60.0);
        assert_eq!(core.result(), QteResult::Fail);
        assert_eq!(core.take_outcome(), Some(QteResult::Fail));
        assert_eq!(core.take_outcome(), None);
    }

    #[test]
    fn test_unknown_name_falls_back_to_timeout() {
        assert_eq!(QteKind::parse("tap"), QteKind::Tap);
        assert_eq!(QteKind::parse("SpinningTop"), QteKind::SpinningTop);
        assert_eq!(QteKind::parse("juggling"), QteKind::Timeout);
    }

    #[test]
    fn test_every_kind_builds_and_resolves_by_timeout() {
        let mut rng = seeded_rng(11);
        for kind in QteKind::ALL {
            let subject = enemy_subject(EnemyKind::Bat, kind);
            let mut qte = Qte::for_subject(subject, 1, &mut rng, 1.0);
            assert_eq!(qte.kind, kind);
            let budget = (qte.core.time_limit * 60.0) as usize + 5;
            for _ in 0..budget {
                qte.update(1.0 / 60.0, &mut rng);
            }
            assert!(qte.completed(), "{:?} never finished", kind);
            assert_eq!(qte.result(), QteResult::Fail, "{:?}", kind);
        }
    }

    #[test]
    fn test_generator_subject_is_tap() {
        let subject = QteSubject::Generator(GeneratorProxy {
            index: 0,
            color: 0x44ff88,
        });
        assert_eq!(subject.qte_type(), QteKind::Tap);
        assert_eq!(subject.label(), "Generator");

        let mut rng = seeded_rng(2);
        let qte = Qte::for_subject(subject, 1, &mut rng, 1.0);
        match qte.game {
            Game::Tap(ref tap) => assert_eq!(tap.target, tuning::generator_tap_target(1)),
            _ => panic!("expected tap"),
        }
    }

    #[test]
    fn test_assist_stretches_time_limit() {
        let mut rng = seeded_rng(3);
        let subject = enemy_subject(EnemyKind::Bat, QteKind::Bat);
        let normal = Qte::for_subject(subject, 1, &mut rng, 1.0);
        let assisted = Qte::for_subject(subject, 1, &mut rng, 1.5);
        assert!((assisted.core.time_limit - normal.core.time_limit * 1.5).abs() < 1e-4);
        // Below 1 is ignored
        let clamped = Qte::for_subject(subject, 1, &mut rng, 0.2);
        assert_eq!(clamped.core.time_limit, normal.core.time_limit);
    }

    #[test]
    fn test_input_after_completion_is_ignored() {
        let subject = enemy_subject(EnemyKind::Bat, QteKind::Tap);
        let mut qte = Qte::with_game(QteKind::Tap, subject, Game::Tap(TapQte::new(1)), 5.0);
        qte.core.fail();
        qte.on_input(&InputEvent::MouseDown(Vec2::ZERO));
        assert_eq!(qte.result(), QteResult::Fail);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Succeed,
        Fail,
        Tick,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Succeed), Just(Op::Fail), Just(Op::Tick)]
    }

    proptest! {
        #[test]
        fn prop_latch_closes_once(ops in proptest::collection::vec(op(), 1..40)) {
            let mut core = QteCore::new(0.1);
            let mut first: Option<QteResult> = None;
            let mut outcomes = 0;
            for op in ops {
                match op {
                    Op::Succeed => { core.succeed(); }
                    Op::Fail => { core.fail(); }
                    Op::Tick => core.tick(1.0 / 60.0),
                }
                if core.completed() && first.is_none() {
                    first = Some(core.result());
                }
                if let Some(r) = first {
                    prop_assert_eq!(core.result(), r);
                }
                if core.take_outcome().is_some() {
                    outcomes += 1;
                }
            }
            prop_assert!(outcomes <= 1);
            prop_assert_eq!(outcomes == 1, first.is_some());
        }
    }
}
