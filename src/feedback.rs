//! Fire-and-forget feedback: sound cues, particle bursts, camera shake
//!
//! The encounter core calls into a `Feedback` implementation and never reads
//! anything back. Synthesis and rendering live outside the core; the shell
//! injects whatever sink it has (the native demo and tests use `EventLog`).

use glam::Vec2;

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    /// Enemy entered a windup/telegraph state
    Anticipation,
    /// A QTE took over the encounter
    QteStart,
    /// QTE won
    QteSuccess,
    /// QTE lost
    QteFail,
    /// Player lost a life
    PlayerHit,
    /// Bullet hit was retroactively undone by a QTE
    DamageUndone,
    /// Falling enemy touched down
    EnemyLand,
    /// Heart QTE granted a life
    ExtraLife,
    /// Clock QTE added time
    TimeBonus,
    /// Boss took a hit
    BossHit,
    /// Level exit opened
    ExitOpen,
    /// Generator powered on
    GeneratorOn,
    /// Level timer ran out
    TimeUp,
}

/// One recorded feedback call
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackEvent {
    Sound { sfx: Sfx, pos: Vec2 },
    DeathBurst { pos: Vec2, color: u32 },
    Shake { amount: f32 },
}

/// Sink for audio/particle/camera notifications
pub trait Feedback {
    fn play_sfx(&mut self, sfx: Sfx, pos: Vec2);
    fn death_burst(&mut self, pos: Vec2, color: u32);
    fn camera_shake(&mut self, amount: f32);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedback;

impl Feedback for NullFeedback {
    fn play_sfx(&mut self, _sfx: Sfx, _pos: Vec2) {}
    fn death_burst(&mut self, _pos: Vec2, _color: u32) {}
    fn camera_shake(&mut self, _amount: f32) {}
}

/// Records every call in order
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<FeedbackEvent>,
    /// Shake requests are dropped when false (reduced motion)
    pub shake_enabled: bool,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            shake_enabled: true,
        }
    }

    /// How many times a sound was played
    pub fn count(&self, sfx: Sfx) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::Sound { sfx: s, .. } if *s == sfx))
            .count()
    }

    pub fn drain(&mut self) -> Vec<FeedbackEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Feedback for EventLog {
    fn play_sfx(&mut self, sfx: Sfx, pos: Vec2) {
        self.events.push(FeedbackEvent::Sound { sfx, pos });
    }

    fn death_burst(&mut self, pos: Vec2, color: u32) {
        self.events.push(FeedbackEvent::DeathBurst { pos, color });
    }

    fn camera_shake(&mut self, amount: f32) {
        if self.shake_enabled {
            self.events.push(FeedbackEvent::Shake { amount });
        }
    }
}
