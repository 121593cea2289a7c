//! Encounter orchestration: one room's enemies, bullets, player and QTEs
//!
//! Each gameplay frame runs in a fixed order:
//! 1. Player, enemy FSMs and the bullet pool update
//! 2. QTE trigger check (player AABB vs QTE-able enemies, spawn order wins)
//! 3. Bullet vs player (circle)
//! 4. Lunging enemies vs player (circle)
//! 5. Landing impacts, then landing flags are cleared
//!
//! A bullet hit recorded within `qte_priority_frames` of a QTE trigger is
//! undone: the QTE takes priority over a graze from the same contact. While a
//! QTE runs, only the QTE advances. Hitstop and pause freeze the frame count.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::bullet::BulletPool;
use super::collision::{Rect, aabb_vs_aabb, circle_vs_circle};
use super::enemy::{Enemy, EnemyKind};
use super::player::Player;
use super::qte::{GeneratorProxy, InputEvent, Qte, QteKind, QteResult, QteSubject};
use super::{SimRng, random_unit, seeded_rng};
use crate::feedback::{Feedback, Sfx};
use crate::settings::Settings;
use crate::tuning::{self, Tuning};

/// Wall thickness used by `LevelSetup::boxed`
const WALL_THICKNESS: f32 = 20.0;
/// Minimum distance between the player and a random spawn
const SPAWN_CLEARANCE: f32 = 150.0;
const GENERATOR_SIZE: f32 = 28.0;
const GENERATOR_COLOR: u32 = 0x44ff88;
/// Camera shake amounts
const SHAKE_HIT: f32 = 6.0;
const SHAKE_LAND: f32 = 4.0;
const SHAKE_KILL: f32 = 8.0;

/// Static description of a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSetup {
    /// Level depth driving every difficulty curve
    pub depth: i32,
    /// Walkable interior
    pub room: Rect,
    pub walls: Vec<Rect>,
    pub player_start: Vec2,
    /// Boss hit points, for boss rooms
    pub boss_hp: Option<u32>,
    pub generators: Vec<Vec2>,
    pub seed: u64,
}

impl LevelSetup {
    /// A rectangular room enclosed by four walls, player in the middle
    pub fn boxed(depth: i32, room: Rect, seed: u64) -> Self {
        let t = WALL_THICKNESS;
        let walls = vec![
            Rect::new(room.x - t, room.y - t, room.w + 2.0 * t, t),
            Rect::new(room.x - t, room.bottom(), room.w + 2.0 * t, t),
            Rect::new(room.x - t, room.y - t, t, room.h + 2.0 * t),
            Rect::new(room.right(), room.y - t, t, room.h + 2.0 * t),
        ];
        Self {
            depth,
            room,
            walls,
            player_start: room.center(),
            boss_hp: None,
            generators: Vec::new(),
            seed,
        }
    }
}

/// Interactable that is powered by winning a Tap QTE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    pub pos: Vec2,
    pub powered: bool,
}

impl Generator {
    pub fn rect(&self) -> Rect {
        Rect::centered(self.pos, Vec2::splat(GENERATOR_SIZE))
    }
}

/// Player input for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub move_dir: Vec2,
    pub dash: bool,
    /// Use whatever the player is standing on (generators)
    pub interact: bool,
    /// Raw events for the active QTE
    pub qte_events: Vec<InputEvent>,
}

/// Outcomes the shell may react to (HUD, scene changes, saves)
#[derive(Debug, Clone, PartialEq)]
pub enum EncounterEvent {
    QteStarted { subject: QteSubject, kind: QteKind },
    QteFinished { subject: QteSubject, result: QteResult },
    PlayerHit { lives: u8 },
    DamageUndone { lives: u8 },
    EnemyKilled { id: u32, kind: EnemyKind },
    ExtraLife { lives: u8 },
    TimeBonus { seconds: f32 },
    BossDamaged { hp: u32 },
    ExitOpened,
    TimeUp,
    GeneratorPowered { index: usize },
}

pub struct Encounter<F: Feedback> {
    pub depth: i32,
    pub tuning: Tuning,
    pub settings: Settings,
    pub room: Rect,
    pub walls: Vec<Rect>,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: BulletPool,
    pub generators: Vec<Generator>,
    /// The single active QTE, if any
    pub qte: Option<Qte>,
    /// Active gameplay frames so far (frozen by hitstop, pause and QTEs)
    pub frame_count: u64,
    /// Frame of the last bullet hit that cost a life
    bullet_damage_frame: Option<u64>,
    /// Remaining frozen frames
    pub hitstop: u32,
    /// Seconds left on the level clock
    pub time_left: f32,
    time_up: bool,
    pub boss_hp: Option<u32>,
    pub exit_open: bool,
    paused: bool,
    next_enemy_id: u32,
    rng: SimRng,
    events: Vec<EncounterEvent>,
    feedback: F,
}

impl<F: Feedback> Encounter<F> {
    pub fn new(setup: LevelSetup, tuning: Tuning, settings: Settings, feedback: F) -> Self {
        log::info!(
            "Encounter at depth {} (seed {}, boss: {:?})",
            setup.depth,
            setup.seed,
            setup.boss_hp
        );
        Self {
            depth: setup.depth.max(1),
            bullets: BulletPool::new(tuning.bullet_soft_cap),
            tuning,
            settings,
            room: setup.room,
            walls: setup.walls,
            player: Player::new(setup.player_start),
            enemies: Vec::new(),
            generators: setup
                .generators
                .into_iter()
                .map(|pos| Generator { pos, powered: false })
                .collect(),
            qte: None,
            frame_count: 0,
            bullet_damage_frame: None,
            hitstop: 0,
            time_left: tuning::level_time_limit(setup.depth),
            time_up: false,
            boss_hp: setup.boss_hp,
            exit_open: false,
            paused: false,
            next_enemy_id: 1,
            rng: seeded_rng(setup.seed),
            events: Vec::new(),
            feedback,
        }
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn feedback_mut(&mut self) -> &mut F {
        &mut self.feedback
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<EncounterEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: u32) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    #[inline]
    pub fn qte_active(&self) -> bool {
        self.qte.is_some()
    }

    /// Every enemy has been dealt with
    pub fn cleared(&self) -> bool {
        self.enemies.iter().all(|e| !e.active())
    }

    pub fn is_time_up(&self) -> bool {
        self.time_up
    }

    // === Spawning ===

    /// Add an enemy; returns its id
    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> u32 {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;

        let difficulty = tuning::difficulty_multiplier(self.depth);
        let mut enemy = Enemy::new(id, kind, pos, difficulty, self.room);
        if let Some(name) = self.tuning.qte_overrides.get(kind.name()) {
            enemy.qte_type = QteKind::parse(name);
        }
        log::debug!("Spawned {} #{} (qte: {})", kind, id, enemy.qte_type);
        self.enemies.push(enemy);
        id
    }

    /// Add an enemy that drops in from above
    pub fn spawn_falling(&mut self, kind: EnemyKind, pos: Vec2, duration: f32) -> u32 {
        let id = self.spawn_enemy(kind, pos);
        if let Some(enemy) = self.enemy_mut(id) {
            enemy.start_fall(duration);
        }
        id
    }

    /// Fill the room with `enemy_count(depth)` random enemies away from the player
    pub fn populate(&mut self) {
        let count = tuning::enemy_count(self.depth);
        let inset = Vec2::splat(crate::consts::ENEMY_SIZE);
        let min = Vec2::new(self.room.left(), self.room.top()) + inset;
        let max = Vec2::new(self.room.right(), self.room.bottom()) - inset;
        if min.x >= max.x || min.y >= max.y {
            log::warn!("Room too small to populate");
            return;
        }

        for _ in 0..count {
            let kind = EnemyKind::ALL[self.rng.random_range(0..EnemyKind::ALL.len())];
            let mut pos = self.player.pos();
            // A handful of tries, then accept whatever we got
            for _ in 0..16 {
                pos = Vec2::new(
                    self.rng.random_range(min.x..max.x),
                    self.rng.random_range(min.y..max.y),
                );
                if pos.distance(self.player.pos()) >= SPAWN_CLEARANCE {
                    break;
                }
            }
            self.spawn_enemy(kind, pos);
        }
    }

    // === Pause ===

    /// Freeze everything, including an in-progress QTE
    pub fn pause(&mut self) {
        if !self.paused {
            log::debug!("Encounter paused");
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            log::debug!("Encounter resumed");
            self.paused = false;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // === Frame ===

    /// Advance one fixed step
    pub fn tick(&mut self, dt: f32, input: &FrameInput) {
        if self.paused {
            return;
        }

        if self.qte.is_some() {
            self.update_qte(dt, input);
            return;
        }

        if self.hitstop > 0 {
            self.hitstop -= 1;
            return;
        }

        self.frame_count += 1;
        self.update_level_timer(dt);

        if !self.player.dead {
            if input.dash {
                self.player.dash(input.move_dir);
            }
            self.player.update(dt, input.move_dir, &self.walls);
        }

        for enemy in &mut self.enemies {
            enemy.update(
                dt,
                &self.walls,
                &self.player,
                &mut self.bullets,
                &mut self.rng,
            );
        }
        for enemy in &mut self.enemies {
            if enemy.poll_anticipation() {
                self.feedback.play_sfx(Sfx::Anticipation, enemy.pos());
            }
        }
        self.bullets.update(dt, &self.walls);

        self.arbitrate();

        if input.interact && self.qte.is_none() {
            self.try_interact();
        }
    }

    fn update_level_timer(&mut self, dt: f32) {
        if self.time_up {
            return;
        }
        self.time_left -= dt;
        if self.time_left <= 0.0 {
            self.time_left = 0.0;
            self.time_up = true;
            log::info!("Level timer expired");
            self.feedback.play_sfx(Sfx::TimeUp, self.player.pos());
            self.events.push(EncounterEvent::TimeUp);
        }
    }

    fn update_qte(&mut self, dt: f32, input: &FrameInput) {
        let Some(qte) = self.qte.as_mut() else {
            return;
        };
        for event in &input.qte_events {
            qte.on_input(event);
        }
        qte.update(dt, &mut self.rng);

        let Some(result) = qte.take_outcome() else {
            return;
        };
        let subject = qte.subject;
        self.qte = None;
        self.finish_qte(subject, result);
    }

    // === Arbitration ===

    /// A bullet hit recent enough to be undone by a QTE trigger
    fn within_priority_window(&self) -> bool {
        self.bullet_damage_frame
            .is_some_and(|hit| self.frame_count - hit <= self.tuning.qte_priority_frames)
    }

    /// Whether the player may start a QTE by touch this frame
    fn player_can_trigger(&self) -> bool {
        // Death is final, even inside the priority window
        if self.player.dead {
            return false;
        }
        // A fresh bullet hit leaves the player invulnerable, but the
        // contact that caused it may still turn into a QTE
        !self.player.invulnerable() || self.player.dashing() || self.within_priority_window()
    }

    fn arbitrate(&mut self) {
        if self.player.dead {
            self.clear_landings();
            return;
        }

        if self.qte.is_none() && self.player_can_trigger() {
            let body = self.player.rect();
            let touched = self
                .enemies
                .iter()
                .position(|e| e.can_trigger_qte() && aabb_vs_aabb(&body, &e.rect()));
            if let Some(i) = touched {
                if self.within_priority_window() {
                    self.player.undo_damage();
                    self.bullet_damage_frame = None;
                    log::info!(
                        "Bullet hit undone by QTE contact (lives {})",
                        self.player.lives
                    );
                    self.feedback.play_sfx(Sfx::DamageUndone, self.player.pos());
                    self.events.push(EncounterEvent::DamageUndone {
                        lives: self.player.lives,
                    });
                }
                let subject = QteSubject::from_enemy(&self.enemies[i]);
                self.start_qte(subject);
                self.clear_landings();
                return;
            }
        }

        let center = self.player.pos();
        let hits = self.bullets.collide_circle(center, self.player.bullet_radius);
        if hits > 0 && self.damage_player() {
            self.bullet_damage_frame = Some(self.frame_count);
        }

        let lunged = self.enemies.iter().any(|e| {
            e.is_lunging()
                && circle_vs_circle(center, self.player.bullet_radius, e.pos(), e.body.radius()).hit
        });
        if lunged {
            self.damage_player();
        }

        let landed: Vec<Vec2> = self
            .enemies
            .iter()
            .filter(|e| e.active() && e.just_landed)
            .map(|e| e.pos())
            .collect();
        for pos in landed {
            self.feedback.play_sfx(Sfx::EnemyLand, pos);
            self.shake(SHAKE_LAND);
            let radius = crate::consts::ENEMY_SIZE / 2.0;
            if circle_vs_circle(center, self.player.wall_radius, pos, radius).hit {
                self.damage_player();
            }
        }
        self.clear_landings();
    }

    fn clear_landings(&mut self) {
        for enemy in &mut self.enemies {
            enemy.clear_landing();
        }
    }

    /// One damage tick; returns true if it cost a life
    fn damage_player(&mut self) -> bool {
        if !self.player.damage() {
            return false;
        }
        log::debug!("Player hit, {} lives left", self.player.lives);
        self.feedback.play_sfx(Sfx::PlayerHit, self.player.pos());
        self.shake(SHAKE_HIT);
        self.events.push(EncounterEvent::PlayerHit {
            lives: self.player.lives,
        });
        true
    }

    fn shake(&mut self, amount: f32) {
        if self.settings.effective_screen_shake() {
            self.feedback.camera_shake(amount);
        }
    }

    // === QTE lifecycle ===

    fn start_qte(&mut self, subject: QteSubject) {
        let assist = self.settings.effective_qte_assist();
        let qte = Qte::for_subject(subject, self.depth, &mut self.rng, assist);
        log::info!(
            "QTE {} started by {} ({:.2}s)",
            qte.kind,
            subject.label(),
            qte.core.time_limit
        );
        self.feedback.play_sfx(Sfx::QteStart, self.player.pos());
        self.events.push(EncounterEvent::QteStarted {
            subject,
            kind: qte.kind,
        });
        self.qte = Some(qte);
    }

    fn finish_qte(&mut self, subject: QteSubject, result: QteResult) {
        log::info!("QTE for {} finished: {:?}", subject.label(), result);
        self.events
            .push(EncounterEvent::QteFinished { subject, result });

        match subject {
            QteSubject::Enemy { id, .. } => {
                let Some(index) = self.enemies.iter().position(|e| e.id == id) else {
                    log::warn!("QTE finished for unknown enemy #{}", id);
                    return;
                };
                match result {
                    QteResult::Success => self.on_enemy_defeated(index),
                    QteResult::Fail => self.on_enemy_qte_failed(index),
                    QteResult::Pending => {}
                }
            }
            QteSubject::Generator(proxy) => {
                if result == QteResult::Success {
                    self.power_generator(proxy.index);
                } else {
                    self.feedback
                        .play_sfx(Sfx::QteFail, self.player.pos());
                }
            }
        }
    }

    fn on_enemy_defeated(&mut self, index: usize) {
        let (id, kind, pos) = {
            let enemy = &mut self.enemies[index];
            enemy.take_damage();
            (enemy.id, enemy.kind, enemy.pos())
        };

        self.feedback.play_sfx(Sfx::QteSuccess, pos);
        if self.settings.particles {
            self.feedback.death_burst(pos, kind.color());
        }
        self.shake(SHAKE_KILL);
        self.events.push(EncounterEvent::EnemyKilled { id, kind });

        // Blast: clear nearby bullets and shove nearby enemies away
        let radius = self.tuning.blast_radius;
        let cleared = self.bullets.destroy_in_radius(pos, radius);
        let mut shoved = 0;
        for (i, other) in self.enemies.iter_mut().enumerate() {
            if i == index || !other.active() {
                continue;
            }
            if other.pos().distance_squared(pos) <= radius * radius {
                other.apply_knockback(pos, self.tuning.blast_knockback, &mut self.rng);
                shoved += 1;
            }
        }
        log::debug!("Blast cleared {} bullets, shoved {} enemies", cleared, shoved);

        match kind {
            EnemyKind::Heart => {
                if self.player.add_life(self.tuning.heart_life_cap) {
                    self.feedback.play_sfx(Sfx::ExtraLife, pos);
                    self.events.push(EncounterEvent::ExtraLife {
                        lives: self.player.lives,
                    });
                }
            }
            EnemyKind::Clock => {
                let bonus = self.tuning.clock_time_bonus;
                self.time_left += bonus;
                self.feedback.play_sfx(Sfx::TimeBonus, pos);
                self.events.push(EncounterEvent::TimeBonus { seconds: bonus });
            }
            _ => {}
        }

        if let Some(hp) = self.boss_hp.as_mut()
            && *hp > 0
        {
            *hp -= 1;
            let hp = *hp;
            log::info!("Boss hit, {} hp left", hp);
            self.feedback.play_sfx(Sfx::BossHit, pos);
            self.events.push(EncounterEvent::BossDamaged { hp });
            if hp == 0 {
                self.open_exit();
            }
        }

        self.hitstop = self.tuning.hitstop_frames;
    }

    fn on_enemy_qte_failed(&mut self, index: usize) {
        let enemy_pos = self.enemies[index].pos();
        self.feedback.play_sfx(Sfx::QteFail, enemy_pos);
        self.damage_player();

        // Separate the two so the same contact does not retrigger at once
        let force = self.tuning.qte_fail_knockback;
        let fallback = random_unit(&mut self.rng);
        self.player.apply_knockback(enemy_pos, force, fallback);
        let player_pos = self.player.pos();
        self.enemies[index].apply_knockback(player_pos, force, &mut self.rng);
    }

    fn open_exit(&mut self) {
        if self.exit_open {
            return;
        }
        self.exit_open = true;
        log::info!("Exit opened");
        self.feedback.play_sfx(Sfx::ExitOpen, self.room.center());
        self.events.push(EncounterEvent::ExitOpened);
    }

    // === Generators ===

    fn try_interact(&mut self) {
        if self.player.dead {
            return;
        }
        let body = self.player.rect();
        let Some(index) = self
            .generators
            .iter()
            .position(|g| !g.powered && aabb_vs_aabb(&body, &g.rect()))
        else {
            return;
        };
        self.start_qte(QteSubject::Generator(GeneratorProxy {
            index,
            color: GENERATOR_COLOR,
        }));
    }

    fn power_generator(&mut self, index: usize) {
        let Some(generator) = self.generators.get_mut(index) else {
            log::warn!("QTE finished for unknown generator {}", index);
            return;
        };
        generator.powered = true;
        let pos = generator.pos;
        log::info!("Generator {} powered", index);
        self.feedback.play_sfx(Sfx::GeneratorOn, pos);
        self.events.push(EncounterEvent::GeneratorPowered { index });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::consts::SIM_DT;
    use crate::feedback::EventLog;
    use crate::sim::bullet::BulletSpec;
    use crate::sim::enemy::{Behavior, BatState, StateMachine};

    fn room() -> Rect {
        Rect::new(20.0, 20.0, 800.0, 600.0)
    }

    fn encounter() -> Encounter<EventLog> {
        encounter_with(Tuning::default())
    }

    fn encounter_with(tuning: Tuning) -> Encounter<EventLog> {
        let setup = LevelSetup::boxed(1, room(), 42);
        Encounter::new(setup, tuning, Settings::default(), EventLog::new())
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn step(enc: &mut Encounter<EventLog>, frames: usize) {
        for _ in 0..frames {
            enc.tick(SIM_DT, &idle());
        }
    }

    fn skip_hitstop(enc: &mut Encounter<EventLog>) {
        let frames = enc.hitstop as usize;
        step(enc, frames);
    }

    /// A still bullet sitting on the player
    fn bullet_on_player(enc: &mut Encounter<EventLog>) {
        let pos = enc.player.pos();
        enc.bullets.spawn(pos, Vec2::ZERO, BulletSpec::default());
    }

    fn far() -> Vec2 {
        Vec2::new(700.0, 500.0)
    }

    fn force_qte(enc: &mut Encounter<EventLog>, result: QteResult) {
        let qte = enc.qte.as_mut().expect("qte active");
        match result {
            QteResult::Success => qte.core.succeed(),
            _ => qte.core.fail(),
        };
        enc.tick(SIM_DT, &idle());
    }

    #[test]
    fn test_retroactive_priority_undoes_bullet_hit() {
        let mut enc = encounter();
        let id = enc.spawn_enemy(EnemyKind::Controller, far());
        let lives = enc.player.lives;

        bullet_on_player(&mut enc);
        step(&mut enc, 1);
        let hit_frame = enc.frame_count;
        assert_eq!(enc.player.lives, lives - 1);
        assert!(enc.player.invulnerable());

        step(&mut enc, 1);
        // Contact two frames after the hit
        let pos = enc.player.pos();
        enc.enemy_mut(id).unwrap().body.pos = pos;
        step(&mut enc, 1);
        assert_eq!(enc.frame_count, hit_frame + 2);

        assert!(enc.qte_active());
        assert_eq!(enc.player.lives, lives);
        assert!(!enc.player.invulnerable());
        let events = enc.drain_events();
        assert!(events.contains(&EncounterEvent::DamageUndone { lives }));
        assert_eq!(enc.feedback().count(Sfx::DamageUndone), 1);
    }

    #[test]
    fn test_fatal_bullet_hit_is_not_undone_by_contact() {
        let mut enc = encounter();
        let id = enc.spawn_enemy(EnemyKind::Controller, far());
        enc.player.lives = 1;

        bullet_on_player(&mut enc);
        step(&mut enc, 1);
        assert!(enc.player.dead);

        let pos = enc.player.pos();
        enc.enemy_mut(id).unwrap().body.pos = pos;
        step(&mut enc, 1);
        assert!(!enc.qte_active());
        assert!(enc.player.dead);
        assert_eq!(enc.player.lives, 0);
        assert_eq!(enc.feedback().count(Sfx::DamageUndone), 0);
    }

    #[test]
    fn test_hit_outside_window_stands() {
        let mut enc = encounter();
        let id = enc.spawn_enemy(EnemyKind::Controller, far());
        let lives = enc.player.lives;

        bullet_on_player(&mut enc);
        step(&mut enc, 1);
        step(&mut enc, 4);
        let pos = enc.player.pos();
        enc.enemy_mut(id).unwrap().body.pos = pos;
        step(&mut enc, 1);

        // Still invulnerable from the hit, outside the window: no QTE
        assert!(!enc.qte_active());
        assert_eq!(enc.player.lives, lives - 1);
    }

    #[test]
    fn test_first_enemy_in_spawn_order_wins() {
        let mut enc = encounter();
        let pos = enc.player.pos();
        let first = enc.spawn_enemy(EnemyKind::Controller, pos + Vec2::new(10.0, 0.0));
        let _second = enc.spawn_enemy(EnemyKind::Controller, pos);
        step(&mut enc, 1);
        match enc.qte.as_ref().map(|q| q.subject) {
            Some(QteSubject::Enemy { id, .. }) => assert_eq!(id, first),
            other => panic!("unexpected subject {:?}", other),
        }
    }

    #[test]
    fn test_qte_freezes_world_and_blocks_second_qte() {
        let mut enc = encounter();
        let pos = enc.player.pos();
        enc.spawn_enemy(EnemyKind::Controller, pos);
        step(&mut enc, 1);
        assert!(enc.qte_active());
        let frame = enc.frame_count;
        let timer = enc.enemies[0].state_timer();

        // Another enemy lands on the player mid-QTE: ignored
        enc.spawn_enemy(EnemyKind::Controller, pos);
        step(&mut enc, 10);
        assert_eq!(enc.frame_count, frame);
        assert_eq!(enc.enemies[0].state_timer(), timer);
        let started = enc
            .drain_events()
            .iter()
            .filter(|e| matches!(e, EncounterEvent::QteStarted { .. }))
            .count();
        assert_eq!(started, 1);
    }

    #[test]
    fn test_qte_success_blast_and_hitstop() {
        let mut enc = encounter();
        let pos = enc.player.pos();
        let target = enc.spawn_enemy(EnemyKind::Controller, pos);
        let near = enc.spawn_enemy(EnemyKind::Controller, pos + Vec2::new(120.0, 0.0));
        let distant = enc.spawn_enemy(EnemyKind::Controller, pos + Vec2::new(-350.0, 0.0));
        step(&mut enc, 1);
        assert!(enc.qte_active());

        enc.bullets.spawn(pos + Vec2::new(0.0, 100.0), Vec2::ZERO, BulletSpec::default());
        enc.bullets.spawn(pos + Vec2::new(0.0, 260.0), Vec2::ZERO, BulletSpec::default());

        force_qte(&mut enc, QteResult::Success);
        assert!(!enc.qte_active());
        assert!(!enc.enemy(target).unwrap().active());
        assert_eq!(enc.bullets.active_count(), 1);
        assert!(enc.enemy(near).unwrap().knockback.x > 0.0);
        assert_eq!(enc.enemy(distant).unwrap().knockback, Vec2::ZERO);
        assert_eq!(enc.hitstop, enc.tuning.hitstop_frames);
        assert_eq!(enc.feedback().count(Sfx::QteSuccess), 1);

        let frame = enc.frame_count;
        skip_hitstop(&mut enc);
        assert_eq!(enc.frame_count, frame);
        step(&mut enc, 1);
        assert_eq!(enc.frame_count, frame + 1);
    }

    #[test]
    fn test_qte_fail_damages_and_separates() {
        let mut enc = encounter();
        let pos = enc.player.pos();
        let id = enc.spawn_enemy(EnemyKind::Controller, pos + Vec2::new(8.0, 0.0));
        let lives = enc.player.lives;
        step(&mut enc, 1);
        force_qte(&mut enc, QteResult::Fail);

        assert_eq!(enc.player.lives, lives - 1);
        assert!(enc.player.knockback.x < 0.0);
        assert!(enc.enemy(id).unwrap().knockback.x > 0.0);

        // No immediate retrigger against the same enemy
        step(&mut enc, 30);
        assert!(!enc.qte_active());
        assert!(enc.enemy(id).unwrap().active());
    }

    #[test]
    fn test_heart_and_clock_bonuses() {
        let mut enc = encounter();
        let pos = enc.player.pos();
        enc.spawn_enemy(EnemyKind::Heart, pos);
        step(&mut enc, 1);
        force_qte(&mut enc, QteResult::Success);
        assert_eq!(enc.player.lives, crate::consts::PLAYER_START_LIVES + 1);

        skip_hitstop(&mut enc);
        let before = enc.time_left;
        let pos = enc.player.pos();
        enc.spawn_enemy(EnemyKind::Clock, pos);
        step(&mut enc, 1);
        force_qte(&mut enc, QteResult::Success);
        assert!((enc.time_left - (before + enc.tuning.clock_time_bonus)).abs() < 0.1);

        let events = enc.drain_events();
        assert!(events.iter().any(|e| matches!(e, EncounterEvent::ExtraLife { .. })));
        assert!(events.iter().any(|e| matches!(e, EncounterEvent::TimeBonus { .. })));
    }

    #[test]
    fn test_extra_life_is_capped() {
        let mut tuning = Tuning::default();
        tuning.heart_life_cap = crate::consts::PLAYER_START_LIVES;
        let mut enc = encounter_with(tuning);
        let pos = enc.player.pos();
        enc.spawn_enemy(EnemyKind::Heart, pos);
        step(&mut enc, 1);
        force_qte(&mut enc, QteResult::Success);
        assert_eq!(enc.player.lives, crate::consts::PLAYER_START_LIVES);
    }

    #[test]
    fn test_boss_room_opens_exit() {
        let mut setup = LevelSetup::boxed(5, room(), 3);
        setup.boss_hp = Some(2);
        let mut enc = Encounter::new(setup, Tuning::default(), Settings::default(), EventLog::new());

        for _ in 0..2 {
            let pos = enc.player.pos();
            enc.spawn_enemy(EnemyKind::Controller, pos);
            step(&mut enc, 1);
            force_qte(&mut enc, QteResult::Success);
            skip_hitstop(&mut enc);
        }
        assert_eq!(enc.boss_hp, Some(0));
        assert!(enc.exit_open);
        let opened = enc
            .drain_events()
            .iter()
            .filter(|e| **e == EncounterEvent::ExitOpened)
            .count();
        assert_eq!(opened, 1);
    }

    #[test]
    fn test_lunging_bat_damages_instead_of_qte() {
        let mut enc = encounter();
        let pos = enc.player.pos();
        let id = enc.spawn_enemy(EnemyKind::Bat, far());
        {
            let bat = enc.enemy_mut(id).unwrap();
            bat.body.pos = pos;
            if let Behavior::Bat(b) = &mut bat.behavior {
                b.set_state(BatState::Lunge, &mut bat.body);
            }
        }
        let lives = enc.player.lives;
        step(&mut enc, 1);
        assert!(!enc.qte_active());
        assert_eq!(enc.player.lives, lives - 1);
    }

    #[test]
    fn test_landing_impact() {
        let mut enc = encounter();
        let pos = enc.player.pos();
        let id = enc.spawn_falling(EnemyKind::Controller, pos, 0.05);
        let lives = enc.player.lives;

        step(&mut enc, 1);
        assert_eq!(enc.player.lives, lives);
        assert!(!enc.qte_active());

        step(&mut enc, 3);
        assert_eq!(enc.player.lives, lives - 1);
        assert!(!enc.qte_active());
        assert!(!enc.enemy(id).unwrap().just_landed);
        assert_eq!(enc.feedback().count(Sfx::EnemyLand), 1);
    }

    #[test]
    fn test_pause_preserves_qte() {
        let mut enc = encounter();
        let pos = enc.player.pos();
        enc.spawn_enemy(EnemyKind::Controller, pos);
        step(&mut enc, 1);
        step(&mut enc, 10);
        let elapsed = enc.qte.as_ref().unwrap().core.elapsed;

        enc.pause();
        step(&mut enc, 100);
        assert_eq!(enc.qte.as_ref().unwrap().core.elapsed, elapsed);

        enc.resume();
        step(&mut enc, 1);
        assert!(enc.qte.as_ref().unwrap().core.elapsed > elapsed);
    }

    #[test]
    fn test_generator_tap_qte() {
        let mut setup = LevelSetup::boxed(1, room(), 9);
        setup.generators.push(setup.player_start);
        let mut enc = Encounter::new(setup, Tuning::default(), Settings::default(), EventLog::new());

        let interact = FrameInput {
            interact: true,
            ..Default::default()
        };
        enc.tick(SIM_DT, &interact);
        let qte = enc.qte.as_ref().expect("generator qte");
        assert_eq!(qte.kind, QteKind::Tap);

        let taps = FrameInput {
            qte_events: vec![InputEvent::MouseDown(Vec2::ZERO); tuning::generator_tap_target(1) as usize],
            ..Default::default()
        };
        enc.tick(SIM_DT, &taps);
        assert!(enc.generators[0].powered);
        assert!(
            enc.drain_events()
                .contains(&EncounterEvent::GeneratorPowered { index: 0 })
        );

        // Powered generators cannot be used again
        enc.tick(SIM_DT, &interact);
        assert!(!enc.qte_active());
    }

    #[test]
    fn test_qte_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("bat".to_string(), "tap".to_string());
        overrides.insert("gopher".to_string(), "no-such-game".to_string());
        let tuning = Tuning {
            qte_overrides: overrides,
            ..Default::default()
        };
        let mut enc = encounter_with(tuning);
        let bat = enc.spawn_enemy(EnemyKind::Bat, far());
        let gopher = enc.spawn_enemy(EnemyKind::Gopher, far());
        let top = enc.spawn_enemy(EnemyKind::SpinningTop, far());
        assert_eq!(enc.enemy(bat).unwrap().qte_type, QteKind::Tap);
        assert_eq!(enc.enemy(gopher).unwrap().qte_type, QteKind::Timeout);
        assert_eq!(enc.enemy(top).unwrap().qte_type, QteKind::SpinningTop);
    }

    #[test]
    fn test_level_timer_expires_once() {
        let mut enc = encounter();
        enc.time_left = 0.05;
        step(&mut enc, 10);
        assert!(enc.is_time_up());
        assert_eq!(enc.time_left, 0.0);
        let ups = enc
            .drain_events()
            .iter()
            .filter(|e| **e == EncounterEvent::TimeUp)
            .count();
        assert_eq!(ups, 1);
    }

    #[test]
    fn test_populate_is_deterministic() {
        let mut a = encounter();
        let mut b = encounter();
        a.populate();
        b.populate();
        assert_eq!(a.enemies.len(), tuning::enemy_count(1) as usize);
        for (x, y) in a.enemies.iter().zip(&b.enemies) {
            assert_eq!(x.kind, y.kind);
            assert_eq!(x.pos(), y.pos());
        }
    }

    #[test]
    fn test_anticipation_cue_plays_on_edge() {
        let mut enc = encounter();
        enc.spawn_enemy(EnemyKind::Controller, far());
        // One full idle + flash cycle
        step(&mut enc, 130);
        assert_eq!(enc.feedback().count(Sfx::Anticipation), 1);
    }
}
