//! QTE Crawler entry point
//!
//! Handles platform-specific initialization and drives the encounter core at
//! a fixed step. The web build exposes a small handle to the page script; the
//! native build runs a headless autopiloted room and logs what happened.

use glam::Vec2;

use qte_crawler::consts::*;
use qte_crawler::sim::{Encounter, FrameInput, InputEvent, LevelSetup, Rect};
use qte_crawler::{Feedback, Settings, Tuning};

/// Room used when the shell does not supply a layout
fn default_room() -> Rect {
    Rect::new(20.0, 20.0, 800.0, 600.0)
}

/// Fixed-step accumulator shared by both front ends
struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    fn new() -> Self {
        Self { accumulator: 0.0 }
    }

    /// Run as many whole steps as `dt` covers, capped to avoid a spiral of death
    fn advance<F: Feedback>(
        &mut self,
        encounter: &mut Encounter<F>,
        dt: f32,
        input: &mut FrameInput,
    ) -> u32 {
        self.accumulator += dt.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            encounter.tick(SIM_DT, input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // One-shot inputs only apply to the first step
            input.dash = false;
            input.interact = false;
            input.qte_events.clear();
        }
        substeps
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;

    use super::*;
    use qte_crawler::NullFeedback;
    use qte_crawler::sim::Key;

    /// Encounter handle driven by the page's animation frame
    #[wasm_bindgen]
    pub struct WebEncounter {
        encounter: Encounter<NullFeedback>,
        clock: FixedStep,
        input: FrameInput,
    }

    #[wasm_bindgen]
    impl WebEncounter {
        #[wasm_bindgen(constructor)]
        pub fn new(seed: u64, depth: i32) -> WebEncounter {
            let setup = LevelSetup::boxed(depth, default_room(), seed);
            let mut encounter =
                Encounter::new(setup, Tuning::default(), Settings::load(), NullFeedback);
            encounter.populate();
            log::info!("Encounter ready (seed {}, depth {})", seed, depth);
            WebEncounter {
                encounter,
                clock: FixedStep::new(),
                input: FrameInput::default(),
            }
        }

        /// Advance by the real time elapsed since the last frame
        pub fn frame(&mut self, dt: f32) -> u32 {
            self.clock.advance(&mut self.encounter, dt, &mut self.input)
        }

        pub fn set_move(&mut self, x: f32, y: f32) {
            self.input.move_dir = Vec2::new(x, y);
        }

        pub fn dash(&mut self) {
            self.input.dash = true;
        }

        pub fn interact(&mut self) {
            self.input.interact = true;
        }

        pub fn mouse_down(&mut self, x: f32, y: f32) {
            self.input
                .qte_events
                .push(InputEvent::MouseDown(Vec2::new(x, y)));
        }

        pub fn mouse_move(&mut self, x: f32, y: f32) {
            self.input
                .qte_events
                .push(InputEvent::MouseMove(Vec2::new(x, y)));
        }

        pub fn mouse_up(&mut self, x: f32, y: f32) {
            self.input
                .qte_events
                .push(InputEvent::MouseUp(Vec2::new(x, y)));
        }

        /// `KeyboardEvent.key` values
        pub fn key_down(&mut self, key: &str) {
            if let Some(key) = parse_key(key) {
                self.input.qte_events.push(InputEvent::KeyDown(key));
            }
        }

        pub fn key_up(&mut self, key: &str) {
            if let Some(key) = parse_key(key) {
                self.input.qte_events.push(InputEvent::KeyUp(key));
            }
        }

        pub fn pause(&mut self) {
            self.encounter.pause();
        }

        pub fn resume(&mut self) {
            self.encounter.resume();
        }

        pub fn lives(&self) -> u8 {
            self.encounter.player.lives
        }

        pub fn time_left(&self) -> f32 {
            self.encounter.time_left
        }

        /// Name of the running QTE, if any
        pub fn qte_kind(&self) -> Option<String> {
            self.encounter.qte.as_ref().map(|q| q.kind.name().to_string())
        }

        pub fn cleared(&self) -> bool {
            self.encounter.cleared()
        }

        /// Drained encounter events as debug strings for the HUD
        pub fn drain_events(&mut self) -> Vec<String> {
            self.encounter
                .drain_events()
                .iter()
                .map(|e| format!("{:?}", e))
                .collect()
        }
    }

    fn parse_key(key: &str) -> Option<Key> {
        match key {
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            " " => Some(Key::Space),
            "Enter" => Some(Key::Enter),
            "Escape" => Some(Key::Escape),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c.to_ascii_lowercase())),
                    _ => None,
                }
            }
        }
    }

    #[wasm_bindgen(start)]
    pub fn wasm_main() {
        console_error_panic_hook::set_once();
        if let Err(err) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {}", err).into());
        }
        log::info!("QTE Crawler starting...");
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use qte_crawler::EventLog;
    use qte_crawler::sim::EncounterEvent;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let depth = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Tuning::load_or_default(&json),
            Err(err) => {
                log::warn!("Could not read {}: {}", path, err);
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };

    log::info!("QTE Crawler (native) headless run: seed {}, depth {}", seed, depth);

    let setup = LevelSetup::boxed(depth, default_room(), seed);
    let mut encounter = Encounter::new(setup, tuning, Settings::load(), EventLog::new());
    encounter.populate();

    let mut clock = FixedStep::new();
    let mut input = FrameInput::default();
    let mut kills = 0;
    let mut qtes = 0;

    // Two minutes of wall time at most
    for frame in 0..(120.0 / SIM_DT) as u32 {
        autopilot(&encounter, frame, &mut input);
        clock.advance(&mut encounter, SIM_DT, &mut input);

        for event in encounter.drain_events() {
            match event {
                EncounterEvent::QteStarted { .. } => qtes += 1,
                EncounterEvent::EnemyKilled { .. } => kills += 1,
                _ => {}
            }
            log::debug!("{:?}", event);
        }

        if encounter.cleared() || encounter.player.dead || encounter.is_time_up() {
            break;
        }
    }

    log::info!(
        "Run finished after {} frames: {} QTEs, {} kills, {} lives left, {:.1}s on the clock",
        encounter.frame_count,
        qtes,
        kills,
        encounter.player.lives,
        encounter.time_left
    );
    log::info!("{} feedback calls recorded", encounter.feedback().events.len());
}

/// Walk at the nearest enemy and mash the mouse during QTEs
#[cfg(not(target_arch = "wasm32"))]
fn autopilot<F: Feedback>(encounter: &Encounter<F>, frame: u32, input: &mut FrameInput) {
    if encounter.qte_active() {
        input.move_dir = Vec2::ZERO;
        if frame % 6 == 0 {
            let center = Vec2::new(QTE_VIEW_W, QTE_VIEW_H) / 2.0;
            input.qte_events.push(InputEvent::MouseDown(center));
        }
        return;
    }

    let me = encounter.player.pos();
    input.move_dir = encounter
        .enemies
        .iter()
        .filter(|e| e.active())
        .min_by(|a, b| me.distance_squared(a.pos()).total_cmp(&me.distance_squared(b.pos())))
        .map(|e| (e.pos() - me).normalize_or_zero())
        .unwrap_or(Vec2::ZERO);
}
