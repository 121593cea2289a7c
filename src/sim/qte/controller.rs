//! Controller QTE: a one-screen platformer
//!
//! Walk and jump to the goal tile. Spikes and falling off the bottom of the
//! map lose. The map is one of a few hand-authored layouts, chosen at random.
//! Physics runs in map space (origin at the map's top-left corner).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{InputEvent, Key, MiniGame, QteCore};
use crate::consts::{QTE_VIEW_H, QTE_VIEW_W};
use crate::sim::SimRng;
use crate::sim::collision::Rect;

pub const TILE: f32 = 32.0;
pub const GRAVITY: f32 = 1500.0;
pub const RUN_SPEED: f32 = 200.0;
pub const JUMP_VELOCITY: f32 = -560.0;
pub const MAX_FALL_SPEED: f32 = 900.0;
/// Jump still allowed this long after walking off a ledge
pub const COYOTE_TIME: f32 = 0.1;
pub const BODY_SIZE: Vec2 = Vec2::new(20.0, 28.0);

/// Map legend: `#` solid, `^` spike, `G` goal, `P` start, anything else empty
pub const LAYOUTS: [[&str; 10]; 4] = [
    [
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
        "...................G",
        ".P.......^.......###",
        "####################",
    ],
    [
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
        "..............G.....",
        "...........#####....",
        "....................",
        ".P......###.........",
        "#######......#######",
    ],
    [
        "....................",
        "....................",
        "..................G.",
        "................####",
        "....................",
        "............###.....",
        "....................",
        "........###.........",
        ".P..................",
        "####....^^^^....####",
    ],
    [
        "####################",
        "#..................#",
        "#..................#",
        "#.....^.......^....#",
        "#....###.....###...#",
        "#..................#",
        "#.P...............G#",
        "#######...##########",
        "....................",
        "....................",
    ],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Empty,
    Solid,
    Spike,
    Goal,
}

impl Tile {
    fn from_char(c: char) -> Self {
        match c {
            '#' => Tile::Solid,
            '^' => Tile::Spike,
            'G' => Tile::Goal,
            _ => Tile::Empty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerQte {
    pub width: usize,
    pub height: usize,
    tiles: Vec<Tile>,
    /// Body centre in map space
    pub pos: Vec2,
    pub vel: Vec2,
    pub on_ground: bool,
    coyote: f32,
    left: bool,
    right: bool,
    jump_queued: bool,
}

impl ControllerQte {
    pub fn new(rng: &mut SimRng) -> Self {
        let layout = rng.random_range(0..LAYOUTS.len());
        Self::from_rows(&LAYOUTS[layout])
    }

    /// Build from map rows; short rows are padded with empty tiles
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut tiles = vec![Tile::Empty; width * height];
        let mut start = (1, height.saturating_sub(2));

        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                if ch == 'P' {
                    start = (c, r);
                }
                tiles[r * width + c] = Tile::from_char(ch);
            }
        }

        let pos = Vec2::new(
            (start.0 as f32 + 0.5) * TILE,
            (start.1 as f32 + 1.0) * TILE - BODY_SIZE.y / 2.0,
        );
        Self {
            width,
            height,
            tiles,
            pos,
            vel: Vec2::ZERO,
            on_ground: false,
            coyote: 0.0,
            left: false,
            right: false,
            jump_queued: false,
        }
    }

    /// Where the map's top-left sits in QTE view space
    pub fn origin(&self) -> Vec2 {
        let size = Vec2::new(self.width as f32, self.height as f32) * TILE;
        (Vec2::new(QTE_VIEW_W, QTE_VIEW_H) - size) / 2.0
    }

    /// Tile at a grid cell. The sides are walled; above and below are open.
    pub fn tile(&self, c: i32, r: i32) -> Tile {
        if c < 0 || c >= self.width as i32 {
            return Tile::Solid;
        }
        if r < 0 || r >= self.height as i32 {
            return Tile::Empty;
        }
        self.tiles[r as usize * self.width + c as usize]
    }

    pub fn body(&self) -> Rect {
        Rect::centered(self.pos, BODY_SIZE)
    }

    /// Grid cells overlapped by a rect (edges touching do not count)
    fn cells(rect: &Rect) -> impl Iterator<Item = (i32, i32)> {
        const EPS: f32 = 1e-3;
        let c0 = (rect.left() / TILE).floor() as i32;
        let c1 = ((rect.right() - EPS) / TILE).floor() as i32;
        let r0 = (rect.top() / TILE).floor() as i32;
        let r1 = ((rect.bottom() - EPS) / TILE).floor() as i32;
        (r0..=r1).flat_map(move |r| (c0..=c1).map(move |c| (c, r)))
    }

    fn hits_solid(&self) -> bool {
        Self::cells(&self.body()).any(|(c, r)| self.tile(c, r) == Tile::Solid)
    }

    fn move_x(&mut self, dx: f32) {
        self.pos.x += dx;
        if !self.hits_solid() {
            return;
        }
        let half = BODY_SIZE.x / 2.0;
        if dx > 0.0 {
            let col = ((self.pos.x + half) / TILE).floor();
            self.pos.x = col * TILE - half;
        } else if dx < 0.0 {
            let col = ((self.pos.x - half) / TILE).floor();
            self.pos.x = (col + 1.0) * TILE + half;
        }
        self.vel.x = 0.0;
    }

    fn move_y(&mut self, dy: f32) {
        self.pos.y += dy;
        self.on_ground = false;
        if !self.hits_solid() {
            return;
        }
        let half = BODY_SIZE.y / 2.0;
        if dy > 0.0 {
            let row = ((self.pos.y + half) / TILE).floor();
            self.pos.y = row * TILE - half;
            self.on_ground = true;
        } else if dy < 0.0 {
            let row = ((self.pos.y - half) / TILE).floor();
            self.pos.y = (row + 1.0) * TILE + half;
        }
        self.vel.y = 0.0;
    }

    fn touching(&self, tile: Tile) -> bool {
        // Slightly forgiving hurt/goal box
        let mut body = self.body();
        body.x += 2.0;
        body.y += 2.0;
        body.w -= 4.0;
        body.h -= 4.0;
        Self::cells(&body).any(|(c, r)| self.tile(c, r) == tile)
    }
}

impl MiniGame for ControllerQte {
    fn update(&mut self, dt: f32, core: &mut QteCore, _rng: &mut SimRng) {
        let dir = (self.right as i32 - self.left as i32) as f32;
        self.vel.x = dir * RUN_SPEED;

        if self.on_ground {
            self.coyote = COYOTE_TIME;
        } else {
            self.coyote = (self.coyote - dt).max(0.0);
        }
        if self.jump_queued && self.coyote > 0.0 {
            self.vel.y = JUMP_VELOCITY;
            self.coyote = 0.0;
        }
        self.jump_queued = false;

        self.vel.y = (self.vel.y + GRAVITY * dt).min(MAX_FALL_SPEED);
        self.move_x(self.vel.x * dt);
        self.move_y(self.vel.y * dt);

        if self.touching(Tile::Spike) {
            core.fail();
        } else if self.touching(Tile::Goal) {
            core.succeed();
        } else if self.body().top() > self.height as f32 * TILE {
            core.fail();
        }
    }

    fn on_input(&mut self, event: &InputEvent, _core: &mut QteCore) {
        match *event {
            InputEvent::KeyDown(Key::Left | Key::Char('a')) => self.left = true,
            InputEvent::KeyUp(Key::Left | Key::Char('a')) => self.left = false,
            InputEvent::KeyDown(Key::Right | Key::Char('d')) => self.right = true,
            InputEvent::KeyUp(Key::Right | Key::Char('d')) => self.right = false,
            InputEvent::KeyDown(Key::Up | Key::Space | Key::Char('w')) => self.jump_queued = true,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::qte::QteResult;
    use crate::sim::seeded_rng;

    const DT: f32 = 1.0 / 60.0;

    fn step(game: &mut ControllerQte, core: &mut QteCore, frames: usize) {
        let mut rng = seeded_rng(0);
        for _ in 0..frames {
            if core.completed() {
                return;
            }
            game.update(DT, core, &mut rng);
        }
    }

    fn key(game: &mut ControllerQte, core: &mut QteCore, event: InputEvent) {
        game.on_input(&event, core);
    }

    #[test]
    fn test_layouts_are_well_formed() {
        for rows in LAYOUTS {
            assert!(rows.iter().all(|r| r.len() == 20));
            assert_eq!(rows.iter().map(|r| r.matches('P').count()).sum::<usize>(), 1);
            assert!(rows.iter().any(|r| r.contains('G')));
            let game = ControllerQte::from_rows(&rows);
            assert!(!game.hits_solid());
        }
    }

    #[test]
    fn test_settles_on_floor() {
        let mut game = ControllerQte::from_rows(&["....", ".P..", "####"]);
        let mut core = QteCore::new(10.0);
        step(&mut game, &mut core, 30);
        assert!(game.on_ground);
        assert!((game.body().bottom() - 2.0 * TILE).abs() < 1e-3);
        assert_eq!(core.result(), QteResult::Pending);
    }

    #[test]
    fn test_walk_to_goal() {
        let mut game = ControllerQte::from_rows(&["..........", ".P......G.", "##########"]);
        let mut core = QteCore::new(10.0);
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Right));
        step(&mut game, &mut core, 120);
        assert_eq!(core.result(), QteResult::Success);
    }

    #[test]
    fn test_spike_fails() {
        let mut game = ControllerQte::from_rows(&["......", ".P.^..", "######"]);
        let mut core = QteCore::new(10.0);
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Char('d')));
        step(&mut game, &mut core, 120);
        assert_eq!(core.result(), QteResult::Fail);
    }

    #[test]
    fn test_jump_clears_spike() {
        let mut game = ControllerQte::from_rows(&["........", "........", ".P.^..G.", "########"]);
        let mut core = QteCore::new(10.0);
        step(&mut game, &mut core, 10);
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Right));
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Space));
        step(&mut game, &mut core, 120);
        assert_eq!(core.result(), QteResult::Success);
    }

    #[test]
    fn test_falling_off_map_fails() {
        let mut game = ControllerQte::from_rows(&["....", ".P..", "##.."]);
        let mut core = QteCore::new(10.0);
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Right));
        step(&mut game, &mut core, 120);
        assert_eq!(core.result(), QteResult::Fail);
    }

    #[test]
    fn test_coyote_jump() {
        let rows = ["........", "........", "........", ".P......", "##......"];
        let mut game = ControllerQte::from_rows(&rows);
        let mut core = QteCore::new(10.0);
        step(&mut game, &mut core, 5);
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Right));
        let mut frames = 0;
        while game.on_ground {
            step(&mut game, &mut core, 1);
            frames += 1;
            assert!(frames < 60);
        }
        // Just walked off: jump is still honoured
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Up));
        step(&mut game, &mut core, 1);
        assert!(game.vel.y < 0.0);
    }

    #[test]
    fn test_late_jump_ignored() {
        let rows = ["........", "........", "........", ".P......", "##......", "........", "........"];
        let mut game = ControllerQte::from_rows(&rows);
        let mut core = QteCore::new(10.0);
        step(&mut game, &mut core, 5);
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Right));
        while game.on_ground {
            step(&mut game, &mut core, 1);
        }
        step(&mut game, &mut core, 10);
        key(&mut game, &mut core, InputEvent::KeyDown(Key::Up));
        step(&mut game, &mut core, 1);
        assert!(game.vel.y > 0.0);
    }
}
