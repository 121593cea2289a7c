//! Gopher QTE: whack gophers popping out of a 3x3 grid of holes

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{InputEvent, MiniGame, QteCore};
use crate::consts::{QTE_VIEW_H, QTE_VIEW_W};
use crate::sim::SimRng;
use crate::sim::collision::Rect;
use crate::tuning;

pub const GRID: usize = 3;
pub const CELL_SIZE: f32 = 120.0;
/// Seconds a gopher stays up
pub const POP_DURATION: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GopherQte {
    /// Remaining up-time per hole, `None` when empty
    pub holes: [Option<f32>; GRID * GRID],
    pub hits: u32,
    pub hits_required: u32,
    pub pops: u32,
    pub max_pops: u32,
    pub pop_interval: f32,
    pop_timer: f32,
}

impl GopherQte {
    pub fn new(depth: i32) -> Self {
        Self {
            holes: [None; GRID * GRID],
            hits: 0,
            hits_required: tuning::gopher_hits_required(depth),
            pops: 0,
            max_pops: tuning::gopher_max_pops(depth),
            pop_interval: tuning::gopher_pop_interval(depth),
            pop_timer: 0.0,
        }
    }

    /// Screen rect of a hole
    pub fn hole_rect(index: usize) -> Rect {
        let origin = Vec2::new(QTE_VIEW_W, QTE_VIEW_H) / 2.0 - Vec2::splat(CELL_SIZE * GRID as f32 / 2.0);
        let col = (index % GRID) as f32;
        let row = (index / GRID) as f32;
        Rect::new(
            origin.x + col * CELL_SIZE,
            origin.y + row * CELL_SIZE,
            CELL_SIZE,
            CELL_SIZE,
        )
    }

    pub fn hole_at(p: Vec2) -> Option<usize> {
        (0..GRID * GRID).find(|&i| Self::hole_rect(i).contains(p))
    }

    fn pop(&mut self, rng: &mut SimRng) {
        let empty: Vec<usize> = (0..self.holes.len())
            .filter(|&i| self.holes[i].is_none())
            .collect();
        if empty.is_empty() {
            return;
        }
        let pick = empty[rng.random_range(0..empty.len())];
        self.holes[pick] = Some(POP_DURATION);
        self.pops += 1;
    }
}

impl MiniGame for GopherQte {
    fn update(&mut self, dt: f32, _core: &mut QteCore, rng: &mut SimRng) {
        for hole in &mut self.holes {
            if let Some(t) = hole {
                *t -= dt;
                if *t <= 0.0 {
                    *hole = None;
                }
            }
        }

        self.pop_timer -= dt;
        if self.pop_timer <= 0.0 && self.pops < self.max_pops {
            self.pop(rng);
            self.pop_timer += self.pop_interval;
        }
    }

    fn on_input(&mut self, event: &InputEvent, core: &mut QteCore) {
        let InputEvent::MouseDown(p) = *event else {
            return;
        };
        // Clicking an empty hole (or outside the grid) does nothing
        let Some(i) = Self::hole_at(p) else {
            return;
        };
        if self.holes[i].take().is_some() {
            self.hits += 1;
            if self.hits >= self.hits_required {
                core.succeed();
            }
        }
    }
}
