//! Collision primitives and wall-slide resolution
//!
//! Everything here is pure geometry. Walls are axis-aligned rectangles and
//! the only responses are single-axis pushes, which is what produces the
//! "slide along the wall" feel on diagonal approaches.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Axis-aligned rectangle, (x, y) is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of size `size` centred on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            x: center.x - size.x / 2.0,
            y: center.y - size.y / 2.0,
            w: size.x,
            h: size.y,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Whether a point lies inside (edges inclusive)
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Closest point inside the rectangle to `p`
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.left(), self.right()),
            p.y.clamp(self.top(), self.bottom()),
        )
    }
}

/// Result of a circle-circle test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleHit {
    pub hit: bool,
    /// Squared centre distance, so boolean callers skip the sqrt
    pub dist_sq: f32,
}

/// Result of a circle-AABB test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AabbPush {
    pub overlaps: bool,
    /// Vector that moves the circle out of the rectangle
    pub push: Vec2,
}

impl AabbPush {
    pub fn miss() -> Self {
        Self {
            overlaps: false,
            push: Vec2::ZERO,
        }
    }
}

/// Collider shape used when resolving against walls
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    /// The entity's own AABB
    Box,
    /// A circle of the given radius at the entity centre
    Circle { radius: f32 },
}

/// Circle-circle overlap; touching circles do not overlap
pub fn circle_vs_circle(a: Vec2, ar: f32, b: Vec2, br: f32) -> CircleHit {
    let dist_sq = a.distance_squared(b);
    let reach = ar + br;
    CircleHit {
        hit: dist_sq < reach * reach,
        dist_sq,
    }
}

/// AABB overlap; touching edges do not overlap
pub fn aabb_vs_aabb(a: &Rect, b: &Rect) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

/// Circle-AABB overlap with a push-out vector
///
/// Outside the rectangle the push runs from the closest point to the centre.
/// A centre enclosed by the rectangle is pushed along the axis of minimum
/// penetration instead, so it never gets ejected diagonally.
pub fn circle_vs_aabb(center: Vec2, radius: f32, rect: &Rect) -> AabbPush {
    let closest = rect.clamp_point(center);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > 0.0 {
        if dist_sq >= radius * radius {
            return AabbPush::miss();
        }
        let dist = dist_sq.sqrt();
        return AabbPush {
            overlaps: true,
            push: delta / dist * (radius - dist),
        };
    }

    // Centre inside the rectangle: signed distances to each edge
    let to_left = center.x - rect.left();
    let to_right = rect.right() - center.x;
    let to_top = center.y - rect.top();
    let to_bottom = rect.bottom() - center.y;

    let min = to_left.min(to_right).min(to_top).min(to_bottom);
    let push = if min == to_left {
        Vec2::new(-(to_left + radius), 0.0)
    } else if min == to_right {
        Vec2::new(to_right + radius, 0.0)
    } else if min == to_top {
        Vec2::new(0.0, -(to_top + radius))
    } else {
        Vec2::new(0.0, to_bottom + radius)
    };

    AabbPush {
        overlaps: true,
        push,
    }
}

/// Single-axis correction that separates a circle from a rectangle
fn circle_single_axis_push(center: Vec2, radius: f32, rect: &Rect) -> Option<Vec2> {
    let result = circle_vs_aabb(center, radius, rect);
    if !result.overlaps {
        return None;
    }

    let closest = rect.clamp_point(center);
    let d = center - closest;

    // Face contact or enclosed centre: the push is already axis-aligned
    if d.x == 0.0 || d.y == 0.0 {
        return Some(result.push);
    }

    // Corner contact: distance each axis must travel on its own to clear
    let r_sq = radius * radius;
    let along_x = (r_sq - d.y * d.y).max(0.0).sqrt() - d.x.abs();
    let along_y = (r_sq - d.x * d.x).max(0.0).sqrt() - d.y.abs();

    if along_x <= along_y {
        Some(Vec2::new(along_x.copysign(d.x), 0.0))
    } else {
        Some(Vec2::new(0.0, along_y.copysign(d.y)))
    }
}

/// Single-axis correction that separates two AABBs
fn box_single_axis_push(rect: &Rect, wall: &Rect) -> Option<Vec2> {
    if !aabb_vs_aabb(rect, wall) {
        return None;
    }

    // Distance to exit through each side; the shorter side wins per axis
    let out_left = rect.right() - wall.left();
    let out_right = wall.right() - rect.left();
    let out_up = rect.bottom() - wall.top();
    let out_down = wall.bottom() - rect.top();

    let push_x = if out_left <= out_right { -out_left } else { out_right };
    let push_y = if out_up <= out_down { -out_up } else { out_down };

    if push_x.abs() <= push_y.abs() {
        Some(Vec2::new(push_x, 0.0))
    } else {
        Some(Vec2::new(0.0, push_y))
    }
}

fn wall_push(entity: &Entity, wall: &Rect, collider: Collider) -> Option<Vec2> {
    match collider {
        Collider::Box => box_single_axis_push(&entity.rect(), wall),
        Collider::Circle { radius } => circle_single_axis_push(entity.pos, radius, wall),
    }
}

/// Push an entity out of the walls it overlaps, along one axis only
///
/// The axis is that of the smallest correction any overlapped wall asks for;
/// walls that want the other axis are left for the next call. Callers move X
/// then resolve, then move Y then resolve, for stable diagonal movement.
/// Returns true if any wall was touched.
pub fn resolve_wall_collision(entity: &mut Entity, walls: &[Rect], collider: Collider) -> bool {
    let smallest = walls
        .iter()
        .filter_map(|wall| wall_push(entity, wall, collider))
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()));
    let Some(smallest) = smallest else {
        return false;
    };
    let along_x = smallest.x != 0.0;

    for wall in walls {
        if let Some(push) = wall_push(entity, wall, collider) {
            if along_x {
                entity.pos.x += push.x;
            } else {
                entity.pos.y += push.y;
            }
        }
    }

    true
}

/// Move an entity by `delta`, resolving against walls once per axis
///
/// A corner can leave an overlap on the axis the last pass skipped, so one
/// more pass runs when needed. Returns true if either axis hit a wall.
pub fn move_and_slide(entity: &mut Entity, delta: Vec2, walls: &[Rect], collider: Collider) -> bool {
    entity.pos.x += delta.x;
    let hit_x = resolve_wall_collision(entity, walls, collider);
    entity.pos.y += delta.y;
    let hit_y = resolve_wall_collision(entity, walls, collider);
    if hit_x || hit_y {
        resolve_wall_collision(entity, walls, collider);
    }
    hit_x || hit_y
}
