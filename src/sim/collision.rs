//! Collision predicates and responses
//!
//! Everything here is pure: no mutation of inputs, no I/O, deterministic.
//! Bad geometry (negative extents, NaN) never panics; it clamps or reports a miss.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, Shape, sanitize_extent};

/// Velocity component flipped by a wall bounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Negates `vx` (left/right wall)
    Horizontal,
    /// Negates `vy` (top/bottom wall)
    Vertical,
}

/// Side of the play area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

impl Wall {
    /// Velocity component a bounce off this wall flips
    pub fn axis(&self) -> Axis {
        match self {
            Wall::Left | Wall::Right => Axis::Horizontal,
            Wall::Top | Wall::Bottom => Axis::Vertical,
        }
    }
}

/// Which shape test produced a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    CircleCircle,
    CircleRect,
    RectRect,
}

/// Transient result of a collision test, consumed by rule resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: EntityId,
    pub b: EntityId,
    pub kind: CollisionKind,
}

/// Axis-aligned play area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn from_size(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(sanitize_extent(width), sanitize_extent(height)),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// True when a shape at `pos` lies entirely outside the bounds, grown by `margin`
    pub fn is_outside(&self, pos: Vec2, shape: Shape, margin: f32) -> bool {
        let (lo, hi) = shape_aabb(pos, shape);
        hi.x < self.min.x - margin
            || lo.x > self.max.x + margin
            || hi.y < self.min.y - margin
            || lo.y > self.max.y + margin
    }
}

/// Circle-circle overlap: `dist² <= (r1 + r2)²`
#[inline]
pub fn circle_circle_intersect(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = sanitize_extent(ra) + sanitize_extent(rb);
    // NaN compares false, so bad positions never intersect
    a.distance_squared(b) <= r * r
}

/// Circle vs rect (top-left `rect_pos`, size `w`x`h`)
///
/// Clamps the circle center onto the rect to find the closest point.
pub fn circle_rect_intersect(center: Vec2, radius: f32, rect_pos: Vec2, w: f32, h: f32) -> bool {
    if !center.is_finite() || !rect_pos.is_finite() {
        return false;
    }
    let r = sanitize_extent(radius);
    let max = rect_pos + Vec2::new(sanitize_extent(w), sanitize_extent(h));
    let closest = center.clamp(rect_pos, max);
    center.distance_squared(closest) <= r * r
}

/// AABB overlap for two top-left positioned rects
pub fn rect_rect_intersect(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    let a_max = a_pos + a_size.max(Vec2::ZERO);
    let b_max = b_pos + b_size.max(Vec2::ZERO);
    a_pos.x <= b_max.x && b_pos.x <= a_max.x && a_pos.y <= b_max.y && b_pos.y <= a_max.y
}

/// Distance from point `p` to the segment `a`-`b`
///
/// Used for swipe/slice tests against moving targets: a hit is
/// `segment_point_distance(center, a, b) <= radius`.
pub fn segment_point_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    if !p.is_finite() || !a.is_finite() || !b.is_finite() {
        return f32::INFINITY;
    }
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < f32::EPSILON {
        return p.distance(a); // Degenerate segment
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Flip the velocity component named by `axis`
#[inline]
pub fn reflect_velocity(vel: Vec2, axis: Axis) -> Vec2 {
    match axis {
        Axis::Horizontal => Vec2::new(-vel.x, vel.y),
        Axis::Vertical => Vec2::new(vel.x, -vel.y),
    }
}

/// Reflect off a surface: v' = v - 2(v·n)n
#[inline]
pub fn reflect_about_normal(vel: Vec2, normal: Vec2) -> Vec2 {
    let n = normal.normalize_or_zero();
    vel - 2.0 * vel.dot(n) * n
}

fn shape_aabb(pos: Vec2, shape: Shape) -> (Vec2, Vec2) {
    match shape {
        Shape::Circle { radius } => (pos - Vec2::splat(radius), pos + Vec2::splat(radius)),
        Shape::Rect { width, height } => (pos, pos + Vec2::new(width, height)),
    }
}

/// Wall the shape is pressing into, if any.
///
/// Only reports a contact while the velocity points into the wall, so an
/// entity that already bounced is not reflected again next tick.
pub fn wall_contact(pos: Vec2, vel: Vec2, shape: Shape, bounds: &Bounds) -> Option<Wall> {
    let (lo, hi) = shape_aabb(pos, shape);
    if lo.x <= bounds.min.x && vel.x < 0.0 {
        Some(Wall::Left)
    } else if hi.x >= bounds.max.x && vel.x > 0.0 {
        Some(Wall::Right)
    } else if lo.y <= bounds.min.y && vel.y < 0.0 {
        Some(Wall::Top)
    } else if hi.y >= bounds.max.y && vel.y > 0.0 {
        Some(Wall::Bottom)
    } else {
        None
    }
}

/// Shape dispatch for two entities
pub fn shapes_intersect<T>(a: &Entity<T>, b: &Entity<T>) -> Option<CollisionKind> {
    match (a.shape(), b.shape()) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle_intersect(a.pos, ra, b.pos, rb).then_some(CollisionKind::CircleCircle)
        }
        (Shape::Circle { radius }, Shape::Rect { width, height }) => {
            circle_rect_intersect(a.pos, radius, b.pos, width, height)
                .then_some(CollisionKind::CircleRect)
        }
        (Shape::Rect { width, height }, Shape::Circle { radius }) => {
            circle_rect_intersect(b.pos, radius, a.pos, width, height)
                .then_some(CollisionKind::CircleRect)
        }
        (
            Shape::Rect {
                width: wa,
                height: ha,
            },
            Shape::Rect {
                width: wb,
                height: hb,
            },
        ) => rect_rect_intersect(a.pos, Vec2::new(wa, ha), b.pos, Vec2::new(wb, hb))
            .then_some(CollisionKind::RectRect),
    }
}

/// Test every pair of active entities accepted by `filter`.
///
/// Pairs come out ordered by (a, b) insertion order with `a` before `b`.
pub fn find_pairs<T, F>(entities: &[Entity<T>], mut filter: F) -> Vec<CollisionPair>
where
    F: FnMut(&Entity<T>, &Entity<T>) -> bool,
{
    let mut pairs = Vec::new();
    for (i, a) in entities.iter().enumerate() {
        if !a.is_active() {
            continue;
        }
        for b in entities[i + 1..].iter().filter(|b| b.is_active()) {
            if !filter(a, b) {
                continue;
            }
            if let Some(kind) = shapes_intersect(a, b) {
                pairs.push(CollisionPair {
                    a: a.id,
                    b: b.id,
                    kind,
                });
            }
        }
    }
    pairs
}
