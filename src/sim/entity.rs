//! Entity storage and lifecycle
//!
//! Entities live in a single insertion-ordered collection owned by the
//! simulation step. Removal only happens through [`EntityManager::expire`],
//! a single `retain` pass run after advance and collision resolution.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Axis, reflect_velocity};

/// Monotonically increasing entity identifier
pub type EntityId = u32;

/// Collision shape. Rects are positioned by their top-left corner, circles by
/// their center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle {
            radius: sanitize_extent(radius),
        }
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Shape::Rect {
            width: sanitize_extent(width),
            height: sanitize_extent(height),
        }
    }

    /// Half width/height of the shape's bounding box
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Rect { width, height } => Vec2::new(width, height) * 0.5,
        }
    }
}

/// Negative or non-finite extents collapse to zero
#[inline]
pub(crate) fn sanitize_extent(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

/// Lifecycle flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    #[default]
    Active,
    Expired,
}

/// Limited number of wall reflections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BounceBudget {
    pub max: u32,
    pub used: u32,
}

/// Result of a wall contact for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceOutcome {
    /// Velocity reflected; `remaining` bounces left (None = unlimited)
    Reflected { remaining: Option<u32> },
    /// Budget used up; the entity has been marked expired
    Exhausted,
}

/// A simulated object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity<T> {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Constant acceleration (gravity etc.), applied to velocity before position
    pub force: Vec2,
    shape: Shape,
    pub lifecycle: Lifecycle,
    bounces: Option<BounceBudget>,
    /// Time-to-live in seconds
    pub ttl: Option<f32>,
    /// Seconds since spawn
    pub age: f32,
    /// Game-specific payload
    pub data: T,
}

impl<T> Entity<T> {
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn mark_expired(&mut self) {
        self.lifecycle = Lifecycle::Expired;
    }

    /// Geometric center (rects are stored by corner)
    pub fn center(&self) -> Vec2 {
        match self.shape {
            Shape::Circle { .. } => self.pos,
            Shape::Rect { .. } => self.pos + self.shape.half_extents(),
        }
    }

    pub fn bounces_used(&self) -> Option<u32> {
        self.bounces.map(|b| b.used)
    }

    pub fn ttl_exceeded(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.age >= ttl)
    }

    fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }

    /// Reflect off a wall, consuming one bounce from the budget if any.
    /// The contact after the last allowed bounce expires the entity.
    pub fn bounce(&mut self, axis: Axis) -> BounceOutcome {
        match self.bounces.as_mut() {
            Some(budget) if budget.used >= budget.max => {
                self.lifecycle = Lifecycle::Expired;
                BounceOutcome::Exhausted
            }
            Some(budget) => {
                budget.used += 1;
                let remaining = budget.max - budget.used;
                self.vel = reflect_velocity(self.vel, axis);
                BounceOutcome::Reflected {
                    remaining: Some(remaining),
                }
            }
            None => {
                self.vel = reflect_velocity(self.vel, axis);
                BounceOutcome::Reflected { remaining: None }
            }
        }
    }
}

/// Spawn request
#[derive(Debug, Clone)]
pub struct EntityDescriptor<T> {
    pub pos: Vec2,
    pub vel: Vec2,
    pub force: Vec2,
    pub shape: Shape,
    pub max_bounces: Option<u32>,
    pub ttl: Option<f32>,
    pub data: T,
}

impl<T> EntityDescriptor<T> {
    pub fn new(pos: Vec2, shape: Shape, data: T) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            force: Vec2::ZERO,
            shape,
            max_bounces: None,
            ttl: None,
            data,
        }
    }

    pub fn circle(pos: Vec2, radius: f32, data: T) -> Self {
        Self::new(pos, Shape::circle(radius), data)
    }

    pub fn rect(pos: Vec2, width: f32, height: f32, data: T) -> Self {
        Self::new(pos, Shape::rect(width, height), data)
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_force(mut self, force: Vec2) -> Self {
        self.force = force;
        self
    }

    pub fn with_max_bounces(mut self, max: u32) -> Self {
        self.max_bounces = Some(max);
        self
    }

    pub fn with_ttl(mut self, seconds: f32) -> Self {
        self.ttl = Some(seconds);
        self
    }
}

/// Owns the active-entity collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityManager<T> {
    entities: Vec<Entity<T>>,
    next_id: EntityId,
}

impl<T> Default for EntityManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EntityManager<T> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity and append it to the collection
    pub fn spawn(&mut self, desc: EntityDescriptor<T>) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;

        let shape = match desc.shape {
            Shape::Circle { radius } => Shape::circle(radius),
            Shape::Rect { width, height } => Shape::rect(width, height),
        };
        let mut entity = Entity {
            id,
            pos: desc.pos,
            vel: desc.vel,
            force: desc.force,
            shape,
            lifecycle: Lifecycle::Active,
            bounces: desc.max_bounces.map(|max| BounceBudget { max, used: 0 }),
            ttl: desc.ttl,
            age: 0.0,
            data: desc.data,
        };
        if !entity.is_finite() {
            log::warn!("entity {} spawned with non-finite state, expiring", id);
            entity.lifecycle = Lifecycle::Expired;
        }
        self.entities.push(entity);
        id
    }

    /// Integrate every active entity by `dt` seconds.
    ///
    /// Entities whose state turns non-finite are marked expired so one bad
    /// entity cannot poison the rest of the frame.
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        for entity in self.entities.iter_mut().filter(|e| e.is_active()) {
            entity.vel += entity.force * dt;
            entity.pos += entity.vel * dt;
            entity.age += dt;
            if !entity.is_finite() {
                log::warn!("entity {} diverged, expiring", entity.id);
                entity.lifecycle = Lifecycle::Expired;
            }
        }
    }

    /// Remove every entity matching `predicate` in a single pass.
    /// Returns the number removed.
    pub fn expire<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Entity<T>) -> bool,
    {
        let before = self.entities.len();
        self.entities.retain(|e| !predicate(e));
        before - self.entities.len()
    }

    /// Visit active entities in insertion (draw) order
    pub fn for_each_active<F>(&self, mut visitor: F)
    where
        F: FnMut(&Entity<T>),
    {
        self.entities
            .iter()
            .filter(|e| e.is_active())
            .for_each(|e| visitor(e));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity<T>> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity<T>> {
        self.entities.iter_mut()
    }

    pub fn as_slice(&self) -> &[Entity<T>] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity<T>> {
        // Ids are assigned in increasing order and never reordered
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entities[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity<T>> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &mut self.entities[i])
    }

    /// Flag an entity for removal at the next expire pass
    pub fn mark_expired(&mut self, id: EntityId) -> bool {
        match self.get_mut(id) {
            Some(e) if e.is_active() => {
                e.mark_expired();
                true
            }
            _ => false,
        }
    }

    /// Wall contact for entity `id`; see [`Entity::bounce`]
    pub fn bounce(&mut self, id: EntityId, axis: Axis) -> Option<BounceOutcome> {
        self.get_mut(id).map(|e| e.bounce(axis))
    }

    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_active()).count()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drop all entities. Ids keep increasing across clears.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(pos: Vec2, vel: Vec2) -> EntityDescriptor<()> {
        EntityDescriptor::circle(pos, 5.0, ()).with_velocity(vel)
    }

    #[test]
    fn test_spawn_assigns_increasing_ids() {
        let mut entities = EntityManager::new();
        let a = entities.spawn(ball(Vec2::ZERO, Vec2::ZERO));
        let b = entities.spawn(ball(Vec2::ZERO, Vec2::ZERO));
        entities.expire(|e| e.id == a);
        let c = entities.spawn(ball(Vec2::ZERO, Vec2::ZERO));
        assert!(a < b && b < c);
        entities.clear();
        let d = entities.spawn(ball(Vec2::ZERO, Vec2::ZERO));
        assert!(d > c);
    }

    #[test]
    fn test_advance_integrates_position() {
        let mut entities = EntityManager::new();
        let id = entities.spawn(ball(Vec2::new(100.0, 100.0), Vec2::new(50.0, 0.0)));
        entities.advance(0.1);
        let e = entities.get(id).unwrap();
        assert!((e.pos.x - 105.0).abs() < 1e-4);
        assert!((e.pos.y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_advance_applies_force_before_position() {
        let mut entities = EntityManager::new();
        let id = entities.spawn(
            EntityDescriptor::circle(Vec2::ZERO, 4.0, ()).with_force(Vec2::new(0.0, 100.0)),
        );
        entities.advance(0.5);
        let e = entities.get(id).unwrap();
        assert!((e.vel.y - 50.0).abs() < 1e-4);
        assert!((e.pos.y - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_advance_skips_expired_and_isolates_faults() {
        let mut entities = EntityManager::new();
        let good = entities.spawn(ball(Vec2::ZERO, Vec2::new(10.0, 0.0)));
        let bad = entities.spawn(ball(Vec2::ZERO, Vec2::new(f32::MAX, 0.0)).with_force(
            Vec2::new(f32::MAX, 0.0),
        ));
        let parked = entities.spawn(ball(Vec2::ZERO, Vec2::new(10.0, 0.0)));
        entities.mark_expired(parked);

        entities.advance(1.0);
        assert!(entities.get(good).unwrap().is_active());
        assert!((entities.get(good).unwrap().pos.x - 10.0).abs() < 1e-4);
        assert!(!entities.get(bad).unwrap().is_active());
        assert_eq!(entities.get(parked).unwrap().pos, Vec2::ZERO);
    }

    #[test]
    fn test_spawn_with_nan_is_expired() {
        let mut entities = EntityManager::new();
        let id = entities.spawn(ball(Vec2::new(f32::NAN, 0.0), Vec2::ZERO));
        assert!(!entities.get(id).unwrap().is_active());
        assert_eq!(entities.active_count(), 0);
    }

    #[test]
    fn test_negative_extent_clamps_to_zero() {
        assert_eq!(Shape::circle(-3.0), Shape::Circle { radius: 0.0 });
        assert_eq!(
            Shape::rect(f32::NAN, -1.0),
            Shape::Rect {
                width: 0.0,
                height: 0.0
            }
        );
    }

    #[test]
    fn test_expire_is_exact_and_idempotent() {
        let mut entities = EntityManager::new();
        for x in 0..10 {
            entities.spawn(ball(Vec2::new(x as f32 * 100.0, 0.0), Vec2::ZERO));
        }
        let off_surface = |e: &Entity<()>| e.pos.x > 450.0;

        assert_eq!(entities.expire(off_surface), 5);
        assert!(entities.iter().all(|e| !off_surface(e)));
        assert_eq!(entities.len(), 5);
        assert_eq!(entities.expire(off_surface), 0);
    }

    #[test]
    fn test_expire_leaves_non_matching_marked_entities() {
        let mut entities = EntityManager::new();
        let marked = entities.spawn(ball(Vec2::ZERO, Vec2::ZERO));
        entities.spawn(ball(Vec2::new(500.0, 0.0), Vec2::ZERO));
        entities.mark_expired(marked);

        assert_eq!(entities.expire(|e| e.pos.x > 450.0), 1);
        assert_eq!(entities.len(), 1);
        assert!(entities.get(marked).is_some_and(|e| !e.is_active()));
        assert_eq!(entities.expire(|e| !e.is_active()), 1);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_for_each_active_in_insertion_order() {
        let mut entities = EntityManager::new();
        let ids: Vec<_> = (0..4)
            .map(|_| entities.spawn(ball(Vec2::ZERO, Vec2::ZERO)))
            .collect();
        entities.mark_expired(ids[1]);

        let mut seen = Vec::new();
        entities.for_each_active(|e| seen.push(e.id));
        assert_eq!(seen, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn test_bounce_budget_two_then_exhausted() {
        let mut entities = EntityManager::new();
        let id = entities.spawn(ball(Vec2::ZERO, Vec2::new(30.0, 0.0)).with_max_bounces(2));

        assert_eq!(
            entities.bounce(id, Axis::Horizontal),
            Some(BounceOutcome::Reflected { remaining: Some(1) })
        );
        assert_eq!(entities.get(id).unwrap().vel.x, -30.0);
        assert_eq!(
            entities.bounce(id, Axis::Horizontal),
            Some(BounceOutcome::Reflected { remaining: Some(0) })
        );
        assert_eq!(entities.get(id).unwrap().vel.x, 30.0);
        assert_eq!(
            entities.bounce(id, Axis::Horizontal),
            Some(BounceOutcome::Exhausted)
        );
        assert!(!entities.get(id).unwrap().is_active());
    }

    #[test]
    fn test_ttl_exceeded() {
        let mut entities = EntityManager::new();
        let id = entities.spawn(ball(Vec2::ZERO, Vec2::ZERO).with_ttl(0.25));
        entities.advance(0.2);
        assert!(!entities.get(id).unwrap().ttl_exceeded());
        entities.advance(0.05);
        assert!(entities.get(id).unwrap().ttl_exceeded());
    }

    #[test]
    fn test_rect_center_from_corner() {
        let mut entities = EntityManager::new();
        let id = entities.spawn(EntityDescriptor::rect(Vec2::new(10.0, 20.0), 40.0, 10.0, ()));
        assert_eq!(entities.get(id).unwrap().center(), Vec2::new(30.0, 25.0));
    }
}
