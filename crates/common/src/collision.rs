//! Axis-aligned overlap queries.
//!
//! Boxes are closed intervals: touching edges count as overlapping.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world units (Y-up).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Bottom-left corner.
    pub min: Vec2,
    /// Top-right corner.
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box from its bottom-left corner and size.
    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position, position + size)
    }

    /// Box from its center and half extents.
    pub fn from_center(center: Vec2, half_size: Vec2) -> Self {
        Self::new(center - half_size, center + half_size)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn half_size(&self) -> Vec2 {
        self.size() * 0.5
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Grow the box so it contains `point`.
    pub fn encapsulate(&mut self, point: Vec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the box so it contains `other`.
    pub fn encapsulate_box(&mut self, other: &Aabb) {
        self.encapsulate(other.min);
        self.encapsulate(other.max);
    }

    pub fn expanded(&self, amount: f32) -> Self {
        Self::new(self.min - Vec2::splat(amount), self.max + Vec2::splat(amount))
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }
}

/// Result of an overlap query between two boxes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionInfo {
    pub hit: bool,
    /// Direction that pushes `a` out of `b`.
    pub normal: Vec2,
    /// Overlap depth along `normal`; positive when overlapping.
    pub penetration: f32,
}

/// Minimum-penetration overlap of `a` against `b`.
///
/// Ties resolve in the order left, right, down, up.
pub fn collision_info(a: &Aabb, b: &Aabb) -> CollisionInfo {
    if !a.intersects(b) {
        return CollisionInfo::default();
    }

    let candidates = [
        (a.max.x - b.min.x, Vec2::NEG_X),
        (b.max.x - a.min.x, Vec2::X),
        (a.max.y - b.min.y, Vec2::NEG_Y),
        (b.max.y - a.min.y, Vec2::Y),
    ];

    let (mut penetration, mut normal) = candidates[0];
    for &(depth, dir) in &candidates[1..] {
        if depth < penetration {
            penetration = depth;
            normal = dir;
        }
    }

    CollisionInfo {
        hit: true,
        normal,
        penetration,
    }
}

/// Displacement that moves `a` out of `b`, or zero when they do not overlap.
pub fn separation(a: &Aabb, b: &Aabb) -> Vec2 {
    let info = collision_info(a, b);
    if !info.hit {
        return Vec2::ZERO;
    }
    info.normal * info.penetration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_agree() {
        let a = Aabb::from_position_size(Vec2::new(1.0, 2.0), Vec2::new(4.0, 2.0));
        let b = Aabb::from_center(Vec2::new(3.0, 3.0), Vec2::new(2.0, 1.0));
        assert_eq!(a, b);
        assert_eq!(a.center(), Vec2::new(3.0, 3.0));
        assert_eq!(a.half_size(), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        assert!(a.contains(Vec2::ZERO));
        assert!(a.contains(Vec2::ONE));
        assert!(!a.contains(Vec2::new(1.01, 0.5)));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let b = Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        let c = Aabb::new(Vec2::new(1.5, 0.0), Vec2::new(2.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn encapsulate_grows_box() {
        let mut a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        a.encapsulate(Vec2::new(-1.0, 3.0));
        assert_eq!(a, Aabb::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 3.0)));

        a.encapsulate_box(&Aabb::new(Vec2::new(0.0, -2.0), Vec2::new(5.0, 0.0)));
        assert_eq!(a, Aabb::new(Vec2::new(-1.0, -2.0), Vec2::new(5.0, 3.0)));
    }

    #[test]
    fn expanded_and_translated() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        assert_eq!(a.expanded(1.0), Aabb::new(Vec2::splat(-1.0), Vec2::splat(2.0)));
        assert_eq!(
            a.translated(Vec2::new(2.0, -1.0)),
            Aabb::new(Vec2::new(2.0, -1.0), Vec2::new(3.0, 0.0))
        );
    }

    #[test]
    fn no_overlap_gives_empty_info() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let b = Aabb::new(Vec2::splat(5.0), Vec2::splat(6.0));
        assert!(!collision_info(&a, &b).hit);
        assert_eq!(separation(&a, &b), Vec2::ZERO);
    }

    #[test]
    fn separation_pushes_along_shallowest_axis() {
        // a overlaps b's left edge by 0.25 and spans it vertically
        let a = Aabb::new(Vec2::new(-0.75, 0.0), Vec2::new(0.25, 1.0));
        let b = Aabb::new(Vec2::new(0.0, -1.0), Vec2::new(2.0, 2.0));
        let info = collision_info(&a, &b);
        assert!(info.hit);
        assert_eq!(info.normal, Vec2::NEG_X);
        assert_eq!(info.penetration, 0.25);
        assert_eq!(separation(&a, &b), Vec2::new(-0.25, 0.0));

        let moved = a.translated(separation(&a, &b));
        assert_eq!(moved.max.x, b.min.x);
    }

    #[test]
    fn separation_upward_when_landing() {
        let player = Aabb::new(Vec2::new(0.0, 0.9), Vec2::new(1.0, 1.9));
        let ground = Aabb::new(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 1.0));
        let info = collision_info(&player, &ground);
        assert_eq!(info.normal, Vec2::Y);
        assert!((info.penetration - 0.1).abs() < 1e-6);
    }
}
