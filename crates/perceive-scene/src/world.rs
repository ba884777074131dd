//! A minimal physics stand-in: sphere colliders answering ray casts.
//!
//! Hit positions are collider centres, so a signal's collider is hit "at the
//! signal" when its centre tracks the signal's position. Rays are infinite.
//! A collider that contains the ray origin is never hit, so an agent standing
//! inside its own body still sees out.

use std::cell::RefCell;

use perceive_core::{RayHit, SpatialQuery, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Distance along the unit ray `direction` to the near surface, or `None`
    /// on a miss, a hit behind the origin, or an origin inside the sphere.
    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let oc = origin - self.center;
        let c = oc.length_squared() - self.radius * self.radius;
        if c <= 0.0 {
            return None;
        }
        let b = oc.dot(direction);
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let t = -b - disc.sqrt();
        (t >= 0.0).then_some(t)
    }
}

/// Identifies a collider inside a [`SphereWorld`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColliderId(usize);

/// Static and moving sphere colliders.
///
/// Colliders move through `&self` so the world can be shared, behind an `Rc`,
/// with every sensor's line-of-sight strategy while the host keeps moving
/// bodies between ticks.
#[derive(Debug, Default)]
pub struct SphereWorld {
    colliders: RefCell<Vec<Sphere>>,
}

impl SphereWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, sphere: Sphere) -> ColliderId {
        let mut colliders = self.colliders.borrow_mut();
        colliders.push(sphere);
        ColliderId(colliders.len() - 1)
    }

    /// Move a collider's centre. Unknown ids are ignored.
    pub fn move_to(&self, id: ColliderId, center: Vec3) {
        if let Some(sphere) = self.colliders.borrow_mut().get_mut(id.0) {
            sphere.center = center;
        }
    }

    pub fn get(&self, id: ColliderId) -> Option<Sphere> {
        self.colliders.borrow().get(id.0).copied()
    }

    pub fn len(&self) -> usize {
        self.colliders.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.borrow().is_empty()
    }

    /// Whether anything other than the collider centred at `target` blocks
    /// the segment from `origin` to `target`.
    pub fn is_blocked(&self, origin: Vec3, target: Vec3) -> bool {
        let to_target = target - origin;
        let span = to_target.length();
        self.raycast_all(origin, to_target)
            .iter()
            .any(|hit| hit.distance < span && !hit.is_at(target))
    }
}

impl SpatialQuery for SphereWorld {
    fn raycast_all(&self, origin: Vec3, direction: Vec3) -> Vec<RayHit> {
        if direction.length_squared() == 0.0 || !direction.is_finite() {
            return Vec::new();
        }
        let direction = direction.normalize();
        let mut hits: Vec<RayHit> = self
            .colliders
            .borrow()
            .iter()
            .filter_map(|sphere| {
                sphere.intersect(origin, direction).map(|distance| RayHit {
                    position: sphere.center,
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_intersect_near_surface() {
        let s = Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0);
        let t = s.intersect(Vec3::ZERO, Vec3::FORWARD).unwrap();
        assert_relative_eq!(t, 8.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_miss_and_behind() {
        let s = Sphere::new(Vec3::new(5.0, 0.0, 10.0), 1.0);
        assert!(s.intersect(Vec3::ZERO, Vec3::FORWARD).is_none());

        let behind = Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0);
        assert!(behind.intersect(Vec3::ZERO, Vec3::FORWARD).is_none());
    }

    #[test]
    fn test_origin_inside_is_ignored() {
        let s = Sphere::new(Vec3::ZERO, 1.0);
        assert!(s.intersect(Vec3::ZERO, Vec3::FORWARD).is_none());
    }

    #[test]
    fn test_raycast_all_sorted_nearest_first() {
        let world = SphereWorld::new();
        world.add(Sphere::new(Vec3::new(0.0, 0.0, 9.0), 0.5));
        world.add(Sphere::new(Vec3::new(0.0, 0.0, 3.0), 0.5));
        world.add(Sphere::new(Vec3::new(4.0, 0.0, 6.0), 0.5));

        // Unnormalized direction is accepted
        let hits = world.raycast_all(Vec3::ZERO, Vec3::new(0.0, 0.0, 42.0));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].position, Vec3::new(0.0, 0.0, 3.0));
        assert_relative_eq!(hits[0].distance, 2.5, epsilon = 1e-5);
        assert_eq!(hits[1].position, Vec3::new(0.0, 0.0, 9.0));

        let nearest = world.raycast(Vec3::ZERO, Vec3::FORWARD).unwrap();
        assert_eq!(nearest.position, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_degenerate_direction_hits_nothing() {
        let world = SphereWorld::new();
        world.add(Sphere::new(Vec3::new(0.0, 0.0, 3.0), 0.5));
        assert!(world.raycast_all(Vec3::ZERO, Vec3::ZERO).is_empty());
    }

    #[test]
    fn test_move_to_updates_hits() {
        let world = SphereWorld::new();
        let id = world.add(Sphere::new(Vec3::new(0.0, 0.0, 3.0), 0.5));
        world.move_to(id, Vec3::new(0.0, 0.0, -3.0));
        assert!(world.raycast_all(Vec3::ZERO, Vec3::FORWARD).is_empty());
        assert_eq!(world.get(id).unwrap().center, Vec3::new(0.0, 0.0, -3.0));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_is_blocked() {
        let world = SphereWorld::new();
        let target = Vec3::new(0.0, 0.0, 8.0);
        world.add(Sphere::new(target, 0.5));
        assert!(!world.is_blocked(Vec3::ZERO, target));

        world.add(Sphere::new(Vec3::new(0.0, 0.0, 4.0), 1.0));
        assert!(world.is_blocked(Vec3::ZERO, target));

        // Past the target does not count
        assert!(!world.is_blocked(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0)));
    }
}
