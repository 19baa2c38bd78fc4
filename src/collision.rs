//! Ray query results.
//!
//! These structures hold the results of physics queries used by the ground
//! prober, the step climber and the ground distance check.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if known).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Cosine of the angle between the hit normal and `up`.
    #[inline]
    pub fn up_dot(&self, up: Vec3) -> f32 {
        self.normal.dot(up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hit() {
        let cast = CollisionData::new(5.0, Vec3::Y, Vec3::new(10.0, 0.0, 2.0), None);

        assert_eq!(cast.distance, 5.0);
        assert_eq!(cast.normal, Vec3::Y);
        assert_eq!(cast.point, Vec3::new(10.0, 0.0, 2.0));
    }

    #[test]
    fn ray_hit_with_entity() {
        let entity = Entity::from_raw(42);
        let cast = CollisionData::new(3.0, Vec3::X, Vec3::ZERO, Some(entity));

        assert_eq!(cast.entity, Some(entity));
    }

    #[test]
    fn up_dot_of_wall_is_zero() {
        let cast = CollisionData::new(1.0, Vec3::NEG_Z, Vec3::ZERO, None);
        assert!(cast.up_dot(Vec3::Y).abs() < 1e-6);
    }
}
