//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement to
//! drive the locomotion controller. The controller never resolves
//! collisions itself: the backend reports contacts (through its own sensor
//! systems filling [`ContactState`](crate::contact::ContactState)), answers
//! ray queries and exposes the body's position, rotation and velocity.

use bevy::prelude::*;

use crate::collision::CollisionData;

/// Trait for physics backend implementations.
///
/// All methods are static and operate on the [`World`], so the locomotion
/// step can run as a single exclusive system generic over the backend.
///
/// For an example implementation, see the `rapier` module's
/// `Rapier3dBackend`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    ///
    /// Backend sensor systems that gather contacts belong in
    /// [`LocomotionSet::Sensors`](crate::LocomotionSet::Sensors).
    fn plugin() -> impl Plugin;

    /// Cast a ray and return the first hit.
    ///
    /// # Arguments
    /// * `world` - The ECS world for queries
    /// * `origin` - Ray origin in world space
    /// * `direction` - Cast direction (normalized)
    /// * `max_distance` - Maximum cast distance
    /// * `exclude_entity` - Entity to exclude from the cast (usually self)
    /// * `collision_groups` - Optional collision groups for filtering (memberships, filters)
    fn raycast(
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude_entity: Entity,
        collision_groups: Option<(u32, u32)>,
    ) -> Option<CollisionData>;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Overwrite the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Get the current position (collider center) of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Move an entity by `offset` without touching its velocity.
    fn translate(world: &mut World, entity: Entity, offset: Vec3);

    /// Get the current rotation of an entity.
    fn get_rotation(world: &World, entity: Entity) -> Quat;

    /// Overwrite the rotation of an entity.
    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }

    /// Get the collision groups for an entity (memberships, filters).
    /// Returns None if the entity doesn't have collision groups.
    fn get_collision_groups(_world: &World, _entity: Entity) -> Option<(u32, u32)> {
        None
    }

    /// Distance from the collider center to its bottom.
    fn get_collider_bottom_offset(_world: &World, _entity: Entity) -> f32 {
        0.0
    }

    /// Horizontal radius of the collider.
    fn get_collider_radius(_world: &World, _entity: Entity) -> f32 {
        0.0
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
