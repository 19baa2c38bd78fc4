//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.
//!
//! Rapier resolves collisions for the dynamic body. Each fixed step the
//! backend reads the contact manifolds Rapier produced for the character and
//! feeds them to the contact accumulator, then the locomotion step overwrites
//! the body's velocity before Rapier advances the simulation.

use bevy::prelude::*;
use bevy_rapier3d::geometry::Group;
use bevy_rapier3d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::CollisionData;
use crate::config::{InvalidConfig, LocomotionConfig};
use crate::contact::{ContactSample, ContactState, ContactThresholds, SurfaceFriction};
use crate::LocomotionSet;

/// Contact points further apart than this are predictive, not touching.
const CONTACT_DISTANCE: f32 = 0.02;

/// Rapier3D physics backend for the locomotion controller.
///
/// Raycasts go through the default Rapier context's query pipeline, velocity
/// is read from and written to [`Velocity::linvel`].
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn raycast(
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude_entity: Entity,
        collision_groups: Option<(u32, u32)>,
    ) -> Option<CollisionData> {
        let mut query = world
            .try_query_filtered::<(&RapierContextColliders, &RapierQueryPipeline, &RapierRigidBodySet), With<DefaultRapierContext>>()?;
        let (colliders, pipeline, bodies) = query.single(world).ok()?;

        // Create filter to exclude the casting entity
        let mut filter = QueryFilter::default()
            .exclude_rigid_body(exclude_entity)
            .exclude_sensors();

        if let Some((memberships, filters)) = collision_groups {
            filter = filter.groups(CollisionGroups::new(
                Group::from_bits_truncate(memberships),
                Group::from_bits_truncate(filters),
            ));
        }

        pipeline
            .cast_ray_and_get_normal(colliders, bodies, origin, direction, max_distance, true, filter)
            .map(|(hit_entity, hit)| {
                CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
            })
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| world.get::<GlobalTransform>(entity).map(|t| t.translation()))
            .unwrap_or(Vec3::ZERO)
    }

    fn translate(world: &mut World, entity: Entity, offset: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation += offset;
        }
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<Transform>(entity)
            .map(|t| t.rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn set_rotation(world: &mut World, entity: Entity, rotation: Quat) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.rotation = rotation;
        }
    }

    fn get_collision_groups(world: &World, entity: Entity) -> Option<(u32, u32)> {
        world
            .get::<CollisionGroups>(entity)
            .map(|cg| (cg.memberships.bits(), cg.filters.bits()))
    }

    fn get_collider_bottom_offset(world: &World, entity: Entity) -> f32 {
        world
            .get::<Collider>(entity)
            .map(collider_bottom_offset)
            .unwrap_or(0.0)
    }

    fn get_collider_radius(world: &World, entity: Entity) -> f32 {
        world
            .get::<Collider>(entity)
            .map(collider_radius)
            .unwrap_or(0.0)
    }
}

/// Plugin that sets up Rapier3D-specific systems for the locomotion controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            collect_rapier_contacts.in_set(LocomotionSet::Sensors),
        );

        // Velocities must be written before Rapier reads the components back.
        app.configure_sets(
            FixedUpdate,
            LocomotionSet::Sync.before(PhysicsSet::SyncBackend),
        );
    }
}

/// Distance from collider center to bottom.
/// For capsules, this is half_height + radius.
pub fn collider_bottom_offset(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        let half_height = (segment.a().y - segment.b().y).abs() / 2.0;
        half_height + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().y
    } else {
        0.0
    }
}

/// Horizontal radius of a collider.
pub fn collider_radius(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        let half = cuboid.half_extents();
        half.x.max(half.z)
    } else {
        0.0
    }
}

/// Feed this step's Rapier contacts into each character's [`ContactState`].
///
/// Manifold normals point from the first collider of a pair to the second,
/// so they are flipped when the character is the first collider.
fn collect_rapier_contacts(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(Entity, &LocomotionConfig, &mut ContactState), Without<InvalidConfig>>,
    q_friction: Query<&SurfaceFriction>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, config, mut contacts) in &mut q_controllers {
        let thresholds = ContactThresholds::from_config(config);

        for pair in context.contact_pairs_with(entity) {
            if !pair.has_any_active_contact() {
                continue;
            }
            let (Some(collider1), Some(collider2)) = (pair.collider1(), pair.collider2()) else {
                continue;
            };
            let (other, sign) = if collider1 == entity {
                (collider2, -1.0)
            } else {
                (collider1, 1.0)
            };
            let friction = q_friction.get(other).ok().map(|f| f.0);

            for manifold in pair.manifolds() {
                let touching = manifold.points().filter(|p| p.dist() <= CONTACT_DISTANCE).count();
                let normal = manifold.normal() * sign;
                for _ in 0..touching {
                    let mut sample = ContactSample::new(normal);
                    if let Some(friction) = friction {
                        sample = sample.with_friction(friction);
                    }
                    let kind = contacts.classify(sample, &thresholds);
                    trace!("{entity} touches {other}: {kind:?} {normal}");
                }
            }
        }
    }
}

/// Physics components for a Rapier-driven character.
///
/// Rotation is locked so the controller owns facing, and Rapier gravity is
/// disabled so the controller's own gravity is the only one applied.
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    pub locked_axes: LockedAxes,
    pub gravity_scale: GravityScale,
    pub mass_properties: ReadMassProperties,
    pub collider: Collider,
}

impl Rapier3dCharacterBundle {
    /// Capsule standing on its bottom, `height` tall overall.
    pub fn capsule(height: f32, radius: f32) -> Self {
        let half_segment = (height * 0.5 - radius).max(0.0);
        Self::with_collider(Collider::capsule_y(half_segment, radius))
    }

    pub fn with_collider(collider: Collider) -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::zero(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            gravity_scale: GravityScale(0.0),
            mass_properties: ReadMassProperties::default(),
            collider,
        }
    }
}
