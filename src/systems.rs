//! Core controller systems.
//!
//! These systems drive the locomotion step from the ECS. They are generic
//! over the physics backend so different physics engines can be used.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::{InvalidConfig, LocomotionConfig};
use crate::contact::ContactState;
use crate::intent::LocomotionIntent;
use crate::locomotion::{run_step, BodySnapshot};
use crate::state::{Airborne, Grounded, MotionState, OnClimb, OnSteep};

/// Check configs when they are inserted or changed.
///
/// Invalid configs are reported once and the controller is skipped until
/// the config is fixed.
pub fn validate_configs(
    mut commands: Commands,
    q_configs: Query<(Entity, &LocomotionConfig, Has<InvalidConfig>), Changed<LocomotionConfig>>,
) {
    for (entity, config, is_invalid) in &q_configs {
        match config.validate() {
            Ok(()) => {
                if is_invalid {
                    debug!("locomotion config of {entity} is valid again");
                    commands.entity(entity).remove::<InvalidConfig>();
                }
            }
            Err(err) => {
                warn!("skipping locomotion of {entity}: {err}");
                commands.entity(entity).insert(InvalidConfig(err));
            }
        }
    }
}

/// Run one locomotion step for every controller.
///
/// Reads this step's contacts and the body state through the backend, runs
/// [`run_step`] with backend raycasts, and writes velocity, step lift and
/// facing back to the body.
pub fn run_locomotion<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<Entity> = world
        .query_filtered::<Entity, (With<LocomotionConfig>, Without<InvalidConfig>)>()
        .iter(world)
        .collect();

    for entity in entities {
        let (Some(config), Some(intent), Some(motion), Some(contacts)) = (
            world.get::<LocomotionConfig>(entity).copied(),
            world.get::<LocomotionIntent>(entity).cloned(),
            world.get::<MotionState>(entity).cloned(),
            world.get::<ContactState>(entity).copied(),
        ) else {
            continue;
        };
        let (mut intent, mut motion, mut contacts) = (intent, motion, contacts);

        let body = BodySnapshot {
            position: B::get_position(world, entity),
            velocity: B::get_velocity(world, entity),
            rotation: B::get_rotation(world, entity),
            bottom_offset: B::get_collider_bottom_offset(world, entity),
            radius: B::get_collider_radius(world, entity),
        };
        let collision_groups = B::get_collision_groups(world, entity);

        let output = {
            let world: &World = world;
            let caster = |origin: Vec3, direction: Vec3, max_distance: f32| {
                B::raycast(world, origin, direction, max_distance, entity, collision_groups)
            };
            run_step(
                &config,
                &caster,
                &body,
                &mut intent,
                &mut motion,
                &mut contacts,
                dt,
            )
        };

        if let Some(mut current) = world.get_mut::<LocomotionIntent>(entity) {
            *current = intent;
        }
        if let Some(mut current) = world.get_mut::<MotionState>(entity) {
            *current = motion;
        }
        if let Some(mut current) = world.get_mut::<ContactState>(entity) {
            *current = contacts;
        }

        B::set_velocity(world, entity, output.velocity);
        if output.lift > 0.0 {
            B::translate(world, entity, Vec3::Y * output.lift);
        }
        if output.rotation != body.rotation {
            B::set_rotation(world, entity, output.rotation);
        }
    }
}

/// Keep the state marker components in sync with [`MotionState`].
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &MotionState,
        Has<Grounded>,
        Has<Airborne>,
        Option<&OnSteep>,
        Has<OnClimb>,
    )>,
) {
    for (entity, motion, has_grounded, has_airborne, on_steep, has_climb) in &q_controllers {
        // Sync Grounded/Airborne
        if motion.is_grounded() && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !motion.is_grounded() && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        // Sync OnSteep, refreshing the normal while it changes
        match (motion.is_on_steep(), motion.wall_normal(), on_steep) {
            (true, Some(normal), Some(current)) if current.normal == normal => {}
            (true, Some(normal), _) => {
                commands.entity(entity).insert(OnSteep { normal });
            }
            (false, _, Some(_)) | (true, None, Some(_)) => {
                commands.entity(entity).remove::<OnSteep>();
            }
            _ => {}
        }

        if motion.is_on_climb() && !has_climb {
            commands.entity(entity).insert(OnClimb);
        } else if !motion.is_on_climb() && has_climb {
            commands.entity(entity).remove::<OnClimb>();
        }
    }
}
