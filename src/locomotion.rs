//! The locomotion step.
//!
//! [`run_step`] sequences one fixed tick for one character:
//!
//! 1. Resolve the contact state: direct ground contacts, else a snap probe,
//!    else airborne. Landing resets the jump and air-sprint phases.
//! 2. Horizontal movement: stop fall-off, step climbing plus the velocity
//!    solver while moving, idle friction, or the sprint dash.
//! 3. Gravity while on a steep surface or without ground, unless a slope
//!    hold keeps the body at rest.
//! 4. Jump start and jump hold.
//! 5. Hand the velocity, step lift and facing back to the caller, clear the
//!    step's contacts and measure the ground distance for the next tick.
//!
//! The step is pure over its inputs and a [`RayCaster`], so it runs the same
//! under any backend and in tests.

use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::contact::{ContactState, ContactThresholds, UP};
use crate::intent::LocomotionIntent;
use crate::jump::JumpSurface;
use crate::probe::{measure_ground_distance, try_snap_to_ground, RayCaster};
use crate::solver::{adjust_velocity, fall_off, slope_holds, stop_with_friction, SurfaceContext};
use crate::state::MotionState;
use crate::step::{step_climb, StepBody};

/// Body data read from the physics backend at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    /// Collider center.
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    /// Distance from the collider center down to the feet.
    pub bottom_offset: f32,
    /// Horizontal collider radius.
    pub radius: f32,
}

impl Default for BodySnapshot {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            bottom_offset: 0.0,
            radius: 0.0,
        }
    }
}

/// What the backend writes back after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub velocity: Vec3,
    /// Upward translation from step climbing.
    pub lift: f32,
    pub rotation: Quat,
}

/// Horizontal facing of a rotation (`-Z` forward).
pub fn facing(rotation: Quat) -> Vec3 {
    let forward = rotation * Vec3::NEG_Z;
    Vec3::new(forward.x, 0.0, forward.z).normalize_or(Vec3::NEG_Z)
}

/// Yaw `current` toward `direction` by at most `max_degrees`.
pub fn turn_toward(current: Quat, direction: Vec3, max_degrees: f32) -> Quat {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= f32::EPSILON {
        return current;
    }
    let target = Quat::from_rotation_y(f32::atan2(-flat.x, -flat.z));
    let angle = current.angle_between(target);
    let max = max_degrees.max(0.0).to_radians();
    if angle <= max || angle <= f32::EPSILON {
        target
    } else {
        current.slerp(target, max / angle)
    }
}

/// Run one fixed tick of locomotion for one character.
pub fn run_step<C: RayCaster>(
    config: &LocomotionConfig,
    caster: &C,
    body: &BodySnapshot,
    intent: &mut LocomotionIntent,
    motion: &mut MotionState,
    contacts: &mut ContactState,
    dt: f32,
) -> StepOutput {
    let thresholds = ContactThresholds::from_config(config);
    motion.velocity = body.velocity + std::mem::take(&mut motion.pending_impulse);

    resolve_state(config, &thresholds, caster, body, motion, contacts);
    apply_toggles(config, body, intent, motion);

    let walk = if motion.walking {
        config.walk_coefficient
    } else {
        1.0
    };
    let desired = intent.direction() * config.max_velocity() * motion.sprint.multiplier() * walk;
    motion.desired_velocity = desired;

    let (lift, slope_held) = move_horizontally(config, caster, body, intent, motion, contacts, dt);

    let force_static = motion.on_steep || !motion.is_grounded();
    if force_static && !slope_held {
        motion.velocity += config.gravity * dt;
    }

    jump(config, intent, motion, dt);

    contacts.clear();
    motion.ground_distance =
        measure_ground_distance(caster, body.position, body.bottom_offset, &config.probe);

    let rotation = if motion.sprint.is_dashing() {
        body.rotation
    } else {
        let rate = if motion.on_air {
            config.air_rotate_speed
        } else {
            config.rotate_speed * motion.velocity.length()
        };
        turn_toward(body.rotation, desired, rate * dt)
    };

    StepOutput {
        velocity: motion.velocity,
        lift,
        rotation,
    }
}

fn resolve_state<C: RayCaster>(
    config: &LocomotionConfig,
    thresholds: &ContactThresholds,
    caster: &C,
    body: &BodySnapshot,
    motion: &mut MotionState,
    contacts: &mut ContactState,
) {
    motion.steps_since_grounded = motion.steps_since_grounded.saturating_add(1);
    motion.steps_since_jump = motion.steps_since_jump.saturating_add(1);

    motion.on_ground_contact = contacts.on_ground();
    motion.on_snapped_ground = false;
    if !motion.on_ground_contact {
        try_snap_to_ground(caster, body.position, motion, contacts, thresholds, &config.probe);
    }

    motion.on_steep = contacts.on_steep();
    motion.on_climb = contacts.on_climb();
    motion.wall_normal = contacts.steep.resolve().or_else(|| contacts.climb.resolve());
    motion.friction = contacts.friction();

    if motion.is_grounded() {
        motion.on_air = false;
        motion.steps_since_grounded = 0;
        motion.grounded_streak = motion.grounded_streak.saturating_add(1);
        if motion.on_ground_contact && motion.steps_since_jump > 1 && motion.grounded_streak >= 2 {
            if motion.jump.phase() > 0 || motion.sprint.air_phase() > 0 {
                debug!("landed after jump phase {}", motion.jump.phase());
            }
            motion.jump.land();
            motion.sprint.land();
        }
        motion.contact_normal = contacts.ground.resolve().unwrap_or(UP);
    } else {
        motion.grounded_streak = 0;
        if motion.ground_distance > config.probe.air_threshold {
            motion.on_air = true;
        }
        motion.contact_normal = UP;
    }
}

fn apply_toggles(
    config: &LocomotionConfig,
    body: &BodySnapshot,
    intent: &mut LocomotionIntent,
    motion: &mut MotionState,
) {
    if let Some(walking) = intent.take_walk_request() {
        motion.walking = walking;
    }

    match intent.take_sprint_request() {
        Some(true) if config.capabilities.sprint => {
            let direction = if intent.direction() == Vec3::ZERO {
                facing(body.rotation)
            } else {
                intent.direction()
            };
            let grounded = motion.is_grounded();
            let in_air = motion.on_air;
            motion.sprint.start(direction, grounded, in_air, &config.sprint);
            motion.walking = false;
            debug!("sprint started toward {direction}");
        }
        Some(false) => motion.sprint.release(),
        _ => {}
    }
}

/// Returns the step lift and whether a slope hold suppresses gravity.
fn move_horizontally<C: RayCaster>(
    config: &LocomotionConfig,
    caster: &C,
    body: &BodySnapshot,
    intent: &mut LocomotionIntent,
    motion: &mut MotionState,
    contacts: &ContactState,
    dt: f32,
) -> (f32, bool) {
    let grounded = motion.is_grounded();
    let ground_acceleration = config.base_acceleration() * motion.friction;
    let dashing = motion.sprint.is_dashing();

    let input = intent.direction();
    let input_changed = input != motion.last_input;
    motion.last_input = input;

    if intent.is_moving() && !dashing {
        if intent.take_stop() {
            motion.velocity = fall_off(motion.velocity, config.fall_off_coefficient, grounded);
            return (0.0, false);
        }

        let mut lift = 0.0;
        if config.capabilities.step_climb {
            let step_body = StepBody {
                position: body.position,
                facing: facing(body.rotation),
                bottom_offset: body.bottom_offset,
                radius: body.radius,
            };
            let support = grounded.then_some(motion.contact_normal);
            lift = step_climb(caster, &step_body, support, &config.step, dt);
            if lift > 0.0 {
                trace!("step detected, lifting by {lift}");
            }
        }

        let acceleration = if grounded {
            ground_acceleration
        } else {
            config.air_acceleration()
        };
        let surface = SurfaceContext {
            grounded,
            wall_normal: motion.wall_normal,
            force_static: motion.on_steep || !grounded,
            input_changed,
        };
        motion.velocity = adjust_velocity(
            motion.velocity,
            motion.desired_velocity,
            motion.contact_normal,
            acceleration,
            dt,
            surface,
        );
        trace!("solved velocity {}", motion.velocity);
        return (lift, false);
    }

    // Idle on ground. The step right after a jump still sees the ground
    // contact and must not cancel the jump.
    if grounded && motion.steps_since_jump > 1 && (motion.external_force || !dashing) {
        motion.velocity = stop_with_friction(
            motion.velocity,
            &mut motion.external_force,
            ground_acceleration,
            dt,
        );
    }

    if dashing {
        let idle = !intent.is_moving() || input == Vec3::ZERO;
        if !motion.sprint.tick(&mut motion.velocity, idle, &config.sprint, dt) {
            debug!("sprint finished");
        }
        return (0.0, false);
    }

    if config.capabilities.slope_hold && !grounded {
        if let Some(normal) = contacts.steep.resolve() {
            if slope_holds(normal, config.gravity, motion.friction) {
                motion.velocity = Vec3::ZERO;
                return (0.0, true);
            }
        }
    }

    (0.0, false)
}

fn jump(config: &LocomotionConfig, intent: &mut LocomotionIntent, motion: &mut MotionState, dt: f32) {
    if intent.take_jump_hold_start() {
        motion.jump.restart_hold();
    }

    if intent.take_jump_request() {
        let surface = if motion.is_grounded() {
            JumpSurface::Ground
        } else if let Some(normal) = motion.wall_normal {
            JumpSurface::Wall(normal)
        } else {
            JumpSurface::Air
        };
        let outcome = motion.jump.start(
            &mut motion.velocity,
            surface,
            config.capabilities.wall_jump,
            config,
        );
        if outcome.accepted() {
            motion.steps_since_jump = 0;
            debug!("jump {outcome:?}, phase {}", motion.jump.phase());
        } else {
            debug!("jump dropped at phase {}", motion.jump.phase());
        }
    }

    motion
        .jump
        .hold(&mut motion.velocity, intent.is_jump_held(), config, dt);
}
