//! Step climbing.
//!
//! Pairs of horizontal probes are cast straight ahead and to both sides of
//! the facing direction. A hit on a near-vertical face at ankle height with
//! nothing at step height means a ledge low enough to climb, and the body is
//! lifted a little this step. Hits at both heights mean a wall.

use bevy::prelude::*;

use crate::config::StepConfig;
use crate::contact::UP;
use crate::probe::RayCaster;

/// What one probe pair found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepProbe {
    /// Lower probe clear, or it hit something walkable.
    Open,
    /// Both probes blocked.
    Wall,
    /// Riser below step height with free space above.
    Step,
}

/// Body measurements the probes need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBody {
    /// Collider center.
    pub position: Vec3,
    /// Horizontal facing of the body.
    pub facing: Vec3,
    /// Distance from the collider center down to the feet.
    pub bottom_offset: f32,
    /// Horizontal radius of the collider.
    pub radius: f32,
}

/// Probe one direction for a climbable step.
pub fn probe_step<C: RayCaster>(
    caster: &C,
    body: &StepBody,
    direction: Vec3,
    config: &StepConfig,
) -> StepProbe {
    let feet = body.position - UP * body.bottom_offset;

    let Some(lower) = caster.cast(
        feet + UP * config.ankle_height,
        direction,
        body.radius + config.low_margin,
    ) else {
        return StepProbe::Open;
    };
    if lower.up_dot(UP) >= config.max_riser_dot {
        return StepProbe::Open;
    }

    match caster.cast(
        feet + UP * config.height,
        direction,
        body.radius + config.high_margin,
    ) {
        Some(_) => StepProbe::Wall,
        None => StepProbe::Step,
    }
}

/// Probe directions: the facing and the facing yawed by `±side_angle`.
pub fn probe_directions(facing: Vec3, config: &StepConfig) -> [Vec3; 3] {
    let side = config.side_angle.to_radians();
    [
        facing,
        Quat::from_rotation_y(side) * facing,
        Quat::from_rotation_y(-side) * facing,
    ]
}

/// Vertical lift for this step, `0.0` when no step was found.
///
/// Probing only runs while the body stands on near-flat ground
/// (`support_normal`); `None` means no ground support.
pub fn step_climb<C: RayCaster>(
    caster: &C,
    body: &StepBody,
    support_normal: Option<Vec3>,
    config: &StepConfig,
    dt: f32,
) -> f32 {
    let Some(support) = support_normal else {
        return 0.0;
    };
    if support.dot(UP) < config.min_support_dot {
        return 0.0;
    }
    let facing = Vec3::new(body.facing.x, 0.0, body.facing.z).normalize_or_zero();
    if facing == Vec3::ZERO {
        return 0.0;
    }

    let found = probe_directions(facing, config)
        .into_iter()
        .any(|direction| probe_step(caster, body, direction, config) == StepProbe::Step);

    if found {
        config.smooth_rate * dt
    } else {
        0.0
    }
}
