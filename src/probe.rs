//! Downward ground probes.
//!
//! Two rays are cast below the body. The snap probe keeps a character glued
//! to the ground for the step after it loses contact (walking over a crest
//! or down a small ledge). The distance probe measures how far the feet are
//! above the ground so the in-air flag only flips on real drops.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::ProbeConfig;
use crate::contact::{ContactState, ContactThresholds, UP};
use crate::state::MotionState;

/// Something that can answer ray queries for one character.
///
/// Backends implement this over their physics world with the character
/// itself excluded. Any `Fn(origin, direction, max_distance)` closure works,
/// which keeps the probes testable without a physics engine.
pub trait RayCaster {
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<CollisionData>;
}

impl<F> RayCaster for F
where
    F: Fn(Vec3, Vec3, f32) -> Option<CollisionData>,
{
    fn cast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<CollisionData> {
        self(origin, direction, max_distance)
    }
}

/// Snap onto ground right below the body.
///
/// Only tried on the step right after losing ground, and never within two
/// steps of a jump. On success the hit normal is folded into `contacts` as a
/// ground contact and velocity pointing away from the surface is re-aimed
/// along it without losing speed. A miss or a too-steep hit returns `false`.
pub fn try_snap_to_ground<C: RayCaster>(
    caster: &C,
    position: Vec3,
    motion: &mut MotionState,
    contacts: &mut ContactState,
    thresholds: &ContactThresholds,
    probe: &ProbeConfig,
) -> bool {
    if motion.steps_since_grounded > 1 || motion.steps_since_jump <= 2 {
        return false;
    }

    let Some(hit) = caster.cast(position, -UP, probe.snap_distance) else {
        return false;
    };
    if hit.up_dot(UP) < thresholds.min_ground_dot {
        return false;
    }

    motion.on_snapped_ground = true;
    contacts.add_ground(hit.normal);

    let speed = motion.velocity.length();
    let dot = motion.velocity.dot(hit.normal);
    if dot > 0.0 {
        motion.velocity = (motion.velocity - hit.normal * dot).normalize_or_zero() * speed;
    }

    true
}

/// Distance from the feet down to the ground, capped at the probe range.
pub fn measure_ground_distance<C: RayCaster>(
    caster: &C,
    position: Vec3,
    bottom_offset: f32,
    probe: &ProbeConfig,
) -> f32 {
    caster
        .cast(position, -UP, bottom_offset + probe.ground_distance_range)
        .map(|hit| (hit.distance - bottom_offset).max(0.0))
        .unwrap_or(probe.ground_distance_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocomotionConfig;

    fn thresholds() -> ContactThresholds {
        ContactThresholds::from_config(&LocomotionConfig::player())
    }

    /// Flat floor at `y = floor`.
    fn floor(floor: f32, normal: Vec3) -> impl Fn(Vec3, Vec3, f32) -> Option<CollisionData> {
        move |origin: Vec3, direction: Vec3, max: f32| {
            if direction.y >= 0.0 {
                return None;
            }
            let distance = (origin.y - floor) / -direction.y;
            (distance >= 0.0 && distance <= max).then(|| {
                CollisionData::new(distance, normal, origin + direction * distance, None)
            })
        }
    }

    fn just_left_ground() -> MotionState {
        MotionState {
            steps_since_grounded: 1,
            steps_since_jump: 10,
            ..default()
        }
    }

    #[test]
    fn snaps_to_ground_below() {
        let caster = floor(0.0, Vec3::Y);
        let mut motion = just_left_ground();
        let mut contacts = ContactState::default();

        let snapped = try_snap_to_ground(
            &caster,
            Vec3::new(0.0, 1.2, 0.0),
            &mut motion,
            &mut contacts,
            &thresholds(),
            &ProbeConfig::default(),
        );

        assert!(snapped);
        assert!(motion.on_snapped_ground);
        assert_eq!(contacts.ground.count, 1);
    }

    #[test]
    fn snap_preserves_speed() {
        let slope = Vec3::new(0.3, 1.0, 0.0).normalize();
        let caster = floor(0.0, slope);
        let mut motion = just_left_ground();
        motion.velocity = Vec3::new(4.0, 2.0, 1.0);
        let speed = motion.velocity.length();
        let mut contacts = ContactState::default();

        assert!(try_snap_to_ground(
            &caster,
            Vec3::new(0.0, 1.0, 0.0),
            &mut motion,
            &mut contacts,
            &thresholds(),
            &ProbeConfig::default(),
        ));

        assert!((motion.velocity.length() - speed).abs() < 1e-4);
        assert!(motion.velocity.dot(slope).abs() < 1e-4);
    }

    #[test]
    fn velocity_into_ground_is_untouched() {
        let caster = floor(0.0, Vec3::Y);
        let mut motion = just_left_ground();
        motion.velocity = Vec3::new(2.0, -3.0, 0.0);
        let mut contacts = ContactState::default();

        try_snap_to_ground(
            &caster,
            Vec3::new(0.0, 1.0, 0.0),
            &mut motion,
            &mut contacts,
            &thresholds(),
            &ProbeConfig::default(),
        );

        assert_eq!(motion.velocity, Vec3::new(2.0, -3.0, 0.0));
    }

    #[test]
    fn no_snap_long_after_ground() {
        let caster = floor(0.0, Vec3::Y);
        let mut motion = just_left_ground();
        motion.steps_since_grounded = 2;
        let mut contacts = ContactState::default();

        assert!(!try_snap_to_ground(
            &caster,
            Vec3::new(0.0, 1.0, 0.0),
            &mut motion,
            &mut contacts,
            &thresholds(),
            &ProbeConfig::default(),
        ));
        assert!(!contacts.on_ground());
    }

    #[test]
    fn no_snap_right_after_jump() {
        let caster = floor(0.0, Vec3::Y);
        let mut contacts = ContactState::default();

        for steps_since_jump in 0..=2 {
            let mut motion = just_left_ground();
            motion.steps_since_jump = steps_since_jump;
            assert!(!try_snap_to_ground(
                &caster,
                Vec3::new(0.0, 1.0, 0.0),
                &mut motion,
                &mut contacts,
                &thresholds(),
                &ProbeConfig::default(),
            ));
        }
    }

    #[test]
    fn no_snap_on_miss_or_steep_hit() {
        let mut contacts = ContactState::default();
        let mut motion = just_left_ground();

        let far = floor(-5.0, Vec3::Y);
        assert!(!try_snap_to_ground(
            &far,
            Vec3::ZERO,
            &mut motion,
            &mut contacts,
            &thresholds(),
            &ProbeConfig::default(),
        ));

        let steep = floor(0.0, Vec3::new(1.0, 0.5, 0.0).normalize());
        assert!(!try_snap_to_ground(
            &steep,
            Vec3::new(0.0, 1.0, 0.0),
            &mut motion,
            &mut contacts,
            &thresholds(),
            &ProbeConfig::default(),
        ));
        assert!(!motion.on_snapped_ground);
    }

    #[test]
    fn ground_distance_is_measured_from_feet() {
        let caster = floor(0.0, Vec3::Y);
        let probe = ProbeConfig::default();

        let distance = measure_ground_distance(&caster, Vec3::new(0.0, 3.0, 0.0), 1.0, &probe);
        assert!((distance - 2.0).abs() < 1e-5);

        let resting = measure_ground_distance(&caster, Vec3::new(0.0, 0.98, 0.0), 1.0, &probe);
        assert_eq!(resting, 0.0);
    }

    #[test]
    fn ground_distance_caps_at_range() {
        let caster = floor(-100.0, Vec3::Y);
        let probe = ProbeConfig::default();

        let distance = measure_ground_distance(&caster, Vec3::ZERO, 1.0, &probe);
        assert_eq!(distance, probe.ground_distance_range);
    }
}
