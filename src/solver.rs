//! Velocity solver.
//!
//! Converges the current velocity toward the desired velocity along the
//! contact plane, limited by an acceleration budget per step. Also holds the
//! smaller velocity rules used by the locomotion step: stop fall-off,
//! friction decay after a shove and the static-friction slope hold.

use bevy::prelude::*;

use crate::contact::UP;

/// Alignment below which moving into a steep surface is refused.
pub const INTO_WALL_DOT: f32 = -0.8;

/// Contact situation the solver runs in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceContext {
    /// Supported by ground this step.
    pub grounded: bool,
    /// Normal of a touched steep or climb surface.
    pub wall_normal: Option<Vec3>,
    /// Gravity acts this step (steep contact or no ground).
    pub force_static: bool,
    /// Move input differs from the previous step.
    pub input_changed: bool,
}

/// Next velocity after one step of acceleration-limited convergence.
///
/// Below the desired speed the result accelerates and never exceeds
/// `|desired|`. At or above it the horizontal components take the desired
/// values and the vertical component is kept.
pub fn adjust_velocity(
    current: Vec3,
    desired: Vec3,
    contact_normal: Vec3,
    acceleration: f32,
    dt: f32,
    surface: SurfaceContext,
) -> Vec3 {
    let desired_speed = desired.length();

    if let Some(wall) = surface.wall_normal {
        let away = Vec3::new(wall.x, 0.0, wall.z).normalize_or_zero();
        if away.dot(desired.normalize_or_zero()) < INTO_WALL_DOT {
            return if surface.grounded { Vec3::ZERO } else { current };
        }
    }

    let mut velocity = current;
    let mut direction = (desired - contact_normal * desired.dot(contact_normal)).normalize_or_zero();

    if direction.y > 0.0 && surface.force_static {
        direction.y = 0.0;
        if velocity.y > 0.0 {
            velocity.y = 0.0;
        }
    }

    if surface.grounded && surface.input_changed {
        velocity = direction * velocity.length();
    }

    if velocity.length() < desired_speed {
        velocity += direction * acceleration * dt;
        velocity = velocity.clamp_length_max(desired_speed);
    } else {
        velocity.x = desired.x;
        velocity.z = desired.z;
    }

    velocity
}

/// Bleed off horizontal speed when a move stops; grounded bodies also lose
/// vertical speed.
pub fn fall_off(velocity: Vec3, coefficient: f32, grounded: bool) -> Vec3 {
    Vec3::new(
        velocity.x * coefficient,
        if grounded { 0.0 } else { velocity.y },
        velocity.z * coefficient,
    )
}

/// Idle on ground: stop, or decay by `acceleration * dt` while a shove is
/// still active. Clears `external_force` once the body has stopped.
pub fn stop_with_friction(velocity: Vec3, external_force: &mut bool, acceleration: f32, dt: f32) -> Vec3 {
    if !*external_force {
        return Vec3::ZERO;
    }
    let speed = (velocity.length() - acceleration * dt).max(0.0);
    if speed <= 0.0 {
        *external_force = false;
        Vec3::ZERO
    } else {
        velocity.normalize_or_zero() * speed
    }
}

/// Whether static friction keeps a body at rest on a surface with `normal`
/// against `gravity`: the tangential pull must not exceed `friction` times
/// the normal load.
pub fn slope_holds(normal: Vec3, gravity: Vec3, friction: f32) -> bool {
    let down = gravity.normalize_or_zero();
    if down == Vec3::ZERO {
        return true;
    }
    let normal = normal.normalize_or(UP);
    let load = normal.dot(-down);
    if load <= 0.0 {
        return false;
    }
    let tangential = (1.0 - load * load).max(0.0).sqrt();
    tangential <= friction * load
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn grounded() -> SurfaceContext {
        SurfaceContext {
            grounded: true,
            ..default()
        }
    }

    fn airborne() -> SurfaceContext {
        SurfaceContext {
            grounded: false,
            force_static: true,
            ..default()
        }
    }

    #[test]
    fn accelerates_from_rest_by_budget() {
        let desired = Vec3::new(0.0, 0.0, 8.0);
        let surface = SurfaceContext {
            input_changed: true,
            ..grounded()
        };

        let velocity = adjust_velocity(Vec3::ZERO, desired, Vec3::Y, 8.0, DT, surface);

        assert!((velocity.length() - (8.0 * DT).min(8.0)).abs() < 1e-5);
        assert!(velocity.z > 0.0);
    }

    #[test]
    fn large_budget_stops_at_desired_speed() {
        let desired = Vec3::new(0.0, 0.0, 2.0);
        let velocity = adjust_velocity(Vec3::ZERO, desired, Vec3::Y, 10_000.0, DT, grounded());
        assert!((velocity.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn snaps_when_at_or_above_desired_speed() {
        let current = Vec3::new(5.0, 0.0, 0.0);
        let desired = Vec3::new(0.0, 0.0, 3.0);
        let velocity = adjust_velocity(current, desired, Vec3::Y, 8.0, DT, grounded());
        assert!((velocity - desired).length() < 1e-5);
    }

    #[test]
    fn acceleration_never_overshoots() {
        let cases = [
            (Vec3::new(0.0, -2.0, 0.0), Vec3::new(5.0, 0.0, 0.0), airborne()),
            (Vec3::new(1.0, 0.5, 0.0), Vec3::new(0.0, 0.0, 4.0), airborne()),
            (Vec3::new(1.0, 0.0, 1.0), Vec3::new(-4.0, 0.0, 0.0), grounded()),
            (Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), grounded()),
        ];
        for (current, desired, surface) in cases {
            for normal in [Vec3::Y, Vec3::new(0.3, 1.0, 0.0).normalize()] {
                let velocity = adjust_velocity(current, desired, normal, 50.0, DT, surface);
                let cap = current.length().max(desired.length());
                assert!(
                    velocity.length() <= cap + 1e-4,
                    "{current} -> {velocity} exceeds {cap}"
                );
            }
        }
    }

    #[test]
    fn snap_sets_horizontal_and_keeps_fall_speed() {
        let current = Vec3::new(0.0, -20.0, 0.0);
        let desired = Vec3::new(8.0, 0.0, 0.0);

        let velocity = adjust_velocity(current, desired, Vec3::Y, 8.0, DT, airborne());

        assert_eq!(velocity, Vec3::new(8.0, -20.0, 0.0));
    }

    #[test]
    fn steering_while_falling_does_not_slow_the_fall() {
        let mut velocity = Vec3::new(0.0, -20.0, 0.0);
        for desired in [Vec3::new(8.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -8.0), Vec3::new(-8.0, 0.0, 0.0)] {
            velocity = adjust_velocity(velocity, desired, Vec3::Y, 8.0, DT, airborne());
            assert_eq!(velocity.y, -20.0);
            assert_eq!(Vec3::new(velocity.x, 0.0, velocity.z), desired);
        }
    }

    #[test]
    fn direction_follows_slope() {
        let slope = Vec3::new(0.0, 1.0, -0.5).normalize();
        let desired = Vec3::new(0.0, 0.0, 4.0);
        let velocity = adjust_velocity(Vec3::ZERO, desired, slope, 8.0, DT, grounded());

        // Moving uphill along the surface.
        assert!(velocity.y > 0.0);
        assert!(velocity.dot(slope).abs() < 1e-5);
    }

    #[test]
    fn no_climbing_in_force_static_regime() {
        let slope = Vec3::new(0.0, 1.0, -0.5).normalize();
        let desired = Vec3::new(0.0, 0.0, 4.0);
        let surface = SurfaceContext {
            force_static: true,
            ..grounded()
        };

        let velocity = adjust_velocity(Vec3::new(0.0, 1.0, 0.0), desired, slope, 8.0, DT, surface);
        assert!(velocity.y <= 0.0);
    }

    #[test]
    fn pushing_into_wall_stops_grounded_body() {
        let surface = SurfaceContext {
            wall_normal: Some(Vec3::X),
            ..grounded()
        };
        let desired = Vec3::new(-4.0, 0.0, 0.0);

        let velocity = adjust_velocity(Vec3::new(-2.0, 0.0, 0.0), desired, Vec3::Y, 8.0, DT, surface);
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn pushing_into_wall_in_air_keeps_velocity() {
        let surface = SurfaceContext {
            wall_normal: Some(Vec3::X),
            ..airborne()
        };
        let current = Vec3::new(-2.0, -3.0, 0.0);

        let velocity = adjust_velocity(current, Vec3::new(-4.0, 0.0, 0.0), Vec3::Y, 8.0, DT, surface);
        assert_eq!(velocity, current);
    }

    #[test]
    fn sliding_along_wall_is_allowed() {
        let surface = SurfaceContext {
            wall_normal: Some(Vec3::X),
            ..grounded()
        };
        let velocity = adjust_velocity(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0), Vec3::Y, 8.0, DT, surface);
        assert!(velocity.z > 0.0);
    }

    #[test]
    fn changed_input_reaims_velocity() {
        let surface = SurfaceContext {
            input_changed: true,
            ..grounded()
        };
        let velocity = adjust_velocity(
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 8.0),
            Vec3::Y,
            8.0,
            DT,
            surface,
        );

        assert!(velocity.x.abs() < 1e-5);
        assert!((velocity.z - (4.0 + 8.0 * DT)).abs() < 1e-4);
    }

    #[test]
    fn fall_off_scales_horizontal() {
        let velocity = Vec3::new(4.0, -2.0, 2.0);
        assert_eq!(fall_off(velocity, 0.5, false), Vec3::new(2.0, -2.0, 1.0));
        assert_eq!(fall_off(velocity, 0.5, true), Vec3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn idle_stop_is_immediate() {
        let mut shoved = false;
        let velocity = stop_with_friction(Vec3::new(3.0, 0.0, 0.0), &mut shoved, 8.0, DT);
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn shove_decays_until_stopped() {
        let mut shoved = true;
        let mut velocity = Vec3::new(1.0, 0.0, 0.0);
        let mut steps = 0;
        while shoved {
            velocity = stop_with_friction(velocity, &mut shoved, 8.0, DT);
            steps += 1;
            assert!(steps < 100);
        }
        assert_eq!(velocity, Vec3::ZERO);
        // 1.0 / (8 / 60) = 7.5 steps
        assert_eq!(steps, 8);
    }

    #[test]
    fn slope_hold_depends_on_friction() {
        let gravity = Vec3::new(0.0, -9.8, 0.0);
        let thirty = Vec3::new(30f32.to_radians().sin(), 30f32.to_radians().cos(), 0.0);
        let fifty = Vec3::new(50f32.to_radians().sin(), 50f32.to_radians().cos(), 0.0);

        assert!(slope_holds(thirty, gravity, 1.0));
        assert!(!slope_holds(fifty, gravity, 1.0));
        assert!(!slope_holds(thirty, gravity, 0.2));
        assert!(!slope_holds(Vec3::NEG_Y, gravity, 1.0));
    }
}
