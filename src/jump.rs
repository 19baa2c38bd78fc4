//! Jump state machine.
//!
//! A jump phase counter gates how many jumps may start before the character
//! lands again. Grounded jumps go straight up, wall jumps push away from the
//! touched steep/climb surface, and air jumps zero the vertical velocity
//! before adding a stronger impulse. Holding the jump input keeps the upward
//! velocity for a short window after the start.

use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::contact::UP;

/// Slack on timer comparisons so accumulated `dt` does not add an extra tick.
pub(crate) const TIMER_EPSILON: f32 = 1e-5;

/// Where a jump is started from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpSurface {
    /// Standing on ground (direct contact or snapped).
    Ground,
    /// Touching a steep or climb surface with the given normal.
    Wall(Vec3),
    /// No support at all.
    Air,
}

/// Result of a jump request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    Grounded,
    Wall,
    Air,
    /// Not allowed in the current state; velocity untouched.
    Dropped,
}

impl JumpOutcome {
    pub fn accepted(self) -> bool {
        self != Self::Dropped
    }
}

/// Jump phase and hold timer of one character.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct JumpState {
    phase: u32,
    hold_timer: f32,
}

impl JumpState {
    /// Jumps started since the last landing.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Seconds the current hold has been extending the jump.
    pub fn hold_timer(&self) -> f32 {
        self.hold_timer
    }

    /// Try to start a jump, adding the impulse to `velocity`.
    pub fn start(
        &mut self,
        velocity: &mut Vec3,
        surface: JumpSurface,
        wall_jump: bool,
        config: &LocomotionConfig,
    ) -> JumpOutcome {
        let max_air_jump = config.max_air_jump;

        let (direction, outcome, counted) = match surface {
            JumpSurface::Ground => (UP, JumpOutcome::Grounded, false),
            JumpSurface::Wall(normal) if wall_jump && self.phase <= max_air_jump => {
                velocity.y = 0.0;
                let direction =
                    (normal.normalize_or_zero() + UP * config.wall_jump_coefficient).normalize_or(UP);
                (direction, JumpOutcome::Wall, false)
            }
            JumpSurface::Wall(_) | JumpSurface::Air
                if max_air_jump > 0 && self.phase <= max_air_jump =>
            {
                // Walked off a ledge: this air jump is the first phase.
                let counted = self.phase == 0;
                if counted {
                    self.phase = 1;
                }
                velocity.y = 0.0;
                (UP, JumpOutcome::Air, counted)
            }
            _ => return JumpOutcome::Dropped,
        };

        let coefficient = if self.phase > 0 {
            velocity.y = 0.0;
            config.air_jump_velocity_coefficient
        } else {
            1.0
        };
        if !counted {
            self.phase += 1;
        }

        if velocity.y < 0.0 {
            velocity.y = 0.0;
        }
        *velocity += direction * config.jump_speed() * coefficient;

        outcome
    }

    /// Restart the hold window (jump input pressed).
    pub fn restart_hold(&mut self) {
        self.hold_timer = 0.0;
    }

    /// Extend a held jump. Returns whether the vertical velocity was set.
    ///
    /// Only a jump started since the last landing is extended; holding the
    /// input alone never lifts the body.
    pub fn hold(&mut self, velocity: &mut Vec3, held: bool, config: &LocomotionConfig, dt: f32) -> bool {
        if held
            && self.phase > 0
            && self.hold_timer + TIMER_EPSILON < config.jump_time
            && self.phase <= config.max_air_jump
        {
            self.hold_timer += dt;
            velocity.y = config.jump_speed();
            true
        } else {
            false
        }
    }

    /// Landed: air jumps become available again.
    pub fn land(&mut self) {
        self.phase = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LocomotionConfig {
        LocomotionConfig::player()
    }

    #[test]
    fn ground_jump_goes_straight_up() {
        let config = config();
        let mut jump = JumpState::default();
        let mut velocity = Vec3::new(3.0, -2.0, 0.0);

        let outcome = jump.start(&mut velocity, JumpSurface::Ground, true, &config);

        assert_eq!(outcome, JumpOutcome::Grounded);
        assert_eq!(jump.phase(), 1);
        assert_eq!(velocity.x, 3.0);
        // Falling speed is discarded before the impulse.
        assert!((velocity.y - config.jump_speed()).abs() < 0.001);
    }

    #[test]
    fn air_jumps_until_phase_exceeds_limit() {
        let config = config().with_max_air_jump(1);
        let mut jump = JumpState::default();
        let mut velocity = Vec3::new(0.0, -5.0, 0.0);

        assert_eq!(
            jump.start(&mut velocity, JumpSurface::Air, true, &config),
            JumpOutcome::Air
        );
        assert_eq!(jump.phase(), 1);
        let expected = config.jump_speed() * config.air_jump_velocity_coefficient;
        assert!((velocity.y - expected).abs() < 0.001);

        assert_eq!(
            jump.start(&mut velocity, JumpSurface::Air, true, &config),
            JumpOutcome::Air
        );
        assert_eq!(jump.phase(), 2);
        // Air jumps replace the vertical velocity instead of stacking.
        assert!((velocity.y - expected).abs() < 0.001);

        let before = velocity;
        assert_eq!(
            jump.start(&mut velocity, JumpSurface::Air, true, &config),
            JumpOutcome::Dropped
        );
        assert_eq!(jump.phase(), 2);
        assert_eq!(velocity, before);
    }

    #[test]
    fn no_air_jumps_without_budget() {
        let config = config().with_max_air_jump(0);
        let mut jump = JumpState::default();
        let mut velocity = Vec3::ZERO;

        assert_eq!(
            jump.start(&mut velocity, JumpSurface::Air, true, &config),
            JumpOutcome::Dropped
        );
        assert_eq!(velocity, Vec3::ZERO);
    }

    #[test]
    fn wall_jump_pushes_away_from_wall() {
        let config = config();
        let mut jump = JumpState::default();
        let mut velocity = Vec3::new(0.0, -3.0, 1.0);

        let outcome = jump.start(&mut velocity, JumpSurface::Wall(Vec3::X), true, &config);

        assert_eq!(outcome, JumpOutcome::Wall);
        let direction = (Vec3::X + Vec3::Y * config.wall_jump_coefficient).normalize();
        let expected = Vec3::new(0.0, 0.0, 1.0) + direction * config.jump_speed();
        assert!((velocity - expected).length() < 0.001, "got {velocity}");
    }

    #[test]
    fn wall_without_capability_is_air_jump() {
        let config = config();
        let mut jump = JumpState::default();
        let mut velocity = Vec3::ZERO;

        let outcome = jump.start(&mut velocity, JumpSurface::Wall(Vec3::X), false, &config);

        assert_eq!(outcome, JumpOutcome::Air);
        assert_eq!(velocity.x, 0.0);
    }

    #[test]
    fn land_resets_phase() {
        let config = config();
        let mut jump = JumpState::default();
        let mut velocity = Vec3::ZERO;
        jump.start(&mut velocity, JumpSurface::Ground, true, &config);
        jump.start(&mut velocity, JumpSurface::Air, true, &config);
        assert_eq!(jump.phase(), 2);

        jump.land();
        assert_eq!(jump.phase(), 0);
    }

    #[test]
    fn hold_extends_for_jump_time() {
        let config = config().with_jump_time(0.1);
        let dt = 1.0 / 60.0;
        let mut jump = JumpState::default();
        let mut velocity = Vec3::ZERO;
        jump.start(&mut velocity, JumpSurface::Ground, true, &config);
        jump.restart_hold();

        let mut held_ticks = 0;
        for _ in 0..20 {
            velocity.y -= 1.0;
            if jump.hold(&mut velocity, true, &config, dt) {
                held_ticks += 1;
                assert!((velocity.y - config.jump_speed()).abs() < 0.001);
            }
        }
        assert_eq!(held_ticks, 6);
    }

    #[test]
    fn hold_without_jump_does_nothing() {
        let config = config();
        let mut jump = JumpState::default();
        let mut velocity = Vec3::ZERO;
        jump.restart_hold();

        assert!(!jump.hold(&mut velocity, true, &config, 1.0 / 60.0));
        assert_eq!(velocity, Vec3::ZERO);
        assert_eq!(jump.phase(), 0);
    }

    #[test]
    fn released_hold_does_nothing() {
        let config = config();
        let mut jump = JumpState::default();
        let mut velocity = Vec3::new(0.0, 1.0, 0.0);

        assert!(!jump.hold(&mut velocity, false, &config, 1.0 / 60.0));
        assert_eq!(velocity.y, 1.0);
    }
}
