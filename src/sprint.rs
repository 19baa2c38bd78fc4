//! Sprint dash.
//!
//! Starting a sprint fires a dash at `distance / time` for `time` seconds
//! and, when started on the ground, boosts the desired speed until the
//! sprint is released. Dashes started in the air spend an air-sprint phase.

use bevy::prelude::*;

use crate::config::SprintConfig;
use crate::jump::TIMER_EPSILON;

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SprintState {
    dashing: bool,
    timer: f32,
    speed: f32,
    direction: Vec3,
    air_phase: u32,
    multiplier: f32,
}

impl Default for SprintState {
    fn default() -> Self {
        Self {
            dashing: false,
            timer: 0.0,
            speed: 0.0,
            direction: Vec3::ZERO,
            air_phase: 0,
            multiplier: 1.0,
        }
    }
}

impl SprintState {
    /// Whether a dash is in progress.
    pub fn is_dashing(&self) -> bool {
        self.dashing
    }

    /// Desired speed multiplier from sprinting.
    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Dashes spent since the last landing.
    pub fn air_phase(&self) -> u32 {
        self.air_phase
    }

    /// Start a dash along `direction`.
    pub fn start(&mut self, direction: Vec3, grounded: bool, in_air: bool, config: &SprintConfig) {
        self.multiplier = if grounded { config.coefficient } else { 1.0 };
        self.dashing = true;
        if in_air {
            self.air_phase += 1;
        }
        self.speed = config.velocity();
        self.direction = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
    }

    /// Release the sprint input.
    pub fn release(&mut self) {
        self.multiplier = 1.0;
    }

    /// Advance the dash. Returns whether it overrode `velocity` this tick.
    ///
    /// When the dash ends without move input the character stops dead.
    pub fn tick(&mut self, velocity: &mut Vec3, idle: bool, config: &SprintConfig, dt: f32) -> bool {
        if self.air_phase <= config.max_air_sprint && self.timer + TIMER_EPSILON < config.time {
            self.timer += dt;
            *velocity = self.direction * self.speed;
            true
        } else {
            self.timer = 0.0;
            self.dashing = false;
            if idle {
                *velocity = Vec3::ZERO;
            }
            false
        }
    }

    /// Landed: air dashes become available again.
    pub fn land(&mut self) {
        self.air_phase = 0;
    }
}
