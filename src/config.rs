//! Controller configuration components.
//!
//! This module defines the tuning surface of the locomotion controller: body
//! mass and movement force, contact angle tiers, jump and sprint parameters,
//! step climbing and ground probing distances. A config is immutable while
//! the simulation runs; presets cover the common controller variants.

use bevy::prelude::*;

use crate::contact::ContactState;
use crate::error::ConfigError;
use crate::intent::LocomotionIntent;
use crate::state::MotionState;

/// Speed tier of a character.
///
/// Scales the maximum velocity derived from movement force and mass. The
/// base acceleration is the same for every tier. The tier is set per
/// character, not derived from the `force / mass` ratio.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementTier {
    /// Max velocity is `force / (2 * mass)`.
    Slow,
    /// Max velocity is `force / mass`.
    #[default]
    Normal,
    /// Max velocity is `2 * force / mass`.
    Fast,
}

impl MovementTier {
    /// Multiplier applied to `force / mass` to get the max velocity.
    pub fn velocity_scale(self) -> f32 {
        match self {
            Self::Slow => 0.5,
            Self::Normal => 1.0,
            Self::Fast => 2.0,
        }
    }
}

/// Structural switches between controller variants.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Contacts steeper than ground are collected as steep contacts.
    pub steep_tier: bool,
    /// Contacts steeper than the steep tier are collected as climb contacts.
    pub climb_tier: bool,
    /// Jumping off steep/climb contacts is allowed.
    pub wall_jump: bool,
    /// Forward probes lift the body over small ledges.
    pub step_climb: bool,
    /// Sprint dashes and the sprint speed multiplier.
    pub sprint: bool,
    /// Idle characters on steep slopes stay put when friction holds them.
    pub slope_hold: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            steep_tier: true,
            climb_tier: false,
            wall_jump: true,
            step_climb: true,
            sprint: true,
            slope_hold: false,
        }
    }
}

impl Capabilities {
    /// Only the ground tier; no wall jumps, steps, sprint or slope hold.
    pub fn ground_only() -> Self {
        Self {
            steep_tier: false,
            climb_tier: false,
            wall_jump: false,
            step_climb: false,
            sprint: false,
            slope_hold: false,
        }
    }
}

/// Step climbing probes.
///
/// The lower probe starts `ankle_height` above the feet and reaches
/// `radius + low_margin`; the upper probe starts `height` above the feet and
/// reaches `radius + high_margin`.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct StepConfig {
    /// Tallest ledge that can be stepped onto.
    pub height: f32,
    /// Upward nudge speed while a step is detected (units per second).
    pub smooth_rate: f32,
    /// Height of the lower probe above the feet.
    pub ankle_height: f32,
    /// Reach of the lower probe beyond the collider radius.
    pub low_margin: f32,
    /// Reach of the upper probe beyond the collider radius.
    pub high_margin: f32,
    /// Yaw of the side probes relative to the facing, in degrees.
    pub side_angle: f32,
    /// Minimum `normal · up` of the supporting surface for probing to run.
    pub min_support_dot: f32,
    /// Maximum `normal · up` for the lower hit to count as a riser.
    pub max_riser_dot: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            height: 0.4,
            smooth_rate: 20.0,
            ankle_height: 0.1,
            low_margin: 0.1,
            high_margin: 0.2,
            side_angle: 45.0,
            min_support_dot: 0.9,
            max_riser_dot: 0.1,
        }
    }
}

/// Sprint dash parameters.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SprintConfig {
    /// Distance covered by one dash.
    pub distance: f32,
    /// Duration of one dash in seconds.
    pub time: f32,
    /// Dashes allowed before landing again.
    pub max_air_sprint: u32,
    /// Desired speed multiplier while sprinting on ground.
    pub coefficient: f32,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            time: 0.1,
            max_air_sprint: 1,
            coefficient: 1.5,
        }
    }
}

impl SprintConfig {
    /// Dash speed, `distance / time`.
    pub fn velocity(&self) -> f32 {
        self.distance / self.time
    }
}

/// Downward probe distances, measured from the body center.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ProbeConfig {
    /// Reach of the snap-to-ground ray.
    pub snap_distance: f32,
    /// Reach of the ground distance ray below the feet.
    pub ground_distance_range: f32,
    /// Feet-to-ground distance above which an ungrounded body counts as in the air.
    pub air_threshold: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            snap_distance: 1.5,
            ground_distance_range: 10.0,
            air_threshold: 1.5,
        }
    }
}

/// Configuration for a locomotion controller.
///
/// Inserting it also inserts the per-character state the controller needs.
///
/// # Example
///
/// ```rust
/// use msg_locomotion_controller::prelude::*;
///
/// let config = LocomotionConfig::player()
///     .with_mass(80.0)
///     .with_max_air_jump(2)
///     .validated()
///     .expect("valid config");
/// assert!(config.max_velocity() > 0.0);
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[require(MotionState, ContactState, LocomotionIntent)]
pub struct LocomotionConfig {
    // === Body ===
    /// Mass of the character.
    pub mass: f32,
    /// Force driving horizontal movement.
    pub movement_force: f32,
    /// Speed tier scaling the max velocity.
    pub tier: MovementTier,

    // === Contact tiers (degrees from up) ===
    /// Steepest surface that still counts as ground.
    pub max_ground_angle: f32,
    /// Steepest surface that counts as a steep contact.
    pub max_steep_angle: f32,
    /// Steepest surface that counts as a climb contact.
    pub max_climb_angle: f32,

    // === Acceleration ===
    /// Air acceleration as a fraction of the base acceleration.
    pub air_acceleration_coefficient: f32,
    /// Horizontal velocity kept when movement stops.
    pub fall_off_coefficient: f32,
    /// Desired speed multiplier while walking.
    pub walk_coefficient: f32,

    // === Jump ===
    /// Jump speed as a fraction of the max velocity.
    pub jump_velocity_coefficient: f32,
    /// Extra multiplier for jumps that start in the air.
    pub air_jump_velocity_coefficient: f32,
    /// Upward bias of the wall jump direction.
    pub wall_jump_coefficient: f32,
    /// Jumps allowed after leaving the ground.
    pub max_air_jump: u32,
    /// How long a held jump keeps the upward velocity, in seconds.
    pub jump_time: f32,

    // === Environment ===
    /// Gravity applied in the force-static regime.
    pub gravity: Vec3,

    // === Facing ===
    /// Ground turn rate in degrees per second per unit of speed.
    pub rotate_speed: f32,
    /// Air turn rate in degrees per second.
    pub air_rotate_speed: f32,

    // === Nested ===
    pub probe: ProbeConfig,
    pub step: StepConfig,
    pub sprint: SprintConfig,
    pub capabilities: Capabilities,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            mass: 50.0,
            movement_force: 400.0,
            tier: MovementTier::Normal,

            max_ground_angle: 40.0,
            max_steep_angle: 95.0,
            max_climb_angle: 95.0,

            air_acceleration_coefficient: 1.0,
            fall_off_coefficient: 0.5,
            walk_coefficient: 0.5,

            jump_velocity_coefficient: 1.4,
            air_jump_velocity_coefficient: 1.6,
            wall_jump_coefficient: 2.0,
            max_air_jump: 1,
            jump_time: 0.2,

            gravity: Vec3::new(0.0, -40.0, 0.0),

            rotate_speed: 180.0,
            air_rotate_speed: 720.0,

            probe: ProbeConfig::default(),
            step: StepConfig::default(),
            sprint: SprintConfig::default(),
            capabilities: Capabilities::default(),
        }
    }
}

impl LocomotionConfig {
    /// Full-featured player controller: ground and steep tiers, wall jumps,
    /// step climbing and sprinting.
    pub fn player() -> Self {
        Self::default()
    }

    /// Three contact tiers (ground, steep, climb) with slope hold, no step
    /// climbing and no sprint.
    pub fn classic() -> Self {
        Self {
            max_ground_angle: 10.0,
            max_steep_angle: 60.0,
            max_climb_angle: 90.0,
            air_acceleration_coefficient: 0.5,
            fall_off_coefficient: 0.0,
            jump_velocity_coefficient: 0.5,
            air_jump_velocity_coefficient: 1.0,
            wall_jump_coefficient: 1.0,
            max_air_jump: 2,
            jump_time: 0.5,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            rotate_speed: 360.0,
            air_rotate_speed: 360.0,
            capabilities: Capabilities {
                steep_tier: true,
                climb_tier: true,
                wall_jump: true,
                step_climb: false,
                sprint: false,
                slope_hold: true,
            },
            ..default()
        }
    }

    /// Ground tier only, single air jump and no extras.
    pub fn simple() -> Self {
        Self {
            air_acceleration_coefficient: 0.5,
            capabilities: Capabilities::ground_only(),
            ..default()
        }
    }

    /// Builder: set mass.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Builder: set movement force.
    pub fn with_movement_force(mut self, force: f32) -> Self {
        self.movement_force = force;
        self
    }

    /// Builder: set speed tier.
    pub fn with_tier(mut self, tier: MovementTier) -> Self {
        self.tier = tier;
        self
    }

    /// Builder: set contact tier angles in degrees.
    pub fn with_angles(mut self, ground: f32, steep: f32, climb: f32) -> Self {
        self.max_ground_angle = ground;
        self.max_steep_angle = steep;
        self.max_climb_angle = climb;
        self
    }

    /// Builder: set air jumps allowed before landing.
    pub fn with_max_air_jump(mut self, jumps: u32) -> Self {
        self.max_air_jump = jumps;
        self
    }

    /// Builder: set jump coefficients (ground, air, wall).
    pub fn with_jump_coefficients(mut self, jump: f32, air_jump: f32, wall_jump: f32) -> Self {
        self.jump_velocity_coefficient = jump;
        self.air_jump_velocity_coefficient = air_jump;
        self.wall_jump_coefficient = wall_jump;
        self
    }

    /// Builder: set jump hold duration.
    pub fn with_jump_time(mut self, seconds: f32) -> Self {
        self.jump_time = seconds;
        self
    }

    /// Builder: set gravity.
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Builder: set air acceleration coefficient.
    pub fn with_air_acceleration(mut self, coefficient: f32) -> Self {
        self.air_acceleration_coefficient = coefficient;
        self
    }

    /// Builder: set probe distances.
    pub fn with_probe(mut self, probe: ProbeConfig) -> Self {
        self.probe = probe;
        self
    }

    /// Builder: set step climbing parameters.
    pub fn with_step(mut self, step: StepConfig) -> Self {
        self.step = step;
        self
    }

    /// Builder: set sprint parameters.
    pub fn with_sprint(mut self, sprint: SprintConfig) -> Self {
        self.sprint = sprint;
        self
    }

    /// Builder: set capability flags.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Base acceleration, `force / mass`.
    pub fn base_acceleration(&self) -> f32 {
        self.movement_force / self.mass
    }

    /// Max velocity for the configured tier.
    pub fn max_velocity(&self) -> f32 {
        self.base_acceleration() * self.tier.velocity_scale()
    }

    /// Acceleration while airborne.
    pub fn air_acceleration(&self) -> f32 {
        self.base_acceleration() * self.air_acceleration_coefficient
    }

    /// Vertical speed of a grounded jump.
    pub fn jump_speed(&self) -> f32 {
        self.max_velocity() * self.jump_velocity_coefficient
    }

    /// Check every contract of the config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(ConfigError::NonPositiveMass(self.mass));
        }
        if !(self.movement_force >= 0.0 && self.movement_force.is_finite()) {
            return Err(ConfigError::NegativeMovementForce(self.movement_force));
        }

        for (name, degrees) in [
            ("max_ground_angle", self.max_ground_angle),
            ("max_steep_angle", self.max_steep_angle),
            ("max_climb_angle", self.max_climb_angle),
            ("step.side_angle", self.step.side_angle),
        ] {
            if !(0.0..=180.0).contains(&degrees) {
                return Err(ConfigError::AngleOutOfRange { name, degrees });
            }
        }
        if self.capabilities.steep_tier && self.max_steep_angle < self.max_ground_angle {
            return Err(ConfigError::InvertedThresholds {
                flatter: "max_ground_angle",
                flatter_degrees: self.max_ground_angle,
                steeper: "max_steep_angle",
                steeper_degrees: self.max_steep_angle,
            });
        }
        if self.capabilities.climb_tier {
            let (flatter, flatter_degrees) = if self.capabilities.steep_tier {
                ("max_steep_angle", self.max_steep_angle)
            } else {
                ("max_ground_angle", self.max_ground_angle)
            };
            if self.max_climb_angle < flatter_degrees {
                return Err(ConfigError::InvertedThresholds {
                    flatter,
                    flatter_degrees,
                    steeper: "max_climb_angle",
                    steeper_degrees: self.max_climb_angle,
                });
            }
        }

        for (name, value) in [
            ("jump_time", self.jump_time),
            ("step.height", self.step.height),
            ("sprint.time", self.sprint.time),
            ("probe.snap_distance", self.probe.snap_distance),
            ("probe.ground_distance_range", self.probe.ground_distance_range),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        for (name, value) in [
            ("air_acceleration_coefficient", self.air_acceleration_coefficient),
            ("fall_off_coefficient", self.fall_off_coefficient),
            ("walk_coefficient", self.walk_coefficient),
            ("jump_velocity_coefficient", self.jump_velocity_coefficient),
            ("air_jump_velocity_coefficient", self.air_jump_velocity_coefficient),
            ("wall_jump_coefficient", self.wall_jump_coefficient),
            ("rotate_speed", self.rotate_speed),
            ("air_rotate_speed", self.air_rotate_speed),
            ("step.smooth_rate", self.step.smooth_rate),
            ("sprint.distance", self.sprint.distance),
            ("sprint.coefficient", self.sprint.coefficient),
            ("probe.air_threshold", self.probe.air_threshold),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::Negative { name, value });
            }
        }

        Ok(())
    }

    /// Builder-friendly [`validate`](Self::validate).
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map(|()| self)
    }
}

/// Marks a controller whose config failed validation. The controller is
/// skipped until the config is fixed.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct InvalidConfig(pub ConfigError);
