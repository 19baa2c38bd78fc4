//! Motion state and state marker components.
//!
//! [`MotionState`] persists across fixed steps and is owned by the locomotion
//! step. Other code reads it through its accessors. The marker components
//! mirror the resolved state for consumers that prefer query filters.

use bevy::prelude::*;

use crate::contact::UP;
use crate::jump::JumpState;
use crate::sprint::SprintState;

/// Persistent locomotion state of a character.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct MotionState {
    pub(crate) velocity: Vec3,
    pub(crate) desired_velocity: Vec3,

    // === Resolved contact state ===
    pub(crate) on_ground_contact: bool,
    pub(crate) on_snapped_ground: bool,
    pub(crate) on_steep: bool,
    pub(crate) on_climb: bool,
    pub(crate) on_air: bool,
    pub(crate) contact_normal: Vec3,
    pub(crate) wall_normal: Option<Vec3>,
    pub(crate) friction: f32,
    pub(crate) ground_distance: f32,

    // === Step counters ===
    pub(crate) steps_since_grounded: u32,
    pub(crate) steps_since_jump: u32,
    pub(crate) grounded_streak: u32,

    // === Input bookkeeping ===
    pub(crate) last_input: Vec3,
    pub(crate) walking: bool,
    pub(crate) external_force: bool,
    pub(crate) pending_impulse: Vec3,

    pub(crate) jump: JumpState,
    pub(crate) sprint: SprintState,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            desired_velocity: Vec3::ZERO,
            on_ground_contact: false,
            on_snapped_ground: false,
            on_steep: false,
            on_climb: false,
            on_air: false,
            contact_normal: UP,
            wall_normal: None,
            friction: 1.0,
            ground_distance: 0.0,
            steps_since_grounded: 0,
            steps_since_jump: 0,
            grounded_streak: 0,
            last_input: Vec3::ZERO,
            walking: false,
            external_force: false,
            pending_impulse: Vec3::ZERO,
            jump: JumpState::default(),
            sprint: SprintState::default(),
        }
    }
}

impl MotionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supported by ground this step, through a contact or a snap.
    pub fn is_grounded(&self) -> bool {
        self.on_ground_contact || self.on_snapped_ground
    }

    /// Not supported by ground this step.
    pub fn is_airborne(&self) -> bool {
        !self.is_grounded()
    }

    /// Far enough above the ground to count as in the air.
    ///
    /// Unlike [`is_airborne`](Self::is_airborne) this ignores short hops and
    /// single-step contact losses.
    pub fn is_in_air(&self) -> bool {
        self.on_air
    }

    pub fn is_on_steep(&self) -> bool {
        self.on_steep
    }

    pub fn is_on_climb(&self) -> bool {
        self.on_climb
    }

    /// Grounded only thanks to the snap probe.
    pub fn is_snapped(&self) -> bool {
        self.on_snapped_ground && !self.on_ground_contact
    }

    /// Velocity written to the body on the last step.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn desired_velocity(&self) -> Vec3 {
        self.desired_velocity
    }

    /// Resolved ground normal of the last step (up when unsupported).
    pub fn contact_normal(&self) -> Vec3 {
        self.contact_normal
    }

    /// Normal of the steep or climb surface touched on the last step.
    pub fn wall_normal(&self) -> Option<Vec3> {
        self.wall_normal
    }

    /// Surface friction in effect on the last step.
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Feet-to-ground distance measured after the last step.
    pub fn ground_distance(&self) -> f32 {
        self.ground_distance
    }

    pub fn steps_since_grounded(&self) -> u32 {
        self.steps_since_grounded
    }

    pub fn steps_since_jump(&self) -> u32 {
        self.steps_since_jump
    }

    pub fn jump_phase(&self) -> u32 {
        self.jump.phase()
    }

    pub fn jump(&self) -> &JumpState {
        &self.jump
    }

    pub fn sprint(&self) -> &SprintState {
        &self.sprint
    }

    pub fn is_sprinting(&self) -> bool {
        self.sprint.is_dashing()
    }

    pub fn is_walking(&self) -> bool {
        self.walking
    }

    /// Whether an external shove is still bleeding off.
    pub fn has_external_force(&self) -> bool {
        self.external_force
    }

    /// Shove the character. The impulse is added to the body velocity on the
    /// next step and then decays by ground friction instead of stopping dead.
    pub fn push(&mut self, impulse: Vec3) {
        self.pending_impulse += impulse;
        self.external_force = true;
    }
}

/// Marker component indicating the character is supported by ground.
///
/// Mutually exclusive with [`Airborne`].
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_locomotion_controller::prelude::*;
///
/// fn count_grounded(q: Query<(), With<Grounded>>) -> usize {
///     q.iter().count()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character has no ground support.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component for touching a steep surface, with its normal.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct OnSteep {
    pub normal: Vec3,
}

/// Marker component for touching a climbable surface.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct OnClimb;
