//! Movement intent component.
//!
//! The intent is the only surface input code writes to. It holds the desired
//! move direction plus one-shot requests (jump start, stop, sprint and walk
//! changes) that the locomotion step consumes on the next fixed tick.
//! Between ticks the last write wins; nothing is queued.

use bevy::prelude::*;

/// Desired movement for a character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_locomotion_controller::prelude::*;
///
/// let mut intent = LocomotionIntent::new();
/// intent.set_desired_move(Vec3::Z);
/// assert!(intent.is_moving());
///
/// intent.request_jump_start();
/// intent.set_jump_held(true);
/// assert!(intent.has_jump_request());
///
/// intent.clear_desired_move();
/// assert_eq!(intent.direction(), Vec3::ZERO);
/// ```
#[derive(Component, Reflect, Debug, Clone, Default, PartialEq)]
#[reflect(Component)]
pub struct LocomotionIntent {
    /// Horizontal move direction in world space, length at most 1.
    direction: Vec3,
    /// A move is in progress (stays set until a stop is consumed).
    moving: bool,
    stop_requested: bool,
    jump_requested: bool,
    jump_held: bool,
    jump_hold_started: bool,
    sprint_request: Option<bool>,
    walk_request: Option<bool>,
}

impl LocomotionIntent {
    /// Create an idle intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move along a world-space direction.
    ///
    /// The vertical component is dropped and the length clamped to 1, so
    /// analog input below full deflection asks for proportionally less speed.
    pub fn set_desired_move(&mut self, direction: Vec3) {
        self.direction = Vec3::new(direction.x, 0.0, direction.z).clamp_length_max(1.0);
        self.moving = true;
        self.stop_requested = false;
    }

    /// Move along a 2D stick input relative to a camera-like basis.
    ///
    /// `input.y` maps to the basis' flattened forward, `input.x` to its
    /// flattened right.
    pub fn set_desired_move_relative(&mut self, input: Vec2, basis: &Transform) {
        let flatten = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
        let forward = flatten(basis.forward().as_vec3());
        let right = flatten(basis.right().as_vec3());
        self.set_desired_move(forward * input.y + right * input.x);
    }

    /// Stop moving. Consumed on the next tick, which bleeds off horizontal speed.
    pub fn clear_desired_move(&mut self) {
        self.direction = Vec3::ZERO;
        self.stop_requested = true;
    }

    /// Ask for a jump on the next tick. Repeated calls before the tick merge.
    pub fn request_jump_start(&mut self) {
        self.jump_requested = true;
    }

    /// Hold or release the jump input. Pressing restarts the hold timer.
    ///
    /// Holding only extends a jump started with
    /// [`request_jump_start`](Self::request_jump_start).
    pub fn set_jump_held(&mut self, held: bool) {
        if held && !self.jump_held {
            self.jump_hold_started = true;
        }
        self.jump_held = held;
    }

    /// Start (`true`) a sprint dash, or release (`false`) the sprint multiplier.
    pub fn set_sprint_active(&mut self, active: bool) {
        self.sprint_request = Some(active);
    }

    /// Switch walking on or off.
    pub fn set_walk_toggled(&mut self, walking: bool) {
        self.walk_request = Some(walking);
    }

    /// Current move direction.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Whether a move is in progress.
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Whether the jump input is held.
    pub fn is_jump_held(&self) -> bool {
        self.jump_held
    }

    /// Whether a jump start is waiting for the next tick.
    pub fn has_jump_request(&self) -> bool {
        self.jump_requested
    }

    /// Consume a pending stop. Ends the move.
    pub(crate) fn take_stop(&mut self) -> bool {
        let stop = self.moving && self.stop_requested;
        if stop {
            self.moving = false;
            self.stop_requested = false;
        }
        stop
    }

    pub(crate) fn take_jump_request(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }

    pub(crate) fn take_jump_hold_start(&mut self) -> bool {
        std::mem::take(&mut self.jump_hold_started)
    }

    pub(crate) fn take_sprint_request(&mut self) -> Option<bool> {
        self.sprint_request.take()
    }

    pub(crate) fn take_walk_request(&mut self) -> Option<bool> {
        self.walk_request.take()
    }
}
