//! Per-step contact accumulation.
//!
//! Every physical contact point reported for a character during a step is
//! classified by the angle of its normal against world up and summed into
//! one of three buckets: ground, steep or climb. The buckets are read once by
//! the locomotion step and cleared right after.
//!
//! Multiple contacts in one bucket are combined by vector sum. The sum is
//! only renormalized when more than one contact landed in the bucket, so a
//! single contact keeps its exact normal.

use bevy::prelude::*;

use crate::config::LocomotionConfig;

/// World up. Contact tiers, probes and gravity all measure against it.
pub const UP: Vec3 = Vec3::Y;

/// One contact point as reported by the physics layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSample {
    /// Contact normal in world space, pointing away from the touched surface.
    pub normal: Vec3,
    /// Friction of the touched surface, if it carries one.
    pub friction: Option<f32>,
}

impl ContactSample {
    pub fn new(normal: Vec3) -> Self {
        Self {
            normal,
            friction: None,
        }
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = Some(friction);
        self
    }
}

/// Friction coefficient of a surface the character can touch.
///
/// Backends attach it to contact samples from the touched entity. Surfaces
/// without it count as 1.0.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct SurfaceFriction(pub f32);

impl Default for SurfaceFriction {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Bucket a contact was sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Ground,
    Steep,
    Climb,
    /// Overhangs and anything past the last modeled tier.
    Ignored,
}

/// Minimum `normal · up` for each tier.
///
/// A tier that is not modeled is `None` and never receives contacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactThresholds {
    pub min_ground_dot: f32,
    pub min_steep_dot: Option<f32>,
    pub min_climb_dot: Option<f32>,
}

impl ContactThresholds {
    /// Convert the config's tier angles (degrees) into dot thresholds.
    pub fn from_config(config: &LocomotionConfig) -> Self {
        let dot = |degrees: f32| degrees.to_radians().cos();
        Self {
            min_ground_dot: dot(config.max_ground_angle),
            min_steep_dot: config
                .capabilities
                .steep_tier
                .then(|| dot(config.max_steep_angle)),
            min_climb_dot: config
                .capabilities
                .climb_tier
                .then(|| dot(config.max_climb_angle)),
        }
    }

    /// Tier for a contact whose normal has the given up component.
    pub fn kind(&self, up_dot: f32) -> ContactKind {
        if up_dot >= self.min_ground_dot {
            ContactKind::Ground
        } else if self.min_steep_dot.is_some_and(|min| up_dot >= min) {
            ContactKind::Steep
        } else if self.min_climb_dot.is_some_and(|min| up_dot >= min) {
            ContactKind::Climb
        } else {
            ContactKind::Ignored
        }
    }
}

/// Running sum of one contact tier.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalSum {
    pub sum: Vec3,
    pub count: u32,
}

impl NormalSum {
    fn add(&mut self, normal: Vec3) {
        self.sum += normal;
        self.count += 1;
    }

    /// Resolved normal: the sum, renormalized when `count > 1`.
    pub fn resolve(&self) -> Option<Vec3> {
        match self.count {
            0 => None,
            1 => Some(self.sum),
            _ => Some(self.sum.normalize_or(UP)),
        }
    }
}

/// Contacts gathered for a character during the current step.
///
/// Written by the backend's contact collection and by the ground prober,
/// consumed by the locomotion step and cleared at the end of it.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct ContactState {
    pub ground: NormalSum,
    pub steep: NormalSum,
    pub climb: NormalSum,
    /// Lowest surface friction among this step's contacts.
    friction: Option<f32>,
}

impl ContactState {
    /// Sort a contact into its tier and record its friction.
    pub fn classify(&mut self, sample: ContactSample, thresholds: &ContactThresholds) -> ContactKind {
        let kind = thresholds.kind(sample.normal.dot(UP));
        match kind {
            ContactKind::Ground => self.ground.add(sample.normal),
            ContactKind::Steep => self.steep.add(sample.normal),
            ContactKind::Climb => self.climb.add(sample.normal),
            ContactKind::Ignored => {}
        }
        if let Some(friction) = sample.friction {
            self.friction = Some(self.friction.map_or(friction, |f| f.min(friction)));
        }
        kind
    }

    /// Record a ground normal found by a probe rather than a contact.
    pub fn add_ground(&mut self, normal: Vec3) {
        self.ground.add(normal);
    }

    pub fn on_ground(&self) -> bool {
        self.ground.count > 0
    }

    pub fn on_steep(&self) -> bool {
        self.steep.count > 0
    }

    pub fn on_climb(&self) -> bool {
        self.climb.count > 0
    }

    /// Surface friction in effect for this step (1.0 without contacts).
    pub fn friction(&self) -> f32 {
        self.friction.unwrap_or(1.0)
    }

    /// Reset for the next step.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
