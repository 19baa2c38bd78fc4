//! # `msg_locomotion_controller`
//!
//! A kinematic 3D character locomotion controller with physics backend abstraction.
//!
//! This crate provides a responsive, tuneable character controller that:
//! - Sorts contacts into ground, steep and climb surfaces by angle
//! - Snaps to ground over small bumps and drops instead of launching off them
//! - Climbs steps with short forward raycasts
//! - Converges velocity toward the desired move with a per-step acceleration budget
//! - Runs a jump state machine with air jumps, wall jumps and variable jump height
//! - Supports a short sprint dash and a walk toggle
//! - Abstracts physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! Each fixed step runs in three phases ([`LocomotionSet`]):
//! 1. **Sensors**: the backend reports this step's contacts into [`ContactState`](contact::ContactState)
//! 2. **Motion**: the locomotion step turns intent, contacts and the body's
//!    velocity into a new velocity, a step lift and a facing
//! 3. **Sync**: state marker components follow the motion state
//!
//! The physics engine still resolves collisions; the controller only decides
//! the velocity it hands back.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_locomotion_controller::prelude::*;
//!
//! // The config pulls in the motion state, contact state and intent.
//! let config = LocomotionConfig::player();
//! let mut intent = LocomotionIntent::default();
//! intent.set_desired_move(Vec3::NEG_Z);
//!
//! // These can be spawned together with physics components
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod contact;
pub mod error;
pub mod intent;
pub mod jump;
pub mod locomotion;
pub mod probe;
pub mod solver;
pub mod sprint;
pub mod state;
pub mod step;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::collision::CollisionData;
    pub use crate::config::{
        Capabilities, InvalidConfig, LocomotionConfig, MovementTier, ProbeConfig, SprintConfig,
        StepConfig,
    };
    pub use crate::contact::{ContactSample, ContactState, ContactThresholds, SurfaceFriction, UP};
    pub use crate::error::ConfigError;
    pub use crate::intent::LocomotionIntent;
    pub use crate::state::{Airborne, Grounded, MotionState, OnClimb, OnSteep};
    pub use crate::{LocomotionControllerPlugin, LocomotionSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// Phases of one controller step inside [`FixedUpdate`].
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Contact gathering and config validation.
    Sensors,
    /// The locomotion step itself.
    Motion,
    /// Marker components and other read-only consumers of the step.
    Sync,
}

/// Main plugin for the locomotion controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (raycasting, velocity access, contacts).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_locomotion_controller::prelude::*;
///
/// App::new()
///     .add_plugins((MinimalPlugins, TransformPlugin))
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(LocomotionControllerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct LocomotionControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for LocomotionControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for LocomotionControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<config::MovementTier>();
        app.register_type::<config::Capabilities>();
        app.register_type::<config::StepConfig>();
        app.register_type::<config::SprintConfig>();
        app.register_type::<config::ProbeConfig>();
        app.register_type::<contact::ContactState>();
        app.register_type::<contact::SurfaceFriction>();
        app.register_type::<intent::LocomotionIntent>();
        app.register_type::<state::MotionState>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::OnSteep>();
        app.register_type::<state::OnClimb>();

        app.configure_sets(
            FixedUpdate,
            (LocomotionSet::Sensors, LocomotionSet::Motion, LocomotionSet::Sync).chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            systems::validate_configs.in_set(LocomotionSet::Sensors),
        );
        app.add_systems(
            FixedUpdate,
            systems::run_locomotion::<B>.in_set(LocomotionSet::Motion),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(LocomotionSet::Sync),
        );
    }
}
