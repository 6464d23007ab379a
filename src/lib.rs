//! # bevy-locomotion
//!
//! Third-person character locomotion for Bevy: movement state and gait tracking, character
//! rotation, animation blend parameters, foot IK and a lagged third-person camera rig. The
//! animation graph itself is not part of this crate; this crate feeds it typed parameters through
//! [`LocoAnimOutput`] and reads its curves back through [`LocoAnimCurves`].
//!
//! ## Usage
//!
//! 1. Add [`LocoPlugin`] and the plugin of a physics backend (e.g. `LocoRapier3dPlugin` from
//!    the `bevy-locomotion-rapier3d` crate) to the app. Both must use the same schedule.
//! 2. Load a [`LocoConfig`] (or build one with [`LocoConfig::default`] and
//!    [`LocoConfig::scaled`]) and spawn the character with a [`LocoCharacter`] pointing at it,
//!    together with a rigid body and a collider.
//! 3. Add a [`LocoSkeleton`] to the character once its bones are spawned. Without it there is no
//!    foot IK and cameras cannot follow the character.
//! 4. Write [`LocoControls`] every frame in a system placed in [`LocoUserControlsSystems`], and
//!    use [`LocoMovementLimits`] to move the rigid body.
//! 5. Optionally spawn a camera with [`LocoCamera`].
//!
//! Values are in centimeters by default, matching the authored data. Use
//! [`LocoConfig::scaled`] with `0.01` for a game that works in meters.
mod aiming;
mod anim_curves;
mod animation;
mod blend;
mod camera;
pub mod config;
mod controller;
pub mod curves;
mod foot_ik;
mod landing;
mod rotation;
mod states;
mod tracker;
pub mod util;

pub mod prelude {
    pub use crate::anim_curves::LocoAnimCurves;
    pub use crate::animation::LocoAnimOutput;
    pub use crate::camera::LocoCamera;
    pub use crate::config::LocoConfig;
    pub use crate::controller::{LocoCharacter, LocoPlugin, LocoSkeleton};
    pub use crate::states::{LocoGait, LocoMovementAction, LocoRotationMode, LocoStance};
    pub use crate::tracker::{LocoControls, LocoMovementLimits, LocoState};
    pub use crate::util::Rotator;
    pub use crate::LocoUserControlsSystems;
    pub use bevy_locomotion_physics_integration_layer::data_for_backends::LocoFeet;
    pub use bevy_locomotion_physics_integration_layer::data_for_backends::LocoToggle;
    pub use bevy_locomotion_physics_integration_layer::LocoPipelineSystems;
}

pub use aiming::{
    rotate_in_place_check, turn_in_place, turn_in_place_check, LocoAimingValues,
    LocoLayerValues, LocoTurnInPlaceRequest,
};
pub use anim_curves::LocoAnimCurves;
pub use animation::{LocoAnimFrame, LocoAnimOutput};
pub use blend::{
    calculate_quadrant, crouching_play_rate, movement_direction, relative_acceleration_amount,
    standing_play_rate, stride_blend, velocity_aim_angle, velocity_blend_target, yaw_offsets,
    LocoGroundedValues, LocoLeanAmount, LocoVelocityBlend, LocoYawOffsets,
};
pub use camera::{
    axis_independent_lag, blend_camera_settings, occlusion_corrected, pivot_target, LocoCamera,
    LocoCameraRig,
};
pub use config::{LocoConfig, LocoConfigError, LocoConfigLoadError, LocoConfigLoader};
pub use controller::{LocoCharacter, LocoPlugin, LocoSkeleton};
pub use foot_ik::{next_lock_alpha, rotation_from_normal, LocoFootIk, LocoFootLock, LocoFootOffset};
pub use landing::{evaluate_land_prediction, land_prediction_request, LocoInAirValues};
pub use rotation::{
    apply_rotation_policy, grounded_rotation_rate, limit_rotation, rotation_policy,
    smooth_character_rotation, LocoRotationError, LocoRotationLimit, RotationPolicy,
};
pub use states::{
    LocoGait, LocoMovementAction, LocoMovementDirection, LocoMovementState, LocoRotationMode,
    LocoStance,
};
pub use tracker::{
    actual_gait, allowed_gait, horizontal_speed, mapped_speed, LocoControls, LocoKinematics,
    LocoMovementLimits, LocoState,
};

pub use bevy_locomotion_physics_integration_layer::data_for_backends::*;
pub use bevy_locomotion_physics_integration_layer::{LocoPipelineSystems, LocoSystems};

use bevy::prelude::*;

/// The user controls should be applied in this system set.
///
/// It runs after the physics backend has updated the sensors and before the locomotion logic, so
/// [`LocoControls`] written here are used in the same frame.
#[derive(SystemSet, Clone, PartialEq, Eq, Debug, Hash)]
pub struct LocoUserControlsSystems;
