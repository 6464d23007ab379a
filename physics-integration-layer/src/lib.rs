use bevy::prelude::*;

pub mod data_for_backends;

/// Umbrella system set for [`LocoPipelineSystems`].
///
/// The physics backends' plugins are responsible for preventing this entire system set from
/// running when the physics backend itself is paused.
#[derive(SystemSet, Clone, PartialEq, Eq, Debug, Hash)]
pub struct LocoSystems;

/// The various stages of the locomotion pipeline.
#[derive(SystemSet, Clone, PartialEq, Eq, Debug, Hash)]
pub enum LocoPipelineSystems {
    /// Data is read from the physics backend, and the casts requested in the previous frame are
    /// performed.
    Sensors,
    /// Locomotion state, character rotation, animation parameters and foot IK are computed.
    Logic,
    /// The camera rig computes where the camera wants to be and requests an occlusion cast.
    CameraRig,
    /// The physics backend performs the camera occlusion cast.
    CameraProbe,
    /// The camera rig applies the occlusion correction and moves the camera.
    CameraApply,
}
