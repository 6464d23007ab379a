use serde::{Deserialize, Serialize};

/// Whether the character is supported by the ground.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocoMovementState {
    /// No ground contact has been reported yet.
    #[default]
    None,
    Grounded,
    InAir,
}

/// An action that takes over the character's movement.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocoMovementAction {
    #[default]
    None,
    Rolling,
    GettingUp,
}

/// The movement tier of the character, independent of its exact speed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocoGait {
    #[default]
    Walking,
    Running,
    Sprinting,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocoStance {
    #[default]
    Standing,
    Crouching,
}

/// Which direction the character's facing follows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocoRotationMode {
    /// Face the direction of movement.
    Velocity,
    /// Face the control (camera) direction while moving.
    #[default]
    Looking,
    /// Face the control direction at all times, with a limited yaw drift while standing still.
    Aiming,
}

/// The direction of movement relative to the aim direction, used by the directional animation
/// layers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocoMovementDirection {
    #[default]
    Forward,
    Right,
    Left,
    Backward,
}
