use bevy::prelude::*;

use crate::config::{LocoMovementModel, LocoMovementSettings, LocoTuning};
use crate::states::{LocoGait, LocoMovementAction, LocoMovementState, LocoRotationMode, LocoStance};
use crate::util::{map_range_clamped, normalize_axis, Rotator};

/// What the game wants the character to do.
///
/// Systems that write this component should run in
/// [`LocoUserControlsSystems`](crate::LocoUserControlsSystems).
#[derive(Component, Debug, Clone)]
pub struct LocoControls {
    pub desired_gait: LocoGait,
    pub desired_stance: LocoStance,
    pub rotation_mode: LocoRotationMode,
    /// The direction the player looks at - usually the camera's rotation.
    pub control_rotation: Rotator,
    /// Movement input in world space. Vectors longer than 1 are clamped to 1.
    pub desired_motion: Vec3,
    /// An action that takes over the character's movement.
    pub movement_action: LocoMovementAction,
    /// Set while an animation drives the character's root, which suspends movement rotation.
    pub has_root_motion: bool,
}

impl Default for LocoControls {
    fn default() -> Self {
        Self {
            desired_gait: LocoGait::Running,
            desired_stance: LocoStance::Standing,
            rotation_mode: LocoRotationMode::Looking,
            control_rotation: Rotator::ZERO,
            desired_motion: Vec3::ZERO,
            movement_action: LocoMovementAction::None,
            has_root_motion: false,
        }
    }
}

/// The movement limits the physics layer should apply to the character.
///
/// These are recalculated every frame from the active [`LocoMovementSettings`] row.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct LocoMovementLimits {
    pub max_walk_speed: f32,
    pub max_acceleration: f32,
    pub braking_deceleration: f32,
    pub ground_friction: f32,
}

/// The per-frame facts about the character's movement.
#[derive(Component, Debug, Default, Clone)]
pub struct LocoState {
    /// Horizontal speed.
    pub speed: f32,
    pub is_moving: bool,
    pub has_movement_input: bool,
    /// How much of the maximum acceleration the input asks for, in `[0, 1]`.
    pub movement_input_amount: f32,
    /// How fast the control yaw changes, in degrees per second. Never negative.
    pub aim_yaw_rate: f32,
    pub velocity: Vec3,
    /// The acceleration requested by the input.
    pub movement_input: Vec3,
    /// The acceleration actually measured from the velocity change.
    pub physical_acceleration: Vec3,

    pub movement_state: LocoMovementState,
    pub previous_movement_state: LocoMovementState,
    pub movement_action: LocoMovementAction,
    pub gait: LocoGait,
    pub allowed_gait: LocoGait,
    pub stance: LocoStance,
    pub rotation_mode: LocoRotationMode,

    /// Speed remapped to 0 (stopped) .. 1 (walk) .. 2 (run) .. 3 (sprint).
    pub mapped_speed: f32,

    pub actor_rotation: Rotator,
    /// The actor rotation at the end of the previous frame.
    pub last_update_rotation: Rotator,
    pub aiming_rotation: Rotator,
    /// The rotation the actor chases while rotating smoothly.
    pub target_rotation: Rotator,
    /// The actor rotation when the character left the ground.
    pub in_air_rotation: Rotator,
    pub last_velocity_rotation: Rotator,
    pub last_movement_input_rotation: Rotator,

    pub(crate) previous_velocity: Vec3,
    pub(crate) previous_aim_yaw: f32,
    pub(crate) initialized: bool,
}

/// Raw kinematic facts for one frame, gathered from the physics layer and the controls.
#[derive(Debug, Clone, Copy)]
pub struct LocoKinematics {
    pub velocity: Vec3,
    pub actor_rotation: Rotator,
    pub control_rotation: Rotator,
    pub desired_motion: Vec3,
    pub max_acceleration: f32,
}

/// Length of `velocity` with the vertical component discarded.
pub fn horizontal_speed(velocity: Vec3) -> f32 {
    Vec2::new(velocity.x, velocity.z).length()
}

/// The gait the character may use, given the controls and whether it can sprint.
pub fn allowed_gait(
    desired_gait: LocoGait,
    stance: LocoStance,
    rotation_mode: LocoRotationMode,
    can_sprint: bool,
) -> LocoGait {
    let capped_at_running = match desired_gait {
        LocoGait::Walking => LocoGait::Walking,
        LocoGait::Running | LocoGait::Sprinting => LocoGait::Running,
    };
    match (stance, rotation_mode) {
        (LocoStance::Standing, LocoRotationMode::Looking | LocoRotationMode::Velocity) => {
            if desired_gait == LocoGait::Sprinting && can_sprint {
                LocoGait::Sprinting
            } else {
                capped_at_running
            }
        }
        (LocoStance::Standing, LocoRotationMode::Aiming) | (LocoStance::Crouching, _) => {
            capped_at_running
        }
    }
}

/// The gait that matches the character's actual speed.
///
/// The thresholds are raised by `hysteresis` above the nominal walk and run speeds, so that a
/// character moving exactly at a nominal speed does not flicker between gaits.
pub fn actual_gait(
    speed: f32,
    allowed_gait: LocoGait,
    settings: &LocoMovementSettings,
    hysteresis: f32,
) -> LocoGait {
    if settings.run_speed + hysteresis <= speed {
        if allowed_gait == LocoGait::Sprinting {
            LocoGait::Sprinting
        } else {
            LocoGait::Running
        }
    } else if settings.walk_speed + hysteresis <= speed {
        LocoGait::Running
    } else {
        LocoGait::Walking
    }
}

/// Remap `speed` so that walk, run and sprint speeds land on 1, 2 and 3.
pub fn mapped_speed(speed: f32, settings: &LocoMovementSettings) -> f32 {
    let walk = settings.walk_speed;
    let run = settings.run_speed;
    let sprint = settings.sprint_speed;
    if run < speed {
        map_range_clamped(speed, run, sprint, 2.0, 3.0)
    } else if walk < speed {
        map_range_clamped(speed, walk, run, 1.0, 2.0)
    } else {
        map_range_clamped(speed, 0.0, walk, 0.0, 1.0)
    }
}

impl LocoState {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether the character is moving in a way that should rotate it toward its movement.
    pub fn is_moving_for_rotation(&self, tuning: &LocoTuning) -> bool {
        (self.is_moving && self.has_movement_input)
            || tuning.rotation_speed_threshold < self.speed
    }

    /// Whether the current input allows sprinting.
    pub fn can_sprint(&self, model: &LocoMovementModel) -> bool {
        if !self.has_movement_input {
            return false;
        }
        match self.rotation_mode {
            LocoRotationMode::Velocity => model.sprint_min_input_amount < self.movement_input_amount,
            LocoRotationMode::Looking => {
                let input_rotation = Rotator::from_direction(self.movement_input);
                let angle = normalize_axis(input_rotation.yaw - self.aiming_rotation.yaw);
                model.sprint_min_input_amount < self.movement_input_amount
                    && angle.abs() < model.sprint_max_input_angle
            }
            LocoRotationMode::Aiming => false,
        }
    }

    /// Update the values that are derived directly from the physics and the controls.
    pub fn update_essential_values(
        &mut self,
        kinematics: &LocoKinematics,
        tuning: &LocoTuning,
        frame_duration: f32,
    ) {
        if !self.initialized {
            self.initialized = true;
            self.actor_rotation = kinematics.actor_rotation;
            self.target_rotation = kinematics.actor_rotation;
            self.last_velocity_rotation = kinematics.actor_rotation;
            self.last_movement_input_rotation = kinematics.actor_rotation;
            self.previous_velocity = kinematics.velocity;
            self.previous_aim_yaw = kinematics.control_rotation.yaw;
        }

        self.last_update_rotation = self.actor_rotation;
        self.actor_rotation = kinematics.actor_rotation;
        self.aiming_rotation = kinematics.control_rotation;

        self.velocity = kinematics.velocity;
        self.physical_acceleration = (self.velocity - self.previous_velocity) / frame_duration;

        self.speed = horizontal_speed(self.velocity);
        self.is_moving = tuning.moving_speed_threshold < self.speed;
        if self.is_moving {
            self.last_velocity_rotation = Rotator::from_direction(self.velocity);
        }

        // `max_acceleration` comes from the limits written at the end of the previous frame, so a
        // gait change reaches the input scale one frame late. The amount is a ratio and is not
        // affected.
        self.movement_input =
            kinematics.desired_motion.clamp_length_max(1.0) * kinematics.max_acceleration;
        self.movement_input_amount = if 0.0 < kinematics.max_acceleration {
            self.movement_input.length() / kinematics.max_acceleration
        } else {
            0.0
        };
        self.has_movement_input = 0.0 < self.movement_input_amount;
        if self.has_movement_input {
            self.last_movement_input_rotation = Rotator::from_direction(self.movement_input);
        }

        self.aim_yaw_rate =
            normalize_axis(self.aiming_rotation.yaw - self.previous_aim_yaw).abs() / frame_duration;
    }

    /// Store the values the next frame compares against.
    pub fn cache_values(&mut self) {
        self.previous_velocity = self.velocity;
        self.previous_aim_yaw = self.aiming_rotation.yaw;
    }

    /// Switch the movement state, returning whether it changed.
    pub fn set_movement_state(&mut self, new_state: LocoMovementState) -> bool {
        if self.movement_state == new_state {
            return false;
        }
        self.previous_movement_state = self.movement_state;
        self.movement_state = new_state;
        if new_state == LocoMovementState::InAir {
            self.in_air_rotation = self.actor_rotation;
            if self.movement_action == LocoMovementAction::None {
                self.stance = LocoStance::Standing;
            }
        }
        true
    }

    /// Follow the desired stance. Stance changes only happen on the ground.
    pub fn set_desired_stance(&mut self, desired_stance: LocoStance) -> bool {
        if self.movement_state != LocoMovementState::Grounded || self.stance == desired_stance {
            return false;
        }
        self.stance = desired_stance;
        true
    }

    /// Resolve the gait and calculate the movement limits for this frame.
    ///
    /// Returns whether the gait changed.
    pub fn update_character_movement(
        &mut self,
        desired_gait: LocoGait,
        model: &LocoMovementModel,
        tuning: &LocoTuning,
        limits: &mut LocoMovementLimits,
    ) -> bool {
        let can_sprint = self.can_sprint(model);
        let settings = model.settings(self.rotation_mode, self.stance);
        self.allowed_gait = allowed_gait(desired_gait, self.stance, self.rotation_mode, can_sprint);
        let new_gait = actual_gait(self.speed, self.allowed_gait, settings, tuning.gait_hysteresis);

        self.mapped_speed = mapped_speed(self.speed, settings);
        let movement = settings.movement_curve.sample(self.mapped_speed);
        *limits = LocoMovementLimits {
            max_walk_speed: settings.speed_for(self.allowed_gait),
            max_acceleration: movement.x,
            braking_deceleration: movement.y,
            ground_friction: movement.z,
        };

        if new_gait == self.gait {
            false
        } else {
            self.gait = new_gait;
            true
        }
    }
}
