//! Blend parameters for the grounded locomotion cycles.
//!
//! Everything here works in the animation convention: angles and the `right` channels are positive
//! to the right of the character.

use bevy::prelude::*;

use crate::anim_curves::LocoAnimCurves;
use crate::config::{LocoBlendConfig, LocoQuadrantBuffering, LocoQuadrantConfig};
use crate::states::{LocoGait, LocoMovementDirection};
use crate::tracker::{LocoMovementLimits, LocoState};
use crate::util::{f_interp_to, lerp, normalize_axis, Rotator};

/// Weights of the four directional cycles.
///
/// Forward and backward are never both nonzero, and neither are left and right.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LocoVelocityBlend {
    pub forward: f32,
    pub backward: f32,
    pub left: f32,
    pub right: f32,
}

impl LocoVelocityBlend {
    pub fn interp_to(self, target: Self, frame_duration: f32, speed: f32) -> Self {
        Self {
            forward: f_interp_to(self.forward, target.forward, frame_duration, speed),
            backward: f_interp_to(self.backward, target.backward, frame_duration, speed),
            left: f_interp_to(self.left, target.left, frame_duration, speed),
            right: f_interp_to(self.right, target.right, frame_duration, speed),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LocoLeanAmount {
    /// Positive to the right.
    pub lr: f32,
    /// Positive forward.
    pub fb: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LocoYawOffsets {
    pub forward: f32,
    pub backward: f32,
    pub left: f32,
    pub right: f32,
}

/// Blend values of the grounded animation state.
#[derive(Debug, Clone)]
pub struct LocoGroundedValues {
    pub should_move: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub rotate_rate: f32,
    pub velocity_blend: LocoVelocityBlend,
    pub diagonal_scale_amount: f32,
    /// The measured acceleration relative to the movement limits, in the actor's local axes.
    pub relative_acceleration_amount: Vec3,
    pub lean_amount: LocoLeanAmount,
    pub walk_run_blend: f32,
    pub stride_blend: f32,
    pub standing_play_rate: f32,
    pub crouching_play_rate: f32,
    pub movement_direction: LocoMovementDirection,
    pub yaw_offsets: LocoYawOffsets,
    /// How long the character has been standing with the aim far enough to turn in place.
    pub elapsed_delay_time: f32,
    /// The rotation scale of the last turn-in-place request.
    pub rotation_scale: f32,
}

impl Default for LocoGroundedValues {
    fn default() -> Self {
        Self {
            should_move: false,
            rotate_left: false,
            rotate_right: false,
            rotate_rate: 1.0,
            velocity_blend: Default::default(),
            diagonal_scale_amount: 0.0,
            relative_acceleration_amount: Vec3::ZERO,
            lean_amount: Default::default(),
            walk_run_blend: 0.0,
            stride_blend: 0.0,
            standing_play_rate: 1.0,
            crouching_play_rate: 1.0,
            movement_direction: LocoMovementDirection::Forward,
            yaw_offsets: Default::default(),
            elapsed_delay_time: 0.0,
            rotation_scale: 1.0,
        }
    }
}

fn safe_div(numerator: f32, denominator: f32) -> f32 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// The directional weights the blend should reach for the current velocity.
///
/// The actor-space direction is divided by the sum of the absolute values of its axes, so moving
/// diagonally splits the weight between two channels instead of fully weighting both.
pub fn velocity_blend_target(
    velocity: Vec3,
    actor_rotation: Rotator,
    threshold: f32,
) -> LocoVelocityBlend {
    if velocity.length() < threshold {
        return LocoVelocityBlend::default();
    }
    let local = actor_rotation.unrotate_vector(velocity.normalize_or_zero());
    let sum = local.x.abs() + local.y.abs() + local.z.abs();
    if sum <= 0.0 {
        return LocoVelocityBlend::default();
    }
    let forward = -local.z / sum;
    let right = local.x / sum;
    LocoVelocityBlend {
        forward: forward.clamp(0.0, 1.0),
        backward: forward.clamp(-1.0, 0.0).abs(),
        left: right.clamp(-1.0, 0.0).abs(),
        right: right.clamp(0.0, 1.0),
    }
}

/// The measured acceleration divided by the acceleration (when speeding up) or braking (when
/// slowing down) limit, in the actor's local axes.
pub fn relative_acceleration_amount(
    physical_acceleration: Vec3,
    velocity: Vec3,
    actor_rotation: Rotator,
    limits: &LocoMovementLimits,
) -> Vec3 {
    let limit = if 0.0 < physical_acceleration.dot(velocity) {
        limits.max_acceleration
    } else {
        limits.braking_deceleration
    };
    if limit <= 0.0 {
        return Vec3::ZERO;
    }
    actor_rotation.unrotate_vector(physical_acceleration.clamp_length_max(limit) / limit)
}

pub fn stride_blend(speed: f32, curves: &LocoAnimCurves, config: &LocoBlendConfig) -> f32 {
    let walk = config.stride_walk_curve.sample(speed);
    let run = config.stride_run_curve.sample(speed);
    let crouch = config.stride_crouch_curve.sample(speed);
    let standing = lerp(walk, run, curves.gait_weight(-1.0));
    lerp(standing, crouch, curves.base_pose_clf)
}

/// The play rate of the standing cycles, in `[0, 3]`.
pub fn standing_play_rate(
    speed: f32,
    stride_blend: f32,
    mesh_scale: f32,
    curves: &LocoAnimCurves,
    config: &LocoBlendConfig,
) -> f32 {
    let walk_run = lerp(
        speed / config.animated_walk_speed,
        speed / config.animated_run_speed,
        curves.gait_weight(-1.0),
    );
    let sprint = lerp(
        walk_run,
        speed / config.animated_sprint_speed,
        curves.gait_weight(-2.0),
    );
    safe_div(sprint, stride_blend * mesh_scale).clamp(0.0, 3.0)
}

/// The play rate of the crouching cycles, in `[0, 2]`.
pub fn crouching_play_rate(
    speed: f32,
    stride_blend: f32,
    mesh_scale: f32,
    config: &LocoBlendConfig,
) -> f32 {
    safe_div(
        speed / config.animated_crouch_speed,
        stride_blend * mesh_scale,
    )
    .clamp(0.0, 2.0)
}

fn angle_in_range(angle: f32, min: f32, max: f32, buffer: f32, increase_buffer: bool) -> bool {
    if increase_buffer {
        min - buffer <= angle && angle <= max + buffer
    } else {
        min + buffer <= angle && angle <= max - buffer
    }
}

/// Classify `angle` (the velocity direction relative to the aim, positive to the right) into a
/// movement quadrant.
pub fn calculate_quadrant(
    current: LocoMovementDirection,
    config: &LocoQuadrantConfig,
    angle: f32,
) -> LocoMovementDirection {
    use LocoMovementDirection::*;
    let (widen_forward, widen_sides) = match config.buffering {
        LocoQuadrantBuffering::Legacy => (true, true),
        LocoQuadrantBuffering::Hysteresis => (
            matches!(current, Forward | Backward),
            matches!(current, Right | Left),
        ),
    };
    if angle_in_range(
        angle,
        config.forward_left,
        config.forward_right,
        config.buffer,
        widen_forward,
    ) {
        Forward
    } else if angle_in_range(
        angle,
        config.forward_right,
        config.backward_right,
        config.buffer,
        widen_sides,
    ) {
        Right
    } else if angle_in_range(
        angle,
        config.backward_left,
        config.forward_left,
        config.buffer,
        widen_sides,
    ) {
        Left
    } else {
        Backward
    }
}

/// The yaw of `velocity` relative to the aim, positive to the right.
pub fn velocity_aim_angle(velocity: Vec3, aiming_rotation: Rotator) -> f32 {
    let velocity_yaw = Rotator::from_direction(velocity).yaw;
    -normalize_axis(velocity_yaw - aiming_rotation.yaw)
}

pub fn movement_direction(
    current: LocoMovementDirection,
    gait: LocoGait,
    angle: f32,
    config: &LocoQuadrantConfig,
) -> LocoMovementDirection {
    if gait == LocoGait::Sprinting {
        LocoMovementDirection::Forward
    } else {
        calculate_quadrant(current, config, angle)
    }
}

pub fn yaw_offsets(angle: f32, config: &LocoBlendConfig) -> LocoYawOffsets {
    let fb = config.yaw_offset_fb_curve.sample(angle);
    let lr = config.yaw_offset_lr_curve.sample(angle);
    LocoYawOffsets {
        forward: fb.x,
        backward: fb.y,
        left: lr.x,
        right: lr.y,
    }
}

impl LocoGroundedValues {
    /// Update the directional and speed dependent blend values of a moving character.
    #[allow(clippy::too_many_arguments)]
    pub fn update_movement_values(
        &mut self,
        state: &LocoState,
        limits: &LocoMovementLimits,
        curves: &LocoAnimCurves,
        config: &LocoBlendConfig,
        velocity_direction_threshold: f32,
        mesh_scale: f32,
        frame_duration: f32,
    ) {
        let target =
            velocity_blend_target(state.velocity, state.actor_rotation, velocity_direction_threshold);
        self.velocity_blend = self.velocity_blend.interp_to(
            target,
            frame_duration,
            config.velocity_blend_interp_speed,
        );

        self.diagonal_scale_amount = config
            .diagonal_scale_curve
            .sample((self.velocity_blend.forward + self.velocity_blend.backward).abs());

        self.relative_acceleration_amount = relative_acceleration_amount(
            state.physical_acceleration,
            state.velocity,
            state.actor_rotation,
            limits,
        );
        self.lean_amount = LocoLeanAmount {
            lr: f_interp_to(
                self.lean_amount.lr,
                self.relative_acceleration_amount.x,
                frame_duration,
                config.grounded_lean_interp_speed,
            ),
            fb: f_interp_to(
                self.lean_amount.fb,
                -self.relative_acceleration_amount.z,
                frame_duration,
                config.grounded_lean_interp_speed,
            ),
        };

        self.walk_run_blend = if state.gait == LocoGait::Walking {
            0.0
        } else {
            1.0
        };
        self.stride_blend = stride_blend(state.speed, curves, config);
        self.standing_play_rate =
            standing_play_rate(state.speed, self.stride_blend, mesh_scale, curves, config);
        self.crouching_play_rate =
            crouching_play_rate(state.speed, self.stride_blend, mesh_scale, config);
    }

    /// Update the movement direction and the yaw offsets of a moving character.
    pub fn update_rotation_values(&mut self, state: &LocoState, config: &LocoBlendConfig) {
        let angle = velocity_aim_angle(state.velocity, state.aiming_rotation);
        self.movement_direction =
            movement_direction(self.movement_direction, state.gait, angle, &config.quadrant);
        self.yaw_offsets = yaw_offsets(angle, config);
    }
}
