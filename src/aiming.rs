use bevy::log::info;
use bevy::prelude::*;

use crate::anim_curves::LocoAnimCurves;
use crate::blend::LocoGroundedValues;
use crate::config::{LocoBlendConfig, LocoRotateInPlaceConfig, LocoTurnInPlaceAsset, LocoTurnInPlaceConfig};
use crate::states::{LocoRotationMode, LocoStance};
use crate::tracker::LocoState;
use crate::util::{f_interp_to, lerp, map_range_clamped, normalize_axis, r_interp_to, Rotator};

/// Aim offset parameters.
///
/// The `x` of the angles is the yaw of the aim relative to the actor, positive to the right. The
/// `y` is the pitch, positive upward.
#[derive(Debug, Default, Clone)]
pub struct LocoAimingValues {
    pub smoothed_aiming_rotation: Rotator,
    pub aiming_angle: Vec2,
    pub smoothed_aiming_angle: Vec2,
    pub aim_sweep_time: f32,
    /// Yaw (positive to the right) the spine should twist by toward the aim.
    pub spine_yaw: f32,
    /// The movement input's yaw relative to the actor, remapped from `[-180, 180]` to `[0, 1]`.
    /// Only updated in [`LocoRotationMode::Velocity`].
    pub input_yaw_offset_time: f32,
    pub left_yaw_time: f32,
    pub right_yaw_time: f32,
    pub forward_yaw_time: f32,
}

/// Delta from `from` to `to`, with the yaw flipped to be positive to the right.
fn aim_delta(to: Rotator, from: Rotator) -> Vec2 {
    let delta = to.delta(from);
    Vec2::new(-delta.yaw, delta.pitch)
}

impl LocoAimingValues {
    pub fn update(&mut self, state: &LocoState, config: &LocoBlendConfig, frame_duration: f32) {
        self.smoothed_aiming_rotation = r_interp_to(
            self.smoothed_aiming_rotation,
            state.aiming_rotation,
            frame_duration,
            config.smoothed_aiming_rotation_interp_speed,
        );

        self.aiming_angle = aim_delta(state.aiming_rotation, state.actor_rotation);
        self.smoothed_aiming_angle = aim_delta(self.smoothed_aiming_rotation, state.actor_rotation);

        if state.rotation_mode != LocoRotationMode::Velocity {
            self.aim_sweep_time = map_range_clamped(self.aiming_angle.y, -90.0, 90.0, 1.0, 0.0);
            self.spine_yaw = self.aiming_angle.x / 4.0;
        } else if state.has_movement_input {
            let input_yaw = Rotator::from_direction(state.movement_input).yaw;
            let delta = -normalize_axis(input_yaw - state.actor_rotation.yaw);
            self.input_yaw_offset_time = f_interp_to(
                self.input_yaw_offset_time,
                map_range_clamped(delta, -180.0, 180.0, 0.0, 1.0),
                frame_duration,
                config.input_yaw_offset_interp_speed,
            );
        }

        let smoothed_yaw = self.smoothed_aiming_angle.x;
        self.left_yaw_time = map_range_clamped(smoothed_yaw.abs(), 0.0, 180.0, 0.5, 0.0);
        self.right_yaw_time = map_range_clamped(smoothed_yaw.abs(), 0.0, 180.0, 0.5, 1.0);
        self.forward_yaw_time = map_range_clamped(smoothed_yaw, -180.0, 180.0, 0.0, 1.0);
    }
}

/// Weights of the additive and override layers, read off the animation curves.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LocoLayerValues {
    pub enable_aim_offset: f32,
    pub base_pose_n: f32,
    pub base_pose_clf: f32,
    pub spine_add: f32,
    pub head_add: f32,
    pub arm_l_add: f32,
    pub arm_r_add: f32,
    pub hand_l: f32,
    pub hand_r: f32,
    pub enable_hand_ik_l: f32,
    pub enable_hand_ik_r: f32,
    /// Local space weight of the left arm.
    pub arm_l_ls: f32,
    /// Mesh space weight of the left arm. Always 1 unless the local space weight is full.
    pub arm_l_ms: f32,
    pub arm_r_ls: f32,
    pub arm_r_ms: f32,
}

impl LocoLayerValues {
    pub fn from_curves(curves: &LocoAnimCurves) -> Self {
        Self {
            enable_aim_offset: lerp(1.0, 0.0, curves.mask_aim_offset),
            base_pose_n: curves.base_pose_n,
            base_pose_clf: curves.base_pose_clf,
            spine_add: curves.layering_spine_add,
            head_add: curves.layering_head_add,
            arm_l_add: curves.layering_arm_l_add,
            arm_r_add: curves.layering_arm_r_add,
            hand_l: curves.layering_hand_l,
            hand_r: curves.layering_hand_r,
            enable_hand_ik_l: lerp(0.0, curves.enable_hand_ik_l, curves.layering_arm_l),
            enable_hand_ik_r: lerp(0.0, curves.enable_hand_ik_r, curves.layering_arm_r),
            arm_l_ls: curves.layering_arm_l_ls,
            arm_l_ms: 1.0 - curves.layering_arm_l_ls.floor(),
            arm_r_ls: curves.layering_arm_r_ls,
            arm_r_ms: 1.0 - curves.layering_arm_r_ls.floor(),
        }
    }
}

/// A request for the animation graph to play a turn-in-place animation.
#[derive(Debug, Clone, PartialEq)]
pub struct LocoTurnInPlaceRequest {
    pub animation: String,
    /// Degrees to turn, positive to the right.
    pub turn_angle: f32,
    /// The yaw the character should face after the turn.
    pub target_yaw: f32,
    pub play_rate: f32,
    /// Multiplier for the animation's `rotation_amount` curve, so that it covers `turn_angle`.
    pub rotation_scale: f32,
}

/// Set the rotate-in-place flags of an aiming character that stands still.
pub fn rotate_in_place_check(
    values: &mut LocoGroundedValues,
    aiming_yaw: f32,
    aim_yaw_rate: f32,
    config: &LocoRotateInPlaceConfig,
) {
    values.rotate_left = aiming_yaw < config.min_threshold;
    values.rotate_right = config.max_threshold < aiming_yaw;
    if values.rotate_left || values.rotate_right {
        values.rotate_rate = map_range_clamped(
            aim_yaw_rate,
            config.aim_yaw_rate_min_range,
            config.aim_yaw_rate_max_range,
            config.min_play_rate,
            config.max_play_rate,
        );
    }
}

fn turn_in_place_asset(
    turn_angle: f32,
    stance: LocoStance,
    config: &LocoTurnInPlaceConfig,
) -> &LocoTurnInPlaceAsset {
    let assets = match stance {
        LocoStance::Standing => &config.standing,
        LocoStance::Crouching => &config.crouching,
    };
    match (config.turn_180_threshold <= turn_angle.abs(), turn_angle < 0.0) {
        (false, true) => &assets.left_90,
        (false, false) => &assets.right_90,
        (true, true) => &assets.left_180,
        (true, false) => &assets.right_180,
    }
}

/// Build a request to turn from `actor_yaw` to `target_yaw`.
pub fn turn_in_place(
    actor_yaw: f32,
    target_yaw: f32,
    stance: LocoStance,
    config: &LocoTurnInPlaceConfig,
) -> LocoTurnInPlaceRequest {
    let turn_angle = -normalize_axis(target_yaw - actor_yaw);
    let asset = turn_in_place_asset(turn_angle, stance, config);
    let rotation_scale = if asset.scale_turn_angle && asset.animated_angle != 0.0 {
        turn_angle / asset.animated_angle * asset.play_rate
    } else {
        asset.play_rate
    };
    LocoTurnInPlaceRequest {
        animation: asset.animation.clone(),
        turn_angle,
        target_yaw,
        play_rate: asset.play_rate,
        rotation_scale,
    }
}

/// Count how long the aim has been far enough to the side, and request a turn when it has been
/// long enough.
///
/// The wider the aim angle, the shorter the delay.
pub fn turn_in_place_check(
    values: &mut LocoGroundedValues,
    state: &LocoState,
    aiming_yaw: f32,
    config: &LocoTurnInPlaceConfig,
    frame_duration: f32,
) -> Option<LocoTurnInPlaceRequest> {
    if aiming_yaw.abs() <= config.turn_check_min_angle
        || config.aim_yaw_rate_limit <= state.aim_yaw_rate
    {
        values.elapsed_delay_time = 0.0;
        return None;
    }
    values.elapsed_delay_time += frame_duration;
    let delay = map_range_clamped(
        aiming_yaw.abs(),
        config.turn_check_min_angle,
        180.0,
        config.min_angle_delay,
        config.max_angle_delay,
    );
    if values.elapsed_delay_time <= delay {
        return None;
    }
    let request = turn_in_place(
        state.actor_rotation.yaw,
        state.aiming_rotation.yaw,
        state.stance,
        config,
    );
    info!(
        "Turning in place by {:.1} degrees with {}",
        request.turn_angle, request.animation
    );
    values.elapsed_delay_time = 0.0;
    values.rotation_scale = request.rotation_scale;
    Some(request)
}
