use bevy::prelude::*;

use bevy_locomotion_physics_integration_layer::data_for_backends::LocoFeet;

/// Curve values fed back from the game's animation graph.
///
/// The animation graph (which lives outside this crate) owns these values and writes them every
/// frame, before [`LocoPipelineSystems::Logic`](crate::LocoPipelineSystems::Logic). Values that
/// the graph does not drive can be left at their defaults.
///
/// Angles follow the animation authoring convention: positive values turn to the right.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct LocoAnimCurves {
    /// Added (to the right) to the control yaw when the character faces the looking direction.
    pub yaw_offset: f32,
    /// Degrees (to the right) the character turns per 1/30 second while standing still, driven by
    /// turn-in-place animations.
    pub rotation_amount: f32,
    /// 1 while the walk cycle plays, 2 for the run cycle and 3 for the sprint cycle. Blends in
    /// between.
    pub weight_gait: f32,
    /// Weight of the standing base pose.
    pub base_pose_n: f32,
    /// Weight of the crouching base pose.
    pub base_pose_clf: f32,
    pub mask_aim_offset: f32,
    pub mask_land_prediction: f32,
    pub layering_spine_add: f32,
    pub layering_head_add: f32,
    pub layering_arm_l_add: f32,
    pub layering_arm_r_add: f32,
    pub layering_hand_l: f32,
    pub layering_hand_r: f32,
    pub layering_arm_l: f32,
    pub layering_arm_r: f32,
    pub layering_arm_l_ls: f32,
    pub layering_arm_r_ls: f32,
    pub enable_hand_ik_l: f32,
    pub enable_hand_ik_r: f32,
    pub enable_foot_ik: LocoFeet<f32>,
    pub foot_lock: LocoFeet<f32>,
    /// Turn-in-place is only allowed while this is fully weighted.
    pub enable_transition: f32,
}

impl Default for LocoAnimCurves {
    fn default() -> Self {
        Self {
            yaw_offset: 0.0,
            rotation_amount: 0.0,
            weight_gait: 1.0,
            base_pose_n: 1.0,
            base_pose_clf: 0.0,
            mask_aim_offset: 0.0,
            mask_land_prediction: 0.0,
            layering_spine_add: 0.0,
            layering_head_add: 0.0,
            layering_arm_l_add: 0.0,
            layering_arm_r_add: 0.0,
            layering_hand_l: 0.0,
            layering_hand_r: 0.0,
            layering_arm_l: 0.0,
            layering_arm_r: 0.0,
            layering_arm_l_ls: 0.0,
            layering_arm_r_ls: 0.0,
            enable_hand_ik_l: 0.0,
            enable_hand_ik_r: 0.0,
            enable_foot_ik: LocoFeet::default(),
            foot_lock: LocoFeet::default(),
            enable_transition: 0.0,
        }
    }
}

impl LocoAnimCurves {
    /// `weight_gait + bias`, clamped to `[0, 1]`.
    ///
    /// A bias of -1 gives the walk-to-run weight, and a bias of -2 gives the run-to-sprint weight.
    pub fn gait_weight(&self, bias: f32) -> f32 {
        (self.weight_gait + bias).clamp(0.0, 1.0)
    }
}
