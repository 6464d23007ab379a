use bevy::prelude::*;

use bevy_locomotion_physics_integration_layer::data_for_backends::LocoLandingProbe;

use crate::aiming::{
    rotate_in_place_check, turn_in_place_check, LocoAimingValues, LocoLayerValues,
    LocoTurnInPlaceRequest,
};
use crate::anim_curves::LocoAnimCurves;
use crate::blend::LocoGroundedValues;
use crate::config::LocoConfig;
use crate::landing::LocoInAirValues;
use crate::states::{LocoMovementState, LocoRotationMode};
use crate::tracker::{LocoMovementLimits, LocoState};
use crate::util::{Edge, EdgeDetector};

/// Parameters for the game's animation graph.
///
/// Updated during [`LocoPipelineSystems::Logic`](crate::LocoPipelineSystems::Logic), after the
/// character's [`LocoState`].
#[derive(Component, Debug, Default, Clone)]
pub struct LocoAnimOutput {
    pub grounded: LocoGroundedValues,
    pub aiming: LocoAimingValues,
    pub layers: LocoLayerValues,
    pub in_air: LocoInAirValues,
    /// Only set on the frame a turn in place was requested.
    pub turn_in_place: Option<LocoTurnInPlaceRequest>,
    should_move: EdgeDetector,
}

/// Everything [`LocoAnimOutput::update`] reads.
pub struct LocoAnimFrame<'a> {
    pub entity: Entity,
    pub state: &'a LocoState,
    pub limits: &'a LocoMovementLimits,
    pub curves: &'a LocoAnimCurves,
    pub config: &'a LocoConfig,
    pub translation: Vec3,
    /// Vertical world scale of the character's mesh.
    pub mesh_scale: f32,
    pub frame_duration: f32,
}

impl LocoAnimOutput {
    pub fn update(&mut self, frame: &LocoAnimFrame, landing_probe: &mut LocoLandingProbe) {
        let LocoAnimFrame {
            state,
            config,
            frame_duration,
            ..
        } = *frame;
        self.turn_in_place = None;

        self.aiming.update(state, &config.blend, frame_duration);
        self.layers = LocoLayerValues::from_curves(frame.curves);

        match state.movement_state {
            LocoMovementState::Grounded => {
                landing_probe.0.set_request(None);
                self.update_grounded(frame);
            }
            LocoMovementState::InAir => {
                self.in_air.update(
                    landing_probe,
                    frame.translation,
                    state.velocity,
                    &config.capsule,
                    &config.tuning,
                    &config.blend.land_prediction_curve,
                    frame.curves.mask_land_prediction,
                    frame.entity,
                );
            }
            LocoMovementState::None => {
                landing_probe.0.set_request(None);
            }
        }
    }

    fn update_grounded(&mut self, frame: &LocoAnimFrame) {
        let LocoAnimFrame {
            state,
            config,
            frame_duration,
            ..
        } = *frame;
        let grounded = &mut self.grounded;

        grounded.should_move = state.is_moving_for_rotation(&config.tuning);
        if self.should_move.update(grounded.should_move) == Some(Edge::Rising) {
            grounded.elapsed_delay_time = 0.0;
            grounded.rotate_left = false;
            grounded.rotate_right = false;
        }

        if grounded.should_move {
            grounded.update_movement_values(
                state,
                frame.limits,
                frame.curves,
                &config.blend,
                config.tuning.velocity_direction_threshold,
                frame.mesh_scale,
                frame_duration,
            );
            grounded.update_rotation_values(state, &config.blend);
            return;
        }

        let aiming_yaw = self.aiming.aiming_angle.x;
        if state.rotation_mode == LocoRotationMode::Aiming {
            rotate_in_place_check(
                grounded,
                aiming_yaw,
                state.aim_yaw_rate,
                &config.blend.rotate_in_place,
            );
        } else {
            grounded.rotate_left = false;
            grounded.rotate_right = false;
        }

        if state.rotation_mode == LocoRotationMode::Looking && 0.99 < frame.curves.enable_transition
        {
            self.turn_in_place = turn_in_place_check(
                grounded,
                state,
                aiming_yaw,
                &config.blend.turn_in_place,
                frame_duration,
            );
        } else {
            grounded.elapsed_delay_time = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::states::LocoGait;
    use crate::util::Rotator;

    fn standing_state() -> LocoState {
        LocoState {
            movement_state: LocoMovementState::Grounded,
            rotation_mode: LocoRotationMode::Looking,
            aiming_rotation: Rotator::from_yaw(-120.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_standing_character_turns_in_place() {
        let config = LocoConfig::default();
        let limits = LocoMovementLimits::default();
        let curves = LocoAnimCurves {
            enable_transition: 1.0,
            ..Default::default()
        };
        let state = standing_state();
        let mut output = LocoAnimOutput::default();
        let mut probe = LocoLandingProbe::default();

        let mut request = None;
        for _ in 0..60 {
            output.update(
                &LocoAnimFrame {
                    entity: Entity::from_raw(1),
                    state: &state,
                    limits: &limits,
                    curves: &curves,
                    config: &config,
                    translation: Vec3::ZERO,
                    mesh_scale: 1.0,
                    frame_duration: 1.0 / 30.0,
                },
                &mut probe,
            );
            if let Some(turn) = output.turn_in_place.take() {
                request = Some(turn);
                break;
            }
        }
        let request = request.expect("the character should turn toward the aim");
        assert_relative_eq!(request.turn_angle, 120.0, epsilon = 1e-4);
        assert_eq!(request.animation, config.blend.turn_in_place.standing.right_90.animation);
        assert!(!output.grounded.should_move);
        assert!(probe.0.request.is_none());
    }

    #[test]
    fn test_moving_character_updates_blends() {
        let config = LocoConfig::default();
        let limits = LocoMovementLimits {
            max_acceleration: 1000.0,
            braking_deceleration: 1000.0,
            ..Default::default()
        };
        let curves = LocoAnimCurves::default();
        let state = LocoState {
            velocity: Vec3::new(0.0, 0.0, -300.0),
            speed: 300.0,
            is_moving: true,
            has_movement_input: true,
            gait: LocoGait::Running,
            ..standing_state()
        };
        let mut output = LocoAnimOutput::default();
        output.grounded.elapsed_delay_time = 0.4;
        let mut probe = LocoLandingProbe::default();
        output.update(
            &LocoAnimFrame {
                entity: Entity::from_raw(1),
                state: &state,
                limits: &limits,
                curves: &curves,
                config: &config,
                translation: Vec3::ZERO,
                mesh_scale: 1.0,
                frame_duration: 1.0 / 60.0,
            },
            &mut probe,
        );
        let grounded = &output.grounded;
        assert!(grounded.should_move);
        assert_eq!(grounded.elapsed_delay_time, 0.0);
        assert!(0.0 < grounded.velocity_blend.forward);
        assert_eq!(grounded.velocity_blend.backward, 0.0);
        assert_eq!(grounded.walk_run_blend, 1.0);
        assert!(output.turn_in_place.is_none());
    }

    #[test]
    fn test_falling_character_requests_landing_sweep() {
        let config = LocoConfig::default();
        let limits = LocoMovementLimits::default();
        let curves = LocoAnimCurves::default();
        let state = LocoState {
            movement_state: LocoMovementState::InAir,
            velocity: Vec3::new(0.0, -1000.0, 0.0),
            ..Default::default()
        };
        let mut output = LocoAnimOutput::default();
        let mut probe = LocoLandingProbe::default();
        output.update(
            &LocoAnimFrame {
                entity: Entity::from_raw(1),
                state: &state,
                limits: &limits,
                curves: &curves,
                config: &config,
                translation: Vec3::new(0.0, 500.0, 0.0),
                mesh_scale: 1.0,
                frame_duration: 1.0 / 60.0,
            },
            &mut probe,
        );
        assert_eq!(output.in_air.fall_speed, -1000.0);
        let request = probe.0.request.expect("falling fast enough to sweep");
        assert_eq!(request.ignore, Some(Entity::from_raw(1)));
        assert_eq!(request.origin, Vec3::new(0.0, 500.0, 0.0));
    }
}
