//! Grounded rotation of the character.
//!
//! The rotation is decided by [`rotation_policy`], which picks a [`RotationPolicy`] from the
//! movement state, the movement action, the rotation mode and the gait, and then applied by
//! [`apply_rotation_policy`].

use bevy::prelude::*;

use crate::anim_curves::LocoAnimCurves;
use crate::config::{LocoMovementModel, LocoMovementSettings, LocoTuning};
use crate::states::{LocoGait, LocoMovementAction, LocoMovementState, LocoRotationMode};
use crate::tracker::LocoState;
use crate::util::{map_range_clamped, normalize_axis, r_interp_to, r_interp_to_constant, Rotator};

/// `rotation_amount` is authored as degrees per frame of a 30 FPS animation.
const ROTATION_AMOUNT_FRAME_DURATION: f32 = 1.0 / 30.0;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocoRotationError {
    #[error("No rotation policy for movement state {movement_state:?} with action {movement_action:?}")]
    Unimplemented {
        movement_state: LocoMovementState,
        movement_action: LocoMovementAction,
    },
}

/// How the character should rotate this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationPolicy {
    /// Chase a goal yaw while moving.
    Smooth {
        goal_yaw: f32,
        /// Constant speed (degrees per second) of the target rotation toward the goal.
        target_speed: f32,
        /// Exponential speed of the actor rotation toward the target rotation.
        actor_speed: f32,
    },
    /// Stand still, optionally keeping the yaw within a range around the aim yaw.
    Stationary { limit: Option<LocoRotationLimit> },
    /// An animation drives the character's root.
    RootMotion,
}

/// A yaw range around the aim direction the character must stay within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocoRotationLimit {
    pub aim_yaw_min: f32,
    pub aim_yaw_max: f32,
    pub interp_speed: f32,
}

/// The rotation rate while grounded and moving.
///
/// It follows the settings row's rotation-rate curve, and is boosted while the control rotation
/// itself turns quickly.
pub fn grounded_rotation_rate(
    settings: &LocoMovementSettings,
    model: &LocoMovementModel,
    mapped_speed: f32,
    aim_yaw_rate: f32,
) -> f32 {
    let [boost_from, boost_to] = model.aim_yaw_rate_boost_range;
    let [boost_min, boost_max] = model.aim_yaw_rate_boost;
    settings.rotation_rate_curve.sample(mapped_speed)
        * map_range_clamped(aim_yaw_rate, boost_from, boost_to, boost_min, boost_max)
}

/// Decide how the character rotates this frame.
pub fn rotation_policy(
    state: &LocoState,
    curves: &LocoAnimCurves,
    model: &LocoMovementModel,
    tuning: &LocoTuning,
    has_root_motion: bool,
) -> Result<RotationPolicy, LocoRotationError> {
    match (state.movement_state, state.movement_action) {
        (LocoMovementState::Grounded, LocoMovementAction::None) => {}
        (movement_state, movement_action) => {
            return Err(LocoRotationError::Unimplemented {
                movement_state,
                movement_action,
            });
        }
    }

    if has_root_motion {
        return Ok(RotationPolicy::RootMotion);
    }

    if !state.is_moving_for_rotation(tuning) {
        return Ok(RotationPolicy::Stationary {
            limit: (state.rotation_mode == LocoRotationMode::Aiming).then_some(
                LocoRotationLimit {
                    aim_yaw_min: -model.aiming_yaw_limit,
                    aim_yaw_max: model.aiming_yaw_limit,
                    interp_speed: model.aiming_yaw_limit_speed,
                },
            ),
        });
    }

    let settings = model.settings(state.rotation_mode, state.stance);
    let actor_speed =
        grounded_rotation_rate(settings, model, state.mapped_speed, state.aim_yaw_rate);
    let (goal_yaw, target_speed) = match (state.rotation_mode, state.gait) {
        (LocoRotationMode::Velocity, _) => {
            (state.last_velocity_rotation.yaw, model.velocity_target_speed)
        }
        (LocoRotationMode::Looking, LocoGait::Walking | LocoGait::Running) => (
            // The curve is positive to the right, while yaw is positive to the left.
            state.aiming_rotation.yaw - curves.yaw_offset,
            model.looking_target_speed,
        ),
        (LocoRotationMode::Looking, LocoGait::Sprinting) => {
            (state.last_velocity_rotation.yaw, model.looking_target_speed)
        }
        (LocoRotationMode::Aiming, _) => (state.aiming_rotation.yaw, model.aiming_target_speed),
    };
    Ok(RotationPolicy::Smooth {
        goal_yaw,
        target_speed,
        actor_speed,
    })
}

/// Move the target rotation toward `goal`, and the actor rotation toward the target rotation.
///
/// Returns the new actor rotation. A `target_speed` of 0 snaps the target rotation to the goal.
pub fn smooth_character_rotation(
    target_rotation: &mut Rotator,
    actor_rotation: Rotator,
    goal: Rotator,
    target_speed: f32,
    actor_speed: f32,
    frame_duration: f32,
) -> Rotator {
    *target_rotation = r_interp_to_constant(*target_rotation, goal, frame_duration, target_speed);
    r_interp_to(actor_rotation, *target_rotation, frame_duration, actor_speed)
}

/// Keep the actor within `limit` around the aim yaw.
///
/// Returns the new actor rotation if the actor was out of range.
pub fn limit_rotation(
    target_rotation: &mut Rotator,
    actor_rotation: Rotator,
    aim_yaw: f32,
    limit: &LocoRotationLimit,
    frame_duration: f32,
) -> Option<Rotator> {
    let delta = normalize_axis(aim_yaw - actor_rotation.yaw);
    if (limit.aim_yaw_min..=limit.aim_yaw_max).contains(&delta) {
        return None;
    }
    let goal_yaw = if 0.0 < delta {
        aim_yaw + limit.aim_yaw_min
    } else {
        aim_yaw + limit.aim_yaw_max
    };
    Some(smooth_character_rotation(
        target_rotation,
        actor_rotation,
        Rotator::from_yaw(goal_yaw),
        0.0,
        limit.interp_speed,
        frame_duration,
    ))
}

/// Apply `policy` to the state's actor and target rotations.
pub fn apply_rotation_policy(
    policy: &RotationPolicy,
    state: &mut LocoState,
    curves: &LocoAnimCurves,
    frame_duration: f32,
) {
    match policy {
        RotationPolicy::Smooth {
            goal_yaw,
            target_speed,
            actor_speed,
        } => {
            state.actor_rotation = smooth_character_rotation(
                &mut state.target_rotation,
                state.actor_rotation,
                Rotator::from_yaw(*goal_yaw),
                *target_speed,
                *actor_speed,
                frame_duration,
            );
        }
        RotationPolicy::Stationary { limit } => {
            if let Some(limit) = limit {
                if let Some(new_rotation) = limit_rotation(
                    &mut state.target_rotation,
                    state.actor_rotation,
                    state.aiming_rotation.yaw,
                    limit,
                    frame_duration,
                ) {
                    state.actor_rotation = new_rotation;
                }
            }
            if 0.001 < curves.rotation_amount.abs() {
                let yaw = curves.rotation_amount * (frame_duration / ROTATION_AMOUNT_FRAME_DURATION);
                state.actor_rotation =
                    Rotator::from_yaw(normalize_axis(state.actor_rotation.yaw - yaw));
                state.target_rotation = state.actor_rotation;
            }
        }
        RotationPolicy::RootMotion => {}
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::states::LocoStance;

    fn moving_state(rotation_mode: LocoRotationMode, gait: LocoGait) -> LocoState {
        LocoState {
            movement_state: LocoMovementState::Grounded,
            rotation_mode,
            gait,
            stance: LocoStance::Standing,
            speed: 300.0,
            is_moving: true,
            has_movement_input: true,
            mapped_speed: 1.5,
            aiming_rotation: Rotator::from_yaw(40.0),
            last_velocity_rotation: Rotator::from_yaw(-20.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_policy_goals() {
        let model = LocoMovementModel::default();
        let tuning = LocoTuning::default();
        let curves = LocoAnimCurves {
            yaw_offset: 15.0,
            ..Default::default()
        };

        let goal = |rotation_mode, gait| {
            let policy = rotation_policy(
                &moving_state(rotation_mode, gait),
                &curves,
                &model,
                &tuning,
                false,
            );
            let Ok(RotationPolicy::Smooth {
                goal_yaw,
                target_speed,
                ..
            }) = policy
            else {
                panic!("Expected smooth rotation, got {policy:?}");
            };
            (goal_yaw, target_speed)
        };

        assert_eq!(goal(LocoRotationMode::Looking, LocoGait::Running), (25.0, 500.0));
        assert_eq!(goal(LocoRotationMode::Looking, LocoGait::Sprinting), (-20.0, 500.0));
        assert_eq!(goal(LocoRotationMode::Aiming, LocoGait::Running), (40.0, 1000.0));
        assert_eq!(goal(LocoRotationMode::Velocity, LocoGait::Walking), (-20.0, 800.0));
    }

    #[test]
    fn test_unimplemented_branches() {
        let model = LocoMovementModel::default();
        let tuning = LocoTuning::default();
        let curves = LocoAnimCurves::default();

        let mut state = moving_state(LocoRotationMode::Looking, LocoGait::Running);
        state.movement_state = LocoMovementState::InAir;
        assert_eq!(
            rotation_policy(&state, &curves, &model, &tuning, false),
            Err(LocoRotationError::Unimplemented {
                movement_state: LocoMovementState::InAir,
                movement_action: LocoMovementAction::None,
            })
        );

        state.movement_state = LocoMovementState::Grounded;
        state.movement_action = LocoMovementAction::Rolling;
        assert!(rotation_policy(&state, &curves, &model, &tuning, false).is_err());
    }

    #[test]
    fn test_root_motion_leaves_rotation_to_the_animation() {
        let model = LocoMovementModel::default();
        let tuning = LocoTuning::default();
        let curves = LocoAnimCurves {
            rotation_amount: 3.0,
            yaw_offset: 15.0,
            ..Default::default()
        };
        let mut state = moving_state(LocoRotationMode::Looking, LocoGait::Running);
        state.actor_rotation = Rotator::from_yaw(10.0);
        state.target_rotation = Rotator::from_yaw(12.0);

        let policy = rotation_policy(&state, &curves, &model, &tuning, true);
        assert_eq!(policy, Ok(RotationPolicy::RootMotion));

        let policy = RotationPolicy::RootMotion;
        apply_rotation_policy(&policy, &mut state, &curves, 1.0 / 60.0);
        assert_eq!(state.actor_rotation, Rotator::from_yaw(10.0));
        assert_eq!(state.target_rotation, Rotator::from_yaw(12.0));

        // Root motion does not cover the unimplemented branches.
        state.movement_state = LocoMovementState::InAir;
        assert!(rotation_policy(&state, &curves, &model, &tuning, true).is_err());
    }

    #[test]
    fn test_rotation_rate_boost() {
        let model = LocoMovementModel::default();
        let settings = model.settings(LocoRotationMode::Looking, LocoStance::Standing);
        let base = grounded_rotation_rate(settings, &model, 2.0, 0.0);
        assert_relative_eq!(base, settings.rotation_rate_curve.sample(2.0));
        assert_relative_eq!(grounded_rotation_rate(settings, &model, 2.0, 180.0), base * 2.0);
        assert_relative_eq!(grounded_rotation_rate(settings, &model, 2.0, 1000.0), base * 3.0);
    }

    #[test]
    fn test_smooth_rotation_converges() {
        let mut target = Rotator::ZERO;
        let mut actor = Rotator::ZERO;
        let goal = Rotator::from_yaw(90.0);
        for _ in 0..200 {
            actor = smooth_character_rotation(&mut target, actor, goal, 500.0, 10.0, 1.0 / 60.0);
        }
        assert_relative_eq!(target.yaw, 90.0);
        assert_relative_eq!(actor.yaw, 90.0, epsilon = 0.01);
    }

    #[test]
    fn test_limit_rotation() {
        let limit = LocoRotationLimit {
            aim_yaw_min: -100.0,
            aim_yaw_max: 100.0,
            interp_speed: 20.0,
        };
        let mut target = Rotator::ZERO;
        assert_eq!(
            limit_rotation(&mut target, Rotator::ZERO, 60.0, &limit, 0.1),
            None
        );

        // Aiming 120 degrees to the left of the actor pulls the target to 100 degrees behind the aim.
        let new_rotation = limit_rotation(&mut target, Rotator::ZERO, 120.0, &limit, 0.01);
        assert_relative_eq!(target.yaw, 20.0);
        let new_rotation = new_rotation.expect("actor should have been out of range");
        assert!(0.0 < new_rotation.yaw && new_rotation.yaw < 20.0);
    }

    #[test]
    fn test_rotation_amount_drives_yaw() {
        let mut state = LocoState {
            movement_state: LocoMovementState::Grounded,
            actor_rotation: Rotator::from_yaw(10.0),
            ..Default::default()
        };
        let curves = LocoAnimCurves {
            rotation_amount: 3.0,
            ..Default::default()
        };
        apply_rotation_policy(
            &RotationPolicy::Stationary { limit: None },
            &mut state,
            &curves,
            1.0 / 60.0,
        );
        assert_relative_eq!(state.actor_rotation.yaw, 8.5, epsilon = 1e-4);
        assert_eq!(state.target_rotation, state.actor_rotation);
    }
}
