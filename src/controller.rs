use bevy::ecs::schedule::{InternedScheduleLabel, ScheduleLabel};
use bevy::log::{debug, error, warn_once};
use bevy::prelude::*;

use bevy_locomotion_physics_integration_layer::data_for_backends::{
    LocoFeet, LocoFootProbes, LocoGroundSensor, LocoLandingProbe, LocoRigidBodyTracker,
    LocoToggle,
};
use bevy_locomotion_physics_integration_layer::{LocoPipelineSystems, LocoSystems};

use crate::anim_curves::LocoAnimCurves;
use crate::animation::{LocoAnimFrame, LocoAnimOutput};
use crate::camera::{apply_camera_system, update_camera_rig_system};
use crate::config::{LocoConfig, LocoConfigLoader};
use crate::foot_ik::LocoFootIk;
use crate::rotation::{apply_rotation_policy, rotation_policy};
use crate::states::LocoMovementState;
use crate::tracker::{LocoControls, LocoKinematics, LocoMovementLimits, LocoState};
use crate::util::Rotator;
use crate::LocoUserControlsSystems;

/// The main plugin for the locomotion pipeline.
///
/// A physics backend plugin (e.g. `LocoRapier3dPlugin` from `bevy-locomotion-rapier3d`) must be
/// added as well, with the same schedule.
pub struct LocoPlugin {
    schedule: InternedScheduleLabel,
}

impl LocoPlugin {
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
        }
    }
}

impl Plugin for LocoPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<LocoConfig>();
        app.register_asset_loader(LocoConfigLoader);
        app.configure_sets(
            self.schedule,
            (
                LocoPipelineSystems::Sensors,
                LocoUserControlsSystems,
                LocoPipelineSystems::Logic,
                LocoPipelineSystems::CameraRig,
                LocoPipelineSystems::CameraProbe,
                LocoPipelineSystems::CameraApply,
            )
                .chain()
                .in_set(LocoSystems),
        );
        app.add_systems(self.schedule, validate_configs_system.before(LocoSystems));
        app.add_systems(
            self.schedule,
            (update_locomotion_system, update_animation_system)
                .chain()
                .in_set(LocoPipelineSystems::Logic),
        );
        app.add_systems(
            self.schedule,
            update_camera_rig_system.in_set(LocoPipelineSystems::CameraRig),
        );
        app.add_systems(
            self.schedule,
            apply_camera_system.in_set(LocoPipelineSystems::CameraApply),
        );
    }
}

/// The main component of a locomotion character.
///
/// The character's movement state, rotation and animation parameters are only updated while the
/// config asset is loaded.
#[derive(Component, Debug, Clone)]
#[require(
    LocoControls,
    LocoState,
    LocoMovementLimits,
    LocoAnimCurves,
    LocoAnimOutput,
    LocoRigidBodyTracker,
    LocoGroundSensor,
    LocoLandingProbe,
    Transform
)]
pub struct LocoCharacter {
    pub config: Handle<LocoConfig>,
}

impl LocoCharacter {
    pub fn new(config: Handle<LocoConfig>) -> Self {
        Self { config }
    }
}

/// The bones of the character's rig, needed for foot IK and for the camera.
///
/// Without this component the character still moves and rotates, but foot IK is not computed and
/// [`LocoCamera`](crate::LocoCamera)s cannot follow it.
#[derive(Component, Debug, Clone)]
#[require(LocoFootIk, LocoFootProbes)]
pub struct LocoSkeleton {
    /// The entity of the skinned mesh. Foot locks are expressed in its coordinate system.
    pub mesh: Entity,
    pub root: Entity,
    pub head: Entity,
    pub ik_feet: LocoFeet<Entity>,
    pub camera_trace_right: Entity,
    pub camera_trace_left: Entity,
}

fn validate_configs_system(
    mut events: EventReader<AssetEvent<LocoConfig>>,
    configs: Res<Assets<LocoConfig>>,
) {
    for event in events.read() {
        let (AssetEvent::Added { id } | AssetEvent::Modified { id }) = event else {
            continue;
        };
        let Some(config) = configs.get(*id) else {
            continue;
        };
        if let Err(err) = config.validate() {
            error!("Invalid locomotion config {id:?}: {err}");
            panic!("Invalid locomotion config {id:?}: {err}");
        }
    }
}

#[allow(clippy::type_complexity)]
fn update_locomotion_system(
    time: Res<Time>,
    configs: Res<Assets<LocoConfig>>,
    mut query: Query<(
        Entity,
        &LocoCharacter,
        &LocoControls,
        &LocoAnimCurves,
        &LocoRigidBodyTracker,
        &mut LocoGroundSensor,
        &mut LocoState,
        &mut LocoMovementLimits,
        &mut Transform,
        Option<&LocoToggle>,
    )>,
) {
    let frame_duration = time.delta_secs();
    if frame_duration == 0.0 {
        return;
    }
    for (
        entity,
        character,
        controls,
        curves,
        tracker,
        mut sensor,
        mut state,
        mut limits,
        mut transform,
        loco_toggle,
    ) in query.iter_mut()
    {
        let loco_toggle = loco_toggle.copied().unwrap_or_default();
        if loco_toggle == LocoToggle::Disabled {
            continue;
        }
        let Some(config) = configs.get(&character.config) else {
            continue;
        };
        let state = state.as_mut();

        sensor.cast_direction = Dir3::NEG_Y;
        sensor.cast_range = config.capsule.half_height + config.tuning.ground_probe_slack;

        state.update_essential_values(
            &LocoKinematics {
                velocity: tracker.velocity,
                actor_rotation: Rotator::from_quat(tracker.rotation),
                control_rotation: controls.control_rotation,
                desired_motion: controls.desired_motion,
                max_acceleration: limits.max_acceleration,
            },
            &config.tuning,
            frame_duration,
        );

        let on_ground = sensor
            .output
            .as_ref()
            .is_some_and(|hit| hit.is_walkable(Dir3::Y, config.tuning.walkable_floor_y));
        state.movement_action = controls.movement_action;
        let new_movement_state = if on_ground {
            LocoMovementState::Grounded
        } else {
            LocoMovementState::InAir
        };
        if state.set_movement_state(new_movement_state) {
            debug!(
                "{entity}: movement state {:?} -> {:?}",
                state.previous_movement_state, state.movement_state
            );
        }
        state.rotation_mode = controls.rotation_mode;
        if state.set_desired_stance(controls.desired_stance) {
            debug!("{entity}: stance -> {:?}", state.stance);
        }
        if state.update_character_movement(
            controls.desired_gait,
            &config.movement,
            &config.tuning,
            &mut limits,
        ) {
            debug!("{entity}: gait -> {:?}", state.gait);
        }

        match rotation_policy(
            state,
            curves,
            &config.movement,
            &config.tuning,
            controls.has_root_motion,
        ) {
            Ok(policy) => apply_rotation_policy(&policy, state, curves, frame_duration),
            Err(err) => warn_once!("{err}"),
        }
        if loco_toggle == LocoToggle::Enabled {
            transform.rotation = state.actor_rotation.to_quat();
        }

        state.cache_values();
    }
}

#[allow(clippy::type_complexity)]
fn update_animation_system(
    time: Res<Time>,
    configs: Res<Assets<LocoConfig>>,
    mut query: Query<(
        Entity,
        &LocoCharacter,
        &LocoState,
        &LocoMovementLimits,
        &LocoAnimCurves,
        &LocoRigidBodyTracker,
        &mut LocoAnimOutput,
        &mut LocoLandingProbe,
        Option<(&LocoSkeleton, &mut LocoFootIk, &mut LocoFootProbes)>,
        Option<&LocoToggle>,
    )>,
    bones_query: Query<&GlobalTransform>,
) {
    let frame_duration = time.delta_secs();
    if frame_duration == 0.0 {
        return;
    }
    for (
        entity,
        character,
        state,
        limits,
        curves,
        tracker,
        mut output,
        mut landing_probe,
        skeleton,
        loco_toggle,
    ) in query.iter_mut()
    {
        match loco_toggle.copied().unwrap_or_default() {
            LocoToggle::Disabled => continue,
            LocoToggle::SenseOnly => {}
            LocoToggle::Enabled => {}
        }
        let Some(config) = configs.get(&character.config) else {
            continue;
        };
        if !state.is_initialized() {
            continue;
        }

        let mut mesh_scale = 1.0;
        if let Some((skeleton, mut foot_ik, mut foot_probes)) = skeleton {
            let (Ok(mesh), Ok(root), Ok(foot_l), Ok(foot_r)) = (
                bones_query.get(skeleton.mesh),
                bones_query.get(skeleton.root),
                bones_query.get(skeleton.ik_feet.left),
                bones_query.get(skeleton.ik_feet.right),
            ) else {
                continue;
            };
            mesh_scale = mesh.to_scale_rotation_translation().0.y;

            let rotation_delta = if state.movement_state == LocoMovementState::Grounded {
                state.actor_rotation.delta(state.last_update_rotation)
            } else {
                Rotator::ZERO
            };
            let location_delta = mesh
                .affine()
                .inverse()
                .transform_vector3(tracker.velocity * frame_duration);
            foot_ik.update_foot_locking(
                curves,
                LocoFeet::new(foot_l.reparented_to(mesh), foot_r.reparented_to(mesh)),
                rotation_delta,
                location_delta,
            );

            match state.movement_state {
                LocoMovementState::InAir => {
                    foot_ik.suspend_offsets(&mut foot_probes);
                }
                LocoMovementState::Grounded | LocoMovementState::None => {
                    let root_height = root.translation().y;
                    let feet_floor = LocoFeet::new(foot_l.translation(), foot_r.translation())
                        .map(|foot| Vec3::new(foot.x, root_height, foot.z));
                    foot_ik.update_foot_offsets(
                        curves,
                        &mut foot_probes,
                        feet_floor,
                        &config.foot_ik,
                        config.tuning.walkable_floor_y,
                        entity,
                        frame_duration,
                    );
                }
            }
        }

        output.update(
            &LocoAnimFrame {
                entity,
                state,
                limits,
                curves,
                config,
                translation: tracker.translation,
                mesh_scale,
                frame_duration,
            },
            &mut landing_probe,
        );
    }
}
