//! # bevy_rapier3d Integration for bevy-locomotion
//!
//! In addition to the instruction in bevy-locomotion's documentation:
//!
//! * Add [`LocoRapier3dPlugin`] to the Bevy app.
//! * Give the character entity a [`RigidBody`] and a [`Collider`]. The casts requested by the
//!   locomotion logic never hit the character's own colliders.
mod helpers;

use bevy::ecs::schedule::{InternedScheduleLabel, ScheduleLabel};
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use bevy_locomotion_physics_integration_layer::data_for_backends::{
    LocoCameraProbe, LocoCastRequest, LocoCastShape, LocoFootProbes, LocoGroundSensor,
    LocoLandingProbe, LocoRigidBodyTracker, LocoToggle,
};
use bevy_locomotion_physics_integration_layer::{LocoPipelineSystems, LocoSystems};

use self::helpers::PretendToBeRapierContext;

pub mod prelude {
    pub use crate::{LocoCameraOf, LocoRapier3dPlugin};
}

/// Add this plugin to use bevy_rapier3d as a physics backend.
///
/// This plugin should be used in addition to `LocoPlugin`, and both plugins must use the same
/// schedule - which should match the schedule Rapier runs in. By default, Rapier runs in
/// [`PostUpdate`] - which means this plugin and `LocoPlugin` should run in [`Update`].
pub struct LocoRapier3dPlugin {
    schedule: InternedScheduleLabel,
}

impl LocoRapier3dPlugin {
    pub fn new(schedule: impl ScheduleLabel) -> Self {
        Self {
            schedule: schedule.intern(),
        }
    }
}

impl Plugin for LocoRapier3dPlugin {
    fn build(&self, app: &mut App) {
        app.register_required_components::<LocoRigidBodyTracker, Velocity>();
        app.configure_sets(
            self.schedule,
            LocoSystems.before(PhysicsSet::SyncBackend).run_if(
                |rapier_config: Single<&RapierConfiguration>| rapier_config.physics_pipeline_active,
            ),
        );
        app.add_systems(
            self.schedule,
            (
                update_rigid_body_trackers_system,
                update_ground_sensors_system,
                update_foot_probes_system,
                update_landing_probes_system,
            )
                .in_set(LocoPipelineSystems::Sensors),
        );
        app.add_systems(
            self.schedule,
            (link_cameras_system, update_camera_probes_system)
                .chain()
                .in_set(LocoPipelineSystems::CameraProbe),
        );
    }
}

/// The Rapier context a camera's occlusion sweep runs in.
///
/// Cameras are usually not physics entities, so the backend adds this component with the context
/// of the character the camera follows. It can also be added manually to cameras that should
/// sweep in a different context.
#[derive(Component, Debug, Clone, Copy)]
pub struct LocoCameraOf(pub Entity);

#[allow(clippy::type_complexity)]
fn update_rigid_body_trackers_system(
    mut query: Query<(
        &GlobalTransform,
        &Velocity,
        &mut LocoRigidBodyTracker,
        Option<&LocoToggle>,
    )>,
) {
    for (transform, velocity, mut tracker, loco_toggle) in query.iter_mut() {
        match loco_toggle.copied().unwrap_or_default() {
            LocoToggle::Disabled => continue,
            LocoToggle::SenseOnly => {}
            LocoToggle::Enabled => {}
        }
        let (_, rotation, translation) = transform.to_scale_rotation_translation();
        *tracker = LocoRigidBodyTracker {
            translation,
            rotation,
            velocity: velocity.linvel,
        };
    }
}

#[allow(clippy::type_complexity)]
fn update_ground_sensors_system(
    rapier_context_query: Query<PretendToBeRapierContext>,
    mut query: Query<(
        Entity,
        &RapierContextEntityLink,
        &GlobalTransform,
        &mut LocoGroundSensor,
        Option<&LocoToggle>,
    )>,
) {
    query.par_iter_mut().for_each(
        |(entity, rapier_context_entity_link, transform, mut sensor, loco_toggle)| {
            match loco_toggle.copied().unwrap_or_default() {
                LocoToggle::Disabled => return,
                LocoToggle::SenseOnly => {}
                LocoToggle::Enabled => {}
            }
            let Ok(rapier_context) = rapier_context_query.get(rapier_context_entity_link.0) else {
                return;
            };
            let request = LocoCastRequest {
                origin: transform.transform_point(sensor.cast_origin),
                direction: sensor.cast_direction,
                range: sensor.cast_range,
                shape: LocoCastShape::Ray,
                ignore: Some(entity),
            };
            sensor.output = rapier_context.cast_request(&request);
        },
    );
}

fn update_foot_probes_system(
    rapier_context_query: Query<PretendToBeRapierContext>,
    mut query: Query<(
        &RapierContextEntityLink,
        &mut LocoFootProbes,
        Option<&LocoToggle>,
    )>,
) {
    for (rapier_context_entity_link, mut probes, loco_toggle) in query.iter_mut() {
        if loco_toggle.copied().unwrap_or_default() == LocoToggle::Disabled {
            continue;
        }
        let Ok(rapier_context) = rapier_context_query.get(rapier_context_entity_link.0) else {
            continue;
        };
        for probe in probes.0.as_mut() {
            rapier_context.perform_cast(probe);
        }
    }
}

fn update_landing_probes_system(
    rapier_context_query: Query<PretendToBeRapierContext>,
    mut query: Query<(
        &RapierContextEntityLink,
        &mut LocoLandingProbe,
        Option<&LocoToggle>,
    )>,
) {
    for (rapier_context_entity_link, mut probe, loco_toggle) in query.iter_mut() {
        if loco_toggle.copied().unwrap_or_default() == LocoToggle::Disabled {
            continue;
        }
        let Ok(rapier_context) = rapier_context_query.get(rapier_context_entity_link.0) else {
            continue;
        };
        rapier_context.perform_cast(&mut probe.0);
    }
}

fn link_cameras_system(
    mut commands: Commands,
    cameras_query: Query<(Entity, &LocoCameraProbe), Without<LocoCameraOf>>,
    links_query: Query<&RapierContextEntityLink>,
) {
    for (camera_entity, probe) in cameras_query.iter() {
        let Some(character) = probe.0.request.as_ref().and_then(|request| request.ignore) else {
            continue;
        };
        let Ok(link) = links_query.get(character) else {
            continue;
        };
        commands.entity(camera_entity).insert(LocoCameraOf(link.0));
    }
}

fn update_camera_probes_system(
    rapier_context_query: Query<PretendToBeRapierContext>,
    mut query: Query<(&LocoCameraOf, &mut LocoCameraProbe)>,
) {
    for (LocoCameraOf(rapier_context_entity), mut probe) in query.iter_mut() {
        let Ok(rapier_context) = rapier_context_query.get(*rapier_context_entity) else {
            continue;
        };
        rapier_context.perform_cast(&mut probe.0);
    }
}
