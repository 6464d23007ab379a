//! Third person camera that follows a [`LocoCharacter`](crate::LocoCharacter).
//!
//! The camera runs in three stages of [`LocoPipelineSystems`](crate::LocoPipelineSystems):
//!
//! 1. `CameraRig` - blend the settings, lag the pivot, compute where the camera wants to be and
//!    request an occlusion sweep from the shoulder to there.
//! 2. `CameraProbe` - the physics backend performs the sweep.
//! 3. `CameraApply` - pull the camera in front of whatever the sweep hit, and write its
//!    [`Transform`].

use bevy::prelude::*;

use bevy_locomotion_physics_integration_layer::data_for_backends::{
    LocoCameraProbe, LocoCastRequest, LocoCastShape, LocoSensorHit,
};

use crate::config::{LocoCameraSettings, LocoConfig};
use crate::controller::{LocoCharacter, LocoSkeleton};
use crate::tracker::{LocoControls, LocoState};
use crate::util::{f_interp_to, r_interp_to, v_interp_to, Rotator};

/// Makes the entity a third person camera for `character`.
#[derive(Component, Debug, Clone)]
#[require(LocoCameraRig, LocoCameraProbe, Transform)]
pub struct LocoCamera {
    pub character: Entity,
    /// Trace from the right shoulder socket (`true`) or the left one (`false`).
    pub right_shoulder: bool,
}

impl LocoCamera {
    pub fn new(character: Entity) -> Self {
        Self {
            character,
            right_shoulder: true,
        }
    }
}

/// The smoothed state of the camera.
#[derive(Component, Debug, Default, Clone)]
pub struct LocoCameraRig {
    /// `None` until the first update, which snaps the settings instead of blending them.
    pub current_settings: Option<LocoCameraSettings>,
    pub smoothed_pivot_target: Transform,
    pub pivot_location: Vec3,
    pub camera_rotation: Rotator,
    /// Where the camera wants to be, before the occlusion correction.
    pub target_camera_location: Vec3,
    /// Where the camera is, after the occlusion correction.
    pub camera_location: Vec3,
    pub field_of_view: f32,
}

/// Blend every field of `current` toward `row`, at the row's blend speed.
pub fn blend_camera_settings(
    current: Option<LocoCameraSettings>,
    row: &LocoCameraSettings,
    frame_duration: f32,
) -> LocoCameraSettings {
    let Some(current) = current else {
        return *row;
    };
    let speed = row.blend_speed;
    LocoCameraSettings {
        camera_offset: v_interp_to(current.camera_offset, row.camera_offset, frame_duration, speed),
        pivot_offset: v_interp_to(current.pivot_offset, row.pivot_offset, frame_duration, speed),
        pivot_lag_speed: v_interp_to(
            current.pivot_lag_speed,
            row.pivot_lag_speed,
            frame_duration,
            speed,
        ),
        rotation_lag_speed: f_interp_to(
            current.rotation_lag_speed,
            row.rotation_lag_speed,
            frame_duration,
            speed,
        ),
        blend_speed: speed,
    }
}

/// Lag `current` toward `target`, with a separate speed for each axis of the camera's yaw frame.
///
/// `lag_speeds` are for the right (x), up (y) and back (z) axes of a frame rotated by
/// `camera_yaw`. Working in that frame keeps the lag along the view direction independent of which
/// way the camera faces.
pub fn axis_independent_lag(
    current: Vec3,
    target: Vec3,
    camera_yaw: f32,
    lag_speeds: Vec3,
    frame_duration: f32,
) -> Vec3 {
    let frame = Rotator::from_yaw(camera_yaw);
    let current = frame.unrotate_vector(current);
    let target = frame.unrotate_vector(target);
    frame.rotate_vector(Vec3::new(
        f_interp_to(current.x, target.x, frame_duration, lag_speeds.x),
        f_interp_to(current.y, target.y, frame_duration, lag_speeds.y),
        f_interp_to(current.z, target.z, frame_duration, lag_speeds.z),
    ))
}

/// The point between the head and the root bone, facing the character's direction.
pub fn pivot_target(head: Vec3, root: Vec3, actor_rotation: Rotator) -> Transform {
    Transform::from_translation(0.5 * (head + root)).with_rotation(actor_rotation.to_quat())
}

/// Move `target_location` back along the sweep so it stays in front of what the sweep hit.
pub fn occlusion_corrected(
    target_location: Vec3,
    request: &LocoCastRequest,
    hit: Option<&LocoSensorHit>,
) -> Vec3 {
    match hit {
        Some(hit) if !hit.start_penetrating => target_location + (hit.location - request.end()),
        _ => target_location,
    }
}

impl LocoCameraRig {
    /// Advance the rig toward the character, returning the occlusion sweep to perform.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        row: &LocoCameraSettings,
        control_rotation: Rotator,
        pivot_target: Transform,
        trace_origin: Vec3,
        trace_radius: f32,
        field_of_view: f32,
        frame_duration: f32,
    ) -> Option<LocoCastRequest> {
        let first_update = self.current_settings.is_none();
        let settings = blend_camera_settings(self.current_settings, row, frame_duration);
        self.current_settings = Some(settings);
        self.field_of_view = field_of_view;

        if first_update {
            self.camera_rotation = control_rotation;
            self.smoothed_pivot_target = pivot_target;
        } else {
            self.camera_rotation = r_interp_to(
                self.camera_rotation,
                control_rotation,
                frame_duration,
                settings.rotation_lag_speed,
            );
            self.smoothed_pivot_target = Transform::from_translation(axis_independent_lag(
                self.smoothed_pivot_target.translation,
                pivot_target.translation,
                self.camera_rotation.yaw,
                settings.pivot_lag_speed,
                frame_duration,
            ))
            .with_rotation(pivot_target.rotation);
        }

        self.pivot_location = self.smoothed_pivot_target.translation
            + self.smoothed_pivot_target.rotation * settings.pivot_offset;
        self.target_camera_location =
            self.pivot_location + self.camera_rotation.to_quat() * settings.camera_offset;
        self.camera_location = self.target_camera_location;

        LocoCastRequest::between(
            trace_origin,
            self.target_camera_location,
            LocoCastShape::Sphere {
                radius: trace_radius,
            },
        )
    }
}

#[allow(clippy::type_complexity)]
pub(crate) fn update_camera_rig_system(
    time: Res<Time>,
    configs: Res<Assets<LocoConfig>>,
    mut cameras_query: Query<(&LocoCamera, &mut LocoCameraRig, &mut LocoCameraProbe)>,
    characters_query: Query<(&LocoCharacter, &LocoState, &LocoControls, &LocoSkeleton)>,
    bones_query: Query<&GlobalTransform>,
) {
    let frame_duration = time.delta_secs();
    if frame_duration == 0.0 {
        return;
    }
    for (camera, mut rig, mut probe) in cameras_query.iter_mut() {
        let Ok((character, state, controls, skeleton)) = characters_query.get(camera.character)
        else {
            continue;
        };
        let Some(config) = configs.get(&character.config) else {
            continue;
        };
        let shoulder = if camera.right_shoulder {
            skeleton.camera_trace_right
        } else {
            skeleton.camera_trace_left
        };
        let (Ok(head), Ok(root), Ok(shoulder)) = (
            bones_query.get(skeleton.head),
            bones_query.get(skeleton.root),
            bones_query.get(shoulder),
        ) else {
            continue;
        };

        let request = rig.update(
            config.camera.settings(state.stance, state.gait),
            controls.control_rotation,
            pivot_target(head.translation(), root.translation(), state.actor_rotation),
            shoulder.translation(),
            config.camera.trace_radius,
            config.camera.field_of_view,
            frame_duration,
        );
        probe
            .0
            .set_request(request.map(|request| request.ignoring(camera.character)));
    }
}

pub(crate) fn apply_camera_system(
    mut query: Query<(&mut LocoCameraRig, &LocoCameraProbe, &mut Transform), With<LocoCamera>>,
) {
    for (mut rig, probe, mut transform) in query.iter_mut() {
        if rig.current_settings.is_none() {
            continue;
        }
        let camera_location = match probe.0.request.as_ref() {
            Some(request) => {
                occlusion_corrected(rig.target_camera_location, request, probe.0.output.as_ref())
            }
            None => rig.target_camera_location,
        };
        rig.camera_location = camera_location;
        transform.translation = camera_location;
        transform.rotation = rig.camera_rotation.to_quat();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::config::LocoCameraModel;
    use crate::states::{LocoGait, LocoStance};

    #[test]
    fn test_axis_independent_lag_commutes_with_yaw() {
        let current = Vec3::new(10.0, 5.0, -20.0);
        let target = Vec3::new(-30.0, 25.0, 40.0);
        let lag_speeds = Vec3::new(2.0, 10.0, 6.0);
        let frame_duration = 1.0 / 30.0;
        let base_yaw = 15.0;
        let base = axis_independent_lag(current, target, base_yaw, lag_speeds, frame_duration);

        for yaw in [30.0, 90.0, -135.0, 180.0] {
            let rotation = Rotator::from_yaw(yaw);
            let rotated = axis_independent_lag(
                rotation.rotate_vector(current),
                rotation.rotate_vector(target),
                base_yaw + yaw,
                lag_speeds,
                frame_duration,
            );
            let expected = rotation.rotate_vector(base);
            assert_relative_eq!(rotated.x, expected.x, epsilon = 1e-3);
            assert_relative_eq!(rotated.y, expected.y, epsilon = 1e-3);
            assert_relative_eq!(rotated.z, expected.z, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_lag_speed_per_axis() {
        // With the camera facing forward, only the right axis lags.
        let lagged = axis_independent_lag(
            Vec3::ZERO,
            Vec3::new(10.0, 10.0, 10.0),
            0.0,
            Vec3::new(1.0, 0.0, 0.0),
            0.5,
        );
        assert_relative_eq!(lagged.x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(lagged.y, 10.0, epsilon = 1e-4);
        assert_relative_eq!(lagged.z, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_settings_snap_then_blend() {
        let model = LocoCameraModel::default();
        let walking = model.settings(LocoStance::Standing, LocoGait::Walking);
        let sprinting = model.settings(LocoStance::Standing, LocoGait::Sprinting);

        let first = blend_camera_settings(None, walking, 0.1);
        assert_eq!(first, *walking);

        let blended = blend_camera_settings(Some(first), sprinting, 0.1);
        let alpha = sprinting.blend_speed * 0.1;
        assert_relative_eq!(
            blended.rotation_lag_speed,
            walking.rotation_lag_speed
                + alpha * (sprinting.rotation_lag_speed - walking.rotation_lag_speed),
            epsilon = 1e-4
        );
        assert_eq!(blended.blend_speed, sprinting.blend_speed);
    }

    #[test]
    fn test_occlusion_pulls_camera_in() {
        let request = LocoCastRequest::between(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 100.0),
            LocoCastShape::Sphere { radius: 15.0 },
        )
        .expect("distinct points");
        let mut hit = LocoSensorHit {
            entity: Entity::from_raw(3),
            distance: 40.0,
            fraction: 0.4,
            location: Vec3::new(0.0, 0.0, 40.0),
            impact_point: Vec3::new(0.0, 0.0, 55.0),
            normal: Dir3::NEG_Z,
            start_penetrating: false,
        };
        let target = Vec3::new(0.0, 0.0, 100.0);
        assert_eq!(
            occlusion_corrected(target, &request, Some(&hit)),
            Vec3::new(0.0, 0.0, 40.0)
        );
        hit.start_penetrating = true;
        assert_eq!(occlusion_corrected(target, &request, Some(&hit)), target);
        assert_eq!(occlusion_corrected(target, &request, None), target);
    }

    #[test]
    fn test_first_update_snaps_to_the_character() {
        let model = LocoCameraModel::default();
        let row = model.settings(LocoStance::Standing, LocoGait::Running);
        let mut rig = LocoCameraRig::default();
        let pivot = pivot_target(
            Vec3::new(0.0, 160.0, 0.0),
            Vec3::ZERO,
            Rotator::ZERO,
        );
        let request = rig
            .update(
                row,
                Rotator::from_yaw(90.0),
                pivot,
                Vec3::new(20.0, 140.0, 0.0),
                15.0,
                90.0,
                1.0 / 60.0,
            )
            .expect("the shoulder is not where the camera is");
        assert_eq!(rig.camera_rotation, Rotator::from_yaw(90.0));
        assert_eq!(rig.smoothed_pivot_target.translation, Vec3::new(0.0, 80.0, 0.0));
        assert_eq!(request.origin, Vec3::new(20.0, 140.0, 0.0));
        assert!((request.end() - rig.target_camera_location).length() < 1e-3);
    }
}
