//! Foot locking, foot placement on uneven ground, and the pelvis offset that follows the feet.

use bevy::prelude::*;

use bevy_locomotion_physics_integration_layer::data_for_backends::{
    LocoCast, LocoCastRequest, LocoCastShape, LocoFeet, LocoFootProbes,
};

use crate::anim_curves::LocoAnimCurves;
use crate::config::LocoFootIkConfig;
use crate::util::{r_interp_to, v_interp_to, Rotator};

/// Lock curve values at or above this fully lock the foot.
const FULL_LOCK: f32 = 0.99;

/// A foot pinned to where it was when the lock curve reached full weight.
///
/// The location and rotation are in the mesh's coordinate system, and are updated every frame to
/// cancel the character's own movement so that the foot stays in place in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocoFootLock {
    pub alpha: f32,
    pub location: Vec3,
    pub rotation: Quat,
}

impl Default for LocoFootLock {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// The lock alpha after sampling `curve`.
///
/// The alpha can only go down, unless the curve reaches full weight - in which case it snaps to
/// it. Blending into a lock would drag the foot to where it was when the lock started.
pub fn next_lock_alpha(current: f32, curve: f32) -> f32 {
    if FULL_LOCK <= curve || curve < current {
        curve
    } else {
        current
    }
}

impl LocoFootLock {
    /// Update the lock.
    ///
    /// * `foot` - the IK foot bone's transform relative to the mesh.
    /// * `rotation_delta` - how much the character turned since the previous frame.
    /// * `location_delta` - how much the character moved since the previous frame, in the mesh's
    ///   coordinate system.
    pub fn update(
        &mut self,
        curve: f32,
        foot: Transform,
        rotation_delta: Rotator,
        location_delta: Vec3,
    ) {
        self.alpha = next_lock_alpha(self.alpha, curve);
        if FULL_LOCK <= self.alpha {
            self.location = foot.translation;
            self.rotation = foot.rotation;
        }
        if 0.0 < self.alpha {
            let undo_turn = Quat::from_rotation_y(-rotation_delta.yaw.to_radians());
            self.location = undo_turn * (self.location - location_delta);
            self.rotation = rotation_delta.to_quat().inverse() * self.rotation;
        }
    }
}

/// How far a foot must move to rest on the ground under it.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LocoFootOffset {
    pub location: Vec3,
    pub rotation: Rotator,
    pub location_target: Vec3,
    pub rotation_target: Rotator,
}

/// The rotation that aligns a foot with a surface of the given normal.
pub fn rotation_from_normal(normal: Vec3) -> Rotator {
    Rotator {
        pitch: normal.z.atan2(normal.y).to_degrees(),
        yaw: 0.0,
        roll: (-normal.x).atan2(normal.y).to_degrees(),
    }
}

impl LocoFootOffset {
    /// Read the previous frame's trace, move toward its targets and request the next trace from
    /// under `foot_floor` (the foot's location at the height of the root bone).
    pub fn update(
        &mut self,
        probe: &mut LocoCast,
        foot_floor: Vec3,
        config: &LocoFootIkConfig,
        walkable_floor_y: f32,
        ignore: Entity,
        frame_duration: f32,
    ) {
        self.location_target = Vec3::ZERO;
        self.rotation_target = Rotator::ZERO;
        if let (Some(request), Some(hit)) = (probe.request.as_ref(), probe.output.as_ref()) {
            if hit.is_walkable(Dir3::Y, walkable_floor_y) {
                let traced_floor = request.origin - Vec3::Y * config.trace_distance_above_foot;
                self.location_target = (hit.impact_point + *hit.normal * config.foot_height)
                    - (traced_floor + Vec3::Y * config.foot_height);
                self.rotation_target = rotation_from_normal(*hit.normal);
            }
        }

        let location_speed = if self.location_target.y < self.location.y {
            config.foot_location_lowering_interp_speed
        } else {
            config.foot_location_interp_speed
        };
        self.location = v_interp_to(
            self.location,
            self.location_target,
            frame_duration,
            location_speed,
        );
        self.rotation = r_interp_to(
            self.rotation,
            self.rotation_target,
            frame_duration,
            config.foot_rotation_interp_speed,
        );

        probe.set_request(
            LocoCastRequest::between(
                foot_floor + Vec3::Y * config.trace_distance_above_foot,
                foot_floor - Vec3::Y * config.trace_distance_below_foot,
                LocoCastShape::Ray,
            )
            .map(|request| request.ignoring(ignore)),
        );
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Foot IK targets for the animation graph.
#[derive(Component, Debug, Default, Clone)]
pub struct LocoFootIk {
    pub lock: LocoFeet<LocoFootLock>,
    pub offset: LocoFeet<LocoFootOffset>,
    pub pelvis_alpha: f32,
    pub pelvis_offset: Vec3,
}

impl LocoFootIk {
    pub fn update_foot_locking(
        &mut self,
        curves: &LocoAnimCurves,
        feet: LocoFeet<Transform>,
        rotation_delta: Rotator,
        location_delta: Vec3,
    ) {
        for (((lock, enable), curve), foot) in self
            .lock
            .as_mut()
            .zip(curves.enable_foot_ik)
            .zip(curves.foot_lock)
            .zip(feet)
            .into_iter()
        {
            if enable <= 0.0 {
                continue;
            }
            lock.update(curve, foot, rotation_delta, location_delta);
        }
    }

    /// Place the feet on the ground and move the pelvis with them.
    ///
    /// `feet_floor` are the feet's world locations projected to the height of the root bone.
    #[allow(clippy::too_many_arguments)]
    pub fn update_foot_offsets(
        &mut self,
        curves: &LocoAnimCurves,
        probes: &mut LocoFootProbes,
        feet_floor: LocoFeet<Vec3>,
        config: &LocoFootIkConfig,
        walkable_floor_y: f32,
        ignore: Entity,
        frame_duration: f32,
    ) {
        for (((offset, probe), enable), foot_floor) in self
            .offset
            .as_mut()
            .zip(probes.0.as_mut())
            .zip(curves.enable_foot_ik)
            .zip(feet_floor)
            .into_iter()
        {
            if enable <= 0.0 {
                offset.reset();
                probe.set_request(None);
                continue;
            }
            offset.update(
                probe,
                foot_floor,
                config,
                walkable_floor_y,
                ignore,
                frame_duration,
            );
        }
        self.update_pelvis(
            curves,
            self.offset.left.location_target,
            self.offset.right.location_target,
            config,
            frame_duration,
        );
    }

    /// Stop tracing under the feet, e.g. while in the air.
    ///
    /// The offsets and the pelvis keep their last values so that the feet land where they left
    /// the ground.
    pub fn suspend_offsets(&self, probes: &mut LocoFootProbes) {
        for probe in probes.0.as_mut() {
            probe.set_request(None);
        }
    }

    fn update_pelvis(
        &mut self,
        curves: &LocoAnimCurves,
        left_target: Vec3,
        right_target: Vec3,
        config: &LocoFootIkConfig,
        frame_duration: f32,
    ) {
        self.pelvis_alpha = 0.5 * (curves.enable_foot_ik.left + curves.enable_foot_ik.right);
        if self.pelvis_alpha <= 0.0 {
            self.pelvis_offset = Vec3::ZERO;
            return;
        }
        let target = if left_target.y < right_target.y {
            left_target
        } else {
            right_target
        };
        let speed = if self.pelvis_offset.y < target.y {
            config.pelvis_raising_interp_speed
        } else {
            config.pelvis_interp_speed
        };
        self.pelvis_offset = v_interp_to(self.pelvis_offset, target, frame_duration, speed);
    }
}
