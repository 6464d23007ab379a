use bevy::prelude::*;

use bevy_locomotion_physics_integration_layer::data_for_backends::{
    LocoCastRequest, LocoCastShape, LocoLandingProbe, LocoSensorHit,
};

use crate::config::{LocoCapsule, LocoTuning};
use crate::curves::LocoCurve;
use crate::util::{lerp, map_range_clamped};

/// Blend values of the in-air animation state.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LocoInAirValues {
    /// Vertical velocity. Negative while falling.
    pub fall_speed: f32,
    /// Weight of the landing anticipation pose - 0 far from the ground, rising as it approaches.
    pub land_prediction: f32,
}

/// The capsule sweep that looks for the ground the character is about to land on.
///
/// Returns `None` when the character does not fall fast enough for a landing to be worth
/// predicting.
pub fn land_prediction_request(
    translation: Vec3,
    velocity: Vec3,
    capsule: &LocoCapsule,
    tuning: &LocoTuning,
) -> Option<LocoCastRequest> {
    if tuning.land_prediction_min_fall_speed <= velocity.y {
        return None;
    }
    let sweep_velocity = Vec3::new(
        velocity.x,
        velocity
            .y
            .clamp(tuning.land_prediction_max_fall_speed, tuning.land_prediction_min_fall_speed),
        velocity.z,
    );
    let direction = Dir3::new(sweep_velocity).ok()?;
    let range = map_range_clamped(
        velocity.y,
        0.0,
        tuning.land_prediction_max_fall_speed,
        tuning.land_prediction_min_distance,
        tuning.land_prediction_max_distance,
    );
    Some(LocoCastRequest {
        origin: translation,
        direction,
        range,
        shape: LocoCastShape::Capsule {
            radius: capsule.radius,
            half_height: capsule.half_height,
        },
        ignore: None,
    })
}

/// The landing weight for the result of a [`land_prediction_request`] sweep.
pub fn evaluate_land_prediction(
    hit: Option<&LocoSensorHit>,
    curve: &LocoCurve,
    mask: f32,
    walkable_floor_y: f32,
) -> f32 {
    match hit {
        Some(hit) if hit.is_walkable(Dir3::Y, walkable_floor_y) => {
            lerp(curve.sample(hit.fraction), 0.0, mask)
        }
        _ => 0.0,
    }
}

impl LocoInAirValues {
    /// Update the in-air values from the previous frame's sweep and request the next sweep.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        probe: &mut LocoLandingProbe,
        translation: Vec3,
        velocity: Vec3,
        capsule: &LocoCapsule,
        tuning: &LocoTuning,
        curve: &LocoCurve,
        mask: f32,
        ignore: Entity,
    ) {
        self.fall_speed = velocity.y;
        let request = land_prediction_request(translation, velocity, capsule, tuning);
        self.land_prediction = if request.is_some() {
            evaluate_land_prediction(probe.0.output.as_ref(), curve, mask, tuning.walkable_floor_y)
        } else {
            0.0
        };
        probe
            .0
            .set_request(request.map(|request| request.ignoring(ignore)));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn hit(fraction: f32, normal: Dir3) -> LocoSensorHit {
        LocoSensorHit {
            entity: Entity::from_raw(7),
            distance: fraction * 100.0,
            fraction,
            location: Vec3::ZERO,
            impact_point: Vec3::ZERO,
            normal,
            start_penetrating: false,
        }
    }

    #[test]
    fn test_slow_fall_predicts_nothing() {
        let tuning = LocoTuning::default();
        let capsule = LocoCapsule::default();
        assert_eq!(
            land_prediction_request(Vec3::ZERO, Vec3::new(0.0, -150.0, 0.0), &capsule, &tuning),
            None
        );

        // Even with a stale hit in the probe, the prediction is exactly zero and no sweep is
        // requested.
        let mut values = LocoInAirValues::default();
        let mut probe = LocoLandingProbe::default();
        probe.0.output = Some(hit(0.1, Dir3::Y));
        values.update(
            &mut probe,
            Vec3::ZERO,
            Vec3::new(0.0, -150.0, 0.0),
            &capsule,
            &tuning,
            &LocoCurve::new([(0.0, 1.0), (1.0, 0.0)]),
            0.0,
            Entity::from_raw(1),
        );
        assert_eq!(values.land_prediction, 0.0);
        assert_eq!(values.fall_speed, -150.0);
        assert!(probe.0.request.is_none());
        assert!(probe.0.output.is_none());
    }

    #[test]
    fn test_sweep_direction_and_range() {
        let tuning = LocoTuning::default();
        let request = land_prediction_request(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, -2000.0, 0.0),
            &LocoCapsule::default(),
            &tuning,
        )
        .expect("fast enough to sweep");
        assert_eq!(request.origin, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(request.direction, Dir3::NEG_Y);
        assert_relative_eq!(request.range, 50.0 + 0.5 * 1950.0);

        // Beyond the maximum fall speed the range stops growing.
        let request = land_prediction_request(
            Vec3::ZERO,
            Vec3::new(0.0, -9000.0, 0.0),
            &LocoCapsule::default(),
            &tuning,
        )
        .expect("fast enough to sweep");
        assert_relative_eq!(request.range, 2000.0);
    }

    #[test]
    fn test_evaluate_land_prediction() {
        let curve = LocoCurve::new([(0.0, 1.0), (1.0, 0.0)]);
        assert_relative_eq!(
            evaluate_land_prediction(Some(&hit(0.25, Dir3::Y)), &curve, 0.0, 0.71),
            0.75
        );
        assert_relative_eq!(
            evaluate_land_prediction(Some(&hit(0.25, Dir3::Y)), &curve, 1.0, 0.71),
            0.0
        );
        assert_eq!(
            evaluate_land_prediction(Some(&hit(0.25, Dir3::X)), &curve, 0.0, 0.71),
            0.0
        );
        assert_eq!(evaluate_land_prediction(None, &curve, 0.0, 0.71), 0.0);
    }
}
