use bevy::prelude::*;
use bevy_rapier3d::parry;
use bevy_rapier3d::prelude::*;

use bevy_locomotion_physics_integration_layer::data_for_backends::{
    LocoCast, LocoCastRequest, LocoCastShape, LocoSensorHit,
};

#[derive(bevy::ecs::query::QueryData)]
pub struct PretendToBeRapierContext<'a> {
    pub simulation: &'a RapierContextSimulation,
    pub colliders: &'a RapierContextColliders,
    pub rigidbody_set: &'a RapierRigidBodySet,
}

// TODO: After https://github.com/dimforge/bevy_rapier/issues/677 is fixed, this can be reomved.
impl PretendToBeRapierContextItem<'_, '_> {
    pub fn with_query_pipeline<'a, T>(
        &'a self,
        filter: QueryFilter<'a>,
        scoped_fn: impl FnOnce(RapierQueryPipeline<'_>) -> T,
    ) -> T {
        RapierQueryPipeline::new_scoped(
            &self.simulation.broad_phase,
            self.colliders,
            self.rigidbody_set,
            &filter,
            &bevy_rapier3d::parry::query::DefaultQueryDispatcher,
            scoped_fn,
        )
    }

    /// Perform the cast's request (if there is one) and store the result in its output.
    pub fn perform_cast(&self, cast: &mut LocoCast) {
        cast.output = cast
            .request
            .as_ref()
            .and_then(|request| self.cast_request(request));
    }

    pub fn cast_request(&self, request: &LocoCastRequest) -> Option<LocoSensorHit> {
        let mut filter = QueryFilter::new().exclude_sensors();
        if let Some(ignore) = request.ignore {
            filter = filter.exclude_rigid_body(ignore).exclude_collider(ignore);
        }
        let direction = request.direction;
        self.with_query_pipeline(filter, |query_pipeline| match request.shape {
            LocoCastShape::Ray => query_pipeline
                .cast_ray_and_get_normal(request.origin, *direction, request.range, true)
                .map(|(entity, hit)| LocoSensorHit {
                    entity,
                    distance: hit.time_of_impact,
                    fraction: fraction(hit.time_of_impact, request.range),
                    location: request.origin + hit.time_of_impact * *direction,
                    impact_point: hit.point,
                    normal: Dir3::new(hit.normal).unwrap_or(-direction),
                    start_penetrating: hit.time_of_impact <= 0.0,
                }),
            LocoCastShape::Sphere { radius } => {
                cast_shape(&query_pipeline, request, &parry::shape::Ball::new(radius))
            }
            LocoCastShape::Capsule {
                radius,
                half_height,
            } => cast_shape(
                &query_pipeline,
                request,
                &parry::shape::Capsule::new_y((half_height - radius).max(0.0), radius),
            ),
        })
    }
}

fn fraction(distance: f32, range: f32) -> f32 {
    if 0.0 < range {
        distance / range
    } else {
        0.0
    }
}

fn cast_shape(
    query_pipeline: &RapierQueryPipeline<'_>,
    request: &LocoCastRequest,
    shape: &dyn parry::shape::Shape,
) -> Option<LocoSensorHit> {
    let direction = request.direction;
    let (entity, hit) = query_pipeline.cast_shape(
        request.origin,
        Quat::IDENTITY,
        *direction,
        shape,
        ShapeCastOptions {
            max_time_of_impact: request.range,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        },
    )?;
    let details = hit.details?;
    Some(LocoSensorHit {
        entity,
        distance: hit.time_of_impact,
        fraction: fraction(hit.time_of_impact, request.range),
        location: request.origin + hit.time_of_impact * *direction,
        impact_point: details.witness1,
        normal: Dir3::new(details.normal1).unwrap_or(-direction),
        start_penetrating: hit.time_of_impact <= 0.0,
    })
}
