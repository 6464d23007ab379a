use bevy::prelude::*;

/// Allows disabling the locomotion pipeline for a specific entity.
///
/// This can be used to let some other system temporarily take control over a character.
///
/// This component is not mandatory - if omitted, the pipeline will just assume it is enabled for
/// that entity.
#[derive(Component, Default, Debug, PartialEq, Eq, Clone, Copy)]
pub enum LocoToggle {
    /// Do not update the sensors, and do not run the locomotion logic.
    ///
    /// All the state components retain their last value from before `LocoToggle::Disabled` was
    /// set.
    Disabled,
    /// Update the sensors and the locomotion state, but do not rotate the character.
    ///
    /// Animation parameters and foot IK are still computed, so the character keeps animating
    /// while some other system decides where it faces.
    SenseOnly,
    #[default]
    /// The backend behaves normally - it updates the sensors and the logic rotates the character.
    Enabled,
}

/// Newtonian state of the rigid body.
///
/// The physics backend is responsible for updating this component from the physics engine during
/// [`LocoPipelineSystems::Sensors`](crate::LocoPipelineSystems::Sensors).
#[derive(Component, Debug, Clone)]
pub struct LocoRigidBodyTracker {
    pub translation: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

impl Default for LocoRigidBodyTracker {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
        }
    }
}

/// A pair of values, one for each foot.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LocoFeet<T> {
    pub left: T,
    pub right: T,
}

impl<T> LocoFeet<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn as_ref(&self) -> LocoFeet<&T> {
        LocoFeet {
            left: &self.left,
            right: &self.right,
        }
    }

    pub fn as_mut(&mut self) -> LocoFeet<&mut T> {
        LocoFeet {
            left: &mut self.left,
            right: &mut self.right,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> LocoFeet<U> {
        LocoFeet {
            left: f(self.left),
            right: f(self.right),
        }
    }

    pub fn zip<U>(self, other: LocoFeet<U>) -> LocoFeet<(T, U)> {
        LocoFeet {
            left: (self.left, other.left),
            right: (self.right, other.right),
        }
    }
}

impl<T> IntoIterator for LocoFeet<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, 2>;

    fn into_iter(self) -> Self::IntoIter {
        [self.left, self.right].into_iter()
    }
}

/// The shape that gets swept along a [`LocoCastRequest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocoCastShape {
    Ray,
    Sphere {
        radius: f32,
    },
    /// An upright capsule. `half_height` is measured from the center to the tip of a hemisphere.
    Capsule {
        radius: f32,
        half_height: f32,
    },
}

/// A cast the logic wants the physics backend to perform.
///
/// All the values are in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocoCastRequest {
    pub origin: Vec3,
    pub direction: Dir3,
    pub range: f32,
    pub shape: LocoCastShape,
    /// An entity the cast must not hit - usually the character itself.
    pub ignore: Option<Entity>,
}

impl LocoCastRequest {
    /// A request that sweeps `shape` from `start` to `end`.
    ///
    /// Returns `None` if the two points are too close to determine a direction.
    pub fn between(start: Vec3, end: Vec3, shape: LocoCastShape) -> Option<Self> {
        let (direction, range) = Dir3::new_and_length(end - start).ok()?;
        Some(Self {
            origin: start,
            direction,
            range,
            shape,
            ignore: None,
        })
    }

    pub fn ignoring(self, entity: Entity) -> Self {
        Self {
            ignore: Some(entity),
            ..self
        }
    }

    /// Where the cast ends if it does not hit anything.
    pub fn end(&self) -> Vec3 {
        self.origin + self.range * *self.direction
    }
}

/// Information on the collider a cast has detected.
#[derive(Debug, Clone)]
pub struct LocoSensorHit {
    /// The entity of the collider detected by the cast.
    pub entity: Entity,
    /// The distance traveled along the cast direction before the hit.
    pub distance: f32,
    /// `distance` divided by the range of the cast - `0.0` at the origin, `1.0` at the end.
    pub fraction: f32,
    /// Where the origin of the cast shape was when the hit occured.
    pub location: Vec3,
    /// The point of contact on the detected collider's surface.
    pub impact_point: Vec3,
    /// The normal of the detected collider's surface at the point of contact.
    pub normal: Dir3,
    /// The cast shape was already overlapping the collider at the origin of the cast.
    pub start_penetrating: bool,
}

impl LocoSensorHit {
    /// Whether a character can stand on the surface that was hit.
    ///
    /// `min_up_dot` is the cosine of the steepest walkable slope.
    pub fn is_walkable(&self, up: Dir3, min_up_dot: f32) -> bool {
        min_up_dot <= self.normal.dot(*up)
    }
}

/// A single cast slot: the logic writes the request and the backend writes the output.
///
/// Because the logic runs after the sensors, the output the logic reads in a frame belongs to the
/// request it wrote in the previous frame.
#[derive(Debug, Clone, Default)]
pub struct LocoCast {
    pub request: Option<LocoCastRequest>,
    pub output: Option<LocoSensorHit>,
}

impl LocoCast {
    /// Replace the request. Clearing the request also clears the output.
    pub fn set_request(&mut self, request: Option<LocoCastRequest>) {
        if request.is_none() {
            self.output = None;
        }
        self.request = request;
    }
}

/// Detects the ground under the character.
///
/// The physics backend casts a ray from the entity's position (offset by `cast_origin`, in the
/// entity's coord system) in `cast_direction` (world space) during
/// [`LocoPipelineSystems::Sensors`](crate::LocoPipelineSystems::Sensors). The locomotion logic
/// updates `cast_range` according to its configuration.
#[derive(Component, Debug, Clone)]
pub struct LocoGroundSensor {
    pub cast_origin: Vec3,
    pub cast_direction: Dir3,
    pub cast_range: f32,
    pub output: Option<LocoSensorHit>,
}

impl Default for LocoGroundSensor {
    fn default() -> Self {
        Self {
            cast_origin: Vec3::ZERO,
            cast_direction: Dir3::NEG_Y,
            cast_range: 0.0,
            output: None,
        }
    }
}

/// Downward traces under each foot, used for placing the feet on uneven ground.
#[derive(Component, Debug, Clone, Default)]
pub struct LocoFootProbes(pub LocoFeet<LocoCast>);

/// A sweep of the character's capsule along its fall direction, used for predicting landings.
#[derive(Component, Debug, Clone, Default)]
pub struct LocoLandingProbe(pub LocoCast);

/// A sweep between the character and the camera, used for pulling the camera in front of
/// obstacles.
#[derive(Component, Debug, Clone, Default)]
pub struct LocoCameraProbe(pub LocoCast);
