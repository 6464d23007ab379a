use std::ops::{Add, Mul, Neg, Sub};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Wrap an angle, in degrees, into the `(-180, 180]` range.
pub fn normalize_axis(angle: f32) -> f32 {
    let angle = angle.rem_euclid(360.0);
    if 180.0 < angle {
        angle - 360.0
    } else {
        angle
    }
}

/// An orientation expressed as Euler angles in degrees.
///
/// The angles are applied in yaw-pitch-roll order, where yaw is a rotation around the up (Y) axis,
/// pitch is a rotation around the right (X) axis and roll is a rotation around the back (Z) axis.
/// A zero rotator faces the negative Z direction, and a positive yaw turns it to the left
/// (counter-clockwise when viewed from above).
///
/// Angles are kept as degrees and are not wrapped automatically, which makes it possible to
/// interpolate them per axis and to compare yaw values across frames.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
    };

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub const fn from_yaw(yaw: f32) -> Self {
        Self {
            pitch: 0.0,
            yaw,
            roll: 0.0,
        }
    }

    pub fn from_quat(rotation: Quat) -> Self {
        let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
        Self {
            pitch: pitch.to_degrees(),
            yaw: yaw.to_degrees(),
            roll: roll.to_degrees(),
        }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }

    /// The rotator that faces along `direction`, with no roll.
    ///
    /// A zero vector yields [`Rotator::ZERO`].
    pub fn from_direction(direction: Vec3) -> Self {
        if direction == Vec3::ZERO {
            return Self::ZERO;
        }
        let horizontal = Vec2::new(direction.x, direction.z).length();
        Self {
            pitch: direction.y.atan2(horizontal).to_degrees(),
            yaw: (-direction.x).atan2(-direction.z).to_degrees(),
            roll: 0.0,
        }
    }

    /// Same rotator with only the yaw kept.
    pub fn yaw_only(self) -> Self {
        Self::from_yaw(self.yaw)
    }

    /// Wrap every axis into `(-180, 180]`.
    pub fn normalized(self) -> Self {
        Self {
            pitch: normalize_axis(self.pitch),
            yaw: normalize_axis(self.yaw),
            roll: normalize_axis(self.roll),
        }
    }

    /// The per-axis shortest difference `self - other`.
    pub fn delta(self, other: Self) -> Self {
        (self - other).normalized()
    }

    pub fn is_nearly_zero(self, tolerance: f32) -> bool {
        normalize_axis(self.pitch).abs() <= tolerance
            && normalize_axis(self.yaw).abs() <= tolerance
            && normalize_axis(self.roll).abs() <= tolerance
    }

    pub fn rotate_vector(self, vector: Vec3) -> Vec3 {
        self.to_quat() * vector
    }

    pub fn unrotate_vector(self, vector: Vec3) -> Vec3 {
        self.to_quat().inverse() * vector
    }

    /// The direction this rotator faces.
    pub fn forward(self) -> Vec3 {
        self.rotate_vector(Vec3::NEG_Z)
    }
}

impl Add for Rotator {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            pitch: self.pitch + rhs.pitch,
            yaw: self.yaw + rhs.yaw,
            roll: self.roll + rhs.roll,
        }
    }
}

impl Sub for Rotator {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            pitch: self.pitch - rhs.pitch,
            yaw: self.yaw - rhs.yaw,
            roll: self.roll - rhs.roll,
        }
    }
}

impl Mul<f32> for Rotator {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self {
            pitch: self.pitch * rhs,
            yaw: self.yaw * rhs,
            roll: self.roll * rhs,
        }
    }
}

impl Neg for Rotator {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            pitch: -self.pitch,
            yaw: -self.yaw,
            roll: -self.roll,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_normalize_axis() {
        assert_eq!(normalize_axis(0.0), 0.0);
        assert_eq!(normalize_axis(180.0), 180.0);
        assert_eq!(normalize_axis(-180.0), 180.0);
        assert_eq!(normalize_axis(190.0), -170.0);
        assert_eq!(normalize_axis(-190.0), 170.0);
        assert_eq!(normalize_axis(720.0 + 45.0), 45.0);
    }

    #[test]
    fn test_delta_crosses_seam() {
        let delta = Rotator::from_yaw(-170.0).delta(Rotator::from_yaw(170.0));
        assert_relative_eq!(delta.yaw, 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_direction_round_trip() {
        let direction = Vec3::new(-1.0, 0.5, -2.0).normalize();
        let rotator = Rotator::from_direction(direction);
        let back = rotator.forward();
        assert_relative_eq!(back.x, direction.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, direction.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, direction.z, epsilon = 1e-5);
    }

    #[test]
    fn test_positive_yaw_turns_left() {
        assert_relative_eq!(Rotator::from_direction(Vec3::NEG_X).yaw, 90.0, epsilon = 1e-4);
        assert_relative_eq!(Rotator::from_direction(Vec3::X).yaw, -90.0, epsilon = 1e-4);
        assert_relative_eq!(Rotator::from_direction(Vec3::NEG_Z).yaw, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_quat_round_trip() {
        let rotator = Rotator::new(20.0, -135.0, 5.0);
        let back = Rotator::from_quat(rotator.to_quat());
        assert_relative_eq!(back.pitch, rotator.pitch, epsilon = 1e-3);
        assert_relative_eq!(back.yaw, rotator.yaw, epsilon = 1e-3);
        assert_relative_eq!(back.roll, rotator.roll, epsilon = 1e-3);
    }
}
