//! Frame-rate aware interpolation helpers.
//!
//! These all take the frame duration and a speed, and move a fraction `speed * frame_duration`
//! (clamped to 1) of the remaining distance. They converge exponentially and never overshoot.

use bevy::prelude::*;

use super::rotator::Rotator;

const SMALL_NUMBER: f32 = 1.0e-8;
const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

pub fn f_interp_to(current: f32, target: f32, frame_duration: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let dist = target - current;
    if dist * dist < SMALL_NUMBER {
        return target;
    }
    current + dist * (frame_duration * speed).clamp(0.0, 1.0)
}

pub fn v_interp_to(current: Vec3, target: Vec3, frame_duration: f32, speed: f32) -> Vec3 {
    if speed <= 0.0 {
        return target;
    }
    let dist = target - current;
    if dist.length_squared() < KINDA_SMALL_NUMBER {
        return target;
    }
    current + dist * (frame_duration * speed).clamp(0.0, 1.0)
}

/// Exponentially chase `target`, taking the shortest way around on every axis.
pub fn r_interp_to(current: Rotator, target: Rotator, frame_duration: f32, speed: f32) -> Rotator {
    if frame_duration == 0.0 || current == target {
        return current;
    }
    if speed <= 0.0 {
        return target;
    }
    let delta = target.delta(current);
    if delta.is_nearly_zero(KINDA_SMALL_NUMBER) {
        return target;
    }
    (current + delta * (speed * frame_duration).clamp(0.0, 1.0)).normalized()
}

/// Chase `target` at a constant angular speed (degrees per second) on every axis.
pub fn r_interp_to_constant(
    current: Rotator,
    target: Rotator,
    frame_duration: f32,
    speed: f32,
) -> Rotator {
    if frame_duration == 0.0 || current == target {
        return current;
    }
    if speed <= 0.0 {
        return target;
    }
    let max_step = speed * frame_duration;
    let delta = target.delta(current);
    Rotator {
        pitch: current.pitch + delta.pitch.clamp(-max_step, max_step),
        yaw: current.yaw + delta.yaw.clamp(-max_step, max_step),
        roll: current.roll + delta.roll.clamp(-max_step, max_step),
    }
    .normalized()
}

/// Map `value` from `[in_a, in_b]` to `[out_a, out_b]`, clamping to the output range.
///
/// A degenerate input range maps everything at or above `in_b` to `out_b` and everything below it
/// to `out_a`.
pub fn map_range_clamped(value: f32, in_a: f32, in_b: f32, out_a: f32, out_b: f32) -> f32 {
    let divisor = in_b - in_a;
    let pct = if divisor.abs() <= SMALL_NUMBER {
        if in_b <= value {
            1.0
        } else {
            0.0
        }
    } else {
        (value - in_a) / divisor
    };
    lerp(out_a, out_b, pct.clamp(0.0, 1.0))
}

/// Unclamped linear interpolation.
pub fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
    a + alpha * (b - a)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_f_interp_to() {
        assert_relative_eq!(f_interp_to(0.0, 10.0, 0.1, 5.0), 5.0);
        assert_relative_eq!(f_interp_to(0.0, 10.0, 1.0, 5.0), 10.0);
        assert_eq!(f_interp_to(3.0, 10.0, 0.1, 0.0), 10.0);
        assert_eq!(f_interp_to(10.0 - 1.0e-5, 10.0, 0.1, 1.0), 10.0);
    }

    #[test]
    fn test_v_interp_to_snaps_when_close() {
        let target = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v_interp_to(target + Vec3::X * 0.001, target, 0.01, 1.0), target);
        let halfway = v_interp_to(Vec3::ZERO, target, 0.5, 1.0);
        assert_relative_eq!(halfway.z, 1.5);
    }

    #[test]
    fn test_r_interp_to_takes_short_way() {
        let result = r_interp_to(
            Rotator::from_yaw(170.0),
            Rotator::from_yaw(-170.0),
            0.25,
            2.0,
        );
        assert_relative_eq!(result.yaw, 180.0, epsilon = 1e-4);
    }

    #[test]
    fn test_r_interp_to_zero_frame() {
        let current = Rotator::from_yaw(10.0);
        assert_eq!(
            r_interp_to(current, Rotator::from_yaw(50.0), 0.0, 0.0),
            current
        );
    }

    #[test]
    fn test_r_interp_to_constant() {
        let result = r_interp_to_constant(Rotator::ZERO, Rotator::from_yaw(90.0), 0.1, 500.0);
        assert_relative_eq!(result.yaw, 50.0, epsilon = 1e-4);
        let result = r_interp_to_constant(Rotator::ZERO, Rotator::from_yaw(-30.0), 0.1, 500.0);
        assert_relative_eq!(result.yaw, -30.0, epsilon = 1e-4);
        let snapped = r_interp_to_constant(Rotator::ZERO, Rotator::from_yaw(120.0), 0.1, 0.0);
        assert_eq!(snapped, Rotator::from_yaw(120.0));
    }

    #[test]
    fn test_map_range_clamped() {
        assert_relative_eq!(map_range_clamped(180.0, 90.0, 270.0, 1.0, 3.0), 2.0);
        assert_relative_eq!(map_range_clamped(0.0, 90.0, 270.0, 1.0, 3.0), 1.0);
        assert_relative_eq!(map_range_clamped(1000.0, 90.0, 270.0, 1.0, 3.0), 3.0);
        assert_relative_eq!(map_range_clamped(-2000.0, 0.0, -4000.0, 50.0, 2000.0), 1025.0);
        assert_relative_eq!(map_range_clamped(5.0, 5.0, 5.0, 0.0, 1.0), 1.0);
        assert_relative_eq!(map_range_clamped(4.0, 5.0, 5.0, 0.0, 1.0), 0.0);
    }
}
