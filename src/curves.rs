use std::ops::{Add, Mul, Sub};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::LocoConfigError;

/// A value that can be interpolated between curve keys.
pub trait LocoCurveValue:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    fn is_finite_value(&self) -> bool;
}

impl LocoCurveValue for f32 {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

impl LocoCurveValue for Vec3 {
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }
}

/// A piecewise-linear response curve.
///
/// The keys are `(time, value)` pairs sorted by time. Sampling before the first key or after the
/// last key returns the value of that key.
///
/// In RON the curve is written as a plain list of pairs, e.g. `[(0.0, 1.0), (3.0, 2.5)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocoKeyedCurve<T> {
    pub keys: Vec<(f32, T)>,
}

/// A 1-D curve - e.g. a rotation rate keyed by mapped speed.
pub type LocoCurve = LocoKeyedCurve<f32>;

/// A 3-D curve - e.g. acceleration, braking deceleration and ground friction keyed by mapped speed.
pub type LocoVectorCurve = LocoKeyedCurve<Vec3>;

impl<T: LocoCurveValue> LocoKeyedCurve<T> {
    pub fn new(keys: impl IntoIterator<Item = (f32, T)>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// A curve that returns `value` everywhere.
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![(0.0, value)],
        }
    }

    /// Check that the curve can be sampled.
    ///
    /// `name` is only used for the error message.
    pub fn validate(&self, name: &str) -> Result<(), LocoConfigError> {
        if self.keys.is_empty() {
            return Err(LocoConfigError::EmptyCurve {
                curve: name.to_owned(),
            });
        }
        for (index, (time, value)) in self.keys.iter().enumerate() {
            if !time.is_finite() || !value.is_finite_value() {
                return Err(LocoConfigError::NonFiniteCurve {
                    curve: name.to_owned(),
                    index,
                });
            }
        }
        if let Some(index) = self
            .keys
            .windows(2)
            .position(|pair| pair[1].0 <= pair[0].0)
        {
            return Err(LocoConfigError::UnsortedCurve {
                curve: name.to_owned(),
                index: index + 1,
            });
        }
        Ok(())
    }

    /// Sample the curve at `time`.
    ///
    /// An empty curve samples as `fallback`. Validated curves are never empty.
    pub fn sample_or(&self, time: f32, fallback: T) -> T {
        let Some(&(first_time, first_value)) = self.keys.first() else {
            return fallback;
        };
        if time <= first_time {
            return first_value;
        }
        let next_index = self.keys.partition_point(|&(key_time, _)| key_time <= time);
        let Some(&(next_time, next_value)) = self.keys.get(next_index) else {
            return self.keys[next_index - 1].1;
        };
        let (prev_time, prev_value) = self.keys[next_index - 1];
        let alpha = (time - prev_time) / (next_time - prev_time);
        prev_value + (next_value - prev_value) * alpha
    }

    /// Stretch the time axis by `factor`.
    pub fn with_scaled_time(&self, factor: f32) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .map(|&(time, value)| (time * factor, value))
                .collect(),
        }
    }

    /// Apply `f` to every key's value.
    pub fn with_mapped_values(&self, f: impl Fn(T) -> T) -> Self {
        Self {
            keys: self.keys.iter().map(|&(time, value)| (time, f(value))).collect(),
        }
    }
}

impl LocoCurve {
    pub fn sample(&self, time: f32) -> f32 {
        self.sample_or(time, 0.0)
    }
}

impl LocoVectorCurve {
    pub fn sample(&self, time: f32) -> Vec3 {
        self.sample_or(time, Vec3::ZERO)
    }
}
