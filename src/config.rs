use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::curves::{LocoCurve, LocoVectorCurve};
use crate::states::{LocoGait, LocoRotationMode, LocoStance};

/// A [`LocoConfig`] that cannot be used.
#[derive(thiserror::Error, Debug)]
pub enum LocoConfigError {
    #[error("curve `{curve}` has no keys")]
    EmptyCurve { curve: String },
    #[error("curve `{curve}` is not sorted by time at key {index}")]
    UnsortedCurve { curve: String, index: usize },
    #[error("curve `{curve}` has a non-finite value at key {index}")]
    NonFiniteCurve { curve: String, index: usize },
    #[error(
        "movement settings `{row}` must satisfy 0 < walk <= run <= sprint, got {walk}, {run}, {sprint}"
    )]
    InconsistentSpeeds {
        row: String,
        walk: f32,
        run: f32,
        sprint: f32,
    },
    #[error("`{name}` must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("`{name}` must not be negative, got {value}")]
    Negative { name: String, value: f32 },
    #[error("capsule radius {radius} does not fit in half height {half_height}")]
    InvalidCapsule { radius: f32, half_height: f32 },
}

/// Failure of [`LocoConfigLoader`].
#[derive(thiserror::Error, Debug)]
pub enum LocoConfigLoadError {
    #[error("could not read locomotion config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse locomotion config: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid locomotion config: {0}")]
    Invalid(#[from] LocoConfigError),
}

/// All the designer data of a locomotion character.
///
/// The defaults are authored in centimeters (and centimeters per second). Use
/// [`LocoConfig::scaled`] to convert them to other units - e.g. `LocoConfig::default().scaled(0.01)`
/// for meters.
#[derive(Asset, TypePath, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoConfig {
    pub movement: LocoMovementModel,
    pub camera: LocoCameraModel,
    pub blend: LocoBlendConfig,
    pub foot_ik: LocoFootIkConfig,
    pub tuning: LocoTuning,
    pub capsule: LocoCapsule,
}

impl LocoConfig {
    /// Check the invariants that the per-frame code relies on.
    pub fn validate(&self) -> Result<(), LocoConfigError> {
        self.movement.validate()?;
        self.blend.validate()?;
        self.camera.validate()?;
        if !(0.0 < self.capsule.radius && self.capsule.radius <= self.capsule.half_height) {
            return Err(LocoConfigError::InvalidCapsule {
                radius: self.capsule.radius,
                half_height: self.capsule.half_height,
            });
        }
        Ok(())
    }

    /// Convert every distance and speed in the config by multiplying it by `factor`.
    ///
    /// Angles, rates and weights are left untouched.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            movement: self.movement.scaled(factor),
            camera: self.camera.scaled(factor),
            blend: self.blend.scaled(factor),
            foot_ik: self.foot_ik.scaled(factor),
            tuning: self.tuning.scaled(factor),
            capsule: LocoCapsule {
                radius: self.capsule.radius * factor,
                half_height: self.capsule.half_height * factor,
            },
        }
    }
}

/// Loads [`LocoConfig`] assets from `*.loco.ron` files.
///
/// The config is validated while loading, so an invalid file fails to load instead of reaching
/// the character.
#[derive(Default)]
pub struct LocoConfigLoader;

impl AssetLoader for LocoConfigLoader {
    type Asset = LocoConfig;
    type Settings = ();
    type Error = LocoConfigLoadError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &(),
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        let config: LocoConfig = ron::de::from_bytes(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    fn extensions(&self) -> &[&str] {
        &["loco.ron"]
    }
}

/// Speeds and response curves for one rotation mode and stance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocoMovementSettings {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub sprint_speed: f32,

    /// Grounded rotation rate, keyed by mapped speed (0 = stopped, 1 = walk, 2 = run, 3 = sprint).
    pub rotation_rate_curve: LocoCurve,

    /// Max acceleration (x), braking deceleration (y) and ground friction (z), keyed by mapped
    /// speed.
    pub movement_curve: LocoVectorCurve,
}

impl LocoMovementSettings {
    fn standing(walk_speed: f32, run_speed: f32, sprint_speed: f32) -> Self {
        Self {
            walk_speed,
            run_speed,
            sprint_speed,
            rotation_rate_curve: LocoCurve::new([(0.0, 5.0), (1.0, 8.0), (2.0, 12.0), (3.0, 20.0)]),
            movement_curve: LocoVectorCurve::new([
                (0.0, Vec3::new(800.0, 800.0, 8.0)),
                (1.0, Vec3::new(800.0, 800.0, 8.0)),
                (2.0, Vec3::new(1000.0, 800.0, 6.0)),
                (3.0, Vec3::new(1400.0, 600.0, 4.0)),
            ]),
        }
    }

    fn crouching() -> Self {
        Self {
            walk_speed: 150.0,
            run_speed: 200.0,
            sprint_speed: 300.0,
            rotation_rate_curve: LocoCurve::new([(0.0, 5.0), (1.0, 6.0), (2.0, 8.0), (3.0, 10.0)]),
            movement_curve: LocoVectorCurve::new([
                (0.0, Vec3::new(600.0, 800.0, 8.0)),
                (3.0, Vec3::new(800.0, 800.0, 8.0)),
            ]),
        }
    }

    pub fn speed_for(&self, gait: LocoGait) -> f32 {
        match gait {
            LocoGait::Walking => self.walk_speed,
            LocoGait::Running => self.run_speed,
            LocoGait::Sprinting => self.sprint_speed,
        }
    }

    fn validate(&self, row: &str) -> Result<(), LocoConfigError> {
        if !(0.0 < self.walk_speed
            && self.walk_speed <= self.run_speed
            && self.run_speed <= self.sprint_speed)
        {
            return Err(LocoConfigError::InconsistentSpeeds {
                row: row.to_owned(),
                walk: self.walk_speed,
                run: self.run_speed,
                sprint: self.sprint_speed,
            });
        }
        self.rotation_rate_curve
            .validate(&format!("{row}.rotation_rate_curve"))?;
        self.movement_curve
            .validate(&format!("{row}.movement_curve"))?;
        Ok(())
    }

    fn scaled(&self, factor: f32) -> Self {
        Self {
            walk_speed: self.walk_speed * factor,
            run_speed: self.run_speed * factor,
            sprint_speed: self.sprint_speed * factor,
            rotation_rate_curve: self.rotation_rate_curve.clone(),
            movement_curve: self
                .movement_curve
                .with_mapped_values(|value| Vec3::new(value.x * factor, value.y * factor, value.z)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocoMovementSettingsStance {
    pub standing: LocoMovementSettings,
    pub crouching: LocoMovementSettings,
}

impl LocoMovementSettingsStance {
    pub fn for_stance(&self, stance: LocoStance) -> &LocoMovementSettings {
        match stance {
            LocoStance::Standing => &self.standing,
            LocoStance::Crouching => &self.crouching,
        }
    }
}

/// Movement settings for every rotation mode and stance, plus the rotation policy constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoMovementModel {
    pub velocity: LocoMovementSettingsStance,
    pub looking: LocoMovementSettingsStance,
    pub aiming: LocoMovementSettingsStance,

    /// How fast (degrees per second) the target rotation moves toward the goal in
    /// [`LocoRotationMode::Velocity`].
    pub velocity_target_speed: f32,
    /// How fast (degrees per second) the target rotation moves toward the goal in
    /// [`LocoRotationMode::Looking`].
    pub looking_target_speed: f32,
    /// How fast (degrees per second) the target rotation moves toward the goal in
    /// [`LocoRotationMode::Aiming`].
    pub aiming_target_speed: f32,

    /// How far (degrees) the actor may drift from the control yaw when aiming while standing
    /// still.
    pub aiming_yaw_limit: f32,
    /// How fast the actor catches up once it drifts past `aiming_yaw_limit`.
    pub aiming_yaw_limit_speed: f32,

    /// The aim yaw rate range (degrees per second) that boosts the grounded rotation rate.
    pub aim_yaw_rate_boost_range: [f32; 2],
    /// The rotation rate multiplier at the ends of `aim_yaw_rate_boost_range`.
    pub aim_yaw_rate_boost: [f32; 2],

    /// Sprinting requires more than this movement input amount.
    pub sprint_min_input_amount: f32,
    /// While looking, sprinting requires the input direction to be within this angle (degrees)
    /// of the control yaw.
    pub sprint_max_input_angle: f32,
}

impl Default for LocoMovementModel {
    fn default() -> Self {
        Self {
            velocity: LocoMovementSettingsStance {
                standing: LocoMovementSettings::standing(165.0, 350.0, 600.0),
                crouching: LocoMovementSettings::crouching(),
            },
            looking: LocoMovementSettingsStance {
                standing: LocoMovementSettings::standing(165.0, 350.0, 600.0),
                crouching: LocoMovementSettings::crouching(),
            },
            aiming: LocoMovementSettingsStance {
                standing: LocoMovementSettings::standing(165.0, 350.0, 350.0),
                crouching: LocoMovementSettings::crouching(),
            },
            velocity_target_speed: 800.0,
            looking_target_speed: 500.0,
            aiming_target_speed: 1000.0,
            aiming_yaw_limit: 100.0,
            aiming_yaw_limit_speed: 20.0,
            aim_yaw_rate_boost_range: [90.0, 270.0],
            aim_yaw_rate_boost: [1.0, 3.0],
            sprint_min_input_amount: 0.9,
            sprint_max_input_angle: 50.0,
        }
    }
}

impl LocoMovementModel {
    pub fn settings(&self, rotation_mode: LocoRotationMode, stance: LocoStance) -> &LocoMovementSettings {
        match rotation_mode {
            LocoRotationMode::Velocity => self.velocity.for_stance(stance),
            LocoRotationMode::Looking => self.looking.for_stance(stance),
            LocoRotationMode::Aiming => self.aiming.for_stance(stance),
        }
    }

    fn rows(&self) -> [(&'static str, &LocoMovementSettings); 6] {
        [
            ("velocity.standing", &self.velocity.standing),
            ("velocity.crouching", &self.velocity.crouching),
            ("looking.standing", &self.looking.standing),
            ("looking.crouching", &self.looking.crouching),
            ("aiming.standing", &self.aiming.standing),
            ("aiming.crouching", &self.aiming.crouching),
        ]
    }

    fn validate(&self) -> Result<(), LocoConfigError> {
        for (row, settings) in self.rows() {
            settings.validate(row)?;
        }
        Ok(())
    }

    fn scaled(&self, factor: f32) -> Self {
        let scale_stance = |stance: &LocoMovementSettingsStance| LocoMovementSettingsStance {
            standing: stance.standing.scaled(factor),
            crouching: stance.crouching.scaled(factor),
        };
        Self {
            velocity: scale_stance(&self.velocity),
            looking: scale_stance(&self.looking),
            aiming: scale_stance(&self.aiming),
            ..self.clone()
        }
    }
}

/// One row of the camera settings table.
///
/// Offsets are in the local axes of the rotation they are applied with: x is right, y is up and z
/// is back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocoCameraSettings {
    /// Camera location relative to the pivot, rotated by the camera rotation.
    pub camera_offset: Vec3,
    /// Pivot location relative to the smoothed pivot target, rotated by the actor rotation.
    pub pivot_offset: Vec3,
    /// How fast the pivot follows the character on each axis of the camera-yaw frame.
    pub pivot_lag_speed: Vec3,
    /// How fast the camera rotation follows the control rotation.
    pub rotation_lag_speed: f32,
    /// How fast the current camera settings blend toward this row once it becomes active.
    pub blend_speed: f32,
}

impl LocoCameraSettings {
    /// Zero speeds are allowed and disable the lag.
    fn validate(&self, row: &str) -> Result<(), LocoConfigError> {
        for (field, value) in [
            ("pivot_lag_speed.x", self.pivot_lag_speed.x),
            ("pivot_lag_speed.y", self.pivot_lag_speed.y),
            ("pivot_lag_speed.z", self.pivot_lag_speed.z),
            ("rotation_lag_speed", self.rotation_lag_speed),
            ("blend_speed", self.blend_speed),
        ] {
            if value < 0.0 {
                return Err(LocoConfigError::Negative {
                    name: format!("{row}.{field}"),
                    value,
                });
            }
        }
        Ok(())
    }

    fn scaled(&self, factor: f32) -> Self {
        Self {
            camera_offset: self.camera_offset * factor,
            pivot_offset: self.pivot_offset * factor,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocoCameraSettingsGait {
    pub walking: LocoCameraSettings,
    pub running: LocoCameraSettings,
    pub sprinting: LocoCameraSettings,
}

impl LocoCameraSettingsGait {
    pub fn for_gait(&self, gait: LocoGait) -> &LocoCameraSettings {
        match gait {
            LocoGait::Walking => &self.walking,
            LocoGait::Running => &self.running,
            LocoGait::Sprinting => &self.sprinting,
        }
    }

    fn validate(&self, stance: &str) -> Result<(), LocoConfigError> {
        self.walking.validate(&format!("{stance}.walking"))?;
        self.running.validate(&format!("{stance}.running"))?;
        self.sprinting.validate(&format!("{stance}.sprinting"))
    }

    fn scaled(&self, factor: f32) -> Self {
        Self {
            walking: self.walking.scaled(factor),
            running: self.running.scaled(factor),
            sprinting: self.sprinting.scaled(factor),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoCameraModel {
    pub standing: LocoCameraSettingsGait,
    pub crouching: LocoCameraSettingsGait,
    /// Radius of the sphere swept from the shoulder to the camera.
    pub trace_radius: f32,
    /// Vertical field of view, in degrees.
    pub field_of_view: f32,
}

impl Default for LocoCameraModel {
    fn default() -> Self {
        let row = |camera_offset: Vec3, pivot_lag_speed: Vec3, blend_speed: f32| {
            LocoCameraSettings {
                camera_offset,
                pivot_offset: Vec3::new(0.0, 10.0, 0.0),
                pivot_lag_speed,
                rotation_lag_speed: 20.0,
                blend_speed,
            }
        };
        Self {
            standing: LocoCameraSettingsGait {
                walking: row(Vec3::new(40.0, 10.0, 300.0), Vec3::new(10.0, 10.0, 15.0), 1.5),
                running: row(Vec3::new(40.0, 10.0, 330.0), Vec3::new(8.0, 8.0, 15.0), 2.0),
                sprinting: row(Vec3::new(30.0, 10.0, 380.0), Vec3::new(6.0, 6.0, 12.0), 0.35),
            },
            crouching: LocoCameraSettingsGait {
                walking: row(Vec3::new(40.0, -10.0, 250.0), Vec3::new(10.0, 10.0, 15.0), 1.5),
                running: row(Vec3::new(40.0, -10.0, 270.0), Vec3::new(8.0, 8.0, 15.0), 1.5),
                sprinting: row(Vec3::new(40.0, -10.0, 270.0), Vec3::new(8.0, 8.0, 15.0), 1.5),
            },
            trace_radius: 15.0,
            field_of_view: 90.0,
        }
    }
}

impl LocoCameraModel {
    pub fn settings(&self, stance: LocoStance, gait: LocoGait) -> &LocoCameraSettings {
        match stance {
            LocoStance::Standing => self.standing.for_gait(gait),
            LocoStance::Crouching => self.crouching.for_gait(gait),
        }
    }

    fn validate(&self) -> Result<(), LocoConfigError> {
        if self.trace_radius <= 0.0 {
            return Err(LocoConfigError::NonPositive {
                name: "camera.trace_radius",
                value: self.trace_radius,
            });
        }
        if self.field_of_view <= 0.0 {
            return Err(LocoConfigError::NonPositive {
                name: "camera.field_of_view",
                value: self.field_of_view,
            });
        }
        self.standing.validate("camera.standing")?;
        self.crouching.validate("camera.crouching")
    }

    fn scaled(&self, factor: f32) -> Self {
        Self {
            standing: self.standing.scaled(factor),
            crouching: self.crouching.scaled(factor),
            trace_radius: self.trace_radius * factor,
            field_of_view: self.field_of_view,
        }
    }
}

/// How the quadrant buffer widens or narrows the angle ranges of the movement direction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocoQuadrantBuffering {
    /// Always widen every range by the buffer. Matches the animation content this crate was
    /// tuned against.
    #[default]
    Legacy,
    /// Widen the ranges of the current quadrant pair (forward/backward or right/left) and narrow
    /// the others, so the classification sticks to the current quadrant near the boundaries.
    Hysteresis,
}

/// Boundaries (degrees, positive to the right) between the movement direction quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoQuadrantConfig {
    pub forward_right: f32,
    pub forward_left: f32,
    pub backward_right: f32,
    pub backward_left: f32,
    pub buffer: f32,
    pub buffering: LocoQuadrantBuffering,
}

impl Default for LocoQuadrantConfig {
    fn default() -> Self {
        Self {
            forward_right: 70.0,
            forward_left: -70.0,
            backward_right: 110.0,
            backward_left: -110.0,
            buffer: 5.0,
            buffering: LocoQuadrantBuffering::Legacy,
        }
    }
}

/// When a standing, aiming character rotates in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoRotateInPlaceConfig {
    /// Rotate left when the aiming yaw goes below this angle.
    pub min_threshold: f32,
    /// Rotate right when the aiming yaw goes above this angle.
    pub max_threshold: f32,
    pub aim_yaw_rate_min_range: f32,
    pub aim_yaw_rate_max_range: f32,
    pub min_play_rate: f32,
    pub max_play_rate: f32,
}

impl Default for LocoRotateInPlaceConfig {
    fn default() -> Self {
        Self {
            min_threshold: -50.0,
            max_threshold: 50.0,
            aim_yaw_rate_min_range: 90.0,
            aim_yaw_rate_max_range: 270.0,
            min_play_rate: 1.15,
            max_play_rate: 3.0,
        }
    }
}

/// A turn-in-place animation and how to play it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocoTurnInPlaceAsset {
    /// Identifies the animation for the game's animation graph.
    pub animation: String,
    /// The angle the animation turns by, in degrees (positive to the right).
    pub animated_angle: f32,
    pub play_rate: f32,
    /// Scale the play rate so that the animation covers the actual turn angle.
    pub scale_turn_angle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocoTurnInPlaceAssetSet {
    pub left_90: LocoTurnInPlaceAsset,
    pub right_90: LocoTurnInPlaceAsset,
    pub left_180: LocoTurnInPlaceAsset,
    pub right_180: LocoTurnInPlaceAsset,
}

impl LocoTurnInPlaceAssetSet {
    fn with_prefix(prefix: &str, play_rate: f32) -> Self {
        let asset = |suffix: &str, animated_angle: f32| LocoTurnInPlaceAsset {
            animation: format!("{prefix}_TurnIP_{suffix}"),
            animated_angle,
            play_rate,
            scale_turn_angle: true,
        };
        Self {
            left_90: asset("L90", -90.0),
            right_90: asset("R90", 90.0),
            left_180: asset("L180", -180.0),
            right_180: asset("R180", 180.0),
        }
    }
}

/// When a standing, looking character turns in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoTurnInPlaceConfig {
    /// Only consider turning when the aiming yaw is beyond this angle.
    pub turn_check_min_angle: f32,
    /// Only consider turning while the camera turns slower than this (degrees per second).
    pub aim_yaw_rate_limit: f32,
    /// The delay before turning when the aiming yaw is at `turn_check_min_angle`.
    pub min_angle_delay: f32,
    /// The delay before turning when the aiming yaw is at 180 degrees.
    pub max_angle_delay: f32,
    /// Turns larger than this angle use the 180 degrees animations.
    pub turn_180_threshold: f32,
    pub standing: LocoTurnInPlaceAssetSet,
    pub crouching: LocoTurnInPlaceAssetSet,
}

impl Default for LocoTurnInPlaceConfig {
    fn default() -> Self {
        Self {
            turn_check_min_angle: 45.0,
            aim_yaw_rate_limit: 50.0,
            min_angle_delay: 0.75,
            max_angle_delay: 0.0,
            turn_180_threshold: 130.0,
            standing: LocoTurnInPlaceAssetSet::with_prefix("N", 1.2),
            crouching: LocoTurnInPlaceAssetSet::with_prefix("CLF", 1.2),
        }
    }
}

/// Curves and constants for the animation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoBlendConfig {
    /// Foot IK root scale, keyed by `|forward + backward|` velocity blend.
    pub diagonal_scale_curve: LocoCurve,
    /// Standing walk stride, keyed by speed.
    pub stride_walk_curve: LocoCurve,
    /// Standing run stride, keyed by speed.
    pub stride_run_curve: LocoCurve,
    /// Crouching stride, keyed by speed.
    pub stride_crouch_curve: LocoCurve,
    /// Forward (x) and backward (y) yaw offsets, keyed by the velocity-to-aim angle.
    pub yaw_offset_fb_curve: LocoVectorCurve,
    /// Left (x) and right (y) yaw offsets, keyed by the velocity-to-aim angle.
    pub yaw_offset_lr_curve: LocoVectorCurve,
    /// Landing weight, keyed by the fraction of the landing sweep before the hit.
    pub land_prediction_curve: LocoCurve,

    pub animated_walk_speed: f32,
    pub animated_run_speed: f32,
    pub animated_sprint_speed: f32,
    pub animated_crouch_speed: f32,

    pub smoothed_aiming_rotation_interp_speed: f32,
    pub input_yaw_offset_interp_speed: f32,
    pub velocity_blend_interp_speed: f32,
    pub grounded_lean_interp_speed: f32,

    pub quadrant: LocoQuadrantConfig,
    pub rotate_in_place: LocoRotateInPlaceConfig,
    pub turn_in_place: LocoTurnInPlaceConfig,
}

impl Default for LocoBlendConfig {
    fn default() -> Self {
        Self {
            diagonal_scale_curve: LocoCurve::new([(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]),
            stride_walk_curve: LocoCurve::new([(0.0, 0.2), (150.0, 1.0)]),
            stride_run_curve: LocoCurve::new([(0.0, 0.2), (350.0, 1.0)]),
            stride_crouch_curve: LocoCurve::new([(0.0, 0.2), (150.0, 1.0)]),
            yaw_offset_fb_curve: LocoVectorCurve::new([
                (-180.0, Vec3::new(0.0, 0.0, 0.0)),
                (-90.0, Vec3::new(-20.0, 20.0, 0.0)),
                (0.0, Vec3::new(0.0, 0.0, 0.0)),
                (90.0, Vec3::new(20.0, -20.0, 0.0)),
                (180.0, Vec3::new(0.0, 0.0, 0.0)),
            ]),
            yaw_offset_lr_curve: LocoVectorCurve::new([
                (-180.0, Vec3::new(-30.0, 30.0, 0.0)),
                (-90.0, Vec3::new(0.0, 0.0, 0.0)),
                (0.0, Vec3::new(30.0, -30.0, 0.0)),
                (90.0, Vec3::new(0.0, 0.0, 0.0)),
                (180.0, Vec3::new(-30.0, 30.0, 0.0)),
            ]),
            land_prediction_curve: LocoCurve::new([(0.0, 1.0), (1.0, 0.0)]),
            animated_walk_speed: 150.0,
            animated_run_speed: 350.0,
            animated_sprint_speed: 600.0,
            animated_crouch_speed: 150.0,
            smoothed_aiming_rotation_interp_speed: 10.0,
            input_yaw_offset_interp_speed: 8.0,
            velocity_blend_interp_speed: 12.0,
            grounded_lean_interp_speed: 4.0,
            quadrant: Default::default(),
            rotate_in_place: Default::default(),
            turn_in_place: Default::default(),
        }
    }
}

impl LocoBlendConfig {
    fn validate(&self) -> Result<(), LocoConfigError> {
        self.diagonal_scale_curve.validate("blend.diagonal_scale_curve")?;
        self.stride_walk_curve.validate("blend.stride_walk_curve")?;
        self.stride_run_curve.validate("blend.stride_run_curve")?;
        self.stride_crouch_curve.validate("blend.stride_crouch_curve")?;
        self.yaw_offset_fb_curve.validate("blend.yaw_offset_fb_curve")?;
        self.yaw_offset_lr_curve.validate("blend.yaw_offset_lr_curve")?;
        self.land_prediction_curve
            .validate("blend.land_prediction_curve")?;
        for (name, value) in [
            ("blend.animated_walk_speed", self.animated_walk_speed),
            ("blend.animated_run_speed", self.animated_run_speed),
            ("blend.animated_sprint_speed", self.animated_sprint_speed),
            ("blend.animated_crouch_speed", self.animated_crouch_speed),
        ] {
            if value <= 0.0 {
                return Err(LocoConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }

    fn scaled(&self, factor: f32) -> Self {
        Self {
            stride_walk_curve: self.stride_walk_curve.with_scaled_time(factor),
            stride_run_curve: self.stride_run_curve.with_scaled_time(factor),
            stride_crouch_curve: self.stride_crouch_curve.with_scaled_time(factor),
            animated_walk_speed: self.animated_walk_speed * factor,
            animated_run_speed: self.animated_run_speed * factor,
            animated_sprint_speed: self.animated_sprint_speed * factor,
            animated_crouch_speed: self.animated_crouch_speed * factor,
            ..self.clone()
        }
    }
}

/// Foot placement constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoFootIkConfig {
    /// How far above the floor under the foot the foot trace starts.
    pub trace_distance_above_foot: f32,
    /// How far below the floor under the foot the foot trace ends.
    pub trace_distance_below_foot: f32,
    pub foot_height: f32,
    pub foot_location_interp_speed: f32,
    /// Used instead of `foot_location_interp_speed` when the foot needs to go down.
    pub foot_location_lowering_interp_speed: f32,
    pub foot_rotation_interp_speed: f32,
    pub pelvis_interp_speed: f32,
    /// Used instead of `pelvis_interp_speed` when the pelvis needs to go up.
    pub pelvis_raising_interp_speed: f32,
}

impl Default for LocoFootIkConfig {
    fn default() -> Self {
        Self {
            trace_distance_above_foot: 50.0,
            trace_distance_below_foot: 45.0,
            foot_height: 13.5,
            foot_location_interp_speed: 15.0,
            foot_location_lowering_interp_speed: 30.0,
            foot_rotation_interp_speed: 30.0,
            pelvis_interp_speed: 15.0,
            pelvis_raising_interp_speed: 10.0,
        }
    }
}

impl LocoFootIkConfig {
    fn scaled(&self, factor: f32) -> Self {
        Self {
            trace_distance_above_foot: self.trace_distance_above_foot * factor,
            trace_distance_below_foot: self.trace_distance_below_foot * factor,
            foot_height: self.foot_height * factor,
            ..*self
        }
    }
}

/// Thresholds that depend on the world's units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocoTuning {
    /// The character is considered moving above this horizontal speed.
    pub moving_speed_threshold: f32,
    /// How far above a gait's nominal speed the character must go before the next gait kicks in.
    pub gait_hysteresis: f32,
    /// Above this speed the character counts as moving even without movement input.
    pub rotation_speed_threshold: f32,
    /// Velocities shorter than this are treated as zero when computing directions.
    pub velocity_direction_threshold: f32,
    /// Landings are only predicted when falling faster than this (a negative vertical speed).
    pub land_prediction_min_fall_speed: f32,
    /// The fall speed at which the landing sweep reaches its maximum distance.
    pub land_prediction_max_fall_speed: f32,
    pub land_prediction_min_distance: f32,
    pub land_prediction_max_distance: f32,
    /// Extra distance below the capsule where the ground still counts as supporting it.
    pub ground_probe_slack: f32,
    /// Surfaces whose normal has at least this much upward component can be stood on.
    pub walkable_floor_y: f32,
}

impl Default for LocoTuning {
    fn default() -> Self {
        Self {
            moving_speed_threshold: 1.0,
            gait_hysteresis: 10.0,
            rotation_speed_threshold: 150.0,
            velocity_direction_threshold: 0.1,
            land_prediction_min_fall_speed: -200.0,
            land_prediction_max_fall_speed: -4000.0,
            land_prediction_min_distance: 50.0,
            land_prediction_max_distance: 2000.0,
            ground_probe_slack: 5.0,
            walkable_floor_y: 0.71,
        }
    }
}

impl LocoTuning {
    /// Convert the unit-dependent thresholds by multiplying them by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            moving_speed_threshold: self.moving_speed_threshold * factor,
            gait_hysteresis: self.gait_hysteresis * factor,
            rotation_speed_threshold: self.rotation_speed_threshold * factor,
            velocity_direction_threshold: self.velocity_direction_threshold * factor,
            land_prediction_min_fall_speed: self.land_prediction_min_fall_speed * factor,
            land_prediction_max_fall_speed: self.land_prediction_max_fall_speed * factor,
            land_prediction_min_distance: self.land_prediction_min_distance * factor,
            land_prediction_max_distance: self.land_prediction_max_distance * factor,
            ground_probe_slack: self.ground_probe_slack * factor,
            walkable_floor_y: self.walkable_floor_y,
        }
    }
}

/// The character's collision capsule, used for the ground probe and the landing sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocoCapsule {
    pub radius: f32,
    /// Distance from the center of the capsule to the tip of either hemisphere.
    pub half_height: f32,
}

impl Default for LocoCapsule {
    fn default() -> Self {
        Self {
            radius: 35.0,
            half_height: 90.0,
        }
    }
}
