use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use bevy_locomotion::config::LocoCapsule;
use bevy_locomotion::prelude::*;
use bevy_locomotion::{
    LocoCameraRig, LocoFootIk, LocoFootProbes, LocoGroundSensor, LocoLandingProbe,
    LocoMovementState, LocoRigidBodyTracker, LocoSensorHit,
};

/// Stands in for a physics backend: the body moves at a fixed velocity and the ground is
/// either right under it or nowhere.
#[derive(Component)]
struct FakeBody {
    velocity: Vec3,
    on_ground: bool,
}

fn fake_backend_system(
    mut query: Query<(
        Entity,
        &Transform,
        &FakeBody,
        &mut LocoRigidBodyTracker,
        &mut LocoGroundSensor,
    )>,
) {
    for (entity, transform, body, mut tracker, mut sensor) in query.iter_mut() {
        *tracker = LocoRigidBodyTracker {
            translation: transform.translation,
            rotation: transform.rotation,
            velocity: body.velocity,
        };
        sensor.output = body.on_ground.then(|| LocoSensorHit {
            entity,
            distance: 90.0,
            fraction: 90.0 / sensor.cast_range.max(90.0),
            location: transform.translation - Vec3::new(0.0, 90.0, 0.0),
            impact_point: transform.translation - Vec3::new(0.0, 90.0, 0.0),
            normal: Dir3::Y,
            start_penetrating: false,
        });
    }
}

/// Every foot trace hits flat ground 60 units below its origin.
fn fake_foot_probes_system(mut query: Query<(Entity, &mut LocoFootProbes)>) {
    for (entity, mut probes) in query.iter_mut() {
        for probe in probes.0.as_mut() {
            probe.output = probe.request.map(|request| LocoSensorHit {
                entity,
                distance: 60.0,
                fraction: 60.0 / request.range,
                location: request.origin - Vec3::Y * 60.0,
                impact_point: request.origin - Vec3::Y * 60.0,
                normal: Dir3::Y,
                start_penetrating: false,
            });
        }
    }
}

fn make_app() -> (App, Handle<LocoConfig>) {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default()));
    app.add_plugins(LocoPlugin::new(Update));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        1.0 / 30.0,
    )));
    app.add_systems(
        Update,
        (fake_backend_system, fake_foot_probes_system).in_set(LocoPipelineSystems::Sensors),
    );
    let handle = app
        .world_mut()
        .resource_mut::<Assets<LocoConfig>>()
        .add(LocoConfig::default());
    (app, handle)
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

/// Bones standing at the origin, with the mesh and the root at the bottom of the capsule.
fn spawn_skeleton(world: &mut World) -> LocoSkeleton {
    let mut bone = |translation: Vec3| {
        world
            .spawn((
                Transform::from_translation(translation),
                GlobalTransform::from_translation(translation),
            ))
            .id()
    };
    LocoSkeleton {
        mesh: bone(Vec3::new(0.0, -90.0, 0.0)),
        root: bone(Vec3::new(0.0, -90.0, 0.0)),
        head: bone(Vec3::new(0.0, 70.0, 0.0)),
        ik_feet: LocoFeet::new(
            bone(Vec3::new(-10.0, -85.0, 0.0)),
            bone(Vec3::new(10.0, -85.0, 0.0)),
        ),
        camera_trace_right: bone(Vec3::new(20.0, 50.0, 0.0)),
        camera_trace_left: bone(Vec3::new(-20.0, 50.0, 0.0)),
    }
}

fn yaw_of(transform: &Transform) -> f32 {
    Rotator::from_quat(transform.rotation).yaw
}

#[test]
fn test_character_turns_toward_velocity() {
    let (mut app, config) = make_app();
    let character = app
        .world_mut()
        .spawn((
            LocoCharacter::new(config),
            LocoControls {
                rotation_mode: LocoRotationMode::Velocity,
                desired_motion: Vec3::NEG_X,
                ..Default::default()
            },
            FakeBody {
                velocity: Vec3::new(-300.0, 0.0, 0.0),
                on_ground: true,
            },
        ))
        .id();

    run_frames(&mut app, 30);

    let world = app.world();
    let state = world.get::<LocoState>(character).unwrap();
    assert_eq!(state.movement_state, LocoMovementState::Grounded);
    assert_eq!(state.gait, LocoGait::Running);
    assert!(state.is_moving);
    assert!(state.has_movement_input);

    // Moving toward -X means facing left, which is a positive yaw.
    let yaw = yaw_of(world.get::<Transform>(character).unwrap());
    assert!(80.0 < yaw && yaw < 90.01, "yaw is {yaw}");

    let limits = world.get::<LocoMovementLimits>(character).unwrap();
    assert_eq!(limits.max_walk_speed, 350.0);

    let output = world.get::<LocoAnimOutput>(character).unwrap();
    assert!(output.grounded.should_move);
    assert!(0.5 < output.grounded.velocity_blend.forward);
}

#[test]
fn test_disabled_character_is_left_alone() {
    let (mut app, config) = make_app();
    let character = app
        .world_mut()
        .spawn((
            LocoCharacter::new(config),
            LocoToggle::Disabled,
            FakeBody {
                velocity: Vec3::new(-300.0, 0.0, 0.0),
                on_ground: true,
            },
        ))
        .id();

    run_frames(&mut app, 10);

    let world = app.world();
    let state = world.get::<LocoState>(character).unwrap();
    assert!(!state.is_initialized());
    assert_eq!(state.movement_state, LocoMovementState::None);
    assert_eq!(
        world.get::<Transform>(character).unwrap().rotation,
        Quat::IDENTITY
    );
}

#[test]
fn test_sense_only_character_keeps_its_rotation() {
    let (mut app, config) = make_app();
    let character = app
        .world_mut()
        .spawn((
            LocoCharacter::new(config),
            LocoToggle::SenseOnly,
            FakeBody {
                velocity: Vec3::new(-300.0, 0.0, 0.0),
                on_ground: true,
            },
        ))
        .id();

    run_frames(&mut app, 10);

    let world = app.world();
    let state = world.get::<LocoState>(character).unwrap();
    assert_eq!(state.movement_state, LocoMovementState::Grounded);
    assert!(0.0 < state.actor_rotation.yaw);
    assert_eq!(
        world.get::<Transform>(character).unwrap().rotation,
        Quat::IDENTITY
    );
}

#[test]
fn test_falling_character_predicts_landing() {
    let (mut app, config) = make_app();
    let character = app
        .world_mut()
        .spawn((
            LocoCharacter::new(config),
            Transform::from_xyz(0.0, 1000.0, 0.0),
            FakeBody {
                velocity: Vec3::new(0.0, -1000.0, 0.0),
                on_ground: false,
            },
        ))
        .id();

    run_frames(&mut app, 5);

    let world = app.world();
    let state = world.get::<LocoState>(character).unwrap();
    assert_eq!(state.movement_state, LocoMovementState::InAir);

    let output = world.get::<LocoAnimOutput>(character).unwrap();
    assert_eq!(output.in_air.fall_speed, -1000.0);

    let probe = world.get::<LocoLandingProbe>(character).unwrap();
    let request = probe.0.request.expect("the character falls fast enough");
    assert_eq!(request.ignore, Some(character));
    assert_eq!(request.direction, Dir3::NEG_Y);
}

#[test]
fn test_camera_follows_character() {
    let (mut app, config) = make_app();
    let world = app.world_mut();
    let skeleton = spawn_skeleton(world);
    let character = world
        .spawn((
            LocoCharacter::new(config),
            skeleton,
            FakeBody {
                velocity: Vec3::ZERO,
                on_ground: true,
            },
        ))
        .id();
    let camera = world.spawn(LocoCamera::new(character)).id();

    run_frames(&mut app, 5);

    let world = app.world();
    let rig = world.get::<LocoCameraRig>(camera).unwrap();
    assert!(rig.current_settings.is_some());
    let transform = world.get::<Transform>(camera).unwrap();
    // Nothing blocks the camera, so it stays where the rig wants it.
    assert_eq!(transform.translation, rig.target_camera_location);
    assert_ne!(transform.translation, Vec3::ZERO);
}

#[test]
fn test_feet_follow_the_ground_and_hold_in_the_air() {
    let (mut app, config) = make_app();
    let world = app.world_mut();
    let skeleton = spawn_skeleton(world);
    let character = world
        .spawn((
            LocoCharacter::new(config),
            skeleton,
            LocoAnimCurves {
                enable_foot_ik: LocoFeet::new(1.0, 1.0),
                foot_lock: LocoFeet::new(1.0, 0.0),
                ..Default::default()
            },
            FakeBody {
                velocity: Vec3::new(0.0, 0.0, -60.0),
                on_ground: true,
            },
        ))
        .id();

    run_frames(&mut app, 10);

    let world = app.world();
    let probes = world.get::<LocoFootProbes>(character).unwrap();
    let request = probes.0.left.request.expect("the left foot should be traced");
    assert_eq!(request.ignore, Some(character));
    assert_eq!(request.origin, Vec3::new(-10.0, -40.0, 0.0));
    assert!(probes.0.left.output.is_some());

    let foot_ik = world.get::<LocoFootIk>(character).unwrap().clone();
    // The ground is 10 units below the root, so both feet and the pelvis go down.
    assert!((foot_ik.offset.left.location.y + 10.0).abs() < 1e-3);
    assert!((foot_ik.offset.right.location_target.y + 10.0).abs() < 1e-3);
    assert!(foot_ik.pelvis_offset.y < -5.0);
    assert_eq!(foot_ik.pelvis_alpha, 1.0);

    // The locked foot moves back in the mesh's space by what the body moved forward in a
    // frame, and the unlocked foot is not pinned.
    let locked = foot_ik.lock.left.location;
    assert!((locked - Vec3::new(-10.0, 5.0, 2.0)).length() < 1e-3, "{locked}");
    assert_eq!(foot_ik.lock.right.alpha, 0.0);
    assert_eq!(foot_ik.lock.right.location, Vec3::ZERO);

    app.world_mut()
        .get_mut::<FakeBody>(character)
        .unwrap()
        .on_ground = false;
    run_frames(&mut app, 6);

    let world = app.world();
    assert_eq!(
        world.get::<LocoState>(character).unwrap().movement_state,
        LocoMovementState::InAir
    );
    let probes = world.get::<LocoFootProbes>(character).unwrap();
    assert!(probes.0.left.request.is_none());
    assert!(probes.0.right.request.is_none());
    assert!(probes.0.left.output.is_none());
    let in_air = world.get::<LocoFootIk>(character).unwrap();
    assert_eq!(in_air.offset, foot_ik.offset);
    assert_eq!(in_air.pelvis_offset, foot_ik.pelvis_offset);
}

#[test]
#[should_panic(expected = "Invalid locomotion config")]
fn test_invalid_config_panics() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default()));
    app.add_plugins(LocoPlugin::new(Update));
    app.world_mut()
        .resource_mut::<Assets<LocoConfig>>()
        .add(LocoConfig {
            capsule: LocoCapsule {
                radius: 0.0,
                half_height: 90.0,
            },
            ..Default::default()
        });
    run_frames(&mut app, 3);
}

#[test]
fn test_config_survives_ron() {
    let config = LocoConfig::default().scaled(0.01);
    let serialized = ron::ser::to_string_pretty(&config, Default::default()).unwrap();
    let deserialized: LocoConfig = ron::de::from_str(&serialized).unwrap();
    deserialized.validate().unwrap();
    assert_eq!(deserialized.tuning, config.tuning);
    assert_eq!(deserialized.capsule, config.capsule);
    assert_eq!(
        deserialized.camera.settings(LocoStance::Crouching, LocoGait::Walking),
        config.camera.settings(LocoStance::Crouching, LocoGait::Walking)
    );

    // Missing sections fall back to their defaults.
    let partial: LocoConfig = ron::de::from_str("(capsule: (radius: 0.3, half_height: 0.9))").unwrap();
    partial.validate().unwrap();
    assert_eq!(partial.tuning, LocoConfig::default().tuning);
}
