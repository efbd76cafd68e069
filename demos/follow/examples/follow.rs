extern crate bevy;
extern crate bevy_avatar_locomotion;

use bevy::{light::CascadeShadowConfigBuilder, prelude::*};
use bevy_avatar_locomotion::prelude::*;
use std::f32::consts::PI;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(AssetPlugin {
            file_path: "../../assets".to_string(),
            ..default()
        }))
        .add_plugins(AvatarLocomotionPlugin)
        .insert_resource(GlobalAmbientLight {
            color: Color::WHITE,
            brightness: 0.1,
            ..default()
        })
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                track_camera.before(AvatarLocomotionSet::Tick),
                keyboard_commands.before(AvatarLocomotionSet::Tick),
                log_state_changes.after(AvatarLocomotionSet::Tick),
            ),
        )
        .run();
}

#[derive(Component)]
struct Avatar;

#[derive(Resource)]
struct WaveClip(Handle<MotionClip>);

fn setup(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Camera: doubles as the tracked viewer the avatar follows.
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 1.6, 7.0).looking_at(Vec3::new(0.0, 0.875, 0.0), Vec3::Y),
    ));

    // Plane
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::new(Vec3::Y, Vec2::new(8., 8.)))),
        MeshMaterial3d(materials.add(Color::from(LinearRgba::rgb(0.3, 0.5, 0.3)))),
    ));

    // Light
    commands.spawn((
        Transform::from_rotation(Quat::from_euler(EulerRot::ZYX, 0.0, 1.0, -PI / 4.)),
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        CascadeShadowConfigBuilder {
            first_cascade_far_bound: 10.0,
            num_cascades: 3,
            minimum_distance: 0.3,
            maximum_distance: 100.0,
            ..default()
        }
        .build(),
    ));

    // Avatar: a capsule stand-in for a skeletal character.
    let mut controller = AvatarController::default();
    controller.register_action(
        names::IDLE,
        "clips/idle.motion.ron",
        ActionSpec::default(),
        &asset_server,
    );
    controller.register_action(
        names::WALK,
        "clips/walk.motion.ron",
        ActionSpec::default(),
        &asset_server,
    );
    controller.register_action(
        names::TURN_LEFT,
        "clips/turn_left.motion.ron",
        ActionSpec::default(),
        &asset_server,
    );
    controller.register_action(
        names::TURN_RIGHT,
        "clips/turn_right.motion.ron",
        ActionSpec::default(),
        &asset_server,
    );
    // This path does not exist: the load fails, the name stays unbound and
    // the avatar still turns, just without the animation.
    controller.register_action(
        names::TURN_UP,
        "clips/turn_up.motion.ron",
        ActionSpec::default(),
        &asset_server,
    );

    commands.spawn((
        Mesh3d(meshes.add(Capsule3d::new(0.25, 1.0))),
        MeshMaterial3d(materials.add(Color::from(LinearRgba::rgb(0.8, 0.6, 0.4)))),
        Transform::from_xyz(0.0, 0.875, 0.0),
        controller,
        Avatar,
    ));

    commands.insert_resource(WaveClip(asset_server.load("clips/wave.motion.ron")));

    println!("Controls:");
    println!("\tF: Follow the camera (auto walk)");
    println!("\tArrows: Walk one unit left/right/up/down");
    println!("\tQ / E: Turn left / right");
    println!("\tW / S: Turn up / down");
    println!("\tSpace: Play the wave gesture");
}

/// Feed the camera pose to the avatar as the tracked viewer sample.
fn track_camera(
    cameras: Query<&Transform, With<Camera3d>>,
    mut avatars: Query<&mut AvatarController, With<Avatar>>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };
    for mut controller in avatars.iter_mut() {
        controller.set_tracked_pose(TrackedPose {
            position: camera.translation,
            orientation: camera.rotation,
        });
    }
}

fn keyboard_commands(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut clips: ResMut<Assets<MotionClip>>,
    wave: Res<WaveClip>,
    mut avatars: Query<(&mut AvatarController, &Transform), With<Avatar>>,
) {
    let Ok((mut controller, transform)) = avatars.single_mut() else {
        return;
    };

    if keyboard.just_pressed(KeyCode::KeyF) {
        controller.auto_walk();
    }
    if keyboard.just_pressed(KeyCode::ArrowLeft) {
        controller.walk(Direction::Left);
    }
    if keyboard.just_pressed(KeyCode::ArrowRight) {
        controller.walk(Direction::Right);
    }
    if keyboard.just_pressed(KeyCode::ArrowUp) {
        controller.walk(Direction::Up);
    }
    if keyboard.just_pressed(KeyCode::ArrowDown) {
        controller.walk(Direction::Down);
    }
    if keyboard.just_pressed(KeyCode::KeyQ) {
        controller.turn(Direction::Left);
    }
    if keyboard.just_pressed(KeyCode::KeyE) {
        controller.turn(Direction::Right);
    }
    if keyboard.just_pressed(KeyCode::KeyW) {
        controller.turn(Direction::Up);
    }
    if keyboard.just_pressed(KeyCode::KeyS) {
        controller.turn(Direction::Down);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        let options = GestureOptions {
            sync_root: Some(transform.translation),
        };
        match controller.play_gesture(clips.as_mut(), wave.0.clone(), options) {
            Ok((duration, _ticket)) => info!("wave gesture playing for {duration:.2}s"),
            Err(err) => warn!("gesture not played: {err}"),
        }
    }
}

fn log_state_changes(
    avatars: Query<&AvatarController, With<Avatar>>,
    mut last: Local<Option<LocomotionState>>,
) {
    let Ok(controller) = avatars.single() else {
        return;
    };
    let state = controller.state();
    if *last != Some(state) {
        info!("locomotion state: {state:?}");
        *last = Some(state);
    }
}
