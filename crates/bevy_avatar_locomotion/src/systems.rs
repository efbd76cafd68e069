use bevy::{
    asset::prelude::*, ecs::prelude::*, time::prelude::*, transform::components::Transform,
};

use crate::{clip::MotionClip, controller::AvatarController};

/// Binds loaded clips to actions and marks failed loads, for every avatar.
/// Runs in `PreUpdate` so actions registered by a startup system become
/// playable before the first tick that could use them.
pub fn resolve_action_libraries(
    server: Res<AssetServer>,
    clips: Res<Assets<MotionClip>>,
    mut avatars: Query<&mut AvatarController>,
) {
    for mut controller in avatars.iter_mut() {
        controller.mark_load_failures(&server);
        controller.resolve(&clips);
    }
}

/// Ticks every avatar controller by the frame delta, advancing action
/// blends and moving the avatar's `Transform`.
pub fn tick_avatars(
    time: Res<Time>,
    mut clips: ResMut<Assets<MotionClip>>,
    mut avatars: Query<(&mut AvatarController, &mut Transform)>,
) {
    let delta = time.delta_secs();
    for (mut controller, mut transform) in avatars.iter_mut() {
        controller.tick(delta, transform.as_mut(), clips.as_mut());
    }
}
