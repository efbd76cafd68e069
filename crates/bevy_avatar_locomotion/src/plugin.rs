use bevy::{
    app::{App, Plugin, PreUpdate, Update},
    asset::AssetApp,
    ecs::schedule::{IntoScheduleConfigs, SystemSet},
};

use crate::{
    action::{ActionSpec, LoopPolicy, PlayableAction},
    clip::{BonePath, MotionClip, loader::MotionClipLoader},
    config::{LocomotionConfig, RebaseAxes},
    controller::AvatarController,
    gesture::GestureOptions,
    locomotion::{Direction, LocomotionState},
    systems::{resolve_action_libraries, tick_avatars},
    tracking::TrackedPose,
};

/// System sets the plugin's systems run in, public so hosts can order their
/// own systems around them (e.g. supply tracked poses before
/// [`AvatarLocomotionSet::Tick`], read transforms after it).
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum AvatarLocomotionSet {
    /// `PreUpdate`: pending clip loads are bound or marked failed.
    Resolve,
    /// `Update`: controllers advance by the frame delta.
    Tick,
}

/// Adds avatar locomotion support to an app: the [`MotionClip`] asset and
/// its `.motion.ron` loader, reflect registrations for the public types, and
/// the resolve/tick systems driving every [`AvatarController`].
pub struct AvatarLocomotionPlugin;

impl Plugin for AvatarLocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<MotionClip>()
            .init_asset_loader::<MotionClipLoader>()
            .register_asset_reflect::<MotionClip>();

        app //
            .register_type::<AvatarController>()
            .register_type::<LocomotionConfig>()
            .register_type::<RebaseAxes>()
            .register_type::<LocomotionState>()
            .register_type::<Direction>()
            .register_type::<TrackedPose>()
            .register_type::<PlayableAction>()
            .register_type::<ActionSpec>()
            .register_type::<LoopPolicy>()
            .register_type::<BonePath>()
            .register_type::<GestureOptions>();

        app.add_systems(
            PreUpdate,
            resolve_action_libraries.in_set(AvatarLocomotionSet::Resolve),
        );
        app.add_systems(Update, tick_avatars.in_set(AvatarLocomotionSet::Tick));
    }
}
