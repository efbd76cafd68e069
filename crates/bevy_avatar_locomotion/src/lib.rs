//! # Bevy Avatar Locomotion
//!
//! **Bevy Avatar Locomotion** drives a skeletally-animated avatar for
//! [Bevy](https://bevyengine.org/): it selects, blends and sequences a small
//! library of motion clips (idle, walk, directional turns, one-shot
//! gestures) and moves the avatar toward a target derived from a tracked
//! viewer pose or from explicit directional commands.
//!
//! The library introduces one asset type, [`MotionClip`](clip::MotionClip),
//! defined in `*.motion.ron` files (or built in code): named bone tracks of
//! translation/rotation keyframes plus a duration. For example:
//! ```ron
//! (
//!     tracks: [
//!         (
//!             path: ["Armature", "Hips"],
//!             translations: (
//!                 times: [0.0, 0.5, 1.0],
//!                 values: [(0.0, 1.0, 0.0), (0.0, 1.05, 0.0), (0.0, 1.0, 0.0)],
//!             ),
//!         ),
//!     ],
//! )
//! ```
//!
//! The runtime surface is the [`AvatarController`](controller::AvatarController)
//! component. Spawn it on the avatar entity, register named clips for the
//! semantic actions (`idle`, `walk`, `turn_left`, ...), and feed it viewer
//! pose samples; [`AvatarLocomotionPlugin`](plugin::AvatarLocomotionPlugin)
//! resolves the clip loads and ticks every controller once per frame:
//! ```ignore
//! commands.spawn((
//!     AvatarController::default(),
//!     Transform::default(),
//! ));
//! ```
//! Commands (`walk`, `turn`, `auto_walk`, `play_gesture`) take effect at the
//! next tick and hand back a [`CommandTicket`](completion::CommandTicket)
//! that resolves when the movement arrives or the gesture finishes. A clip
//! that fails to load leaves its action unbound; the avatar still moves,
//! just without that animation.

pub mod action;
pub mod blending;
pub mod clip;
pub mod completion;
pub mod config;
pub mod controller;
pub mod errors;
pub mod gesture;
pub mod library;
pub mod locomotion;
pub mod plugin;
pub mod systems;
pub mod tracking;

pub mod prelude {
    pub use crate::action::{ActionId, ActionSpec, LoopPolicy, PlayableAction};
    pub use crate::clip::{BonePath, BoneTrack, Keyframes, MotionClip};
    pub use crate::completion::{CommandTicket, TicketStatus};
    pub use crate::config::{LocomotionConfig, RebaseAxes};
    pub use crate::controller::{ActionSample, AvatarCommand, AvatarController};
    pub use crate::errors::{ClipLoaderError, ControllerError, ControllerResult};
    pub use crate::gesture::GestureOptions;
    pub use crate::library::{ActionSet, SlotStatus, names};
    pub use crate::locomotion::{Direction, LocomotionState};
    pub use crate::plugin::{AvatarLocomotionPlugin, AvatarLocomotionSet};
    pub use crate::tracking::TrackedPose;
}
