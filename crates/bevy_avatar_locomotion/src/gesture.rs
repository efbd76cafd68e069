//! One-shot gesture overlays.
//!
//! A gesture plays a one-shot clip over whatever locomotion action is
//! current, then hands the blend back to that action when the clip ends.
//! While the overlay is active, the locomotion machine keeps moving the
//! avatar but leaves blending alone, so the snapshot taken at start time is
//! exactly what gets restored.

use bevy::{asset::prelude::*, math::prelude::*, reflect::prelude::*};

use crate::{
    action::{ActionArena, ActionId, ActionSpec, PlayableAction},
    blending::crossfade,
    clip::MotionClip,
    completion::TicketSender,
    config::{LocomotionConfig, RebaseAxes},
    errors::{ControllerError, ControllerResult},
};

/// Options for starting a gesture.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureOptions {
    /// Avatar root-bone world position to re-base the clip onto. When set,
    /// the clip's root translation track is shifted so its first keyframe
    /// matches this position on the axes selected by
    /// [`RebaseAxes`](crate::config::RebaseAxes). `None` plays the clip
    /// as authored.
    pub sync_root: Option<Vec3>,
}

#[derive(Debug)]
struct ActiveGesture {
    overlay: ActionId,
    restore: Option<ActionId>,
    sender: Option<TicketSender>,
}

/// Plays one-shot clips over the current locomotion action.
///
/// At most one gesture is active at a time; a second request is rejected
/// rather than corrupting the restore snapshot. The overlay action lives in
/// a scratch arena slot reused across gestures and is never part of the
/// named library.
#[derive(Debug, Default)]
pub struct GestureOverlay {
    slot: Option<ActionId>,
    active: Option<ActiveGesture>,
}

impl GestureOverlay {
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start a gesture. Snapshots `current` for restoration, fades the
    /// overlay in and returns the clip duration immediately without awaiting
    /// completion.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn play(
        &mut self,
        arena: &mut ActionArena,
        clips: &mut Assets<MotionClip>,
        config: &LocomotionConfig,
        current: Option<ActionId>,
        clip: Handle<MotionClip>,
        options: GestureOptions,
        sender: Option<TicketSender>,
    ) -> ControllerResult<f32> {
        if self.active.is_some() {
            return Err(ControllerError::GestureInProgress);
        }
        let Some(clip_asset) = clips.get_mut(&clip) else {
            return Err(ControllerError::ClipUnavailable);
        };
        if let Some(root_position) = options.sync_root {
            rebase_root_tracks(clip_asset, &config.root_bone, config.rebase_axes, root_position);
        }
        let duration = clip_asset.duration();

        let action = PlayableAction::new(clip, duration, ActionSpec::one_shot());
        let overlay = match self.slot {
            Some(id) => {
                arena.replace(id, action);
                id
            }
            None => {
                let id = arena.insert(action);
                self.slot = Some(id);
                id
            }
        };

        crossfade(arena, current, overlay, config.gesture_fade);
        self.active = Some(ActiveGesture {
            overlay,
            restore: current,
            sender,
        });
        Ok(duration)
    }

    /// Restore the snapshotted action once the overlay has finished. The
    /// active record is taken as part of firing, so completion is observed
    /// at most once.
    pub(crate) fn resolve_finished(&mut self, arena: &mut ActionArena, config: &LocomotionConfig) {
        let finished = |gesture: &mut ActiveGesture| {
            arena
                .get(gesture.overlay)
                .is_some_and(|action| action.finished)
        };
        let Some(gesture) = self.active.take_if(finished) else {
            return;
        };

        match gesture.restore {
            Some(restore) => crossfade(arena, Some(gesture.overlay), restore, config.gesture_fade),
            // Nothing was playing before the gesture; just fade it away.
            None => {
                if let Some(overlay) = arena.get_mut(gesture.overlay) {
                    overlay.fade_to(0.0, config.gesture_fade);
                }
            }
        }
        if let Some(sender) = gesture.sender {
            sender.finish();
        }
    }

    /// Drop the active gesture without restoring, abandoning its ticket.
    /// Used when base playback forcibly resets the arena.
    pub(crate) fn cancel(&mut self) {
        self.active = None;
    }
}

/// Shift the translation track of every bone whose name contains
/// `root_bone` so its first keyframe sits at `root_position` on the selected
/// axes.
pub(crate) fn rebase_root_tracks(
    clip: &mut MotionClip,
    root_bone: &str,
    axes: RebaseAxes,
    root_position: Vec3,
) {
    for (path, track) in clip.tracks_mut() {
        if !path.bone_name_contains(root_bone) {
            continue;
        }
        let Some(first) = track.translations.values.first().copied() else {
            continue;
        };
        let offset = root_position - first;
        for value in &mut track.translations.values {
            if axes.x {
                value.x += offset.x;
            }
            if axes.y {
                value.y += offset.y;
            }
            if axes.z {
                value.z += offset.z;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{BonePath, BoneTrack, Keyframes};
    use crate::completion::{TicketStatus, ticket};

    fn wave_clip() -> MotionClip {
        let mut clip = MotionClip::default();
        clip.add_track(
            BonePath::from_slashed_string("Armature/Hips"),
            BoneTrack {
                translations: Keyframes::new(
                    vec![0.0, 1.0, 2.0],
                    vec![
                        Vec3::new(0.5, 1.0, 0.5),
                        Vec3::new(0.5, 1.2, 0.5),
                        Vec3::new(0.5, 1.0, 0.5),
                    ],
                ),
                ..Default::default()
            },
        );
        clip
    }

    fn setup() -> (ActionArena, Assets<MotionClip>, Handle<MotionClip>, ActionId) {
        let mut arena = ActionArena::default();
        let mut clips: Assets<MotionClip> = Assets::default();
        let handle = clips.add(wave_clip());
        let mut idle = PlayableAction::new(Handle::default(), 1.0, ActionSpec::default());
        idle.play_from_start();
        let idle_id = arena.insert(idle);
        (arena, clips, handle, idle_id)
    }

    #[test]
    fn round_trip_restores_the_prior_action() {
        let (mut arena, mut clips, handle, idle) = setup();
        let config = LocomotionConfig::default();
        let mut overlay = GestureOverlay::default();
        let (sender, mut gesture_ticket) = ticket();

        let duration = overlay
            .play(
                &mut arena,
                &mut clips,
                &config,
                Some(idle),
                handle,
                GestureOptions::default(),
                Some(sender),
            )
            .unwrap();
        assert_eq!(duration, 2.0);
        assert!(overlay.is_active());
        assert_eq!(gesture_ticket.poll(), TicketStatus::Pending);

        // Run the overlay to completion, checking it never fires early.
        for _ in 0..20 {
            arena.advance_all(0.1);
            overlay.resolve_finished(&mut arena, &config);
            assert!(overlay.is_active());
            assert_eq!(gesture_ticket.poll(), TicketStatus::Pending);
        }
        arena.advance_all(0.1);
        overlay.resolve_finished(&mut arena, &config);
        assert!(!overlay.is_active());
        assert_eq!(gesture_ticket.poll(), TicketStatus::Finished);

        // The idle action is fading back in.
        let restored = arena.get(idle).unwrap();
        assert!(restored.playing);
        assert_eq!(restored.time, 0.0);
        // A second "finished" observation is impossible: the record is gone.
        overlay.resolve_finished(&mut arena, &config);
        assert_eq!(gesture_ticket.poll(), TicketStatus::Finished);
    }

    #[test]
    fn second_gesture_is_rejected() {
        let (mut arena, mut clips, handle, idle) = setup();
        let config = LocomotionConfig::default();
        let mut overlay = GestureOverlay::default();

        overlay
            .play(
                &mut arena,
                &mut clips,
                &config,
                Some(idle),
                handle.clone(),
                GestureOptions::default(),
                None,
            )
            .unwrap();
        let (sender, mut rejected_ticket) = ticket();
        let result = overlay.play(
            &mut arena,
            &mut clips,
            &config,
            Some(idle),
            handle,
            GestureOptions::default(),
            Some(sender),
        );
        assert_eq!(result, Err(ControllerError::GestureInProgress));
        // The rejected command's sender was dropped inside `play`.
        assert_eq!(rejected_ticket.poll(), TicketStatus::Abandoned);
    }

    #[test]
    fn missing_clip_is_an_error() {
        let (mut arena, mut clips, _, idle) = setup();
        let config = LocomotionConfig::default();
        let mut overlay = GestureOverlay::default();
        let result = overlay.play(
            &mut arena,
            &mut clips,
            &config,
            Some(idle),
            Handle::default(),
            GestureOptions::default(),
            None,
        );
        assert_eq!(result, Err(ControllerError::ClipUnavailable));
        assert!(!overlay.is_active());
    }

    #[test]
    fn rebase_corrects_only_the_vertical_axis_by_default() {
        let mut clip = wave_clip();
        let root = Vec3::new(3.0, 0.2, -4.0);
        rebase_root_tracks(&mut clip, "Hips", RebaseAxes::default(), root);
        let track = clip
            .get_track(&BonePath::from_slashed_string("Armature/Hips"))
            .unwrap();
        let first = track.translations.values[0];
        assert_eq!(first, Vec3::new(0.5, 0.2, 0.5));
        // Relative motion within the track is preserved.
        assert_eq!(track.translations.values[1], Vec3::new(0.5, 0.4, 0.5));
    }

    #[test]
    fn rebase_can_correct_all_axes() {
        let mut clip = wave_clip();
        let root = Vec3::new(3.0, 0.2, -4.0);
        rebase_root_tracks(&mut clip, "Hips", RebaseAxes::all(), root);
        let track = clip
            .get_track(&BonePath::from_slashed_string("Armature/Hips"))
            .unwrap();
        assert_eq!(track.translations.values[0], root);
        assert_eq!(track.translations.values[1], root + Vec3::new(0.0, 0.2, 0.0));
    }

    #[test]
    fn rebase_leaves_other_bones_alone() {
        let mut clip = wave_clip();
        clip.add_track(
            BonePath::from_slashed_string("Armature/Hips/Spine"),
            BoneTrack {
                translations: Keyframes::new(vec![0.0], vec![Vec3::ONE]),
                ..Default::default()
            },
        );
        rebase_root_tracks(&mut clip, "Hips", RebaseAxes::all(), Vec3::ZERO);
        let spine = clip
            .get_track(&BonePath::from_slashed_string("Armature/Hips/Spine"))
            .unwrap();
        assert_eq!(spine.translations.values[0], Vec3::ONE);
    }
}
