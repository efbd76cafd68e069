//! Crossfading between playable actions.
//!
//! A crossfade fades the outgoing action to zero weight over a
//! caller-supplied duration while the incoming action ramps to full weight
//! over the fixed [`FADE_IN_SECONDS`]. The two durations are intentionally
//! independent: callers tune how long the old motion lingers, the new
//! motion always arrives on the same schedule.

use crate::action::{ActionArena, ActionId};

/// Fixed fade-in duration for the incoming action of a crossfade, in
/// seconds. Not configurable; the fade-out duration is the caller's knob.
pub const FADE_IN_SECONDS: f32 = 0.5;

/// Crossfade from `from` (if any) to `to`.
///
/// The incoming action is rewound to local time 0, restored to unit time
/// scale, marked playing and faded in over [`FADE_IN_SECONDS`]. The outgoing
/// action fades to zero weight over `fade_out` seconds. Any other action in
/// the arena is silenced outright, so at most two actions ever carry
/// non-zero weight. No-op when `from == to`.
pub fn crossfade(arena: &mut ActionArena, from: Option<ActionId>, to: ActionId, fade_out: f32) {
    if from == Some(to) {
        return;
    }

    let keep = [from.unwrap_or(to), to];
    arena.silence_except(&keep);

    if let Some(from_id) = from
        && let Some(outgoing) = arena.get_mut(from_id)
    {
        outgoing.fade_to(0.0, fade_out);
    }

    if let Some(incoming) = arena.get_mut(to) {
        incoming.time = 0.0;
        incoming.time_scale = 1.0;
        incoming.playing = true;
        incoming.finished = false;
        incoming.fade_to(1.0, FADE_IN_SECONDS);
    }
}

/// Blend toward `to` if it is a real, different action. Updates `current` on
/// an actual change; missing actions and repeats are no-ops so motion keeps
/// working when a clip failed to load. Suppressed entirely while a gesture
/// overlay owns the blend.
pub(crate) fn request_blend(
    arena: &mut ActionArena,
    current: &mut Option<ActionId>,
    to: Option<ActionId>,
    fade_out: f32,
    suppressed: bool,
) {
    if suppressed {
        return;
    }
    let Some(to) = to else {
        return;
    };
    if *current == Some(to) {
        return;
    }
    crossfade(arena, *current, to, fade_out);
    *current = Some(to);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionSpec, PlayableAction};
    use bevy::asset::Handle;

    fn arena_with(n: usize) -> (ActionArena, Vec<ActionId>) {
        let mut arena = ActionArena::default();
        let ids = (0..n)
            .map(|_| arena.insert(PlayableAction::new(Handle::default(), 2.0, ActionSpec::default())))
            .collect();
        (arena, ids)
    }

    #[test]
    fn fade_in_duration_is_fixed_regardless_of_fade_out() {
        let (mut arena, ids) = arena_with(2);
        arena.get_mut(ids[0]).unwrap().play_from_start();

        crossfade(&mut arena, Some(ids[0]), ids[1], 2.0);
        // Past the fixed fade-in but well inside the fade-out.
        for _ in 0..6 {
            arena.advance_all(0.1);
        }
        let outgoing = arena.get(ids[0]).unwrap();
        let incoming = arena.get(ids[1]).unwrap();
        assert_eq!(incoming.weight, 1.0);
        assert!(outgoing.weight > 0.5 && outgoing.weight < 0.8);
        assert!(outgoing.playing, "still fading out");
    }

    #[test]
    fn crossfade_same_action_is_a_noop() {
        let (mut arena, ids) = arena_with(1);
        {
            let a = arena.get_mut(ids[0]).unwrap();
            a.play_from_start();
            a.time = 1.3;
        }
        crossfade(&mut arena, Some(ids[0]), ids[0], 0.5);
        assert_eq!(arena.get(ids[0]).unwrap().time, 1.3);
        assert!(arena.get(ids[0]).unwrap().fade.is_none());
    }

    #[test]
    fn third_action_is_silenced() {
        let (mut arena, ids) = arena_with(3);
        arena.get_mut(ids[0]).unwrap().play_from_start();
        crossfade(&mut arena, Some(ids[0]), ids[1], 0.5);
        arena.advance_all(0.1);
        // Interrupt mid-fade with a blend to a third action.
        crossfade(&mut arena, Some(ids[1]), ids[2], 0.5);
        arena.advance_all(0.1);

        let weighted = arena.iter().filter(|(_, a)| a.weight > 0.0).count();
        assert!(weighted <= 2);
        assert_eq!(arena.get(ids[0]).unwrap().weight, 0.0);
    }

    #[test]
    fn weights_move_monotonically_to_their_targets() {
        let (mut arena, ids) = arena_with(2);
        arena.get_mut(ids[0]).unwrap().play_from_start();
        crossfade(&mut arena, Some(ids[0]), ids[1], 0.5);

        let (mut last_out, mut last_in) = (1.0_f32, 0.0_f32);
        for _ in 0..12 {
            arena.advance_all(0.05);
            let outgoing = arena.get(ids[0]).unwrap().weight;
            let incoming = arena.get(ids[1]).unwrap().weight;
            assert!(outgoing <= last_out);
            assert!(incoming >= last_in);
            last_out = outgoing;
            last_in = incoming;
        }
        assert_eq!(last_out, 0.0);
        assert_eq!(last_in, 1.0);
    }

    #[test]
    fn request_blend_skips_missing_and_repeat_targets() {
        let (mut arena, ids) = arena_with(2);
        let mut current = None;
        request_blend(&mut arena, &mut current, Some(ids[0]), 0.5, false);
        assert_eq!(current, Some(ids[0]));

        // Repeat request leaves the in-flight fade alone.
        arena.advance_all(0.1);
        let time_before = arena.get(ids[0]).unwrap().time;
        request_blend(&mut arena, &mut current, Some(ids[0]), 0.5, false);
        assert_eq!(arena.get(ids[0]).unwrap().time, time_before);

        // Missing action: no-op, current unchanged.
        request_blend(&mut arena, &mut current, None, 0.5, false);
        assert_eq!(current, Some(ids[0]));

        // Suppressed: no-op even for a real change.
        request_blend(&mut arena, &mut current, Some(ids[1]), 0.5, true);
        assert_eq!(current, Some(ids[0]));
        assert_eq!(arena.get(ids[1]).unwrap().weight, 0.0);
    }
}
