use bevy::{asset::Handle, reflect::prelude::*};
use serde::{Deserialize, Serialize};

use crate::clip::MotionClip;

/// How a playable action treats the end of its clip.
#[derive(Reflect, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopPolicy {
    /// Play through once, then finish.
    Once,
    /// Wrap around and keep playing.
    #[default]
    Repeat,
}

/// Playback parameters an action is created with.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSpec {
    pub loop_policy: LoopPolicy,
    /// For [`LoopPolicy::Once`]: hold the last frame after finishing instead
    /// of going silent.
    pub clamp_on_finish: bool,
    pub time_scale: f32,
}

impl Default for ActionSpec {
    fn default() -> Self {
        Self {
            loop_policy: LoopPolicy::Repeat,
            clamp_on_finish: false,
            time_scale: 1.0,
        }
    }
}

impl ActionSpec {
    /// Spec for a one-shot overlay: play once, hold the final pose.
    pub fn one_shot() -> Self {
        Self {
            loop_policy: LoopPolicy::Once,
            clamp_on_finish: true,
            time_scale: 1.0,
        }
    }
}

/// An in-flight linear weight ramp.
#[derive(Reflect, Clone, Copy, Debug)]
pub struct Fade {
    pub from_weight: f32,
    pub to_weight: f32,
    pub duration: f32,
    pub elapsed: f32,
}

/// Identifier of a [`PlayableAction`] inside an [`ActionArena`]. Copyable
/// stand-in for a borrowed action reference; resolved against the arena at
/// the point of use.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionId(pub(crate) usize);

/// A motion clip bound to runtime playback state: blend weight, local time,
/// time scale and an optional in-flight weight fade.
///
/// Created once when its clip finishes registering and mutated in place
/// every tick it participates in a blend.
#[derive(Reflect, Clone, Debug)]
pub struct PlayableAction {
    pub clip: Handle<MotionClip>,
    /// Clip duration, cached at bind time.
    pub duration: f32,
    pub loop_policy: LoopPolicy,
    pub clamp_on_finish: bool,
    pub weight: f32,
    pub time_scale: f32,
    pub time: f32,
    pub playing: bool,
    /// Set when a [`LoopPolicy::Once`] action reaches the end of its clip.
    pub finished: bool,
    pub(crate) fade: Option<Fade>,
}

impl PlayableAction {
    pub fn new(clip: Handle<MotionClip>, duration: f32, spec: ActionSpec) -> Self {
        Self {
            clip,
            duration,
            loop_policy: spec.loop_policy,
            clamp_on_finish: spec.clamp_on_finish,
            weight: 0.0,
            time_scale: spec.time_scale,
            time: 0.0,
            playing: false,
            finished: false,
            fade: None,
        }
    }

    /// Restart playback at full weight, cancelling any fade.
    pub fn play_from_start(&mut self) {
        self.weight = 1.0;
        self.time = 0.0;
        self.time_scale = 1.0;
        self.playing = true;
        self.finished = false;
        self.fade = None;
    }

    /// Silence the action: zero weight, no fade, not playing.
    pub fn stop(&mut self) {
        self.weight = 0.0;
        self.playing = false;
        self.fade = None;
    }

    /// Begin a linear weight ramp from the current weight to `target` over
    /// `duration` seconds. A non-positive duration applies immediately.
    pub fn fade_to(&mut self, target: f32, duration: f32) {
        if duration <= 0.0 {
            self.weight = target;
            self.fade = None;
            if target <= 0.0 {
                self.playing = false;
            }
            return;
        }
        self.fade = Some(Fade {
            from_weight: self.weight,
            to_weight: target,
            duration,
            elapsed: 0.0,
        });
    }

    /// Advance the fade and local clock by `delta` seconds. A completed
    /// fade-out also stops the action.
    pub fn advance(&mut self, delta: f32) {
        if let Some(fade) = self.fade.as_mut() {
            fade.elapsed += delta;
            if fade.elapsed >= fade.duration {
                self.weight = fade.to_weight;
                let faded_out = fade.to_weight <= 0.0;
                self.fade = None;
                if faded_out {
                    self.playing = false;
                }
            } else {
                let s = fade.elapsed / fade.duration;
                self.weight = fade.from_weight + (fade.to_weight - fade.from_weight) * s;
            }
        }

        if self.playing && !self.finished {
            self.time += delta * self.time_scale;
            if self.duration > 0.0 && self.time >= self.duration {
                match self.loop_policy {
                    LoopPolicy::Repeat => self.time %= self.duration,
                    LoopPolicy::Once => {
                        self.time = self.duration;
                        self.finished = true;
                        if !self.clamp_on_finish {
                            self.playing = false;
                        }
                    }
                }
            }
        }
    }
}

/// Owner of every [`PlayableAction`] for one avatar: the named library
/// actions plus the gesture overlay scratch slot. Actions are addressed by
/// [`ActionId`] and never removed while the avatar lives.
#[derive(Reflect, Clone, Debug, Default)]
pub struct ActionArena {
    actions: Vec<PlayableAction>,
}

impl ActionArena {
    pub fn insert(&mut self, action: PlayableAction) -> ActionId {
        self.actions.push(action);
        ActionId(self.actions.len() - 1)
    }

    /// Replace the action stored under `id`, keeping the id stable.
    pub fn replace(&mut self, id: ActionId, action: PlayableAction) {
        if let Some(slot) = self.actions.get_mut(id.0) {
            *slot = action;
        }
    }

    pub fn get(&self, id: ActionId) -> Option<&PlayableAction> {
        self.actions.get(id.0)
    }

    pub fn get_mut(&mut self, id: ActionId) -> Option<&mut PlayableAction> {
        self.actions.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &PlayableAction)> {
        self.actions
            .iter()
            .enumerate()
            .map(|(idx, action)| (ActionId(idx), action))
    }

    /// Advance every action's fade and clock: the per-tick mixer step.
    pub fn advance_all(&mut self, delta: f32) {
        for action in &mut self.actions {
            action.advance(delta);
        }
    }

    /// Stop every action.
    pub fn stop_all(&mut self) {
        for action in &mut self.actions {
            action.stop();
        }
    }

    /// Stop every action except those in `keep`. Upholds the rule that at
    /// most two actions carry non-zero weight at any time.
    pub fn silence_except(&mut self, keep: &[ActionId]) {
        for (idx, action) in self.actions.iter_mut().enumerate() {
            if !keep.contains(&ActionId(idx)) {
                action.stop();
            }
        }
    }
}
