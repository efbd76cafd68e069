use bevy::reflect::prelude::*;
use serde::{Deserialize, Serialize};

/// Which axes of a root-bone translation track get corrected when a gesture
/// clip is re-based onto the avatar's current root position.
///
/// The default corrects only the vertical axis: gesture clips authored for
/// a standing rig usually need their height matched but keep their own
/// horizontal staging. Hosts that want the clip fully pinned to the avatar
/// opt into all three axes.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebaseAxes {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Default for RebaseAxes {
    fn default() -> Self {
        Self {
            x: false,
            y: true,
            z: false,
        }
    }
}

impl RebaseAxes {
    pub fn all() -> Self {
        Self {
            x: true,
            y: true,
            z: true,
        }
    }
}

/// Tunables for one avatar's locomotion controller.
///
/// Distances are in world units, rates are per second, durations in seconds.
/// Defaults are tuned for a human-scale rig.
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Walking stops once the distance to the target drops to this.
    pub distance_threshold: f32,
    /// Extra margin on top of `distance_threshold` before walking starts
    /// again. The band between the two holds the current state so the
    /// walk/idle blend does not chatter when the distance hovers at the
    /// boundary.
    pub hysteresis_buffer: f32,
    /// Forward speed while walking, world units per second.
    pub movement_speed: f32,
    /// Maximum turn rate, radians per second.
    pub angular_rate: f32,
    /// The tracked target sits this far in front of the viewer.
    pub viewer_offset: f32,
    /// Fade-out duration for walk/idle transitions.
    pub locomotion_fade: f32,
    /// Fade-out duration when entering and leaving a gesture overlay.
    pub gesture_fade: f32,
    /// A directed walk completes when the remaining distance drops below
    /// this.
    pub arrival_epsilon: f32,
    /// A directed turn completes when the remaining angle (radians) drops
    /// below this.
    pub turn_epsilon: f32,
    /// Substring that identifies the skeleton root in bone names ("Hips"
    /// for most humanoid rigs). Gesture re-basing applies to every track
    /// whose bone name contains it.
    pub root_bone: String,
    pub rebase_axes: RebaseAxes,
    /// Action to start playing once the library resolves. `None` starts
    /// silent.
    pub autoplay: Option<String>,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.05,
            hysteresis_buffer: 0.01,
            movement_speed: 0.5,
            angular_rate: 12.0,
            viewer_offset: 2.0,
            locomotion_fade: 0.5,
            gesture_fade: 1.0,
            arrival_epsilon: 0.01,
            turn_epsilon: 0.01,
            root_bone: "Hips".to_string(),
            rebase_axes: RebaseAxes::default(),
            autoplay: Some(crate::library::names::IDLE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ron_fills_in_defaults() {
        let config: LocomotionConfig =
            ron::de::from_str("(movement_speed: 1.5, rebase_axes: (x: true))").unwrap();
        assert_eq!(config.movement_speed, 1.5);
        assert_eq!(config.distance_threshold, 0.05);
        assert_eq!(
            config.rebase_axes,
            RebaseAxes {
                x: true,
                y: true,
                z: false
            }
        );
        assert_eq!(config.autoplay.as_deref(), Some("idle"));
    }
}
