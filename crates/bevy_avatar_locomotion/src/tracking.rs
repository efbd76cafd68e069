use bevy::{math::prelude::*, reflect::prelude::*};

/// An externally supplied viewer pose sample (e.g. a head-mounted display
/// or the active camera). Consumed, never owned, by the tracker.
#[derive(Reflect, Clone, Copy, Debug, PartialEq)]
pub struct TrackedPose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl TrackedPose {
    /// The viewer's forward direction (-Z of its orientation).
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

/// A transient goal set by a directional command, cleared once reached.
#[derive(Reflect, Clone, Copy, Debug, PartialEq)]
pub enum OneShot {
    Position(Vec3),
    Orientation(Quat),
}

/// Per-tick snapshot handed to the state machine. Recomputed every tick;
/// never retained across ticks.
#[derive(Clone, Copy, Debug)]
pub struct TargetState {
    /// Where the avatar should head while autonomous. `None` only before
    /// any viewer pose was ever observed.
    pub position: Option<Vec3>,
    /// Last observed viewer position, for idle facing.
    pub viewer_position: Option<Vec3>,
    pub orientation: Option<Quat>,
    pub distance_threshold: f32,
    pub hysteresis_buffer: f32,
}

/// Computes the avatar's target from tracked viewer poses and holds one-shot
/// goals set by directional commands.
///
/// Absence of input freezes state: when no pose arrives this tick the
/// previous target persists, so losing tracking never snaps the avatar
/// toward the origin.
#[derive(Reflect, Clone, Debug, Default)]
pub struct TargetTracker {
    viewer: Option<TrackedPose>,
    target: Option<Vec3>,
    one_shot: Option<OneShot>,
}

impl TargetTracker {
    /// Ingest this tick's pose sample, if any. The target sits
    /// `viewer_offset` units in front of the viewer.
    pub fn update(&mut self, sample: Option<TrackedPose>, viewer_offset: f32) {
        if let Some(pose) = sample {
            self.viewer = Some(pose);
            self.target = Some(pose.position + pose.forward() * viewer_offset);
        }
    }

    pub fn target_state(&self, distance_threshold: f32, hysteresis_buffer: f32) -> TargetState {
        TargetState {
            position: self.target,
            viewer_position: self.viewer.map(|pose| pose.position),
            orientation: self.viewer.map(|pose| pose.orientation),
            distance_threshold,
            hysteresis_buffer,
        }
    }

    pub fn one_shot(&self) -> Option<OneShot> {
        self.one_shot
    }

    pub fn set_one_shot(&mut self, goal: OneShot) {
        self.one_shot = Some(goal);
    }

    pub fn clear_one_shot(&mut self) {
        self.one_shot = None;
    }
}
