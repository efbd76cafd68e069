pub mod loader;

use bevy::{
    asset::prelude::*, math::prelude::*, platform::collections::HashMap, prelude::Name,
    reflect::prelude::*,
};

/// Path to a bone in the skeleton, with [`Name`]s. Each node in a path must
/// have a name.
#[derive(Reflect, Clone, Debug, Hash, PartialEq, Eq, Default)]
pub struct BonePath {
    /// Parts of the path
    pub parts: Vec<Name>,
}

impl BonePath {
    /// Produce a new path from a `/`-separated string, e.g.
    /// `Armature/Hips/Spine`.
    pub fn from_slashed_string(path: &str) -> Self {
        Self {
            parts: path.split('/').map(|s| Name::new(s.to_owned())).collect(),
        }
    }

    pub fn to_slashed_string(&self) -> String {
        self.parts
            .iter()
            .map(|n| n.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Name of the bone itself (the last path segment).
    pub fn bone_name(&self) -> Option<&Name> {
        self.parts.last()
    }

    /// Whether the bone name contains `needle`. Used to locate the skeleton
    /// root track ("Hips" in most humanoid rigs) without requiring an exact
    /// rig-specific name.
    pub fn bone_name_contains(&self, needle: &str) -> bool {
        self.bone_name()
            .is_some_and(|name| name.as_str().contains(needle))
    }
}

impl<S: AsRef<str>> FromIterator<S> for BonePath {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            parts: iter.into_iter().map(|p| Name::new(p.as_ref().to_owned())).collect(),
        }
    }
}

/// Keyframes for one interpolated channel of a bone track.
///
/// `times` and `values` are parallel arrays of the same length; `times` is
/// non-decreasing.
#[derive(Reflect, Clone, Debug)]
pub struct Keyframes<T> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
}

impl<T> Default for Keyframes<T> {
    fn default() -> Self {
        Self {
            times: vec![],
            values: vec![],
        }
    }
}

impl<T: Copy> Keyframes<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>) -> Self {
        Self { times, values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Sample the channel at `time`, interpolating adjacent keyframes with
    /// `interp`. Clamps to the first/last keyframe outside the keyframed
    /// range. Returns `None` for an empty channel.
    pub fn sample_with(&self, time: f32, interp: impl Fn(T, T, f32) -> T) -> Option<T> {
        if self.values.is_empty() || self.times.len() != self.values.len() {
            return None;
        }
        let upper = self.times.partition_point(|t| *t <= time);
        if upper == 0 {
            return self.values.first().copied();
        }
        if upper == self.times.len() {
            return self.values.last().copied();
        }
        let (t0, t1) = (self.times[upper - 1], self.times[upper]);
        let (v0, v1) = (self.values[upper - 1], self.values[upper]);
        let span = t1 - t0;
        if span <= f32::EPSILON {
            return Some(v1);
        }
        Some(interp(v0, v1, (time - t0) / span))
    }
}

/// Keyframed motion for a single bone.
#[derive(Reflect, Clone, Debug, Default)]
pub struct BoneTrack {
    pub translations: Keyframes<Vec3>,
    pub rotations: Keyframes<Quat>,
}

impl BoneTrack {
    pub fn last_time(&self) -> f32 {
        self.translations.last_time().max(self.rotations.last_time())
    }

    pub fn sample_translation(&self, time: f32) -> Option<Vec3> {
        self.translations.sample_with(time, |a, b, s| a.lerp(b, s))
    }

    pub fn sample_rotation(&self, time: f32) -> Option<Quat> {
        self.rotations.sample_with(time, |a, b, s| a.slerp(b, s))
    }
}

/// A skeletal motion clip: a list of [`BoneTrack`]s keyed by [`BonePath`],
/// plus a duration in seconds.
///
/// Clips are loaded from `.motion.ron` files (see [`loader`]) or built in
/// code and inserted into `Assets<MotionClip>` directly.
#[derive(Asset, Reflect, Clone, Debug, Default)]
pub struct MotionClip {
    tracks: Vec<(BonePath, BoneTrack)>,
    paths: HashMap<BonePath, usize>,
    duration: f32,
}

impl MotionClip {
    /// Duration of the clip, in seconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Extends the duration beyond the last keyframe (a trailing hold).
    /// Shrinking below the keyframed range is ignored.
    pub fn set_duration(&mut self, duration: f32) {
        self.duration = self.duration.max(duration);
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&BonePath, &BoneTrack)> {
        self.tracks.iter().map(|(path, track)| (path, track))
    }

    pub fn tracks_mut(&mut self) -> impl Iterator<Item = (&BonePath, &mut BoneTrack)> {
        self.tracks.iter_mut().map(|(path, track)| (&*path, track))
    }

    /// Gets the track for a bone. Returns `None` if the bone has no track.
    pub fn get_track(&self, path: &BonePath) -> Option<&BoneTrack> {
        self.paths
            .get(path)
            .and_then(|idx| self.tracks.get(*idx))
            .map(|(_, track)| track)
    }

    /// Adds a [`BoneTrack`] under a [`BonePath`], replacing any track already
    /// keyed by the same path. The clip duration grows to cover the track.
    pub fn add_track(&mut self, path: BonePath, track: BoneTrack) {
        self.duration = self.duration.max(track.last_time());
        if let Some(idx) = self.paths.get(&path) {
            self.tracks[*idx].1 = track;
        } else {
            self.paths.insert(path.clone(), self.tracks.len());
            self.tracks.push((path, track));
        }
    }

    pub fn from_tracks(tracks: impl IntoIterator<Item = (BonePath, BoneTrack)>) -> Self {
        let mut clip = Self::default();
        for (path, track) in tracks {
            clip.add_track(path, track);
        }
        clip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hips_track() -> BoneTrack {
        BoneTrack {
            translations: Keyframes::new(
                vec![0.0, 1.0, 2.0],
                vec![Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 2.0)],
            ),
            rotations: Keyframes::new(
                vec![0.0, 2.0],
                vec![Quat::IDENTITY, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)],
            ),
        }
    }

    #[test]
    fn duration_covers_longest_track() {
        let mut clip = MotionClip::default();
        clip.add_track(BonePath::from_slashed_string("Armature/Hips"), hips_track());
        clip.add_track(
            BonePath::from_slashed_string("Armature/Hips/Spine"),
            BoneTrack {
                rotations: Keyframes::new(vec![0.0, 3.5], vec![Quat::IDENTITY, Quat::IDENTITY]),
                ..Default::default()
            },
        );
        assert_eq!(clip.duration(), 3.5);
        clip.set_duration(1.0);
        assert_eq!(clip.duration(), 3.5);
        clip.set_duration(5.0);
        assert_eq!(clip.duration(), 5.0);
    }

    #[test]
    fn sampling_interpolates_and_clamps() {
        let track = hips_track();
        assert_eq!(track.sample_translation(-1.0), Some(Vec3::ZERO));
        assert_eq!(track.sample_translation(0.5), Some(Vec3::new(0.0, 0.5, 0.0)));
        assert_eq!(track.sample_translation(1.5), Some(Vec3::new(0.0, 1.0, 1.0)));
        assert_eq!(track.sample_translation(9.0), Some(Vec3::new(0.0, 1.0, 2.0)));

        let mid = track.sample_rotation(1.0).unwrap();
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);
        assert!(mid.angle_between(expected) < 1e-4);
    }

    #[test]
    fn empty_channel_samples_none() {
        let track = BoneTrack::default();
        assert_eq!(track.sample_translation(0.0), None);
        assert_eq!(track.sample_rotation(0.0), None);
    }

    #[test]
    fn adding_same_path_replaces_track() {
        let path = BonePath::from_slashed_string("Armature/Hips");
        let mut clip = MotionClip::from_tracks([(path.clone(), hips_track())]);
        clip.add_track(
            path.clone(),
            BoneTrack {
                translations: Keyframes::new(vec![0.0], vec![Vec3::splat(7.0)]),
                ..Default::default()
            },
        );
        let track = clip.get_track(&path).unwrap();
        assert_eq!(track.sample_translation(0.0), Some(Vec3::splat(7.0)));
        assert_eq!(clip.tracks().count(), 1);
    }

    #[test]
    fn bone_name_matching() {
        let path = BonePath::from_slashed_string("Armature/J_Bip_C_Hips");
        assert!(path.bone_name_contains("Hips"));
        assert!(!path.bone_name_contains("Armature"));
        assert_eq!(path.to_slashed_string(), "Armature/J_Bip_C_Hips");
    }
}
