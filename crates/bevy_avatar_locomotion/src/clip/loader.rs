use bevy::asset::{AssetLoader, LoadContext, io::Reader};
use bevy::reflect::TypePath;
use serde::{Deserialize, Serialize};

use super::{BonePath, BoneTrack, Keyframes, MotionClip};
use crate::errors::ClipLoaderError;

/// One keyframed channel as it appears on disk. `times` and `values` must
/// have the same length; `times` must be non-decreasing.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ChannelSerial<V> {
    #[serde(default)]
    pub times: Vec<f32>,
    #[serde(default)]
    pub values: Vec<V>,
}

impl<V> Default for ChannelSerial<V> {
    fn default() -> Self {
        Self {
            times: vec![],
            values: vec![],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BoneTrackSerial {
    /// Bone path segments, outermost first, e.g. `["Armature", "Hips"]`.
    pub path: Vec<String>,
    #[serde(default)]
    pub translations: ChannelSerial<[f32; 3]>,
    #[serde(default)]
    pub rotations: ChannelSerial<[f32; 4]>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MotionClipSerial {
    /// Explicit duration. When absent the duration is the latest keyframe
    /// time across all tracks.
    #[serde(default)]
    pub duration: Option<f32>,
    pub tracks: Vec<BoneTrackSerial>,
}

fn validated<V: Copy, T: Copy>(
    path: &str,
    channel: &ChannelSerial<V>,
    convert: impl Fn(V) -> T,
) -> Result<Keyframes<T>, ClipLoaderError> {
    if channel.times.len() != channel.values.len() {
        return Err(ClipLoaderError::MismatchedKeyframes {
            path: path.to_owned(),
            times: channel.times.len(),
            values: channel.values.len(),
        });
    }
    if channel.times.windows(2).any(|w| w[1] < w[0]) {
        return Err(ClipLoaderError::UnsortedKeyframes(path.to_owned()));
    }
    Ok(Keyframes::new(
        channel.times.clone(),
        channel.values.iter().copied().map(convert).collect(),
    ))
}

impl TryFrom<MotionClipSerial> for MotionClip {
    type Error = ClipLoaderError;

    fn try_from(serial: MotionClipSerial) -> Result<Self, Self::Error> {
        let mut clip = MotionClip::default();
        for track in &serial.tracks {
            let path: BonePath = track.path.iter().collect();
            let slashed = path.to_slashed_string();
            clip.add_track(
                path,
                BoneTrack {
                    translations: validated(&slashed, &track.translations, bevy::math::Vec3::from_array)?,
                    rotations: validated(&slashed, &track.rotations, bevy::math::Quat::from_array)?,
                },
            );
        }
        if let Some(duration) = serial.duration {
            clip.set_duration(duration);
        }
        Ok(clip)
    }
}

#[derive(Default, TypePath)]
pub struct MotionClipLoader;

impl AssetLoader for MotionClipLoader {
    type Asset = MotionClip;
    type Settings = ();
    type Error = ClipLoaderError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes).await?;
        let serial: MotionClipSerial = ron::de::from_bytes(&bytes)?;
        serial.try_into()
    }

    fn extensions(&self) -> &[&str] {
        &["motion.ron"]
    }
}
