use thiserror::Error;

/// Possible errors produced while loading a
/// [`MotionClip`](crate::clip::MotionClip) from a `.motion.ron` file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClipLoaderError {
    /// An [IO](std::io) error
    #[error("could not read clip file: {0}")]
    Io(#[from] std::io::Error),
    /// A [RON](ron) error
    #[error("could not parse RON: {0}")]
    RonSpannedError(#[from] ron::error::SpannedError),
    #[error("track '{path}' has {times} keyframe times but {values} values")]
    MismatchedKeyframes {
        path: String,
        times: usize,
        values: usize,
    },
    #[error("track '{0}' has decreasing keyframe times")]
    UnsortedKeyframes(String),
}
