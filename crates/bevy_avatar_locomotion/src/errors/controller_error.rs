use thiserror::Error;

/// Errors surfaced synchronously by [`AvatarController`](crate::controller::AvatarController)
/// operations. None of these are produced from inside the per-frame tick:
/// a missing or unloaded action degrades to motion without animation instead.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// An operation that requires a resolved action library was invoked
    /// while clips were still loading.
    #[error("avatar actions are still loading")]
    NotReady,
    /// No action was registered (or it failed to load) under this name.
    #[error("no action registered under '{0}'")]
    MissingAction(String),
    /// A gesture overlay is already active; a second one would corrupt the
    /// restore snapshot.
    #[error("a gesture overlay is already active")]
    GestureInProgress,
    /// The gesture clip is not present in `Assets<MotionClip>`.
    #[error("gesture clip is not loaded")]
    ClipUnavailable,
}

pub type ControllerResult<T> = Result<T, ControllerError>;
