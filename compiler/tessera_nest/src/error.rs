//! Errors raised while declaring or lowering a nest.

use tessera_backend::BackendError;
use tessera_ir::DeferredError;

/// Fatal error for the current declaration or lowering call.
///
/// Nothing is retried internally. A failed pass leaves the nest's
/// declaration-time state (shape, commands, logic functions) untouched.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum NestError {
    /// A logic function is malformed.
    #[error("invalid logic `{name}`: {reason}")]
    InvalidLogic { name: String, reason: String },

    /// A build was attempted while a dimension is still deferred.
    #[error("dimension {dimension} is still deferred (`{parameter}`); replay deferred values before building")]
    UnresolvedShape { dimension: usize, parameter: String },

    /// A deferred value yielded no integer.
    #[error(transparent)]
    UnresolvableDeferred(#[from] DeferredError),

    /// A capture could not be turned into a backend value.
    #[error("capture `{capture}` of `{logic}` could not be resolved: {reason}")]
    CaptureResolution {
        logic: String,
        capture: String,
        reason: String,
    },

    /// Front-end and runtime arguments do not line up.
    #[error("argument {position}: {reason}")]
    ArgumentMismatch { position: usize, reason: String },

    /// The backend returned a space whose rank differs from the nest's.
    #[error("backend created a space of rank {found}, nest has rank {expected}")]
    SpaceRankMismatch { expected: usize, found: usize },

    /// Commands were replayed before the native space was created.
    #[error("no native space in the build context; run build_context first")]
    MissingSpace,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
