use thiserror::Error;

/// Per-frame recognition conditions.
///
/// None of these are fatal to a session: the pipeline turns every variant
/// into "no letter this frame" and keeps going. They are surfaced as values so
/// that callers and logs can tell an empty frame from a degraded one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError {
    /// Fewer than 21 landmarks were tracked for the hand.
    #[error("insufficient landmarks: expected 21, found {found}")]
    InsufficientLandmarks { found: usize },

    /// A finger's pose matched none of the curl states.
    #[error("curl state undetermined for finger {finger}")]
    FingerUndetermined { finger: usize },

    /// The learned classifier was unavailable, failed, or timed out.
    #[error("missing model output: {0}")]
    MissingModelOutput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid class names: {0}")]
    InvalidClassNames(String),
}
