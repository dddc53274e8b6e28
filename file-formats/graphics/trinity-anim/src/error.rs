use thiserror::Error;

/// Error types for Trinity animation decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimError {
    /// A packed quaternion was read from a buffer of the wrong size
    #[error("Invalid packed quaternion: expected 6 bytes, got {0}")]
    InvalidPackedQuaternion(usize),

    /// A framed channel carries a different number of frames and values
    #[error("Track '{bone}' {channel} channel has {frames} frames but {values} values")]
    TrackLengthMismatch {
        bone: String,
        channel: &'static str,
        frames: usize,
        values: usize,
    },
}

/// Result type using AnimError
pub type Result<T> = std::result::Result<T, AnimError>;
