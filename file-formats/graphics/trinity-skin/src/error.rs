use thiserror::Error;

/// Error types for skinning stream processing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkinError {
    /// Two parallel skinning streams disagree on their vertex count
    #[error("Skinning stream {stream} has {actual} vertices, expected {expected}")]
    SkinningMismatch {
        stream: usize,
        expected: usize,
        actual: usize,
    },
}

/// Result type using SkinError
pub type Result<T> = std::result::Result<T, SkinError>;
