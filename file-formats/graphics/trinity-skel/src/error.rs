use std::io;
use thiserror::Error;

/// Error types for skeleton construction and base-skeleton loading
#[derive(Error, Debug)]
pub enum SkelError {
    /// I/O error while reading a skeleton file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A bone points at a parent outside the bone list
    #[error("Bone {bone} has parent {parent}, but the skeleton only has {count} bones")]
    InvalidParent { bone: usize, parent: i32, count: usize },

    /// A bone points at a parent that appears later in the bone list
    #[error("Bone {bone} references parent {parent} that comes after it")]
    ForwardParentReference { bone: usize, parent: usize },

    /// A bone points at a joint info outside the joint-info table
    #[error("Bone {bone} has joint info {index}, but the table only has {count} entries")]
    InvalidJointInfoIndex { bone: usize, index: i32, count: usize },

    /// The base skeleton could not be loaded
    #[error("Base skeleton error: {0}")]
    BaseSkeleton(String),
}

/// Result type using SkelError
pub type Result<T> = std::result::Result<T, SkelError>;
