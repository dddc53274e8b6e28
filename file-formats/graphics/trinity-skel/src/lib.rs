//! Skeleton model for Trinity rigs.
//!
//! This crate turns deserialized skeleton descriptors into an [`Armature`]:
//!
//! - merging a character's local skeleton onto its shared base skeleton
//! - locating that base skeleton next to the local one on disk
//! - mapping joint-info, skinning-palette and bone-meta slots to bones
//! - evaluating world, bind and inverse-bind matrices for animated poses
//!
//! # Examples
//!
//! ```
//! use trinity_skel::{Armature, JointInfo, SkeletonDescriptor, TransformNode, merge_skeletons};
//!
//! let base = SkeletonDescriptor {
//!     nodes: vec![TransformNode::new("Origin").with_joint_info(0)],
//!     joint_infos: vec![JointInfo::default()],
//!     ..Default::default()
//! };
//! let local = SkeletonDescriptor {
//!     nodes: vec![TransformNode::new("Tail").with_parent_name("origin").with_joint_info(0)],
//!     joint_infos: vec![JointInfo::default()],
//!     ..Default::default()
//! };
//!
//! let armature = Armature::from_descriptor(&merge_skeletons(&base, &local));
//! assert_eq!(armature.parent_of(1), Some(0));
//! assert_eq!(armature.skinning_palette(), vec![0, 1]);
//! ```

pub mod armature;
pub mod base_resolver;
pub mod descriptor;
pub mod error;
pub mod merge;
pub mod pose;

pub use armature::{Armature, Bone, rotation_from_euler_xyz};
pub use base_resolver::{
    BaseSkeletonResolver, BaseSkeletonTable, FsBaseSkeletonResolver, PROTAG, ResolvedSkeleton,
    SkeletonLoader, guess_category_from_mesh, merge_with_base,
};
pub use descriptor::{HelperBone, JointInfo, SkeletonDescriptor, Transform, TransformNode};
pub use error::{Result, SkelError};
pub use merge::merge_skeletons;
pub use pose::LocalTransform;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
