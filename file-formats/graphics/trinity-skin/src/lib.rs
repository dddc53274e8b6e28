//! Skinning stream processing for Trinity meshes.
//!
//! Raw vertex blend indices may address bones, joint-info slots, the
//! skinning palette, the bone-meta table or a per-submesh bone-weight table.
//! [`BlendIndexRemapper`] picks the interpretation per submesh and rewrites
//! the indices so they address [`Armature`](trinity_skel::Armature) bones.
//!
//! # Examples
//!
//! ```
//! use trinity_skel::{Armature, JointInfo, SkeletonDescriptor, TransformNode};
//! use trinity_skin::{BlendIndexRemapper, RemapMode, RemapOptions, VertexInfluences};
//!
//! // Bone 0 is a non-skinning origin, joint info 0 belongs to bone 1
//! let armature = Armature::from_descriptor(&SkeletonDescriptor {
//!     nodes: vec![
//!         TransformNode::new("Origin"),
//!         TransformNode::new("Hips").with_parent(0).with_joint_info(0),
//!     ],
//!     joint_infos: vec![JointInfo::default()],
//!     ..Default::default()
//! });
//!
//! let mut influences = vec![VertexInfluences::new([0, 0, 0, 0], [1.0, 0.0, 0.0, 0.0])];
//! let remapper = BlendIndexRemapper::new(&armature, RemapOptions::default());
//! let report = remapper.remap_submesh(&mut influences, None);
//!
//! assert_eq!(report.mode, RemapMode::JointInfo);
//! assert_eq!(influences[0].indices[0], 1);
//! ```

pub mod error;
pub mod influence;
pub mod remap;

pub use error::{Result, SkinError};
pub use influence::{BlendIndexStats, VertexInfluences, collapse_streams};
pub use remap::{BlendIndexRemapper, BoneWeight, RemapMode, RemapOptions, RemapReport, RemapScore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
