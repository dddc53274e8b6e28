//! In-memory skeleton descriptor
//!
//! These types mirror a deserialized skeleton file: a flat list of transform
//! nodes, a separate joint-info table, helper bones and auxiliary index
//! tables. Parent and joint-info links are signed indices where a negative
//! value means "none".

use glam::{Mat4, Vec3, Vec4};

/// Rest transform of a node, rotation stored as XYZ Euler angles in radians
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub scale: Vec3,
    pub rotate: Vec3,
    pub translate: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotate: Vec3::ZERO,
            translate: Vec3::ZERO,
        }
    }
}

/// One node of the transform hierarchy
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformNode {
    pub name: String,
    pub transform: Transform,
    pub scale_pivot: Vec3,
    pub rotate_pivot: Vec3,
    /// Index of the parent node, negative for a root
    pub parent_index: i32,
    /// Index into the joint-info table, negative when the node has none
    pub joint_info_index: i32,
    /// Name of the parent node, used to attach local nodes to a base skeleton
    pub parent_name: String,
    pub priority: i32,
    pub priority_pass: bool,
    pub ignore_parent_rotation: bool,
}

impl TransformNode {
    /// Create a root node with an identity transform and no joint info
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            scale_pivot: Vec3::ZERO,
            rotate_pivot: Vec3::ZERO,
            parent_index: -1,
            joint_info_index: -1,
            parent_name: String::new(),
            priority: 0,
            priority_pass: false,
            ignore_parent_rotation: false,
        }
    }

    pub fn with_parent(mut self, parent_index: i32) -> Self {
        self.parent_index = parent_index;
        self
    }

    pub fn with_parent_name<S: Into<String>>(mut self, parent_name: S) -> Self {
        self.parent_name = parent_name.into();
        self
    }

    pub fn with_joint_info(mut self, joint_info_index: i32) -> Self {
        self.joint_info_index = joint_info_index;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Per-joint skinning attributes
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct JointInfo {
    /// Undo the parent's scale before applying this joint's transform
    pub segment_scale_compensate: bool,
    /// Whether vertices may be skinned to this joint
    pub influence_skinning: bool,
    /// Inverse bind matrix in world space, when the file provides one
    pub inverse_bind_pose: Option<Mat4>,
}

impl Default for JointInfo {
    fn default() -> Self {
        Self {
            segment_scale_compensate: false,
            influence_skinning: true,
            inverse_bind_pose: None,
        }
    }
}

impl JointInfo {
    /// Build an inverse bind matrix from its four stored axes
    ///
    /// The axes are the rotation/scale basis and the translation; the implicit
    /// fourth row is `(0, 0, 0, 1)`.
    pub fn inverse_bind_from_axes(x: Vec3, y: Vec3, z: Vec3, w: Vec3) -> Mat4 {
        Mat4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), w.extend(1.0))
    }
}

/// Procedural helper bone constraint
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct HelperBone {
    pub output: String,
    pub target: String,
    pub reference: String,
    pub kind: String,
    pub up_type: String,
    pub weight: Vec3,
    pub adjust: Vec4,
}

/// A complete skeleton as read from a file
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SkeletonDescriptor {
    pub version: u32,
    pub nodes: Vec<TransformNode>,
    pub joint_infos: Vec<JointInfo>,
    pub helper_bones: Vec<HelperBone>,
    /// Auxiliary blend-index table mapping a slot to a bone index, often empty
    pub bone_meta: Vec<i32>,
    /// Number of joint infos that precede this skeleton's own in a merged palette
    pub skinning_palette_offset: i32,
    pub is_interior_map: bool,
}

impl SkeletonDescriptor {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Find a node by name, ignoring case
    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.name.eq_ignore_ascii_case(name))
    }
}
