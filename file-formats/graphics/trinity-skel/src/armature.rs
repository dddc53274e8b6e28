//! Bone hierarchy built from a skeleton descriptor
//!
//! The armature keeps the rest pose of every node along with the skinning
//! attributes taken from its joint info, and exposes the auxiliary index
//! tables that vertex blend indices may be expressed in.

use glam::{Mat4, Quat, Vec3};
use log::{debug, trace};
use trinity_anim::bone_key;

use crate::descriptor::{SkeletonDescriptor, TransformNode};
use crate::error::{Result, SkelError};

/// Rest rotation from XYZ Euler angles, applied X first, then Y, then Z
pub fn rotation_from_euler_xyz(euler: Vec3) -> Quat {
    let q = Quat::from_rotation_z(euler.z)
        * Quat::from_rotation_y(euler.y)
        * Quat::from_rotation_x(euler.x);
    q.normalize()
}

/// One bone of an armature
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Bone {
    pub name: String,
    /// Parent bone, None for roots and for links that point outside the armature
    pub parent: Option<usize>,
    /// Parent index exactly as stored in the descriptor
    pub raw_parent: i32,
    pub parent_name: String,
    pub joint_info: Option<usize>,
    /// Joint-info index exactly as stored in the descriptor
    pub raw_joint_info: i32,
    pub rest_scale: Vec3,
    pub rest_rotation: Quat,
    pub rest_translation: Vec3,
    pub rest_euler: Vec3,
    /// Whether vertices may be skinned to this bone
    pub skinning: bool,
    pub segment_scale_compensate: bool,
    /// World-space inverse bind matrix supplied by the joint info
    pub joint_inverse_bind: Option<Mat4>,
}

impl Bone {
    fn from_node(index: usize, node: &TransformNode, node_count: usize) -> Self {
        let parent = usize::try_from(node.parent_index)
            .ok()
            .filter(|&parent| parent < node_count && parent != index);
        let rest_euler = node.transform.rotate;

        Self {
            name: node.name.clone(),
            parent,
            raw_parent: node.parent_index,
            parent_name: node.parent_name.clone(),
            joint_info: None,
            raw_joint_info: node.joint_info_index,
            rest_scale: node.transform.scale,
            rest_rotation: rotation_from_euler_xyz(rest_euler),
            rest_translation: node.transform.translate,
            rest_euler,
            skinning: false,
            segment_scale_compensate: false,
            joint_inverse_bind: None,
        }
    }

    /// Local rest matrix, scale then rotation then translation
    pub fn rest_local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.rest_scale,
            self.rest_rotation,
            self.rest_translation,
        )
    }
}

/// A bone hierarchy with its blend-index tables
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Armature {
    bones: Vec<Bone>,
    /// Joint-info slot to bone index, None where no bone claims the slot
    joint_info_to_bone: Vec<Option<usize>>,
    /// Bone-meta slot to bone index as stored in the descriptor
    bone_meta: Vec<i32>,
    skinning_palette_offset: i32,
}

impl Armature {
    /// Build an armature from a skeleton descriptor
    ///
    /// Bones without a joint info are non-skinning. When several nodes claim
    /// the same joint info, the last one owns the slot.
    pub fn from_descriptor(descriptor: &SkeletonDescriptor) -> Self {
        let node_count = descriptor.nodes.len();
        let mut bones: Vec<Bone> = descriptor
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| Bone::from_node(index, node, node_count))
            .collect();

        let mut joint_info_to_bone = vec![None; descriptor.joint_infos.len()];
        for (index, node) in descriptor.nodes.iter().enumerate() {
            let Some(joint) = usize::try_from(node.joint_info_index)
                .ok()
                .filter(|&joint| joint < descriptor.joint_infos.len())
            else {
                continue;
            };

            let info = &descriptor.joint_infos[joint];
            let bone = &mut bones[index];
            bone.joint_info = Some(joint);
            bone.skinning = info.influence_skinning;
            bone.segment_scale_compensate = info.segment_scale_compensate;
            bone.joint_inverse_bind = info.inverse_bind_pose;

            if let Some(previous) = joint_info_to_bone[joint] {
                trace!("Joint info {joint} claimed by bone {previous} and {index}");
            }
            joint_info_to_bone[joint] = Some(index);
        }

        debug!(
            "Armature: {} bones, {} joint infos ({} mapped), {} bone meta, palette offset {}",
            bones.len(),
            joint_info_to_bone.len(),
            joint_info_to_bone.iter().flatten().count(),
            descriptor.bone_meta.len(),
            descriptor.skinning_palette_offset
        );

        Self {
            bones,
            joint_info_to_bone,
            bone_meta: descriptor.bone_meta.clone(),
            skinning_palette_offset: descriptor.skinning_palette_offset,
        }
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Find a bone by name, ignoring case
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        let key = bone_key(name);
        self.bones.iter().position(|bone| bone_key(&bone.name) == key)
    }

    /// Whether the bone exists and may receive skinning influence
    pub fn is_skinning(&self, index: usize) -> bool {
        self.bones.get(index).is_some_and(|bone| bone.skinning)
    }

    /// Parent of a bone, if it has one inside the armature
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|bone| bone.parent)
    }

    pub fn joint_info_count(&self) -> usize {
        self.joint_info_to_bone.len()
    }

    /// Bone index for a joint-info slot
    ///
    /// Out-of-range and unclaimed slots map to bone 0.
    pub fn map_joint_info(&self, joint_info: usize) -> usize {
        self.joint_info_to_bone
            .get(joint_info)
            .copied()
            .flatten()
            .unwrap_or(0)
    }

    /// Flat palette mapping every joint-info slot to a bone, unclaimed slots to 0
    pub fn skinning_palette(&self) -> Vec<usize> {
        self.joint_info_to_bone
            .iter()
            .map(|bone| bone.unwrap_or(0))
            .collect()
    }

    /// Joint infos that belong to a base skeleton in a merged armature
    pub fn skinning_palette_offset(&self) -> i32 {
        self.skinning_palette_offset
    }

    pub fn bone_meta_count(&self) -> usize {
        self.bone_meta.len()
    }

    /// Bone index for a bone-meta slot
    ///
    /// Out-of-range slots and negative entries map to bone 0.
    pub fn map_bone_meta(&self, slot: usize) -> usize {
        self.bone_meta
            .get(slot)
            .and_then(|&bone| usize::try_from(bone).ok())
            .unwrap_or(0)
    }

    /// Check parent and joint-info links of a descriptor
    ///
    /// Construction tolerates broken links; this reports them for callers
    /// that want strict input. Parents must precede their children.
    pub fn validate_descriptor(descriptor: &SkeletonDescriptor) -> Result<()> {
        let count = descriptor.nodes.len();
        let joint_count = descriptor.joint_infos.len();

        descriptor.nodes.iter().enumerate().try_for_each(|(bone, node)| {
            check_links(bone, node.parent_index, node.joint_info_index, count, joint_count)
        })
    }

    /// Check the links this armature was built from
    pub fn validate(&self) -> Result<()> {
        let count = self.bones.len();
        let joint_count = self.joint_info_to_bone.len();

        self.bones.iter().enumerate().try_for_each(|(bone, entry)| {
            check_links(bone, entry.raw_parent, entry.raw_joint_info, count, joint_count)
        })
    }
}

fn check_links(
    bone: usize,
    parent: i32,
    joint_info: i32,
    count: usize,
    joint_count: usize,
) -> Result<()> {
    if let Ok(parent_index) = usize::try_from(parent) {
        if parent_index >= count {
            return Err(SkelError::InvalidParent { bone, parent, count });
        }
        if parent_index >= bone {
            return Err(SkelError::ForwardParentReference {
                bone,
                parent: parent_index,
            });
        }
    }

    if usize::try_from(joint_info).is_ok_and(|index| index >= joint_count) {
        return Err(SkelError::InvalidJointInfoIndex {
            bone,
            index: joint_info,
            count: joint_count,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{JointInfo, Transform};
    use pretty_assertions::assert_eq;
    use std::f32::consts::FRAC_PI_2;

    fn descriptor() -> SkeletonDescriptor {
        SkeletonDescriptor {
            nodes: vec![
                TransformNode::new("Origin"),
                TransformNode::new("Waist").with_parent(0).with_joint_info(1),
                TransformNode::new("Spine").with_parent(1).with_joint_info(0),
                TransformNode::new("Cloth").with_parent(2).with_joint_info(2),
            ],
            joint_infos: vec![
                JointInfo::default(),
                JointInfo {
                    segment_scale_compensate: true,
                    ..Default::default()
                },
                JointInfo {
                    influence_skinning: false,
                    ..Default::default()
                },
                JointInfo::default(),
            ],
            bone_meta: vec![3, -1],
            skinning_palette_offset: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_joint_info_mapping() {
        let armature = Armature::from_descriptor(&descriptor());

        assert_eq!(armature.joint_info_count(), 4);
        assert_eq!(armature.map_joint_info(0), 2);
        assert_eq!(armature.map_joint_info(1), 1);
        assert_eq!(armature.map_joint_info(2), 3);
        // Unclaimed and out-of-range slots fall back to bone 0
        assert_eq!(armature.map_joint_info(3), 0);
        assert_eq!(armature.map_joint_info(99), 0);
        assert_eq!(armature.skinning_palette(), vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_skinning_flags_come_from_joint_info() {
        let armature = Armature::from_descriptor(&descriptor());

        assert!(!armature.is_skinning(0), "no joint info means no skinning");
        assert!(armature.is_skinning(1));
        assert!(armature.is_skinning(2));
        assert!(!armature.is_skinning(3));
        assert!(!armature.is_skinning(42));
        assert!(armature.bones()[1].segment_scale_compensate);
    }

    #[test]
    fn test_bone_meta_mapping() {
        let armature = Armature::from_descriptor(&descriptor());

        assert_eq!(armature.bone_meta_count(), 2);
        assert_eq!(armature.map_bone_meta(0), 3);
        assert_eq!(armature.map_bone_meta(1), 0);
        assert_eq!(armature.map_bone_meta(2), 0);
    }

    #[test]
    fn test_parents_outside_the_armature_become_roots() {
        let mut skel = descriptor();
        skel.nodes[2].parent_index = 40;
        skel.nodes[3].parent_index = 3;
        let armature = Armature::from_descriptor(&skel);

        assert_eq!(armature.parent_of(1), Some(0));
        assert_eq!(armature.parent_of(2), None);
        assert_eq!(armature.parent_of(3), None);
        assert!(matches!(
            armature.validate(),
            Err(SkelError::InvalidParent { bone: 2, parent: 40, count: 4 })
        ));
    }

    #[test]
    fn test_validate_descriptor() {
        assert!(Armature::validate_descriptor(&descriptor()).is_ok());

        let mut forward = descriptor();
        forward.nodes[1].parent_index = 2;
        assert!(matches!(
            Armature::validate_descriptor(&forward),
            Err(SkelError::ForwardParentReference { bone: 1, parent: 2 })
        ));

        let mut joint = descriptor();
        joint.nodes[0].joint_info_index = 4;
        assert!(matches!(
            Armature::validate_descriptor(&joint),
            Err(SkelError::InvalidJointInfoIndex { bone: 0, index: 4, count: 4 })
        ));
    }

    #[test]
    fn test_find_bone_ignores_case() {
        let armature = Armature::from_descriptor(&descriptor());
        assert_eq!(armature.find_bone("SPINE"), Some(2));
        assert_eq!(armature.find_bone("Tail"), None);
    }

    #[test]
    fn test_rest_rotation_applies_x_then_y_then_z() {
        let q = rotation_from_euler_xyz(Vec3::new(FRAC_PI_2, FRAC_PI_2, 0.0));
        // X maps +Y to +Z, then Y maps +Z to +X
        let v = q * Vec3::Y;
        assert!((v - Vec3::X).length() < 1e-5, "{v:?}");
    }

    #[test]
    fn test_rest_local_matrix() {
        let mut skel = descriptor();
        skel.nodes[0].transform = Transform {
            scale: Vec3::splat(2.0),
            rotate: Vec3::ZERO,
            translate: Vec3::new(0.0, 1.0, 0.0),
        };
        let armature = Armature::from_descriptor(&skel);

        let p = armature.bones()[0].rest_local_matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
    }
}
