//! Pose evaluation over an armature
//!
//! Matrices use glam's column-vector convention: a bone's world matrix is
//! `parent_world * compensation * local`, where `compensation` undoes the
//! parent's scale for bones with segment scale compensation.

use glam::{Mat4, Quat, Vec3};
use trinity_anim::{AnimationDecoder, Pose};

use crate::armature::{Armature, Bone};

/// Resolved local transform of one bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub scale: Vec3,
    pub rotation: Quat,
    pub translation: Vec3,
}

impl LocalTransform {
    /// The bone's rest transform
    pub fn rest(bone: &Bone) -> Self {
        Self {
            scale: bone.rest_scale,
            rotation: bone.rest_rotation,
            translation: bone.rest_translation,
        }
    }

    /// Animated transform, falling back to the rest pose for every missing channel
    pub fn posed(bone: &Bone, pose: Option<&Pose>) -> Self {
        let rest = Self::rest(bone);
        match pose {
            Some(pose) => Self {
                scale: pose.scale.unwrap_or(rest.scale),
                rotation: pose.rotation.unwrap_or(rest.rotation),
                translation: pose.translation.unwrap_or(rest.translation),
            },
            None => rest,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Scale that cancels `scale`, leaving zero components untouched
fn inverse_scale(scale: Vec3) -> Vec3 {
    let invert = |s: f32| if s == 0.0 { 1.0 } else { 1.0 / s };
    Vec3::new(invert(scale.x), invert(scale.y), invert(scale.z))
}

impl Armature {
    /// Sample every bone from a decoder, None where the clip has no track
    pub fn sample_poses(&self, decoder: &AnimationDecoder, frame: f32) -> Vec<Option<Pose>> {
        self.bones()
            .iter()
            .map(|bone| decoder.try_get_pose(&bone.name, frame))
            .collect()
    }

    /// Local transforms for a set of poses, indexed like the bones
    ///
    /// Bones past the end of `poses` use their rest transform.
    pub fn local_transforms(&self, poses: &[Option<Pose>]) -> Vec<LocalTransform> {
        self.bones()
            .iter()
            .enumerate()
            .map(|(index, bone)| {
                LocalTransform::posed(bone, poses.get(index).and_then(Option::as_ref))
            })
            .collect()
    }

    /// World matrices for a set of poses
    pub fn world_matrices(&self, poses: &[Option<Pose>]) -> Vec<Mat4> {
        let locals = self.local_transforms(poses);
        self.accumulate(
            |index| locals[index].matrix(),
            |parent| locals[parent].scale,
        )
    }

    /// World matrices of the rest pose
    pub fn rest_world_matrices(&self) -> Vec<Mat4> {
        self.world_matrices(&[])
    }

    /// World matrices of the bind pose
    ///
    /// With `use_joint_inverse_bind`, a bone that carries a joint inverse
    /// bind matrix takes its inverse as its world matrix directly.
    pub fn bind_world_matrices(&self, use_joint_inverse_bind: bool) -> Vec<Mat4> {
        let bones = self.bones();
        let mut world = self.accumulate(
            |index| bones[index].rest_local_matrix(),
            |parent| bones[parent].rest_scale,
        );

        if use_joint_inverse_bind {
            // Joint inverse binds are world space and replace the accumulated matrix
            for (index, bone) in bones.iter().enumerate() {
                if let Some(inverse_bind) = bone.joint_inverse_bind {
                    world[index] = inverse_bind.inverse();
                }
            }
        }

        world
    }

    /// Inverse bind matrices, preferring joint inverse binds when requested
    pub fn inverse_bind_matrices(&self, use_joint_inverse_bind: bool) -> Vec<Mat4> {
        let bind_world = self.bind_world_matrices(use_joint_inverse_bind);
        self.bones()
            .iter()
            .zip(bind_world)
            .map(|(bone, world)| match bone.joint_inverse_bind {
                Some(inverse_bind) if use_joint_inverse_bind => inverse_bind,
                _ => world.inverse(),
            })
            .collect()
    }

    /// Skinning matrices (`world * inverse_bind`) for a set of poses
    pub fn skinning_matrices(
        &self,
        poses: &[Option<Pose>],
        use_joint_inverse_bind: bool,
    ) -> Vec<Mat4> {
        self.world_matrices(poses)
            .into_iter()
            .zip(self.inverse_bind_matrices(use_joint_inverse_bind))
            .map(|(world, inverse_bind)| world * inverse_bind)
            .collect()
    }

    /// Walk the hierarchy, resolving parents before children
    ///
    /// Parents may appear after their children. A bone caught in a parent
    /// cycle is treated as a root.
    fn accumulate(
        &self,
        local: impl Fn(usize) -> Mat4,
        parent_scale: impl Fn(usize) -> Vec3,
    ) -> Vec<Mat4> {
        let count = self.bone_count();
        let mut world: Vec<Option<Mat4>> = vec![None; count];
        let mut chain = Vec::new();

        for start in 0..count {
            chain.clear();
            let mut cursor = Some(start);
            while let Some(index) = cursor {
                if world[index].is_some() || chain.contains(&index) {
                    break;
                }
                chain.push(index);
                cursor = self.parent_of(index);
            }

            for &index in chain.iter().rev() {
                let local_matrix = local(index);
                let parent = self
                    .parent_of(index)
                    .and_then(|parent| world[parent].map(|m| (parent, m)));
                let matrix = match parent {
                    Some((parent, parent_world))
                        if self.bones()[index].segment_scale_compensate =>
                    {
                        let compensation = Mat4::from_scale(inverse_scale(parent_scale(parent)));
                        parent_world * compensation * local_matrix
                    }
                    Some((_, parent_world)) => parent_world * local_matrix,
                    None => local_matrix,
                };
                world[index] = Some(matrix);
            }
        }

        world.into_iter().map(|m| m.unwrap_or(Mat4::IDENTITY)).collect()
    }
}
