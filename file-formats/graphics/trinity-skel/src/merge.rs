//! Base and local skeleton merging
//!
//! Character meshes ship a small local skeleton whose root nodes hang off a
//! shared base skeleton by parent name. Merging produces one descriptor with
//! the base nodes first and the local nodes appended, with every index
//! rewritten into the combined spaces.

use std::collections::HashMap;

use log::{debug, trace};
use trinity_anim::bone_key;

use crate::descriptor::{SkeletonDescriptor, TransformNode};

/// Merge a local skeleton onto a base skeleton
///
/// - Base nodes keep their indices.
/// - A local node whose parent name matches a base node (ignoring case) is
///   attached to that node; otherwise a non-negative parent index is shifted
///   past the base nodes and a negative one stays a root.
/// - Local joint-info indices are shifted past the base joint infos.
/// - `skinning_palette_offset` becomes the base joint-info count.
///
/// A shifted index that no longer fits an `i32` becomes `-1`.
pub fn merge_skeletons(
    base: &SkeletonDescriptor,
    local: &SkeletonDescriptor,
) -> SkeletonDescriptor {
    let base_node_count = base.nodes.len();
    let base_joint_count = base.joint_infos.len();

    let mut base_index_by_name = HashMap::with_capacity(base_node_count);
    for (index, node) in base.nodes.iter().enumerate() {
        let key = bone_key(&node.name);
        if !key.is_empty() {
            // Later duplicates win
            base_index_by_name.insert(key, index);
        }
    }

    let mut nodes = Vec::with_capacity(base_node_count + local.nodes.len());
    nodes.extend(base.nodes.iter().cloned());

    let mut attached = 0usize;
    for node in &local.nodes {
        let parent_key = bone_key(&node.parent_name);
        let parent_index = if let Some(&base_parent) = base_index_by_name.get(&parent_key) {
            trace!("Attaching '{}' to base bone '{}'", node.name, node.parent_name);
            attached += 1;
            base_parent as i32
        } else {
            shift_index(node.parent_index, base_node_count)
        };
        let joint_info_index = shift_index(node.joint_info_index, base_joint_count);

        nodes.push(TransformNode {
            parent_index,
            joint_info_index,
            ..node.clone()
        });
    }

    let mut joint_infos = Vec::with_capacity(base_joint_count + local.joint_infos.len());
    joint_infos.extend_from_slice(&base.joint_infos);
    joint_infos.extend_from_slice(&local.joint_infos);

    let helper_bones = if base.helper_bones.is_empty() {
        local.helper_bones.clone()
    } else {
        base.helper_bones.clone()
    };

    debug!(
        "Merged skeleton: {} base + {} local nodes ({} attached by name), {} joint infos",
        base_node_count,
        local.nodes.len(),
        attached,
        joint_infos.len()
    );

    SkeletonDescriptor {
        version: if base.version != 0 { base.version } else { local.version },
        nodes,
        joint_infos,
        helper_bones,
        bone_meta: merge_bone_meta(base, local),
        skinning_palette_offset: base_joint_count as i32,
        is_interior_map: base.is_interior_map || local.is_interior_map,
    }
}

/// Base table when present, otherwise the local table shifted into merged bone indices
fn merge_bone_meta(base: &SkeletonDescriptor, local: &SkeletonDescriptor) -> Vec<i32> {
    if !base.bone_meta.is_empty() {
        return base.bone_meta.clone();
    }

    let offset = base.nodes.len();
    local
        .bone_meta
        .iter()
        .map(|&bone| shift_index(bone, offset))
        .collect()
}

/// Shift a non-negative index by `offset`, leaving negative ones alone
fn shift_index(index: i32, offset: usize) -> i32 {
    if index < 0 {
        return index;
    }
    i32::try_from(offset)
        .ok()
        .and_then(|offset| index.checked_add(offset))
        .unwrap_or(-1)
}
