//! Base/local skeleton merging through to the armature

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use trinity_skel::{
    Armature, FsBaseSkeletonResolver, JointInfo, Result, SkeletonDescriptor, TransformNode,
    guess_category_from_mesh, merge_skeletons, merge_with_base,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn skeleton(prefix: &str, bones: usize, joint_infos: usize) -> SkeletonDescriptor {
    SkeletonDescriptor {
        version: 1,
        nodes: (0..bones)
            .map(|i| {
                let joint = if i < joint_infos { i as i32 } else { -1 };
                TransformNode::new(format!("{prefix}{i:02}"))
                    .with_parent(i as i32 - 1)
                    .with_joint_info(joint)
            })
            .collect(),
        joint_infos: vec![JointInfo::default(); joint_infos],
        ..Default::default()
    }
}

fn base_and_local() -> (SkeletonDescriptor, SkeletonDescriptor) {
    let base = skeleton("base_", 20, 5);
    let mut local = skeleton("local_", 10, 3);
    local.nodes[0].parent_name = "BASE_04".to_string();
    (base, local)
}

#[test]
fn test_merge_twenty_and_ten_bones() {
    init_logging();
    let (base, local) = base_and_local();
    let merged = merge_skeletons(&base, &local);

    assert_eq!(merged.nodes.len(), 30);
    assert_eq!(merged.nodes[20].parent_index, 4);
    assert_eq!(merged.nodes[21].parent_index, 20);
    assert_eq!(merged.joint_infos.len(), 8);
    assert_eq!(merged.skinning_palette_offset, 5);

    let armature = Armature::from_descriptor(&merged);
    assert!(armature.validate().is_ok());
    assert_eq!(armature.map_joint_info(4), 4);
    assert_eq!(armature.map_joint_info(5), 20);
    assert_eq!(armature.map_joint_info(7), 22);
    assert_eq!(armature.skinning_palette_offset(), 5);
    assert!(armature.is_skinning(22));
    assert!(!armature.is_skinning(23));

    // Parents always precede children after the merge
    for (index, bone) in armature.bones().iter().enumerate() {
        if let Some(parent) = bone.parent {
            assert!(parent < index, "bone {index} has parent {parent}");
        }
    }
}

#[test]
fn test_merge_with_base_from_disk() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let mesh = temp.path().join("chara/model/npc/dm_0042/dm_0042_body.trmdl");
    let local_path = mesh.with_file_name("dm_0042.trskl");
    let base_path = temp.path().join("chara/model_cc_base/dm/dm_base.trskl");
    fs::create_dir_all(local_path.parent().unwrap()).unwrap();
    fs::create_dir_all(base_path.parent().unwrap()).unwrap();
    fs::write(&local_path, b"local").unwrap();
    fs::write(&base_path, b"base").unwrap();

    let (base, local) = base_and_local();
    let loader = move |path: &Path| -> Result<SkeletonDescriptor> {
        assert_eq!(fs::read(path)?, b"base");
        Ok(base.clone())
    };

    let category = guess_category_from_mesh(&mesh);
    assert_eq!(category.as_deref(), Some("CommonNPCdm"));

    let resolved = merge_with_base(
        local,
        &local_path,
        category.as_deref(),
        &FsBaseSkeletonResolver::default(),
        &loader,
    );

    assert_eq!(resolved.base_path, Some(base_path));
    assert_eq!(resolved.descriptor.nodes.len(), 30);
    assert_eq!(resolved.descriptor.skinning_palette_offset, 5);
}
