use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use trinity_skel::{Armature, JointInfo, SkeletonDescriptor, TransformNode};
use trinity_skin::{BlendIndexRemapper, RemapOptions, VertexInfluences, collapse_streams};

fn create_test_armature(bones: usize, joint_infos: usize) -> Armature {
    let nodes = (0..bones)
        .map(|i| {
            // Joint infos are claimed in reverse so no mapping is an identity
            let joint = if i < joint_infos { (joint_infos - 1 - i) as i32 } else { -1 };
            TransformNode::new(format!("Bone_{i:03}"))
                .with_parent(i as i32 - 1)
                .with_joint_info(joint)
        })
        .collect();

    Armature::from_descriptor(&SkeletonDescriptor {
        nodes,
        joint_infos: vec![JointInfo::default(); joint_infos],
        ..Default::default()
    })
}

fn create_test_influences(vertices: usize, max_index: u32) -> Vec<VertexInfluences> {
    (0..vertices)
        .map(|v| {
            let base = v as u32;
            VertexInfluences::new(
                [base % max_index, (base + 1) % max_index, (base + 7) % max_index, 0],
                [0.6, 0.3, 0.1, 0.0],
            )
        })
        .collect()
}

fn bench_remap_submesh(c: &mut Criterion) {
    let armature = create_test_armature(180, 150);
    let remapper = BlendIndexRemapper::new(&armature, RemapOptions::default());
    let influences = create_test_influences(20_000, 150);

    c.bench_function("remap_submesh", |b| {
        b.iter(|| {
            let mut copy = influences.clone();
            black_box(remapper.remap_submesh(black_box(&mut copy), None))
        });
    });
}

fn bench_collapse_streams(c: &mut Criterion) {
    let first = create_test_influences(20_000, 150);
    let second = create_test_influences(20_000, 90);

    c.bench_function("collapse_streams", |b| {
        b.iter(|| black_box(collapse_streams(&[first.as_slice(), second.as_slice()])));
    });
}

criterion_group!(benches, bench_remap_submesh, bench_collapse_streams);
criterion_main!(benches);
