//! Blend-index remapping
//!
//! Vertex blend indices are not stored in a single index space. Depending on
//! the asset generation they address bones directly, joint-info slots, the
//! skinning palette, the bone-meta table, or a per-submesh bone-weight
//! table. The remapper picks one interpretation per submesh and rewrites the
//! indices into bone indices of the armature.
//!
//! Selection order:
//!
//! 1. A per-submesh bone-weight table that covers every weighted index.
//! 2. The joint-info shortcut for rigs with many more bones than joint infos,
//!    when the joint-info table is not an identity mapping.
//! 3. A score over a bounded sample of vertices: fewest indices mapped
//!    outside the armature, then fewest mapped to non-skinning bones. Leaving
//!    indices untouched is the baseline a candidate must strictly beat.
//! 4. When nothing beats the baseline, a joint-info (then skinning-palette)
//!    mapping that scores exactly the same is preferred.

use log::{debug, trace};
use trinity_skel::Armature;

use crate::influence::{BlendIndexStats, VertexInfluences};

/// How raw blend indices are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum RemapMode {
    /// Indices already address bones
    #[default]
    None,
    /// Indices address the submesh's bone-weight table
    BoneWeights,
    /// Indices address joint-info slots
    JointInfo,
    /// Indices address the skinning palette
    SkinningPalette,
    /// Indices address the bone-meta table
    BoneMeta,
}

/// Entry of a per-submesh bone-weight table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneWeight {
    /// Bone index in the armature, negative when unassigned
    pub rig_index: i32,
}

impl BoneWeight {
    pub const fn new(rig_index: i32) -> Self {
        Self { rig_index }
    }
}

/// Options controlling mode selection
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RemapOptions {
    /// Vertices sampled when scoring a candidate mode
    pub score_sample_limit: usize,
    /// Highest joint-info slot checked by the identity probe
    pub joint_info_probe_limit: usize,
    /// How many more bones than joint infos a rig needs for the joint-info shortcut
    pub min_extra_bones_for_joint_info: usize,
    /// Influences at or below this weight are ignored while scoring
    pub score_weight_threshold: f32,
}

impl Default for RemapOptions {
    fn default() -> Self {
        Self {
            score_sample_limit: 2048,
            joint_info_probe_limit: 64,
            min_extra_bones_for_joint_info: 16,
            score_weight_threshold: 0.0001,
        }
    }
}

/// Quality of a mode over a vertex sample, lower is better
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RemapScore {
    /// Influences mapped outside `[0, bone_count)`
    pub out_of_range: usize,
    /// Influences mapped to a bone that does not take skinning
    pub non_influencer: usize,
}

/// Outcome of remapping one submesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapReport {
    pub mode: RemapMode,
    /// Statistics of the raw indices, before rewriting
    pub stats: BlendIndexStats,
    /// Number of slots whose index changed
    pub rewritten: usize,
}

/// Rewrites raw blend indices into armature bone indices
#[derive(Debug, Clone)]
pub struct BlendIndexRemapper<'a> {
    armature: &'a Armature,
    palette: Vec<usize>,
    options: RemapOptions,
}

impl<'a> BlendIndexRemapper<'a> {
    pub fn new(armature: &'a Armature, options: RemapOptions) -> Self {
        Self {
            armature,
            palette: armature.skinning_palette(),
            options,
        }
    }

    pub fn options(&self) -> &RemapOptions {
        &self.options
    }

    /// Pick the interpretation of a submesh's raw indices
    pub fn select_mode(
        &self,
        influences: &[VertexInfluences],
        bone_weights: Option<&[BoneWeight]>,
    ) -> RemapMode {
        let stats = BlendIndexStats::from_influences(influences);
        self.select_mode_with_stats(influences, bone_weights, &stats)
    }

    fn select_mode_with_stats(
        &self,
        influences: &[VertexInfluences],
        bone_weights: Option<&[BoneWeight]>,
        stats: &BlendIndexStats,
    ) -> RemapMode {
        if let Some(table) = bone_weights
            && covers_weighted_indices(table, influences)
        {
            return RemapMode::BoneWeights;
        }

        if self.joint_info_shortcut_applies(stats.max_index as usize) {
            debug!(
                "Joint-info shortcut: max index {} < {} joint infos, {} bones",
                stats.max_index,
                self.armature.joint_info_count(),
                self.armature.bone_count()
            );
            return RemapMode::JointInfo;
        }

        let baseline = self.score(RemapMode::None, influences, bone_weights);
        let mut best = (RemapMode::None, baseline);

        for mode in [RemapMode::JointInfo, RemapMode::SkinningPalette, RemapMode::BoneMeta] {
            if !self.is_available(mode) {
                continue;
            }
            let score = self.score(mode, influences, bone_weights);
            trace!("{mode:?} scores {score:?}");
            if score < best.1 {
                best = (mode, score);
            }
        }

        if best.0 == RemapMode::None {
            for mode in [RemapMode::JointInfo, RemapMode::SkinningPalette] {
                if self.is_available(mode)
                    && self.score(mode, influences, bone_weights) == baseline
                {
                    best.0 = mode;
                    break;
                }
            }
        }

        debug!("Selected {:?} (baseline {baseline:?}, best {:?})", best.0, best.1);
        best.0
    }

    /// Select a mode and rewrite the influences in place
    pub fn remap_submesh(
        &self,
        influences: &mut [VertexInfluences],
        bone_weights: Option<&[BoneWeight]>,
    ) -> RemapReport {
        let stats = BlendIndexStats::from_influences(influences);
        let mode = self.select_mode_with_stats(influences, bone_weights, &stats);
        let rewritten = self.apply(mode, influences, bone_weights);

        debug!(
            "Remapped {} vertices with {mode:?}: {rewritten} slots rewritten, max raw index {}",
            stats.vertex_count, stats.max_index
        );

        RemapReport {
            mode,
            stats,
            rewritten,
        }
    }

    /// Rewrite the influences through one mode, returning the number of changed slots
    ///
    /// Only slots with a positive weight are rewritten. An index is kept when
    /// the mode has no entry for it or the entry lands outside the armature.
    pub fn apply(
        &self,
        mode: RemapMode,
        influences: &mut [VertexInfluences],
        bone_weights: Option<&[BoneWeight]>,
    ) -> usize {
        if mode == RemapMode::None {
            return 0;
        }

        let mut rewritten = 0;
        for vertex in influences.iter_mut() {
            for (index, &weight) in vertex.indices.iter_mut().zip(vertex.weights.iter()) {
                if weight <= 0.0 {
                    continue;
                }
                let mapped = self.apply_index(mode, *index, bone_weights);
                if mapped != *index {
                    *index = mapped;
                    rewritten += 1;
                }
            }
        }
        rewritten
    }

    /// Score a mode over the first vertices of a submesh
    pub fn score(
        &self,
        mode: RemapMode,
        influences: &[VertexInfluences],
        bone_weights: Option<&[BoneWeight]>,
    ) -> RemapScore {
        let mut score = RemapScore::default();
        let bone_count = self.armature.bone_count() as i64;

        for vertex in influences.iter().take(self.options.score_sample_limit) {
            for (&raw, &weight) in vertex.indices.iter().zip(vertex.weights.iter()) {
                if weight <= self.options.score_weight_threshold {
                    continue;
                }
                let mapped = self.map_index(mode, raw, bone_weights);
                if mapped < 0 || mapped >= bone_count {
                    score.out_of_range += 1;
                } else if !self.armature.is_skinning(mapped as usize) {
                    score.non_influencer += 1;
                }
            }
        }

        score
    }

    fn is_available(&self, mode: RemapMode) -> bool {
        match mode {
            RemapMode::None => true,
            RemapMode::BoneWeights => false,
            RemapMode::JointInfo => self.armature.joint_info_count() > 0,
            RemapMode::SkinningPalette => !self.palette.is_empty(),
            RemapMode::BoneMeta => self.armature.bone_meta_count() > 0,
        }
    }

    fn joint_info_shortcut_applies(&self, max_index: usize) -> bool {
        let joint_info_count = self.armature.joint_info_count();
        if joint_info_count == 0 || max_index >= joint_info_count {
            return false;
        }
        let min_bones = joint_info_count + self.options.min_extra_bones_for_joint_info;
        if self.armature.bone_count() < min_bones {
            return false;
        }

        let probe_end = max_index
            .min(joint_info_count - 1)
            .min(self.options.joint_info_probe_limit);
        (0..=probe_end).any(|slot| self.armature.map_joint_info(slot) != slot)
    }

    /// Where a raw index lands under a mode, possibly outside the armature
    fn map_index(&self, mode: RemapMode, raw: u32, bone_weights: Option<&[BoneWeight]>) -> i64 {
        let index = raw as usize;
        match mode {
            RemapMode::BoneWeights => match bone_weights.and_then(|table| table.get(index)) {
                Some(entry) => i64::from(entry.rig_index),
                None => i64::from(raw),
            },
            RemapMode::JointInfo if index < self.armature.joint_info_count() => {
                self.armature.map_joint_info(index) as i64
            }
            RemapMode::SkinningPalette if index < self.palette.len() => {
                self.palette[index] as i64
            }
            RemapMode::BoneMeta if index < self.armature.bone_meta_count() => {
                self.armature.map_bone_meta(index) as i64
            }
            _ => i64::from(raw),
        }
    }

    /// The rewritten index, keeping the raw value unless it maps onto a bone
    fn apply_index(&self, mode: RemapMode, raw: u32, bone_weights: Option<&[BoneWeight]>) -> u32 {
        let mapped = self.map_index(mode, raw, bone_weights);
        u32::try_from(mapped)
            .ok()
            .filter(|&bone| (bone as usize) < self.armature.bone_count())
            .unwrap_or(raw)
    }
}

/// Whether every positively weighted index falls inside the table
fn covers_weighted_indices(table: &[BoneWeight], influences: &[VertexInfluences]) -> bool {
    !table.is_empty()
        && influences
            .iter()
            .flat_map(VertexInfluences::active)
            .all(|(index, _)| (index as usize) < table.len())
}
