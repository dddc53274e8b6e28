//! Base skeleton discovery
//!
//! Character meshes only carry their local bones. The shared base skeleton
//! for a character category lives at one of a few paths relative to the local
//! skeleton, which differ between asset generations.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};

use crate::descriptor::SkeletonDescriptor;
use crate::error::Result;
use crate::merge::merge_skeletons;

/// Category of the player character rigs
pub const PROTAG: &str = "Protag";

const COMMON_NPC_SHARED: &str = "../../base/cc_base0001_00_young_m/cc_base0001_00_young_m.trskl";

/// Mesh filename prefixes of the common NPC body types
const COMMON_NPC_PREFIXES: [&str; 9] = ["bu", "dm", "df", "em", "fm", "ff", "gm", "gf", "rv"];

/// Guess the base skeleton category from a mesh file name
///
/// Only the file name is inspected, ignoring case.
pub fn guess_category_from_mesh<P: AsRef<Path>>(mesh_path: P) -> Option<String> {
    let file_name = mesh_path.as_ref().file_name()?.to_str()?.to_ascii_lowercase();

    if ["p0", "p1", "p2"].iter().any(|prefix| file_name.starts_with(prefix)) {
        return Some(PROTAG.to_string());
    }

    COMMON_NPC_PREFIXES
        .iter()
        .find(|prefix| {
            file_name.len() > prefix.len()
                && file_name.starts_with(*prefix)
                && file_name.as_bytes()[prefix.len()] == b'_'
        })
        .map(|prefix| format!("CommonNPC{prefix}"))
}

/// Category to candidate base skeleton paths, relative to the local skeleton's directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseSkeletonTable {
    entries: HashMap<String, Vec<PathBuf>>,
}

impl BaseSkeletonTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock character categories
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.insert(
            PROTAG,
            [
                "../../model_pc_base/model/p0_base.trskl",
                "../../../../p2/model/base/p2_base0001_00_default/p2_base0001_00_default.trskl",
                "../../p2/p2_base0001_00_default/p2_base0001_00_default.trskl",
            ],
        );

        // Female and male variants share a base rig for some body types
        for (prefix, base) in [
            ("bu", "bu"),
            ("dm", "dm"),
            ("df", "dm"),
            ("em", "em"),
            ("fm", "fm"),
            ("ff", "fm"),
            ("gm", "gm"),
            ("gf", "gm"),
            ("rv", "rv"),
        ] {
            table.insert(
                format!("CommonNPC{prefix}"),
                [
                    format!("../../../model_cc_base/{base}/{base}_base.trskl"),
                    COMMON_NPC_SHARED.to_string(),
                ],
            );
        }

        table
    }

    /// Set the candidates for a category, replacing any previous list
    pub fn insert<S, I, P>(&mut self, category: S, candidates: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.entries
            .insert(category.into(), candidates.into_iter().map(Into::into).collect());
    }

    /// Candidates for a category in priority order, empty when unknown
    pub fn candidates(&self, category: &str) -> &[PathBuf] {
        self.entries.get(category).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Locates the base skeleton for a local skeleton
pub trait BaseSkeletonResolver {
    /// Path of the base skeleton, None when no candidate exists
    fn resolve(&self, local_skeleton: &Path, category: &str) -> Option<PathBuf>;
}

/// Loads a skeleton descriptor from a path
pub trait SkeletonLoader {
    fn load_skeleton(&self, path: &Path) -> Result<SkeletonDescriptor>;
}

impl<F> SkeletonLoader for F
where
    F: Fn(&Path) -> Result<SkeletonDescriptor>,
{
    fn load_skeleton(&self, path: &Path) -> Result<SkeletonDescriptor> {
        self(path)
    }
}

/// Resolver that checks the candidate paths on the local filesystem
#[derive(Debug, Clone)]
pub struct FsBaseSkeletonResolver {
    table: BaseSkeletonTable,
}

impl FsBaseSkeletonResolver {
    pub fn new(table: BaseSkeletonTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &BaseSkeletonTable {
        &self.table
    }
}

impl Default for FsBaseSkeletonResolver {
    fn default() -> Self {
        Self::new(BaseSkeletonTable::standard())
    }
}

impl BaseSkeletonResolver for FsBaseSkeletonResolver {
    fn resolve(&self, local_skeleton: &Path, category: &str) -> Option<PathBuf> {
        let local_dir = local_skeleton.parent()?;

        self.table
            .candidates(category)
            .iter()
            .map(|candidate| normalize_path(&local_dir.join(candidate)))
            .find(|path| path.is_file())
    }
}

/// Resolve `.` and `..` components without touching the filesystem
///
/// `..` at the root or past the start of a relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !matches!(
                    normalized.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// A local skeleton after base skeleton resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSkeleton {
    pub descriptor: SkeletonDescriptor,
    /// The base skeleton that was merged in, if any
    pub base_path: Option<PathBuf>,
}

/// Merge a local skeleton with its base skeleton when one can be found
///
/// Every failure along the way (no category, no candidate on disk, a loader
/// error) leaves the local skeleton standalone.
pub fn merge_with_base(
    local: SkeletonDescriptor,
    local_path: &Path,
    category: Option<&str>,
    resolver: &dyn BaseSkeletonResolver,
    loader: &dyn SkeletonLoader,
) -> ResolvedSkeleton {
    let standalone = |descriptor: SkeletonDescriptor| ResolvedSkeleton {
        descriptor,
        base_path: None,
    };

    let Some(category) = category.filter(|c| !c.trim().is_empty()) else {
        debug!("No base skeleton category for {}", local_path.display());
        return standalone(local);
    };

    let Some(base_path) = resolver.resolve(local_path, category) else {
        debug!(
            "No base skeleton found for category {category} near {}",
            local_path.display()
        );
        return standalone(local);
    };

    match loader.load_skeleton(&base_path) {
        Ok(base) => {
            debug!("Merging base skeleton {} ({category})", base_path.display());
            ResolvedSkeleton {
                descriptor: merge_skeletons(&base, &local),
                base_path: Some(base_path),
            }
        }
        Err(e) => {
            warn!(
                "Failed to load base skeleton {}: {e}, using local skeleton alone",
                base_path.display()
            );
            standalone(local)
        }
    }
}
