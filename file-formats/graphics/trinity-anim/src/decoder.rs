//! Clip-level animation decoding
//!
//! An [`AnimationDecoder`] is built once per clip and answers pose queries by
//! bone name and frame. Bone names are matched case-insensitively, first on
//! the raw stored name, then on its normalized alias (see
//! [`normalize_bone_name`]).

use std::collections::HashMap;

use log::{debug, trace};

use crate::bone_name::{bone_key, normalize_bone_name};
use crate::track::{BoneTrack, Pose};

/// Frame rate used when a clip does not declare one
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// How a clip behaves once playback passes its last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayMode {
    /// Hold the last frame
    #[default]
    Once,
    /// Wrap back to frame 0
    Looped,
}

/// A deserialized animation clip
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationClip {
    pub name: String,
    pub play_mode: PlayMode,
    pub frame_count: u32,
    /// Frames per second, 0 means [`DEFAULT_FRAME_RATE`]
    pub frame_rate: u32,
    pub tracks: Vec<BoneTrack>,
}

impl AnimationClip {
    /// Create an empty clip
    pub fn new<S: Into<String>>(name: S, frame_count: u32, frame_rate: u32) -> Self {
        Self {
            name: name.into(),
            frame_count,
            frame_rate,
            ..Default::default()
        }
    }

    /// Set the play mode
    pub fn with_play_mode(mut self, play_mode: PlayMode) -> Self {
        self.play_mode = play_mode;
        self
    }

    /// Append a bone track
    pub fn with_track(mut self, track: BoneTrack) -> Self {
        self.tracks.push(track);
        self
    }
}

/// Name-indexed pose queries over one clip
#[derive(Debug, Clone)]
pub struct AnimationDecoder {
    clip: AnimationClip,
    /// Lowercase raw name to track index
    by_name: HashMap<String, usize>,
    /// Lowercase normalized name to track index, only where it differs from the raw key
    by_alias: HashMap<String, usize>,
    /// Tracks reachable through either map, in clip order
    kept: Vec<usize>,
}

impl AnimationDecoder {
    /// Build the lookup tables for a clip
    ///
    /// Tracks with blank names are unreachable and skipped. When two tracks
    /// share a key, the first one wins.
    pub fn new(clip: AnimationClip) -> Self {
        let mut by_name = HashMap::with_capacity(clip.tracks.len());
        let mut by_alias = HashMap::new();
        let mut kept = Vec::with_capacity(clip.tracks.len());

        for (index, track) in clip.tracks.iter().enumerate() {
            let raw_key = bone_key(&track.name);
            if raw_key.is_empty() {
                trace!("Skipping unnamed track {index} in clip '{}'", clip.name);
                continue;
            }

            let mut reachable = false;
            if by_name.contains_key(&raw_key) {
                trace!(
                    "Duplicate track '{}' in clip '{}', keeping the first",
                    track.name, clip.name
                );
            } else {
                by_name.insert(raw_key.clone(), index);
                reachable = true;
            }

            let alias_key = bone_key(normalize_bone_name(&track.name));
            if !alias_key.is_empty() && alias_key != raw_key && !by_alias.contains_key(&alias_key) {
                by_alias.insert(alias_key, index);
                reachable = true;
            }

            if reachable {
                kept.push(index);
            }
        }

        debug!(
            "Clip '{}': {} of {} tracks indexed, {} aliases, {} frames at {} fps",
            clip.name,
            kept.len(),
            clip.tracks.len(),
            by_alias.len(),
            clip.frame_count,
            clip.frame_rate
        );

        Self {
            clip,
            by_name,
            by_alias,
            kept,
        }
    }

    /// The decoded clip
    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn name(&self) -> &str {
        &self.clip.name
    }

    pub fn frame_count(&self) -> u32 {
        self.clip.frame_count
    }

    /// Effective frame rate, never zero
    pub fn frame_rate(&self) -> u32 {
        if self.clip.frame_rate == 0 {
            DEFAULT_FRAME_RATE
        } else {
            self.clip.frame_rate
        }
    }

    pub fn is_looping(&self) -> bool {
        self.clip.play_mode == PlayMode::Looped
    }

    /// Number of distinct tracks reachable by name
    pub fn track_count(&self) -> usize {
        self.kept.len()
    }

    /// Names of the reachable tracks, original case, in clip order
    pub fn track_names(&self) -> impl Iterator<Item = &str> {
        self.kept.iter().map(|&index| self.clip.tracks[index].name.as_str())
    }

    /// Whether a track exists under the raw or normalized form of `name`
    pub fn has_track(&self, name: &str) -> bool {
        self.track_index(name).is_some()
    }

    /// Look up the track for a bone name
    pub fn track(&self, name: &str) -> Option<&BoneTrack> {
        self.track_index(name).map(|index| &self.clip.tracks[index])
    }

    /// Convert a time in seconds to a frame number
    ///
    /// Looping clips wrap around `frame_count` with a truncating remainder, so
    /// negative times land on frame 0. The result is always inside
    /// `[0, max(0, frame_count - 1)]`.
    pub fn get_frame(&self, seconds: f32) -> f32 {
        let mut frame = seconds * self.frame_rate() as f32;
        let frame_count = self.clip.frame_count as f32;

        if self.is_looping() && self.clip.frame_count > 0 {
            frame %= frame_count;
        }

        let last = (frame_count - 1.0).max(0.0);
        if frame.is_nan() {
            return 0.0;
        }
        frame.clamp(0.0, last)
    }

    /// Sample a bone's pose at a frame
    ///
    /// Returns None only when no track exists for `name`. A track with no
    /// data at `frame` yields an empty [`Pose`].
    pub fn try_get_pose(&self, name: &str, frame: f32) -> Option<Pose> {
        self.track(name).map(|track| track.sample(frame))
    }

    fn track_index(&self, name: &str) -> Option<usize> {
        let key = bone_key(name);
        if key.is_empty() {
            return None;
        }
        if let Some(&index) = self.by_name.get(&key) {
            return Some(index);
        }

        let alias = bone_key(normalize_bone_name(name));
        self.by_alias
            .get(&alias)
            .or_else(|| self.by_name.get(&alias))
            .copied()
    }
}
