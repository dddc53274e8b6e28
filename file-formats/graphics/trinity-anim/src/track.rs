//! Per-bone animation tracks and their sampling
//!
//! Each bone carries independent Scale, Rotate and Translate channels. Every
//! channel uses one of four encodings:
//!
//! - `Fixed`: one value for the whole clip
//! - `Dynamic`: one value per integer frame
//! - `Framed16` / `Framed8`: sparse keys with explicit `u16` / `u8` frame numbers
//!
//! Rotation channels store [`PackedQuaternion`] keys that are decoded on demand.

use glam::{Quat, Vec3};

use crate::codec::PackedQuaternion;
use crate::error::{AnimError, Result};
use crate::interpolation::{Interpolate, sample_curve_with};

/// A stored key that decodes into an interpolatable value
pub trait CurveKey: Copy {
    /// Decoded value type
    type Value: Interpolate;

    /// Decode the stored key
    fn decode(self) -> Self::Value;
}

impl CurveKey for Vec3 {
    type Value = Vec3;

    fn decode(self) -> Vec3 {
        self
    }
}

impl CurveKey for Quat {
    type Value = Quat;

    fn decode(self) -> Quat {
        self
    }
}

impl CurveKey for PackedQuaternion {
    type Value = Quat;

    fn decode(self) -> Quat {
        self.unpack()
    }
}

/// One encoded animation channel
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel<K> {
    /// Constant value for the whole clip
    Fixed(K),
    /// One value per integer frame
    Dynamic(Vec<K>),
    /// Sparse keys with 16-bit frame numbers
    Framed16 { frames: Vec<u16>, values: Vec<K> },
    /// Sparse keys with 8-bit frame numbers
    Framed8 { frames: Vec<u8>, values: Vec<K> },
}

/// Scale or translation channel
pub type VectorChannel = Channel<Vec3>;

/// Rotation channel with packed keys
pub type RotationChannel = Channel<PackedQuaternion>;

impl<K: CurveKey> Channel<K> {
    /// Sample the channel at a continuous frame
    ///
    /// Returns None when the channel holds no keys.
    pub fn sample(&self, frame: f32) -> Option<K::Value> {
        match self {
            Self::Fixed(value) => Some(value.decode()),
            Self::Dynamic(values) => sample_dynamic(values, frame),
            Self::Framed16 { frames, values } => sample_framed(frames, values, frame),
            Self::Framed8 { frames, values } => sample_framed(frames, values, frame),
        }
    }
}

impl<K> Channel<K> {
    /// Number of stored keys
    pub fn key_count(&self) -> usize {
        match self {
            Self::Fixed(_) => 1,
            Self::Dynamic(values) => values.len(),
            Self::Framed16 { frames, values } => frames.len().min(values.len()),
            Self::Framed8 { frames, values } => frames.len().min(values.len()),
        }
    }

    /// Short name of the encoding, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::Dynamic(_) => "dynamic",
            Self::Framed16 { .. } => "framed16",
            Self::Framed8 { .. } => "framed8",
        }
    }

    fn framed_lengths(&self) -> Option<(usize, usize)> {
        match self {
            Self::Framed16 { frames, values } => Some((frames.len(), values.len())),
            Self::Framed8 { frames, values } => Some((frames.len(), values.len())),
            Self::Fixed(_) | Self::Dynamic(_) => None,
        }
    }
}

fn sample_dynamic<K: CurveKey>(values: &[K], frame: f32) -> Option<K::Value> {
    if values.is_empty() {
        return None;
    }

    // Saturating float-to-int cast maps NaN and negatives to 0
    let index = (frame.floor() as usize).min(values.len() - 1);
    Some(values[index].decode())
}

fn sample_framed<F, K>(frames: &[F], values: &[K], frame: f32) -> Option<K::Value>
where
    F: Copy + Into<f32>,
    K: CurveKey,
{
    sample_curve_with(frames, values, frame, |key| key.decode())
}

/// The sampled pose of one bone
///
/// Each component is absent when the track has no data for that channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub scale: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub translation: Option<Vec3>,
}

impl Pose {
    /// Whether any channel produced a value
    pub fn is_empty(&self) -> bool {
        self.scale.is_none() && self.rotation.is_none() && self.translation.is_none()
    }
}

/// Animation track for one bone
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneTrack {
    /// Bone name as stored in the clip
    pub name: String,
    pub scale: Option<VectorChannel>,
    pub rotate: Option<RotationChannel>,
    pub translate: Option<VectorChannel>,
}

impl BoneTrack {
    /// Create a track with no channels
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            scale: None,
            rotate: None,
            translate: None,
        }
    }

    /// Set the scale channel
    pub fn with_scale(mut self, channel: VectorChannel) -> Self {
        self.scale = Some(channel);
        self
    }

    /// Set the rotation channel
    pub fn with_rotate(mut self, channel: RotationChannel) -> Self {
        self.rotate = Some(channel);
        self
    }

    /// Set the translation channel
    pub fn with_translate(mut self, channel: VectorChannel) -> Self {
        self.translate = Some(channel);
        self
    }

    /// Sample all three channels at a continuous frame
    pub fn sample(&self, frame: f32) -> Pose {
        Pose {
            scale: self.scale.as_ref().and_then(|c| c.sample(frame)),
            rotation: self.rotate.as_ref().and_then(|c| c.sample(frame)),
            translation: self.translate.as_ref().and_then(|c| c.sample(frame)),
        }
    }

    /// Check that framed channels pair every frame number with a value
    ///
    /// Sampling tolerates mismatched lengths by using the shorter list; this
    /// reports them for callers that want strict input.
    pub fn validate(&self) -> Result<()> {
        let channels = [
            ("scale", self.scale.as_ref().and_then(Channel::framed_lengths)),
            ("rotate", self.rotate.as_ref().and_then(Channel::framed_lengths)),
            ("translate", self.translate.as_ref().and_then(Channel::framed_lengths)),
        ];

        for (channel, lengths) in channels {
            if let Some((frames, values)) = lengths
                && frames != values
            {
                return Err(AnimError::TrackLengthMismatch {
                    bone: self.name.clone(),
                    channel,
                    frames,
                    values,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vectors(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32, (i * i) as f32, 1.0)).collect()
    }

    #[test]
    fn test_fixed_channel_is_constant() {
        let channel = Channel::Fixed(Vec3::new(1.0, 2.0, 3.0));
        for frame in [-10.0, 0.0, 0.5, 7.0, 1e6] {
            assert_eq!(channel.sample(frame), Some(Vec3::new(1.0, 2.0, 3.0)));
        }
    }

    #[test]
    fn test_dynamic_channel_floors_and_clamps() {
        let values = vectors(5);
        let channel = Channel::Dynamic(values.clone());

        assert_eq!(channel.sample(-3.0), Some(values[0]));
        assert_eq!(channel.sample(0.0), Some(values[0]));
        assert_eq!(channel.sample(2.99), Some(values[2]));
        assert_eq!(channel.sample(3.0), Some(values[3]));
        assert_eq!(channel.sample(4.5), Some(values[4]));
        assert_eq!(channel.sample(100.0), Some(values[4]));
        assert_eq!(channel.sample(f32::NAN), Some(values[0]));
    }

    #[test]
    fn test_empty_channels_sample_to_none() {
        assert_eq!(Channel::<Vec3>::Dynamic(vec![]).sample(1.0), None);
        assert_eq!(
            Channel::<Vec3>::Framed8 {
                frames: vec![],
                values: vec![]
            }
            .sample(1.0),
            None
        );
    }

    #[test]
    fn test_framed_packed_rotation_matches_decoded_curve() {
        let packed: Vec<PackedQuaternion> = [
            0x1_2345_6789_u64,
            0x7_0F0F_1234,
            0x3_3333_3333,
            0xA_BCDE_F012,
            0x5_5555_5557,
        ]
        .into_iter()
        .map(PackedQuaternion::from_packed)
        .collect();
        let decoded: Vec<Quat> = packed.iter().map(PackedQuaternion::unpack).collect();
        let frames: Vec<u16> = vec![0, 4, 5, 11, 30];

        let packed_channel = Channel::Framed16 {
            frames: frames.clone(),
            values: packed,
        };
        let decoded_channel = Channel::Framed16 {
            frames,
            values: decoded,
        };

        for step in 0..=64 {
            let frame = step as f32 * 0.5;
            assert_eq!(
                packed_channel.sample(frame),
                decoded_channel.sample(frame),
                "frame {frame}"
            );
        }
    }

    #[test]
    fn test_framed8_rotation_decodes_packed_keys() {
        let identity =
            PackedQuaternion::from_packed(3 | (16384 << 3) | (16384 << 18) | (16384 << 33));
        let channel = Channel::Framed8 {
            frames: vec![0, 10],
            values: vec![identity, identity],
        };

        let q = channel.sample(5.0).unwrap();
        assert!((q.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_bone_track_sample_leaves_missing_channels_empty() {
        let track = BoneTrack::new("Hips").with_translate(Channel::Fixed(Vec3::Y));
        let pose = track.sample(3.0);

        assert_eq!(pose.translation, Some(Vec3::Y));
        assert_eq!(pose.scale, None);
        assert_eq!(pose.rotation, None);
        assert!(!pose.is_empty());
        assert!(BoneTrack::new("Empty").sample(0.0).is_empty());
    }

    #[test]
    fn test_validate_reports_mismatch() {
        let track = BoneTrack::new("Arm").with_scale(Channel::Framed16 {
            frames: vec![0, 1, 2],
            values: vectors(2),
        });

        assert_eq!(
            track.validate(),
            Err(AnimError::TrackLengthMismatch {
                bone: "Arm".to_string(),
                channel: "scale",
                frames: 3,
                values: 2,
            })
        );
        assert!(BoneTrack::new("Arm").validate().is_ok());
    }

    #[test]
    fn test_key_count_and_kind() {
        let channel: VectorChannel = Channel::Framed16 {
            frames: vec![0, 1, 2],
            values: vectors(2),
        };
        assert_eq!(channel.key_count(), 2);
        assert_eq!(channel.kind(), "framed16");
    }
}
