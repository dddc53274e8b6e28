//! Decoder for Trinity skeletal animation clips.
//!
//! Clips store one [`BoneTrack`] per bone with independent scale, rotation
//! and translation channels. Rotation keys are 48-bit packed quaternions and
//! sparse keys are interpolated against their real frame numbers.
//!
//! # Examples
//!
//! ```
//! use glam::Vec3;
//! use trinity_anim::{AnimationClip, AnimationDecoder, BoneTrack, Channel};
//!
//! let track = BoneTrack::new("rig:Hips").with_translate(Channel::Framed16 {
//!     frames: vec![0, 10],
//!     values: vec![Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)],
//! });
//! let decoder = AnimationDecoder::new(AnimationClip::new("walk", 11, 30).with_track(track));
//!
//! let frame = decoder.get_frame(1.0 / 6.0);
//! let pose = decoder.try_get_pose("Hips", frame).unwrap();
//! assert!((pose.translation.unwrap().y - 0.5).abs() < 1e-5);
//! ```

pub mod bone_name;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod interpolation;
pub mod track;

pub use bone_name::{bone_key, normalize_bone_name};
pub use codec::PackedQuaternion;
pub use decoder::{AnimationClip, AnimationDecoder, DEFAULT_FRAME_RATE, PlayMode};
pub use error::{AnimError, Result};
pub use interpolation::{Interpolate, sample_curve};
pub use track::{BoneTrack, Channel, CurveKey, Pose, RotationChannel, VectorChannel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
