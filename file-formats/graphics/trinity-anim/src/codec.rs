//! Packed quaternion codec for Trinity rotation tracks
//!
//! Rotations are stored as three little-endian `u16` words forming a 48-bit
//! value. The largest component is dropped and reconstructed from the other
//! three, which are quantized to 15 bits each.
//!
//! Bit layout of `pack = (z << 32) | (y << 16) | x`:
//!
//! | Bits  | Meaning                                      |
//! |-------|----------------------------------------------|
//! | 0-1   | Index of the dropped component (0=x .. 3=w)  |
//! | 2     | Sign flag, negates the whole quaternion      |
//! | 3-17  | First stored component                       |
//! | 18-32 | Second stored component                      |
//! | 33-47 | Third stored component                       |

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::Quat;

use crate::error::{AnimError, Result};

/// Largest value of a 15-bit quantized field
const FIELD_MAX: f32 = 32767.0;

/// Mask for one 15-bit field
const FIELD_MASK: u64 = 0x7FFF;

/// A rotation packed into three 16-bit words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct PackedQuaternion {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

impl PackedQuaternion {
    /// Create a packed quaternion from its three raw words
    pub const fn new(x: u16, y: u16, z: u16) -> Self {
        Self { x, y, z }
    }

    /// Split a 48-bit packed value into its three words
    ///
    /// Bits above 47 are ignored.
    pub const fn from_packed(pack: u64) -> Self {
        Self {
            x: (pack & 0xFFFF) as u16,
            y: ((pack >> 16) & 0xFFFF) as u16,
            z: ((pack >> 32) & 0xFFFF) as u16,
        }
    }

    /// Read a packed quaternion from six little-endian bytes
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 6] = bytes
            .try_into()
            .map_err(|_| AnimError::InvalidPackedQuaternion(bytes.len()))?;

        Ok(Self {
            x: u16::from_le_bytes([bytes[0], bytes[1]]),
            y: u16::from_le_bytes([bytes[2], bytes[3]]),
            z: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }

    /// The assembled 48-bit value
    pub const fn pack(&self) -> u64 {
        ((self.z as u64) << 32) | ((self.y as u64) << 16) | self.x as u64
    }

    /// Index of the component that was dropped during packing (0=x, 1=y, 2=z, 3=w)
    pub const fn missing_component(&self) -> usize {
        (self.pack() & 0x3) as usize
    }

    /// Whether the decoded quaternion is negated
    pub const fn is_negative(&self) -> bool {
        self.pack() & 0x4 != 0
    }

    /// Decode into a unit quaternion
    ///
    /// Malformed input never panics: a negative radicand for the dropped
    /// component is clamped to zero, and a zero-length result is returned
    /// unnormalized.
    pub fn unpack(&self) -> Quat {
        let pack = self.pack();

        let q1 = dequantize((pack >> 3) & FIELD_MASK);
        let q2 = dequantize((pack >> 18) & FIELD_MASK);
        let q3 = dequantize((pack >> 33) & FIELD_MASK);

        let radicand = 1.0 - (q1 * q1 + q2 * q2 + q3 * q3);
        let dropped = radicand.max(0.0).sqrt();

        let [x, y, z, w] = match self.missing_component() {
            0 => [dropped, q1, q2, q3],
            1 => [q1, dropped, q2, q3],
            2 => [q1, q2, dropped, q3],
            _ => [q1, q2, q3, dropped],
        };

        let mut result = Quat::from_xyzw(x, y, z, w);
        if self.is_negative() {
            result = -result;
        }

        if result.length_squared() > 0.0 {
            result.normalize()
        } else {
            result
        }
    }
}

impl From<PackedQuaternion> for Quat {
    fn from(packed: PackedQuaternion) -> Self {
        packed.unpack()
    }
}

#[inline]
fn dequantize(field: u64) -> f32 {
    field as f32 * (FRAC_PI_2 / FIELD_MAX) - FRAC_PI_4
}
