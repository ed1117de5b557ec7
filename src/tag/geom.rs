//! Bit-packed geometry records shared by the placement tags.

use serde::Serialize;

use super::cursor::{DecodeError, TagCursor};

/// 2D affine transform as encoded in the container: 16.16 fixed-point
/// scale and rotate/skew terms, twip translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Matrix {
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotate_skew_0: f32,
    pub rotate_skew_1: f32,
    /// Translation in twips (1/20 pixel).
    pub translate_x: i32,
    pub translate_y: i32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            rotate_skew_0: 0.0,
            rotate_skew_1: 0.0,
            translate_x: 0,
            translate_y: 0,
        }
    }
}

impl Matrix {
    /// Decode a matrix record. Scale and rotate blocks are optional on the
    /// wire; absent blocks leave the identity values in place.
    pub fn decode(cur: &mut TagCursor) -> Result<Self, DecodeError> {
        cur.align();
        let mut m = Matrix::default();

        if cur.read_bit()? {
            let nbits = cur.read_bits(5)?;
            m.scale_x = cur.read_sbits(nbits)? as f32 / 65536.0;
            m.scale_y = cur.read_sbits(nbits)? as f32 / 65536.0;
        }

        if cur.read_bit()? {
            let nbits = cur.read_bits(5)?;
            m.rotate_skew_0 = cur.read_sbits(nbits)? as f32 / 65536.0;
            m.rotate_skew_1 = cur.read_sbits(nbits)? as f32 / 65536.0;
        }

        let nbits = cur.read_bits(5)?;
        m.translate_x = cur.read_sbits(nbits)?;
        m.translate_y = cur.read_sbits(nbits)?;

        Ok(m)
    }

    /// True when the transform is the identity.
    pub fn is_identity(&self) -> bool {
        *self == Matrix::default()
    }
}

/// Per-channel color transform: an 8.8 fixed-point multiplier and a signed
/// additive term for each of red, green, blue, alpha.
///
/// The legacy placement tag carries the three-channel form (alpha terms stay
/// at their identity values); the extended tags carry all four channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorTransform {
    /// Multipliers in r, g, b, a order.
    pub mult: [f32; 4],
    /// Additive terms in r, g, b, a order.
    pub add: [i16; 4],
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self {
            mult: [1.0; 4],
            add: [0; 4],
        }
    }
}

impl ColorTransform {
    /// Decode the three-channel (RGB) form used by the legacy tag.
    pub fn decode_rgb(cur: &mut TagCursor) -> Result<Self, DecodeError> {
        Self::decode_channels(cur, 3)
    }

    /// Decode the four-channel (RGBA) form used by the extended tags.
    pub fn decode_rgba(cur: &mut TagCursor) -> Result<Self, DecodeError> {
        Self::decode_channels(cur, 4)
    }

    fn decode_channels(cur: &mut TagCursor, channels: usize) -> Result<Self, DecodeError> {
        cur.align();
        let mut cx = ColorTransform::default();

        let has_add = cur.read_bit()?;
        let has_mult = cur.read_bit()?;
        let nbits = cur.read_bits(4)?;

        if has_mult {
            for i in 0..channels {
                cx.mult[i] = cur.read_sbits(nbits)? as f32 / 256.0;
            }
        }
        if has_add {
            for i in 0..channels {
                cx.add[i] = cur.read_sbits(nbits)? as i16;
            }
        }

        Ok(cx)
    }

    /// True when applying the transform changes nothing.
    pub fn is_identity(&self) -> bool {
        *self == ColorTransform::default()
    }
}

/// Straight RGBA color as stored in filter records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn decode(cur: &mut TagCursor) -> Result<Self, DecodeError> {
        Ok(Self {
            r: cur.read_u8()?,
            g: cur.read_u8()?,
            b: cur.read_u8()?,
            a: cur.read_u8()?,
        })
    }
}
