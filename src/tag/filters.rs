//! Decoder for the surface-filter list carried by the version-8 extended
//! placement tag.
//!
//! Filter records are self-framing only through their fixed field layouts:
//! an unrecognized filter id leaves the rest of the list unframeable, so
//! decoding stops there with a warning and the filters read so far are
//! kept.

use log::warn;
use serde::Serialize;

use super::cursor::{DecodeError, TagCursor};
use super::geom::Rgba;

/// One surface filter attached to a placed instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Filter {
    DropShadow(DropShadowFilter),
    Blur(BlurFilter),
    Glow(GlowFilter),
    Bevel(BevelFilter),
    GradientGlow(GradientFilter),
    Convolution(ConvolutionFilter),
    ColorMatrix(ColorMatrixFilter),
    GradientBevel(GradientFilter),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropShadowFilter {
    pub color: Rgba,
    pub blur_x: f32,
    pub blur_y: f32,
    /// Radians.
    pub angle: f32,
    /// Twips.
    pub distance: f32,
    pub strength: f32,
    pub inner: bool,
    pub knockout: bool,
    pub composite_source: bool,
    pub passes: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlurFilter {
    pub blur_x: f32,
    pub blur_y: f32,
    pub passes: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlowFilter {
    pub color: Rgba,
    pub blur_x: f32,
    pub blur_y: f32,
    pub strength: f32,
    pub inner: bool,
    pub knockout: bool,
    pub composite_source: bool,
    pub passes: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BevelFilter {
    pub shadow_color: Rgba,
    pub highlight_color: Rgba,
    pub blur_x: f32,
    pub blur_y: f32,
    pub angle: f32,
    pub distance: f32,
    pub strength: f32,
    pub inner: bool,
    pub knockout: bool,
    pub composite_source: bool,
    pub on_top: bool,
    pub passes: u8,
}

/// Shared layout of the gradient glow and gradient bevel records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientFilter {
    pub colors: Vec<Rgba>,
    pub ratios: Vec<u8>,
    pub blur_x: f32,
    pub blur_y: f32,
    pub angle: f32,
    pub distance: f32,
    pub strength: f32,
    pub inner: bool,
    pub knockout: bool,
    pub composite_source: bool,
    pub on_top: bool,
    pub passes: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvolutionFilter {
    pub matrix_x: u8,
    pub matrix_y: u8,
    pub divisor: f32,
    pub bias: f32,
    /// Row-major, `matrix_x * matrix_y` entries.
    pub matrix: Vec<f32>,
    pub default_color: Rgba,
    pub clamp: bool,
    pub preserve_alpha: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorMatrixFilter {
    /// 4x5 row-major color matrix.
    pub matrix: [f32; 20],
}

/// Decode the filter list: a count byte followed by that many filter
/// records.
pub fn decode_filter_list(cur: &mut TagCursor) -> Result<Vec<Filter>, DecodeError> {
    let count = cur.read_u8()? as usize;
    let mut filters = Vec::with_capacity(count);

    for _ in 0..count {
        let id = cur.read_u8()?;
        let filter = match id {
            0 => Filter::DropShadow(decode_drop_shadow(cur)?),
            1 => Filter::Blur(decode_blur(cur)?),
            2 => Filter::Glow(decode_glow(cur)?),
            3 => Filter::Bevel(decode_bevel(cur)?),
            4 => Filter::GradientGlow(decode_gradient(cur)?),
            5 => Filter::Convolution(decode_convolution(cur)?),
            6 => Filter::ColorMatrix(decode_color_matrix(cur)?),
            7 => Filter::GradientBevel(decode_gradient(cur)?),
            other => {
                warn!(
                    "filter list: unknown filter id {other}, dropping the rest of the list \
                     ({} of {count} decoded)",
                    filters.len()
                );
                break;
            }
        };
        filters.push(filter);
    }

    Ok(filters)
}

fn decode_drop_shadow(cur: &mut TagCursor) -> Result<DropShadowFilter, DecodeError> {
    let color = Rgba::decode(cur)?;
    let blur_x = cur.read_fixed16()?;
    let blur_y = cur.read_fixed16()?;
    let angle = cur.read_fixed16()?;
    let distance = cur.read_fixed16()?;
    let strength = cur.read_fixed8()?;
    let inner = cur.read_bit()?;
    let knockout = cur.read_bit()?;
    let composite_source = cur.read_bit()?;
    let passes = cur.read_bits(5)? as u8;
    Ok(DropShadowFilter {
        color,
        blur_x,
        blur_y,
        angle,
        distance,
        strength,
        inner,
        knockout,
        composite_source,
        passes,
    })
}

fn decode_blur(cur: &mut TagCursor) -> Result<BlurFilter, DecodeError> {
    let blur_x = cur.read_fixed16()?;
    let blur_y = cur.read_fixed16()?;
    let passes = cur.read_bits(5)? as u8;
    cur.read_bits(3)?; // reserved
    Ok(BlurFilter {
        blur_x,
        blur_y,
        passes,
    })
}

fn decode_glow(cur: &mut TagCursor) -> Result<GlowFilter, DecodeError> {
    let color = Rgba::decode(cur)?;
    let blur_x = cur.read_fixed16()?;
    let blur_y = cur.read_fixed16()?;
    let strength = cur.read_fixed8()?;
    let inner = cur.read_bit()?;
    let knockout = cur.read_bit()?;
    let composite_source = cur.read_bit()?;
    let passes = cur.read_bits(5)? as u8;
    Ok(GlowFilter {
        color,
        blur_x,
        blur_y,
        strength,
        inner,
        knockout,
        composite_source,
        passes,
    })
}

fn decode_bevel(cur: &mut TagCursor) -> Result<BevelFilter, DecodeError> {
    let shadow_color = Rgba::decode(cur)?;
    let highlight_color = Rgba::decode(cur)?;
    let blur_x = cur.read_fixed16()?;
    let blur_y = cur.read_fixed16()?;
    let angle = cur.read_fixed16()?;
    let distance = cur.read_fixed16()?;
    let strength = cur.read_fixed8()?;
    let inner = cur.read_bit()?;
    let knockout = cur.read_bit()?;
    let composite_source = cur.read_bit()?;
    let on_top = cur.read_bit()?;
    let passes = cur.read_bits(4)? as u8;
    Ok(BevelFilter {
        shadow_color,
        highlight_color,
        blur_x,
        blur_y,
        angle,
        distance,
        strength,
        inner,
        knockout,
        composite_source,
        on_top,
        passes,
    })
}

fn decode_gradient(cur: &mut TagCursor) -> Result<GradientFilter, DecodeError> {
    let count = cur.read_u8()? as usize;
    let mut colors = Vec::with_capacity(count);
    for _ in 0..count {
        colors.push(Rgba::decode(cur)?);
    }
    let mut ratios = Vec::with_capacity(count);
    for _ in 0..count {
        ratios.push(cur.read_u8()?);
    }
    let blur_x = cur.read_fixed16()?;
    let blur_y = cur.read_fixed16()?;
    let angle = cur.read_fixed16()?;
    let distance = cur.read_fixed16()?;
    let strength = cur.read_fixed8()?;
    let inner = cur.read_bit()?;
    let knockout = cur.read_bit()?;
    let composite_source = cur.read_bit()?;
    let on_top = cur.read_bit()?;
    let passes = cur.read_bits(4)? as u8;
    Ok(GradientFilter {
        colors,
        ratios,
        blur_x,
        blur_y,
        angle,
        distance,
        strength,
        inner,
        knockout,
        composite_source,
        on_top,
        passes,
    })
}

fn decode_convolution(cur: &mut TagCursor) -> Result<ConvolutionFilter, DecodeError> {
    let matrix_x = cur.read_u8()?;
    let matrix_y = cur.read_u8()?;
    let divisor = cur.read_f32()?;
    let bias = cur.read_f32()?;
    let entries = matrix_x as usize * matrix_y as usize;
    let mut matrix = Vec::with_capacity(entries);
    for _ in 0..entries {
        matrix.push(cur.read_f32()?);
    }
    let default_color = Rgba::decode(cur)?;
    cur.read_bits(6)?; // reserved
    let clamp = cur.read_bit()?;
    let preserve_alpha = cur.read_bit()?;
    Ok(ConvolutionFilter {
        matrix_x,
        matrix_y,
        divisor,
        bias,
        matrix,
        default_color,
        clamp,
        preserve_alpha,
    })
}

fn decode_color_matrix(cur: &mut TagCursor) -> Result<ColorMatrixFilter, DecodeError> {
    let mut matrix = [0.0f32; 20];
    for entry in &mut matrix {
        *entry = cur.read_f32()?;
    }
    Ok(ColorMatrixFilter { matrix })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::testutil::TagBuilder;

    #[test]
    fn test_blur_filter() {
        let mut b = TagBuilder::new();
        b.u8(1); // count
        b.u8(1); // blur id
        b.u32(0x0002_0000); // blur_x = 2.0
        b.u32(0x0000_8000); // blur_y = 0.5
        b.bits(3, 5); // passes
        b.bits(0, 3);
        let mut cur = b.cursor();

        let filters = decode_filter_list(&mut cur).unwrap();
        assert_eq!(
            filters,
            vec![Filter::Blur(BlurFilter {
                blur_x: 2.0,
                blur_y: 0.5,
                passes: 3,
            })]
        );
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_drop_shadow_filter() {
        let mut b = TagBuilder::new();
        b.u8(1);
        b.u8(0); // drop shadow id
        b.bytes(&[0x10, 0x20, 0x30, 0xFF]); // rgba
        b.u32(0x0001_0000); // blur_x = 1.0
        b.u32(0x0001_0000); // blur_y
        b.u32(0x0000_0000); // angle
        b.u32(0x0004_0000); // distance = 4.0
        b.u16(0x0100); // strength = 1.0
        b.bits(1, 1); // inner
        b.bits(0, 1); // knockout
        b.bits(1, 1); // composite source
        b.bits(1, 5); // passes
        let mut cur = b.cursor();

        let filters = decode_filter_list(&mut cur).unwrap();
        let Filter::DropShadow(ds) = &filters[0] else {
            panic!("wrong filter kind");
        };
        assert_eq!(
            ds.color,
            Rgba {
                r: 0x10,
                g: 0x20,
                b: 0x30,
                a: 0xFF
            }
        );
        assert_eq!(ds.distance, 4.0);
        assert_eq!(ds.strength, 1.0);
        assert!(ds.inner && !ds.knockout && ds.composite_source);
        assert_eq!(ds.passes, 1);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_color_matrix_consumes_twenty_floats() {
        let mut b = TagBuilder::new();
        b.u8(1);
        b.u8(6);
        for i in 0..20 {
            b.f32(i as f32);
        }
        let mut cur = b.cursor();

        let filters = decode_filter_list(&mut cur).unwrap();
        let Filter::ColorMatrix(cm) = &filters[0] else {
            panic!("wrong filter kind");
        };
        assert_eq!(cm.matrix[0], 0.0);
        assert_eq!(cm.matrix[19], 19.0);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_convolution_matrix_sizing() {
        let mut b = TagBuilder::new();
        b.u8(1);
        b.u8(5);
        b.u8(2); // matrix_x
        b.u8(3); // matrix_y
        b.f32(6.0); // divisor
        b.f32(0.0); // bias
        for i in 0..6 {
            b.f32(i as f32);
        }
        b.bytes(&[0, 0, 0, 0]); // default color
        b.bits(0, 6);
        b.bits(1, 1); // clamp
        b.bits(1, 1); // preserve alpha
        let mut cur = b.cursor();

        let filters = decode_filter_list(&mut cur).unwrap();
        let Filter::Convolution(conv) = &filters[0] else {
            panic!("wrong filter kind");
        };
        assert_eq!(conv.matrix.len(), 6);
        assert!(conv.clamp && conv.preserve_alpha);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_gradient_filter_color_count() {
        let mut b = TagBuilder::new();
        b.u8(1);
        b.u8(4); // gradient glow
        b.u8(2); // two stops
        b.bytes(&[1, 2, 3, 4]);
        b.bytes(&[5, 6, 7, 8]);
        b.u8(0); // ratios
        b.u8(255);
        b.u32(0x0001_0000);
        b.u32(0x0001_0000);
        b.u32(0);
        b.u32(0);
        b.u16(0x0100);
        b.bits(0, 1);
        b.bits(0, 1);
        b.bits(1, 1);
        b.bits(0, 1);
        b.bits(2, 4);
        let mut cur = b.cursor();

        let filters = decode_filter_list(&mut cur).unwrap();
        let Filter::GradientGlow(g) = &filters[0] else {
            panic!("wrong filter kind");
        };
        assert_eq!(g.colors.len(), 2);
        assert_eq!(g.ratios, vec![0, 255]);
        assert_eq!(g.passes, 2);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_unknown_filter_id_stops_list() {
        let mut b = TagBuilder::new();
        b.u8(2);
        b.u8(1); // a valid blur first
        b.u32(0);
        b.u32(0);
        b.u8(0x20); // passes byte
        b.u8(99); // unknown id
        b.bytes(&[0xDE, 0xAD]);
        let mut cur = b.cursor();

        let filters = decode_filter_list(&mut cur).unwrap();
        assert_eq!(filters.len(), 1);
        assert!(matches!(filters[0], Filter::Blur(_)));
    }

    #[test]
    fn test_truncated_filter_fails() {
        let mut b = TagBuilder::new();
        b.u8(1);
        b.u8(6); // color matrix wants 80 bytes
        b.f32(1.0);
        let mut cur = b.cursor();

        assert!(decode_filter_list(&mut cur).is_err());
    }
}
