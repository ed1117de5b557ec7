//! Decoder for the three placement tag variants.

use log::warn;

use super::cursor::{DecodeError, TagCursor};
use super::events::decode_events;
use super::filters::decode_filter_list;
use super::geom::{ColorTransform, Matrix};
use super::types::{DEPTH_OFFSET, Depth, PlaceType, PlacementRecord, TagKind};

/// Decode one placement tag from its byte range.
///
/// `cur` must cover exactly the tag's body; the declared tag end doubles as
/// the presence test for the legacy variant's trailing color transform. A
/// [`DecodeError`] means the whole tag must be discarded: nothing of a
/// partially decoded record may reach the display list.
pub fn decode_place_tag(
    cur: &mut TagCursor,
    kind: TagKind,
    version: u8,
) -> Result<PlacementRecord, DecodeError> {
    match kind {
        TagKind::PlaceObject => decode_legacy(cur),
        TagKind::PlaceObject2 | TagKind::PlaceObject3 => decode_extended(cur, kind, version),
    }
}

fn read_depth(cur: &mut TagCursor) -> Result<Depth, DecodeError> {
    Ok(cur.read_u16()? as Depth + DEPTH_OFFSET)
}

/// The flagless legacy variant: character id, depth, matrix, and a trailing
/// RGB color transform whose presence is decided purely by whether any
/// bytes remain before the tag end.
fn decode_legacy(cur: &mut TagCursor) -> Result<PlacementRecord, DecodeError> {
    let character_id = cur.read_u16()?;
    let depth = read_depth(cur)?;
    let matrix = Matrix::decode(cur)?;

    let color_transform = if cur.position() < cur.end() {
        Some(ColorTransform::decode_rgb(cur)?)
    } else {
        None
    };

    Ok(PlacementRecord {
        place_type: PlaceType::Place,
        depth,
        character_id: Some(character_id),
        matrix: Some(matrix),
        color_transform,
        ratio: None,
        name: None,
        clip_depth: None,
        filters: Vec::new(),
        events: Vec::new(),
    })
}

fn decode_extended(
    cur: &mut TagCursor,
    kind: TagKind,
    version: u8,
) -> Result<PlacementRecord, DecodeError> {
    cur.align();

    let has_actions = cur.read_bit()?;
    let has_clip_depth = cur.read_bit()?;
    let has_name = cur.read_bit()?;
    let has_ratio = cur.read_bit()?;
    let has_cxform = cur.read_bit()?;
    let has_matrix = cur.read_bit()?;
    let has_character = cur.read_bit()?;
    let move_flag = cur.read_bit()?;

    let mut has_bitmap_caching = false;
    let mut has_blend_mode = false;
    let mut has_filters = false;
    if kind == TagKind::PlaceObject3 && version >= 8 {
        let reserved = cur.read_bits(5)?;
        if reserved != 0 {
            warn!("placement tag: reserved flag bits are {reserved:#x} (expected 0)");
        }
        has_bitmap_caching = cur.read_bit()?;
        has_blend_mode = cur.read_bit()?;
        has_filters = cur.read_bit()?;
    }

    let depth = read_depth(cur)?;

    let character_id = if has_character {
        Some(cur.read_u16()?)
    } else {
        None
    };

    let matrix = if has_matrix {
        Some(Matrix::decode(cur)?)
    } else {
        None
    };

    let color_transform = if has_cxform {
        Some(ColorTransform::decode_rgba(cur)?)
    } else {
        None
    };

    let ratio = if has_ratio { Some(cur.read_u16()?) } else { None };

    let name = if has_name {
        Some(cur.read_cstring()?)
    } else {
        None
    };

    let clip_depth = if has_clip_depth {
        Some(read_depth(cur)?)
    } else {
        None
    };

    let filters = if has_filters {
        decode_filter_list(cur)?
    } else {
        Vec::new()
    };

    if has_blend_mode {
        // Consumed but not carried; blend compositing is the renderer's
        // concern and no collaborator asks for it yet.
        let _blend_mode = cur.read_u8()?;
    }

    if has_bitmap_caching {
        let _cache_as_bitmap = cur.read_u8()?;
    }

    let events = if has_actions {
        decode_events(cur, version)?
    } else {
        Vec::new()
    };

    Ok(PlacementRecord {
        place_type: PlaceType::from_flags(has_character, move_flag),
        depth,
        character_id,
        matrix,
        color_transform,
        ratio,
        name,
        clip_depth,
        filters,
        events,
    })
}
