//! Core types shared by the placement-tag decoder and the display list.

use serde::Serialize;

use super::events::EventRegistration;
use super::filters::Filter;
use super::geom::{ColorTransform, Matrix};

/// Z-order key of a display-list slot.
///
/// On-disk depths are unsigned 16-bit values; decoding offsets them by
/// [`DEPTH_OFFSET`], so depths placed from the tag stream land in the
/// negative "timeline" zone while non-negative depths stay reserved for
/// objects created programmatically at run time.
pub type Depth = i32;

/// Offset applied to every on-disk depth and clip depth.
pub const DEPTH_OFFSET: Depth = -16384;

/// Identifier of a definition in the character dictionary.
pub type CharacterId = u16;

/// True for depths in the timeline-reserved zone, the only depths tracked
/// by per-timeline bookkeeping.
pub fn is_timeline_depth(depth: Depth) -> bool {
    depth < 0 && depth >= DEPTH_OFFSET
}

/// The three placement tag variants of the container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagKind {
    /// Legacy flagless variant.
    PlaceObject,
    /// Flag-gated variant.
    PlaceObject2,
    /// Flag-gated variant with the extended flag byte on format
    /// versions >= 8.
    PlaceObject3,
}

impl TagKind {
    /// Map a container tag code to a placement tag kind.
    pub fn from_tag_code(code: u16) -> Option<Self> {
        match code {
            4 => Some(TagKind::PlaceObject),
            26 => Some(TagKind::PlaceObject2),
            70 => Some(TagKind::PlaceObject3),
            _ => None,
        }
    }
}

/// What a placement record does to its depth slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaceType {
    /// Put a new instance at the depth.
    Place,
    /// Update the instance already at the depth in place.
    Move,
    /// Swap the instance at the depth for a new one.
    Replace,
    /// Erase the depth slot.
    Remove,
}

impl PlaceType {
    /// Derive the placement semantics from the two wire flags.
    pub fn from_flags(has_character: bool, move_flag: bool) -> Self {
        match (has_character, move_flag) {
            (true, false) => PlaceType::Place,
            (true, true) => PlaceType::Replace,
            (false, true) => PlaceType::Move,
            (false, false) => PlaceType::Remove,
        }
    }
}

/// One decoded placement tag, immutable once decoded.
///
/// Optional fields are `None` when the corresponding wire flag was clear
/// (or, for the legacy variant, when the trailing bytes were absent).
#[derive(Debug, Clone, Serialize)]
pub struct PlacementRecord {
    pub place_type: PlaceType,
    pub depth: Depth,
    pub character_id: Option<CharacterId>,
    pub matrix: Option<Matrix>,
    pub color_transform: Option<ColorTransform>,
    /// Morph interpolation position.
    pub ratio: Option<u16>,
    pub name: Option<String>,
    /// Marks the instance as a mask reaching down to this depth.
    pub clip_depth: Option<Depth>,
    pub filters: Vec<Filter>,
    pub events: Vec<EventRegistration>,
}
