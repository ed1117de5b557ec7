//! Demultiplexer for the per-instance event table of the extended
//! placement tags.
//!
//! One table entry pairs a flag word (one bit per event kind) with a single
//! action block. A block declared for several kinds at once yields one
//! registration per kind, all sharing the same captured byte range; the
//! block itself is never interpreted here; that is the script engine's
//! job at execution time.

use std::sync::Arc;

use log::warn;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::cursor::{DecodeError, TagCursor};

/// Number of assigned bits in the event flag word; higher bits are
/// reserved.
const KNOWN_EVENT_BITS: u32 = 19;

/// Bit position of the key-press event, the only kind that carries a key
/// code byte inside its table entry.
const KEY_PRESS_BIT: u32 = 17;

/// Event kinds, in flag-word bit order (bit 0 first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Load,
    EnterFrame,
    Unload,
    MouseMove,
    MouseDown,
    MouseUp,
    KeyDown,
    KeyUp,
    Data,
    Initialize,
    Press,
    Release,
    ReleaseOutside,
    RollOver,
    RollOut,
    DragOver,
    DragOut,
    KeyPress,
    Construct,
}

impl EventKind {
    /// Map a flag-word bit position to its event kind.
    pub fn from_bit(bit: u32) -> Option<Self> {
        use EventKind::*;
        const ORDER: [EventKind; KNOWN_EVENT_BITS as usize] = [
            Load,
            EnterFrame,
            Unload,
            MouseMove,
            MouseDown,
            MouseUp,
            KeyDown,
            KeyUp,
            Data,
            Initialize,
            Press,
            Release,
            ReleaseOutside,
            RollOver,
            RollOut,
            DragOver,
            DragOut,
            KeyPress,
            Construct,
        ];
        ORDER.get(bit as usize).copied()
    }
}

/// Zero-copy reference to a captured action block: the owning tag buffer
/// plus an offset/length pair. Clones share the buffer.
#[derive(Debug, Clone)]
pub struct ActionRange {
    data: Arc<[u8]>,
    offset: usize,
    len: usize,
}

impl ActionRange {
    pub(crate) fn new(data: Arc<[u8]>, offset: usize, len: usize) -> Self {
        Self { data, offset, len }
    }

    /// The captured bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data[self.offset..self.offset + self.len]
    }

    /// Offset of the block inside the owning tag buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when both ranges view the same buffer region without copying.
    pub fn shares_buffer(&self, other: &ActionRange) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
            && self.offset == other.offset
            && self.len == other.len
    }
}

impl Serialize for ActionRange {
    // The payload stays opaque; only its framing is exported.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ActionRange", 2)?;
        s.serialize_field("offset", &self.offset)?;
        s.serialize_field("length", &self.len)?;
        s.end()
    }
}

/// One (event kind, action block) pairing decoded from the event table.
#[derive(Debug, Clone, Serialize)]
pub struct EventRegistration {
    pub kind: EventKind,
    pub actions: ActionRange,
    /// Key code, present only on [`EventKind::KeyPress`] registrations.
    pub key_code: Option<u8>,
}

/// Decode the event table that follows the placement fields when the
/// has-actions flag is set.
///
/// The table opens with a reserved word and the logical OR of all
/// per-entry flag words, then repeats (flag word, declared length, action
/// block) until a zero flag word. A declared length that overruns the tag
/// aborts the rest of the table but keeps the entries decoded so far; the
/// cursor is left where the overrun was detected.
pub fn decode_events(
    cur: &mut TagCursor,
    version: u8,
) -> Result<Vec<EventRegistration>, DecodeError> {
    let read_flags = |cur: &mut TagCursor| -> Result<u32, DecodeError> {
        if version >= 6 {
            cur.read_u32()
        } else {
            Ok(cur.read_u16()? as u32)
        }
    };

    let reserved = cur.read_u16()?;
    if reserved != 0 {
        warn!("event table: reserved field is {reserved:#x} (expected 0)");
    }

    // Combined flag word; informational only.
    let _all_flags = read_flags(cur)?;

    let mut registrations = Vec::new();

    loop {
        cur.align();

        let flags = read_flags(cur)?;
        if flags == 0 {
            break;
        }

        let declared = cur.read_u32()? as usize;
        if declared > cur.remaining() {
            warn!(
                "event table: declared action length {declared} exceeds {} byte(s) left in tag, \
                 dropping the rest of the table",
                cur.remaining()
            );
            break;
        }

        let mut budget = declared;
        let mut key_code = None;
        if flags & (1 << KEY_PRESS_BIT) != 0 {
            if budget == 0 {
                warn!("event table: key-press entry with zero-length body, no key code to read");
            } else {
                key_code = Some(cur.read_u8()?);
                budget -= 1;
            }
        }

        let actions = cur.capture("event actions", budget)?;

        if flags >> KNOWN_EVENT_BITS != 0 {
            warn!("event table: unrecognized event bits in flag word {flags:#x}");
        }

        for bit in 0..KNOWN_EVENT_BITS {
            if flags & (1 << bit) == 0 {
                continue;
            }
            let Some(kind) = EventKind::from_bit(bit) else {
                continue;
            };
            registrations.push(EventRegistration {
                kind,
                actions: actions.clone(),
                key_code: if bit == KEY_PRESS_BIT { key_code } else { None },
            });
        }
    }

    Ok(registrations)
}
