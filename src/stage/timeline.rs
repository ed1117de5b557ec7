//! Bookkeeping of which timeline-reserved depths an animation touches.

use std::collections::BTreeSet;

use log::debug;

use crate::tag::{Depth, is_timeline_depth};

/// Records every timeline-zone depth referenced by the tag stream over an
/// animation's lifetime. Depths outside the reserved zone (programmatic
/// objects, or malformed content) are logged and not tracked.
#[derive(Debug, Default)]
pub struct TimelineDepths {
    depths: BTreeSet<Depth>,
}

impl TimelineDepths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a depth seen in a placement record. Returns whether it was
    /// inside the timeline-reserved zone and therefore tracked.
    pub fn record(&mut self, depth: Depth) -> bool {
        if is_timeline_depth(depth) {
            self.depths.insert(depth);
            true
        } else {
            debug!("timeline: depth {depth} outside the reserved zone, not tracked");
            false
        }
    }

    pub fn contains(&self, depth: Depth) -> bool {
        self.depths.contains(&depth)
    }

    /// Tracked depths in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Depth> + '_ {
        self.depths.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::DEPTH_OFFSET;

    #[test]
    fn test_only_reserved_zone_is_tracked() {
        let mut depths = TimelineDepths::new();

        assert!(depths.record(DEPTH_OFFSET));
        assert!(depths.record(-1));
        assert!(!depths.record(0));
        assert!(!depths.record(DEPTH_OFFSET - 1));

        assert_eq!(depths.len(), 2);
        assert!(depths.contains(-1));
        assert!(!depths.contains(0));
    }

    #[test]
    fn test_duplicate_depths_collapse() {
        let mut depths = TimelineDepths::new();
        depths.record(-10);
        depths.record(-10);
        assert_eq!(depths.len(), 1);
    }
}
