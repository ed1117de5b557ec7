//! The display list: the depth-keyed set of live instances for one
//! timeline, and the engine that applies placement records to it.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::tag::{
    CharacterId, ColorTransform, Depth, EventRegistration, Filter, Matrix, PlaceType,
    PlacementRecord,
};

use super::dictionary::{CharacterDictionary, CharacterHandle};

/// Apply-time failures. Each one degrades to a logged no-op inside
/// [`DisplayList::apply`]; the enum exists so the conditions have names
/// and hosts driving the engine manually can observe them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("character {0} is not in the dictionary")]
    UnknownCharacter(CharacterId),
    #[error("no instance at depth {0}")]
    StaleDepthReference(Depth),
}

/// One live placed instance.
///
/// Fields are read through accessors; all mutation goes through the
/// display-list engine so the move/replace contracts hold.
#[derive(Debug, Clone)]
pub struct Instance {
    character: CharacterHandle,
    character_id: CharacterId,
    name: Option<String>,
    matrix: Matrix,
    color_transform: ColorTransform,
    ratio: Option<u16>,
    clip_depth: Option<Depth>,
    filters: Vec<Filter>,
    events: Vec<EventRegistration>,
}

impl Instance {
    fn from_record(record: &PlacementRecord, character: CharacterHandle) -> Self {
        Self {
            character,
            character_id: record.character_id.unwrap_or_default(),
            name: record.name.clone(),
            matrix: record.matrix.unwrap_or_default(),
            color_transform: record.color_transform.unwrap_or_default(),
            ratio: record.ratio,
            clip_depth: record.clip_depth,
            filters: record.filters.clone(),
            events: record.events.clone(),
        }
    }

    pub fn character(&self) -> &CharacterHandle {
        &self.character
    }

    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn color_transform(&self) -> &ColorTransform {
        &self.color_transform
    }

    pub fn ratio(&self) -> Option<u16> {
        self.ratio
    }

    pub fn clip_depth(&self) -> Option<Depth> {
        self.clip_depth
    }

    /// True when this instance masks the depth range down to its clip
    /// depth. The masking intersection itself is the renderer's concern.
    pub fn is_mask(&self) -> bool {
        self.clip_depth.is_some()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn events(&self) -> &[EventRegistration] {
        &self.events
    }
}

/// Depth-ordered collection of live instances. Iteration order is
/// ascending depth, which is the rendering order.
#[derive(Debug, Default)]
pub struct DisplayList {
    slots: BTreeMap<Depth, Instance>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded placement record.
    ///
    /// Records are expected in original tag order. Failures are logged and
    /// leave the list untouched; they never propagate, so one stale or
    /// malformed record cannot take down the timeline.
    pub fn apply(&mut self, record: &PlacementRecord, dictionary: &CharacterDictionary) {
        let result = match record.place_type {
            PlaceType::Place => self.place(record, dictionary),
            PlaceType::Move => self.move_in_place(record),
            PlaceType::Replace => self.replace(record, dictionary),
            PlaceType::Remove => self.remove(record.depth),
        };
        if let Err(err) = result {
            warn!(
                "display list: {:?} at depth {} skipped: {err}",
                record.place_type, record.depth
            );
        }
    }

    fn new_instance(
        record: &PlacementRecord,
        dictionary: &CharacterDictionary,
    ) -> Result<Instance, ApplyError> {
        let Some(id) = record.character_id else {
            // Unreachable for records built by the decoder; a hand-built
            // record without an id has nothing to place.
            return Err(ApplyError::UnknownCharacter(0));
        };
        let character = dictionary
            .lookup(id)
            .ok_or(ApplyError::UnknownCharacter(id))?;
        Ok(Instance::from_record(record, character))
    }

    /// Place: insert a fresh instance, overwriting any prior occupant of
    /// the depth.
    fn place(
        &mut self,
        record: &PlacementRecord,
        dictionary: &CharacterDictionary,
    ) -> Result<(), ApplyError> {
        let instance = Self::new_instance(record, dictionary)?;
        if self.slots.insert(record.depth, instance).is_some() {
            debug!(
                "display list: place over occupied depth {}, old instance dropped",
                record.depth
            );
        }
        Ok(())
    }

    /// Move: update the occupant's fields from whatever the record
    /// carries. Identity and event registrations stay untouched.
    fn move_in_place(&mut self, record: &PlacementRecord) -> Result<(), ApplyError> {
        let instance = self
            .slots
            .get_mut(&record.depth)
            .ok_or(ApplyError::StaleDepthReference(record.depth))?;

        if let Some(matrix) = record.matrix {
            instance.matrix = matrix;
        }
        if let Some(cx) = record.color_transform {
            instance.color_transform = cx;
        }
        if let Some(ratio) = record.ratio {
            instance.ratio = Some(ratio);
        }
        if let Some(clip_depth) = record.clip_depth {
            instance.clip_depth = Some(clip_depth);
        }
        Ok(())
    }

    /// Replace: swap the occupant for a fresh instance in one map insert,
    /// so no observer ever sees the depth empty.
    fn replace(
        &mut self,
        record: &PlacementRecord,
        dictionary: &CharacterDictionary,
    ) -> Result<(), ApplyError> {
        if !self.slots.contains_key(&record.depth) {
            return Err(ApplyError::StaleDepthReference(record.depth));
        }
        let instance = Self::new_instance(record, dictionary)?;
        self.slots.insert(record.depth, instance);
        Ok(())
    }

    /// Remove: erase the slot. An already-empty slot is reported as stale
    /// (and logged by `apply`), not treated as a failure.
    fn remove(&mut self, depth: Depth) -> Result<(), ApplyError> {
        match self.slots.remove(&depth) {
            Some(_) => Ok(()),
            None => Err(ApplyError::StaleDepthReference(depth)),
        }
    }

    pub fn get(&self, depth: Depth) -> Option<&Instance> {
        self.slots.get(&depth)
    }

    /// Resolve a named instance, lowest depth first on ties.
    pub fn get_by_name(&self, name: &str) -> Option<(Depth, &Instance)> {
        self.slots
            .iter()
            .find(|(_, inst)| inst.name() == Some(name))
            .map(|(depth, inst)| (*depth, inst))
    }

    /// Instances in ascending depth order.
    pub fn iter(&self) -> impl Iterator<Item = (Depth, &Instance)> {
        self.slots.iter().map(|(depth, inst)| (*depth, inst))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
