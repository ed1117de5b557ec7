//! Character dictionary: id-to-definition lookup populated by the asset
//! loader.

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;
use serde::Serialize;

use crate::tag::CharacterId;

/// What kind of definition a dictionary entry is. The display list only
/// needs the distinction for diagnostics; rendering details live with the
/// renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CharacterKind {
    Shape,
    MorphShape,
    Sprite,
    Bitmap,
    Font,
    Text,
    Button,
}

/// One loadable definition registered by the asset loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Character {
    pub id: CharacterId,
    pub kind: CharacterKind,
}

/// Shared handle to a dictionary entry. Placed instances hold one of these
/// for as long as they live.
pub type CharacterHandle = Arc<Character>;

/// Dictionary of every definition seen so far in the stream.
#[derive(Debug, Default)]
pub struct CharacterDictionary {
    entries: HashMap<CharacterId, CharacterHandle>,
}

impl CharacterDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, returning its shared handle. Re-registering
    /// an id replaces the old definition for future lookups; instances
    /// already placed keep the handle they were created with.
    pub fn register(&mut self, character: Character) -> CharacterHandle {
        let id = character.id;
        let handle: CharacterHandle = Arc::new(character);
        if self.entries.insert(id, Arc::clone(&handle)).is_some() {
            warn!("dictionary: character id {id} registered twice");
        }
        handle
    }

    /// Look up a definition by id.
    pub fn lookup(&self, id: CharacterId) -> Option<CharacterHandle> {
        self.entries.get(&id).cloned()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
