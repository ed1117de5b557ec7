//! Stateful half of the crate: the character dictionary, the display
//! list the decoded records mutate, and timeline depth bookkeeping.

mod dictionary;
mod display_list;
mod timeline;

pub use dictionary::{Character, CharacterDictionary, CharacterHandle, CharacterKind};
pub use display_list::{ApplyError, DisplayList, Instance};
pub use timeline::TimelineDepths;
