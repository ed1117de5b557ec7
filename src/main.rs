//! Tag-stream inspection tool: decode placement tags from a raw tag
//! stream and print them as JSON.
//!
//! The library deliberately leaves tag framing to the host, so the
//! framing for standalone `.tags` files (length-framed record headers,
//! no container header) lives here.

use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs};

use serde::Serialize;

use stagehand::stage::{Character, CharacterDictionary, CharacterKind, DisplayList, TimelineDepths};
use stagehand::tag::{PlacementRecord, TagCursor, TagKind, decode_place_tag};

#[derive(Serialize)]
struct DumpEntry {
    offset: usize,
    tag: TagKind,
    #[serde(flatten)]
    record: PlacementRecord,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let apply = args.iter().any(|a| a == "--apply");
    let positional: Vec<&String> = args[1..].iter().filter(|a| !a.starts_with("--")).collect();

    if positional.is_empty() {
        eprintln!("Usage: {} <stream.tags> [version] [--apply]", args[0]);
        eprintln!();
        eprintln!("Decode placement tags from a raw tag stream and print JSON records.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  stream.tags  File of length-framed tags, no container header");
        eprintln!("  version      Format version for flag-word widths (default: 8)");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --apply      Replay the records against a display list and print");
        eprintln!("               a summary (character ids are stubbed as shapes)");
        std::process::exit(1);
    }

    let path = PathBuf::from(positional[0]);
    let version: u8 = positional
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);

    let bytes = fs::read(&path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let data: Arc<[u8]> = bytes.into();

    let entries = decode_stream(&data, version);

    for entry in &entries {
        match serde_json::to_string(entry) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Error serializing record: {}", e),
        }
    }

    if apply {
        replay(&entries);
    }
}

/// Walk the record headers and decode every placement tag. A malformed
/// tag is logged and skipped; a header that overruns the file ends the
/// walk.
fn decode_stream(data: &Arc<[u8]>, version: u8) -> Vec<DumpEntry> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    while pos + 2 <= data.len() {
        let header = u16::from_le_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        let code = header >> 6;
        let mut len = (header & 0x3F) as usize;
        if len == 0x3F {
            if pos + 4 > data.len() {
                log::warn!("long record header at offset {} overruns the file", pos - 2);
                break;
            }
            len = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
                as usize;
            pos += 4;
        }

        if code == 0 {
            break; // end-of-stream tag
        }

        let end = pos + len;
        if end > data.len() {
            log::warn!(
                "tag code {code} at offset {pos} declares {len} byte(s), only {} left",
                data.len() - pos
            );
            break;
        }

        if let Some(kind) = TagKind::from_tag_code(code) {
            let offset = pos;
            let mut cursor = TagCursor::new(Arc::clone(data), pos, end);
            match decode_place_tag(&mut cursor, kind, version) {
                Ok(record) => entries.push(DumpEntry {
                    offset,
                    tag: kind,
                    record,
                }),
                Err(err) => log::warn!("tag at offset {offset} discarded: {err}"),
            }
        }

        pos = end;
    }

    entries
}


/// Replay the decoded records against a fresh display list, registering a
/// stub character for every referenced id so placements resolve.
fn replay(entries: &[DumpEntry]) {
    let mut dictionary = CharacterDictionary::new();
    for entry in entries {
        if let Some(id) = entry.record.character_id {
            if !dictionary.contains(id) {
                dictionary.register(Character {
                    id,
                    kind: CharacterKind::Shape,
                });
            }
        }
    }

    let mut display_list = DisplayList::new();
    let mut timeline = TimelineDepths::new();
    for entry in entries {
        timeline.record(entry.record.depth);
        display_list.apply(&entry.record, &dictionary);
    }

    println!();
    println!("Applied {} record(s)", entries.len());
    println!("Timeline depths touched: {}", timeline.len());
    println!("Live instances: {}", display_list.len());
    for (depth, instance) in display_list.iter() {
        println!(
            "  depth {:>6}  char {:>4}  name {}",
            depth,
            instance.character_id(),
            instance.name().unwrap_or("-")
        );
    }
}
