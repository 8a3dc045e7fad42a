// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Compilation of parsed MIDI note streams into instruction streams.
//!
//! Onset order — not track or channel — defines payload order: notes from
//! all tracks are merged and sorted by ascending onset time (stable on
//! ties) before mapping through the instruction table. Reserved no-op
//! notes contribute nothing to the stream.
//!
//! The chunking pass is a presentation transform only: it groups the raw
//! stream into space-separated chunks, closing a chunk immediately after
//! one of the fixed closing patterns or at 8 characters, whichever comes
//! first. Removing the spaces reproduces the raw stream exactly.

use crate::error::CodecError;
use crate::midi::parser::ParsedMidi;
use crate::opcode::InstructionTable;

/// Chunk-closing patterns, checked against the current chunk's tail.
const CLOSING_PATTERNS: [&str; 3] = ["[-]", "[->+<]", ">."];

/// Maximum chunk length in characters.
const MAX_CHUNK_LEN: usize = 8;

/// Compile a parsed MIDI file into the raw instruction stream.
pub fn compile(parsed: &ParsedMidi, table: &InstructionTable) -> String {
    let mut notes: Vec<(f64, u8)> = parsed
        .tracks
        .iter()
        .flat_map(|t| t.notes.iter().map(|n| (n.time, n.note)))
        .collect();
    // Stable sort: ties keep track order, matching the merge contract.
    notes.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut stream = String::new();
    for (_, note) in notes {
        let entry = table.by_note(note);
        if entry.is_payload() {
            stream.push_str(entry.token);
        }
    }
    stream
}

/// Group a raw instruction stream into space-separated chunks.
pub fn chunk_stream(raw: &str) -> String {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in raw.chars() {
        current.push(ch);
        let close = CLOSING_PATTERNS.iter().any(|p| current.ends_with(p))
            || current.chars().count() >= MAX_CHUNK_LEN;
        if close {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks.join(" ")
}

/// Compile and chunk in one pass: the transportable instruction text.
pub fn compile_chunked(parsed: &ParsedMidi, table: &InstructionTable) -> String {
    chunk_stream(&compile(parsed, table))
}

/// Compile a comma-separated list of note numbers (the manual-entry
/// path). Empty items are skipped; reserved and unmapped notes contribute
/// nothing.
///
/// # Errors
/// [`CodecError::MalformedPayload`] if an item is not a note number.
pub fn compile_note_list(input: &str, table: &InstructionTable) -> Result<String, CodecError> {
    let mut stream = String::new();
    for item in input.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let note: u8 = item.parse().map_err(|_| CodecError::MalformedPayload)?;
        let entry = table.by_note(note);
        if entry.is_payload() {
            stream.push_str(entry.token);
        }
    }
    Ok(stream)
}
