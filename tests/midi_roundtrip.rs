// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Integration tests for the MIDI instruction channel: container parse,
//! onset-ordered compilation, and the chunking presentation transform.

use murmur_core::midi::{chunk_stream, compile, compile_chunked, parse};
use murmur_core::{InstructionTable, MidiError};

/// Minimal format-1 SMF writer for fixtures: each track is a list of
/// (delta, event bytes) pairs; end-of-track is appended automatically.
fn smf(division: u16, tracks: &[&[(u32, &[u8])]]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        let mut body = Vec::new();
        for &(delta, event) in *track {
            push_varint(&mut body, delta);
            body.extend_from_slice(event);
        }
        body.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
    }
    out
}

fn push_varint(out: &mut Vec<u8>, mut value: u32) {
    let mut stack = [0u8; 4];
    let mut n = 0;
    loop {
        stack[n] = (value & 0x7F) as u8;
        value >>= 7;
        n += 1;
        if value == 0 {
            break;
        }
    }
    while n > 1 {
        n -= 1;
        out.push(stack[n] | 0x80);
    }
    out.push(stack[0]);
}

/// A note held for `dur` ticks: note-on now, note-off after `dur`.
fn on(note: u8) -> [u8; 3] {
    [0x90, note, 100]
}

fn off(note: u8) -> [u8; 3] {
    [0x80, note, 0]
}

#[test]
fn noop_and_payload_notes() {
    // Notes 60, 62, 64 at onsets 0.0, 0.5, 1.0 s (480 PPQ at 120 BPM):
    // 60 is the reserved no-op, 62 is "+", 64 is "-".
    let table = InstructionTable::global();
    let data = smf(
        480,
        &[&[
            (0, &on(60)),
            (240, &off(60)),
            (240, &on(62)),
            (240, &off(62)),
            (240, &on(64)),
            (240, &off(64)),
        ]],
    );
    let parsed = parse(&data).unwrap();
    let notes = &parsed.tracks[0].notes;
    assert_eq!(notes.len(), 3);
    assert!((notes[0].time - 0.0).abs() < 1e-9);
    assert!((notes[1].time - 0.5).abs() < 1e-9);
    assert!((notes[2].time - 1.0).abs() < 1e-9);
    assert_eq!(compile(&parsed, table), "+-");
}

#[test]
fn onset_order_beats_track_order() {
    // Track 0 has the later note; track 1 the earlier one.
    let table = InstructionTable::global();
    let data = smf(
        480,
        &[
            &[(480, &on(64)), (240, &off(64))], // "-" at 0.5 s
            &[(0, &on(62)), (240, &off(62))],   // "+" at 0.0 s
        ],
    );
    let parsed = parse(&data).unwrap();
    assert_eq!(compile(&parsed, table), "+-");
}

#[test]
fn compiled_stream_concatenates_compound_tokens() {
    // 77 → "[-]", 62 → "+", 76 → ">."
    let table = InstructionTable::global();
    let data = smf(
        480,
        &[&[
            (0, &on(77)),
            (120, &off(77)),
            (120, &on(62)),
            (120, &off(62)),
            (120, &on(76)),
            (120, &off(76)),
        ]],
    );
    let parsed = parse(&data).unwrap();
    assert_eq!(compile(&parsed, table), "[-]+>.");
    // Chunking closes right after each closing pattern.
    assert_eq!(compile_chunked(&parsed, table), "[-] +>.");
}

#[test]
fn chunking_is_presentation_only() {
    let table = InstructionTable::global();
    // A long run of "+" notes interleaved with loops.
    let mut events: Vec<(u32, Vec<u8>)> = Vec::new();
    for &note in &[72, 64, 74, 62, 62, 62, 62, 62, 62, 62, 62, 77, 65, 69] {
        events.push((60, on(note).to_vec()));
        events.push((60, off(note).to_vec()));
    }
    let borrowed: Vec<(u32, &[u8])> =
        events.iter().map(|(d, e)| (*d, e.as_slice())).collect();
    let data = smf(480, &[borrowed.as_slice()]);
    let parsed = parse(&data).unwrap();
    let raw = compile(&parsed, table);
    let chunked = compile_chunked(&parsed, table);
    assert_eq!(chunked.replace(' ', ""), raw);
    assert!(chunk_stream(&raw).split(' ').all(|c| c.chars().count() <= 8));
}

#[test]
fn empty_midi_file_yields_empty_stream() {
    let table = InstructionTable::global();
    let data = smf(480, &[&[]]);
    let parsed = parse(&data).unwrap();
    assert_eq!(compile(&parsed, table), "");
}

#[test]
fn malformed_container_is_fatal() {
    assert!(matches!(parse(b"not midi at all"), Err(MidiError::MissingHeader)));

    // Truncated mid-track.
    let data = smf(480, &[&[(0, &on(62))]]);
    assert!(parse(&data[..data.len() - 3]).is_err());
}

#[test]
fn velocity_and_duration_survive_parse() {
    let data = smf(480, &[&[(0, &[0x90, 62, 64]), (960, &off(62))]]);
    let parsed = parse(&data).unwrap();
    let note = &parsed.tracks[0].notes[0];
    assert!((note.velocity - 64.0 / 127.0).abs() < 1e-6);
    assert!((note.duration - 1.0).abs() < 1e-9);
    assert!((parsed.duration - 1.0).abs() < 1e-9);
}
