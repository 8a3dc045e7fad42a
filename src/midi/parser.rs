// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Standard MIDI File (format 0/1) container parser.
//!
//! Walks the `MThd`/`MTrk` chunk structure and reduces each track to its
//! note events with onset time, duration, and velocity in real seconds.
//! Everything the instruction channel does not need — controllers, pitch
//! bend, sysex, all meta-events except tempo, track name, and end of
//! track — is skipped over. Unknown chunk types are skipped whole, as the
//! SMF specification asks of readers.
//!
//! Tempo changes from all tracks are merged into a single tempo map
//! before tick→seconds conversion, so format-1 files with the tempo on
//! the conductor track resolve the same as format-0 files.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::error::{MidiError, Result};

/// Default tempo: 500 000 µs per quarter note (120 BPM).
const DEFAULT_US_PER_QUARTER: u32 = 500_000;

/// A note with onset time and duration in seconds. Velocity is
/// normalized to 0.0–1.0. Read-only after parse.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub time: f64,
    pub note: u8,
    pub duration: f64,
    pub velocity: f32,
}

/// One track's worth of note events, in file order.
#[derive(Debug, Clone, Default)]
pub struct MidiTrack {
    pub name: String,
    pub notes: Vec<NoteEvent>,
}

/// A fully parsed MIDI file.
#[derive(Debug, Clone, Default)]
pub struct ParsedMidi {
    pub tracks: Vec<MidiTrack>,
    /// End of the last sounding note, in seconds.
    pub duration: f64,
}

impl fmt::Display for ParsedMidi {
    /// Structured dump of the parsed file, one line per note.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "duration: {:.3}s", self.duration)?;
        for (i, track) in self.tracks.iter().enumerate() {
            writeln!(f, "track {i}: {:?} ({} notes)", track.name, track.notes.len())?;
            for n in &track.notes {
                writeln!(
                    f,
                    "  t={:.3} note={} dur={:.3} vel={:.2}",
                    n.time, n.note, n.duration, n.velocity
                )?;
            }
        }
        Ok(())
    }
}

/// Time division from the `MThd` chunk.
#[derive(Debug, Clone, Copy)]
enum Division {
    /// Ticks per quarter note; tempo map applies.
    TicksPerQuarter(u16),
    /// SMPTE: frames per second × ticks per frame; tempo-independent.
    Smpte { fps: f64, ticks_per_frame: u16 },
}

/// Parse a Standard MIDI File from bytes.
///
/// # Errors
/// Any structural fault in the container is fatal (see [`MidiError`]).
/// An empty note list is not an error.
pub fn parse(data: &[u8]) -> Result<ParsedMidi> {
    let mut r = Reader::new(data);

    // Header chunk.
    if r.read_bytes(4)? != b"MThd" {
        return Err(MidiError::MissingHeader);
    }
    let header_len = r.read_u32()?;
    if header_len < 6 {
        return Err(MidiError::InvalidHeaderLength(header_len));
    }
    let format = r.read_u16()?;
    if format > 1 {
        return Err(MidiError::UnsupportedFormat(format));
    }
    let track_count = r.read_u16()?;
    let division_raw = r.read_u16()?;
    r.skip(header_len as usize - 6)?;

    let division = if division_raw & 0x8000 != 0 {
        let fps = -((division_raw >> 8) as u8 as i8) as f64;
        let ticks_per_frame = division_raw & 0x00FF;
        if fps <= 0.0 || ticks_per_frame == 0 {
            return Err(MidiError::InvalidDivision);
        }
        Division::Smpte { fps, ticks_per_frame }
    } else {
        if division_raw == 0 {
            return Err(MidiError::InvalidDivision);
        }
        Division::TicksPerQuarter(division_raw)
    };

    // First pass: raw per-track data in the tick domain, plus the merged
    // tempo events.
    let mut raw_tracks = Vec::new();
    let mut tempo_events: Vec<(u64, u32)> = Vec::new();
    let mut parsed_count = 0u16;

    while parsed_count < track_count && !r.at_end() {
        let chunk_id = r.read_bytes(4)?.to_vec();
        let chunk_len = r.read_u32()? as usize;
        if &chunk_id != b"MTrk" {
            r.skip(chunk_len)?;
            continue;
        }
        let body = r.read_bytes(chunk_len)?;
        let track = parse_track(body)?;
        tempo_events.extend(track.tempos.iter().copied());
        raw_tracks.push(track);
        parsed_count += 1;
    }

    // Merge tempo changes from all tracks into one map.
    tempo_events.sort_by_key(|&(tick, _)| tick);
    let clock = TickClock::new(division, &tempo_events);

    // Second pass: ticks → seconds.
    let mut tracks = Vec::with_capacity(raw_tracks.len());
    let mut duration = 0.0f64;
    for raw in raw_tracks {
        let mut notes = Vec::with_capacity(raw.notes.len());
        for n in raw.notes {
            let time = clock.seconds_at(n.onset_tick);
            let end = clock.seconds_at(n.off_tick);
            let note = NoteEvent {
                time,
                note: n.key,
                duration: end - time,
                velocity: n.velocity as f32 / 127.0,
            };
            duration = duration.max(end);
            notes.push(note);
        }
        tracks.push(MidiTrack { name: raw.name, notes });
    }

    Ok(ParsedMidi { tracks, duration })
}

/// A note in the tick domain, before tempo resolution.
struct RawNote {
    onset_tick: u64,
    off_tick: u64,
    key: u8,
    velocity: u8,
}

struct RawTrack {
    name: String,
    notes: Vec<RawNote>,
    tempos: Vec<(u64, u32)>,
}

/// Parse one `MTrk` chunk body into tick-domain notes and tempo changes.
fn parse_track(body: &[u8]) -> Result<RawTrack> {
    let mut r = Reader::new(body);
    let mut tick = 0u64;
    let mut running_status: Option<u8> = None;
    let mut name = String::new();
    let mut notes: Vec<RawNote> = Vec::new();
    let mut tempos = Vec::new();
    // Sounding notes per (channel, key), paired first-on/first-off.
    let mut open: HashMap<(u8, u8), VecDeque<usize>> = HashMap::new();

    while !r.at_end() {
        tick += r.read_varint()?;

        let first = r.read_u8()?;
        let status = if first & 0x80 != 0 {
            first
        } else {
            // Running status: `first` is the first data byte.
            r.unread();
            running_status.ok_or(MidiError::MissingRunningStatus)?
        };

        match status {
            0x80..=0x8F | 0x90..=0x9F => {
                running_status = Some(status);
                let channel = status & 0x0F;
                let key = r.read_u8()? & 0x7F;
                let velocity = r.read_u8()? & 0x7F;
                let is_on = status & 0xF0 == 0x90 && velocity > 0;
                if is_on {
                    notes.push(RawNote { onset_tick: tick, off_tick: tick, key, velocity });
                    open.entry((channel, key)).or_default().push_back(notes.len() - 1);
                } else if let Some(idx) =
                    open.get_mut(&(channel, key)).and_then(|q| q.pop_front())
                {
                    notes[idx].off_tick = tick;
                }
                // A note-off with no matching note-on is ignored.
            }
            0xA0..=0xBF | 0xE0..=0xEF => {
                // Aftertouch, controller, pitch bend: two data bytes.
                running_status = Some(status);
                r.skip(2)?;
            }
            0xC0..=0xDF => {
                // Program change, channel pressure: one data byte.
                running_status = Some(status);
                r.skip(1)?;
            }
            0xF0 | 0xF7 => {
                // Sysex cancels running status.
                running_status = None;
                let len = r.read_varint()? as usize;
                r.skip(len)?;
            }
            0xFF => {
                running_status = None;
                let meta_type = r.read_u8()?;
                let len = r.read_varint()? as usize;
                let data = r.read_bytes(len)?;
                match meta_type {
                    0x03 if name.is_empty() => {
                        name = String::from_utf8_lossy(data).into_owned();
                    }
                    0x51 => {
                        if len != 3 {
                            return Err(MidiError::InvalidEvent("tempo meta length"));
                        }
                        let uspq =
                            (data[0] as u32) << 16 | (data[1] as u32) << 8 | data[2] as u32;
                        tempos.push((tick, uspq));
                    }
                    0x2F => break,
                    _ => {}
                }
            }
            _ => return Err(MidiError::InvalidEvent("unsupported system message")),
        }
    }

    // Notes still sounding at end of track close at the final tick.
    for queue in open.into_values() {
        for idx in queue {
            notes[idx].off_tick = tick;
        }
    }

    Ok(RawTrack { name, notes, tempos })
}

/// Converts absolute ticks to seconds under the merged tempo map.
struct TickClock {
    division: Division,
    /// (tick, seconds_at_tick, µs per quarter from this tick on).
    segments: Vec<(u64, f64, u32)>,
}

impl TickClock {
    fn new(division: Division, tempo_events: &[(u64, u32)]) -> Self {
        let mut segments = vec![(0u64, 0.0f64, DEFAULT_US_PER_QUARTER)];
        if let Division::TicksPerQuarter(ppq) = division {
            for &(tick, uspq) in tempo_events {
                let &(last_tick, last_secs, last_uspq) =
                    segments.last().unwrap_or(&(0, 0.0, DEFAULT_US_PER_QUARTER));
                let secs = last_secs
                    + (tick - last_tick) as f64 * last_uspq as f64 / 1e6 / ppq as f64;
                if tick == last_tick {
                    segments.pop();
                }
                segments.push((tick, secs, uspq));
            }
        }
        TickClock { division, segments }
    }

    fn seconds_at(&self, tick: u64) -> f64 {
        match self.division {
            Division::Smpte { fps, ticks_per_frame } => {
                tick as f64 / (fps * ticks_per_frame as f64)
            }
            Division::TicksPerQuarter(ppq) => {
                let seg = self
                    .segments
                    .iter()
                    .rev()
                    .find(|&&(t, _, _)| t <= tick)
                    .unwrap_or(&self.segments[0]);
                seg.1 + (tick - seg.0) as f64 * seg.2 as f64 / 1e6 / ppq as f64
            }
        }
    }
}

/// Forward-only byte reader over a slice.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(MidiError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    /// Step back one byte (used after peeking a running-status data byte).
    fn unread(&mut self) {
        debug_assert!(self.pos > 0);
        self.pos -= 1;
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(MidiError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        if self.pos + n > self.data.len() {
            return Err(MidiError::UnexpectedEof);
        }
        self.pos += n;
        Ok(())
    }

    /// MIDI variable-length quantity: 7 bits per byte, high bit is the
    /// continuation flag, at most 4 bytes.
    fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for i in 0.. {
            if i == 4 {
                return Err(MidiError::VarIntTooLong);
            }
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7F) as u64;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(value)
    }
}
