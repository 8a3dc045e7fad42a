// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for Standard MIDI File parsing.

use std::fmt;

/// Errors that can occur while parsing a Standard MIDI File container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiError {
    /// Input data is too short or truncated.
    UnexpectedEof,
    /// Missing `MThd` chunk at start of data.
    MissingHeader,
    /// Header chunk length is not at least 6 bytes.
    InvalidHeaderLength(u32),
    /// File format other than 0 or 1 (format 2 is not supported).
    UnsupportedFormat(u16),
    /// A time division of zero ticks per quarter note.
    InvalidDivision,
    /// A variable-length quantity ran past its 4-byte maximum.
    VarIntTooLong,
    /// A data byte appeared with no status byte to run under.
    MissingRunningStatus,
    /// An event or meta-event is structurally invalid.
    InvalidEvent(&'static str),
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of MIDI data"),
            Self::MissingHeader => write!(f, "missing MThd chunk (not a MIDI file)"),
            Self::InvalidHeaderLength(n) => write!(f, "invalid MThd length: {n}"),
            Self::UnsupportedFormat(n) => write!(f, "unsupported MIDI format: {n}"),
            Self::InvalidDivision => write!(f, "invalid time division"),
            Self::VarIntTooLong => write!(f, "variable-length quantity exceeds 4 bytes"),
            Self::MissingRunningStatus => write!(f, "data byte without running status"),
            Self::InvalidEvent(msg) => write!(f, "invalid MIDI event: {msg}"),
        }
    }
}

impl std::error::Error for MidiError {}

pub type Result<T> = std::result::Result<T, MidiError>;
