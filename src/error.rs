// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Error types for the steganographic codec.
//!
//! [`CodecError`] covers all failure modes across the three carrier
//! channels. Container-level faults keep their own error enums
//! ([`MidiError`](crate::midi::error::MidiError),
//! [`WavError`](crate::audio::wav::WavError)) and are wrapped here.

use core::fmt;

use crate::audio::wav::WavError;
use crate::midi::error::MidiError;
use crate::session::InvalidTransition;

/// Errors that can occur during steganographic encoding or decoding.
#[derive(Debug)]
pub enum CodecError {
    /// A recovered bit sequence does not decompose into whole bytes, or a
    /// carrier is structurally broken (stray boundary marker, foreign
    /// character inside a hidden segment, truncated tone window).
    MalformedPayload,
    /// The MIDI container failed to parse.
    InvalidMidi(MidiError),
    /// The WAV container failed to parse.
    InvalidWav(WavError),
    /// A reverse lookup in the instruction table found more than one
    /// candidate for the same key.
    AmbiguousMapping {
        /// What was being looked up ("byte", "token length").
        key: &'static str,
        /// The ambiguous key value.
        value: u32,
    },
    /// Decode was invoked on a carrier with no recognizable marker or
    /// boundary character.
    UnsupportedCarrier,
    /// A planned tone frequency is at or above the Nyquist limit for the
    /// session's sample rate and cannot be synthesized.
    ToneOutOfRange {
        frequency_hz: f64,
        nyquist_hz: f64,
    },
    /// A session operation was invoked in the wrong state.
    Session(InvalidTransition),
    /// The operation was cancelled by the caller.
    Cancelled,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload => write!(f, "recovered payload is not a whole number of bytes"),
            Self::InvalidMidi(e) => write!(f, "invalid MIDI file: {e}"),
            Self::InvalidWav(e) => write!(f, "invalid WAV file: {e}"),
            Self::AmbiguousMapping { key, value } => {
                write!(f, "ambiguous reverse mapping for {key} {value}")
            }
            Self::UnsupportedCarrier => write!(f, "carrier contains no recognizable markers"),
            Self::ToneOutOfRange { frequency_hz, nyquist_hz } => write!(
                f,
                "tone frequency {frequency_hz} Hz exceeds Nyquist limit {nyquist_hz} Hz"
            ),
            Self::Session(t) => write!(f, "{t}"),
            Self::Cancelled => write!(f, "operation cancelled by caller"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidMidi(e) => Some(e),
            Self::InvalidWav(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MidiError> for CodecError {
    fn from(e: MidiError) -> Self {
        Self::InvalidMidi(e)
    }
}

impl From<WavError> for CodecError {
    fn from(e: WavError) -> Self {
        Self::InvalidWav(e)
    }
}

impl From<InvalidTransition> for CodecError {
    fn from(t: InvalidTransition) -> Self {
        Self::Session(t)
    }
}
