// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Tone planning and PCM synthesis.
//!
//! Every encoded value becomes one [`ToneSegment`]: a pure sine at a
//! frequency that is a deterministic function of the value, held for the
//! session's fixed tone duration. Two frequency rules exist, both
//! instances of the same value→frequency contract; an encode/decode pair
//! must use the same one.
//!
//! Sine samples come from `det_sincos()` with an accumulated phase
//! wrapped to [0, 2π), so the same input produces bit-identical PCM on
//! every platform. Phase resets at each tone boundary.

use std::f64::consts::PI;

use crate::audio::PcmBuffer;
use crate::det_math::det_sin;
use crate::error::CodecError;
use crate::opcode::InstructionTable;
use crate::progress::Progress;

/// Default tone duration per value: 100 ms.
pub const DEFAULT_TONE_SECS: f64 = 0.1;

/// Default output sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Base frequency of the token-octave rule (A4).
pub const BASE_FREQUENCY_HZ: f64 = 440.0;

/// Hz per byte value in the byte-scale rule.
pub const HZ_PER_BYTE: f64 = 10.0;

/// One tone of the planned signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSegment {
    pub frequency_hz: f64,
    pub duration_secs: f64,
}

/// Value→frequency rule for one encode/decode pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyScheme {
    /// `frequency = byte × 10 Hz`. Every byte value 0–255 is encodable.
    ByteScale,
    /// `frequency = 440 Hz × 2^(token length)`. Values are instruction
    /// tokens from the mapping table; the octave index is the token's
    /// character length.
    TokenOctave,
}

/// Synthesis parameters, fixed per encoding session.
#[derive(Debug, Clone, Copy)]
pub struct ToneConfig {
    pub sample_rate: u32,
    pub tone_secs: f64,
    pub scheme: FrequencyScheme,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tone_secs: DEFAULT_TONE_SECS,
            scheme: FrequencyScheme::ByteScale,
        }
    }
}

impl FrequencyScheme {
    /// Frequency for a byte value.
    ///
    /// # Errors
    /// [`CodecError::MalformedPayload`] under the token-octave rule for a
    /// byte with no payload entry in the table.
    pub fn frequency_for_byte(
        &self,
        byte: u8,
        table: &InstructionTable,
    ) -> Result<f64, CodecError> {
        match self {
            Self::ByteScale => Ok(byte as f64 * HZ_PER_BYTE),
            Self::TokenOctave => {
                let entry = table.by_byte(byte)?.ok_or(CodecError::MalformedPayload)?;
                Ok(BASE_FREQUENCY_HZ * (1u64 << entry.token.len()) as f64)
            }
        }
    }
}

/// Plan one tone per byte value.
pub fn plan_bytes(
    values: &[u8],
    cfg: &ToneConfig,
    table: &InstructionTable,
) -> Result<Vec<ToneSegment>, CodecError> {
    values
        .iter()
        .map(|&v| {
            Ok(ToneSegment {
                frequency_hz: cfg.scheme.frequency_for_byte(v, table)?,
                duration_secs: cfg.tone_secs,
            })
        })
        .collect()
}

/// Plan tones for an instruction stream.
///
/// Under the byte-scale rule each character becomes one tone at its byte
/// value × 10 Hz. Under the token-octave rule the stream is tokenized
/// greedily (longest table token first) and each token becomes one tone.
///
/// # Errors
/// [`CodecError::MalformedPayload`] if the stream is not valid UTF-8-
/// single-byte instruction text or cannot be tokenized against the table.
pub fn plan_instructions(
    stream: &str,
    cfg: &ToneConfig,
    table: &InstructionTable,
) -> Result<Vec<ToneSegment>, CodecError> {
    match cfg.scheme {
        FrequencyScheme::ByteScale => {
            if !stream.is_ascii() {
                return Err(CodecError::MalformedPayload);
            }
            Ok(stream
                .bytes()
                .map(|b| ToneSegment {
                    frequency_hz: b as f64 * HZ_PER_BYTE,
                    duration_secs: cfg.tone_secs,
                })
                .collect())
        }
        FrequencyScheme::TokenOctave => {
            let tokens = tokenize(stream, table)?;
            tokens
                .iter()
                .map(|t| {
                    Ok(ToneSegment {
                        frequency_hz: BASE_FREQUENCY_HZ * (1u64 << t.len()) as f64,
                        duration_secs: cfg.tone_secs,
                    })
                })
                .collect()
        }
    }
}

/// Greedy longest-match tokenization of an instruction stream against
/// the table's payload tokens.
fn tokenize<'t>(
    stream: &str,
    table: &'t InstructionTable,
) -> Result<Vec<&'t str>, CodecError> {
    let mut tokens = Vec::new();
    let mut rest = stream;
    while !rest.is_empty() {
        let best = table
            .entries()
            .iter()
            .filter(|e| e.is_payload() && rest.starts_with(e.token))
            .max_by_key(|e| e.token.len())
            .ok_or(CodecError::MalformedPayload)?;
        tokens.push(best.token);
        rest = &rest[best.token.len()..];
    }
    Ok(tokens)
}

/// Synthesize the planned tones into a mono PCM buffer.
///
/// Each segment contributes `round(sample_rate × duration)` samples of a
/// unit-amplitude sine, appended contiguously. Cancellation is honored at
/// tone boundaries; on cancellation the partial buffer is discarded.
///
/// # Errors
/// - [`CodecError::ToneOutOfRange`] if a segment's frequency is at or
///   above the Nyquist limit.
/// - [`CodecError::Cancelled`] if the caller aborted the session.
pub fn synthesize(
    segments: &[ToneSegment],
    sample_rate: u32,
    progress: &Progress,
) -> Result<PcmBuffer, CodecError> {
    let nyquist = sample_rate as f64 / 2.0;
    for seg in segments {
        if seg.frequency_hz >= nyquist {
            return Err(CodecError::ToneOutOfRange {
                frequency_hz: seg.frequency_hz,
                nyquist_hz: nyquist,
            });
        }
    }

    let mut samples = Vec::new();
    progress.init(segments.len() as u32);
    for seg in segments {
        progress.check_cancelled()?;
        let count = (sample_rate as f64 * seg.duration_secs).round() as usize;
        samples.reserve(count);
        let step = 2.0 * PI * seg.frequency_hz / sample_rate as f64;
        let mut phase = 0.0f64;
        for _ in 0..count {
            samples.push(det_sin(phase) as f32);
            phase += step;
            if phase >= 2.0 * PI {
                phase -= 2.0 * PI;
            }
        }
        progress.advance();
    }
    progress.finish();

    Ok(PcmBuffer { samples, sample_rate, channels: 1 })
}
