// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Audio signal channel: payload values as pure tones.
//!
//! Encode: values → tone plan → PCM sine synthesis → WAV container.
//! Decode: WAV container → PCM → windowed dominant-frequency analysis →
//! values. The round trip is exact only on the unmodified samples with
//! matching sample rate, tone duration, and spectral resolution; see
//! [`analyze`] for the contract.

pub mod analyze;
pub mod spectrum;
pub mod synth;
pub mod wav;

pub use analyze::{analyze_bytes, analyze_instructions, AnalyzerConfig, SpectralResolution};
pub use synth::{
    plan_bytes, plan_instructions, synthesize, FrequencyScheme, ToneConfig, ToneSegment,
};
pub use wav::WavError;

use crate::error::CodecError;
use crate::opcode::InstructionTable;
use crate::progress::Progress;

/// A fully materialized mono PCM signal.
///
/// Samples are normalized to [-1, 1]; quantization to 16-bit happens at
/// the WAV boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmBuffer {
    /// Signal length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Encode byte values into a complete WAV file.
pub fn encode_to_wav(
    values: &[u8],
    cfg: &ToneConfig,
    table: &InstructionTable,
) -> Result<Vec<u8>, CodecError> {
    let plan = plan_bytes(values, cfg, table)?;
    let buffer = synthesize(&plan, cfg.sample_rate, &Progress::new())?;
    Ok(wav::serialize(&buffer))
}

/// Decode byte values from a WAV file.
pub fn decode_from_wav(
    data: &[u8],
    cfg: &AnalyzerConfig,
    table: &InstructionTable,
) -> Result<Vec<u8>, CodecError> {
    let buffer = wav::parse(data)?;
    analyze_bytes(&buffer, cfg, table, &Progress::new())
}

/// Encode an instruction stream into a complete WAV file.
pub fn encode_instructions_to_wav(
    stream: &str,
    cfg: &ToneConfig,
    table: &InstructionTable,
) -> Result<Vec<u8>, CodecError> {
    let plan = plan_instructions(stream, cfg, table)?;
    let buffer = synthesize(&plan, cfg.sample_rate, &Progress::new())?;
    Ok(wav::serialize(&buffer))
}

/// Decode an instruction stream from a WAV file.
pub fn decode_instructions_from_wav(
    data: &[u8],
    cfg: &AnalyzerConfig,
    table: &InstructionTable,
) -> Result<String, CodecError> {
    let buffer = wav::parse(data)?;
    analyze_instructions(&buffer, cfg, table, &Progress::new())
}
