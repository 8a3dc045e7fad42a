// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Spectral recovery of encoded values from a PCM buffer.
//!
//! The buffer is partitioned into fixed-duration windows matching the
//! known per-value tone duration. Each window's dominant frequency bin
//! is converted back through the active frequency rule.
//!
//! Recovery is exact only when encode and decode agree on sample rate,
//! tone duration, and spectral resolution, and the samples made a
//! lossless digital round trip. With [`SpectralResolution::WholeWindow`]
//! and the byte-scale rule at the default 100 ms, every encodable
//! frequency falls on an exact bin center (bin width = 1 / duration =
//! 10 Hz), so the round trip recovers every byte. A fixed resolution
//! (e.g. the 2048-point transform of the interactive decoder) quantizes
//! frequencies to coarser bins and only suits widely spaced rules like
//! the token-octave scheme.

use crate::audio::spectrum::{bin_frequency, dominant_bin, SpectrumPlan};
use crate::audio::synth::{FrequencyScheme, BASE_FREQUENCY_HZ, HZ_PER_BYTE};
use crate::audio::PcmBuffer;
use crate::error::CodecError;
use crate::opcode::InstructionTable;
use crate::progress::Progress;

/// Spectral resolution of the analysis pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralResolution {
    /// Transform each whole tone window (arbitrary length via the
    /// chirp-z path). Bin width is `1 / tone_secs`.
    WholeWindow,
    /// Fixed-size transform over the window's leading samples,
    /// zero-padded if short. Bin width is `sample_rate / n`.
    Fixed(usize),
}

/// Analysis parameters; must match the encoding session.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    pub tone_secs: f64,
    pub scheme: FrequencyScheme,
    pub resolution: SpectralResolution,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            tone_secs: crate::audio::synth::DEFAULT_TONE_SECS,
            scheme: FrequencyScheme::ByteScale,
            resolution: SpectralResolution::WholeWindow,
        }
    }
}

/// Recover one byte value per tone window.
///
/// Under the byte-scale rule the byte is the nearest multiple of 10 Hz;
/// under the token-octave rule the octave index selects a table entry by
/// token length (first table-order match, as the legacy decoder) and its
/// byte value is returned.
///
/// # Errors
/// - [`CodecError::MalformedPayload`] if the buffer does not divide into
///   whole tone windows, or a recovered frequency maps outside the rule.
/// - [`CodecError::Cancelled`] if the caller aborted the session.
pub fn analyze_bytes(
    buffer: &PcmBuffer,
    cfg: &AnalyzerConfig,
    table: &InstructionTable,
    progress: &Progress,
) -> Result<Vec<u8>, CodecError> {
    let mut values = Vec::new();
    for freq in window_frequencies(buffer, cfg, progress)? {
        let freq = freq?;
        values.push(byte_for_frequency(freq, cfg.scheme, table)?);
    }
    progress.finish();
    Ok(values)
}

/// Recover the instruction stream from a PCM buffer.
///
/// Byte-scale: each window yields one character. Token-octave: each
/// window yields one whole token.
pub fn analyze_instructions(
    buffer: &PcmBuffer,
    cfg: &AnalyzerConfig,
    table: &InstructionTable,
    progress: &Progress,
) -> Result<String, CodecError> {
    let mut stream = String::new();
    for freq in window_frequencies(buffer, cfg, progress)? {
        let freq = freq?;
        match cfg.scheme {
            FrequencyScheme::ByteScale => {
                let byte = byte_for_frequency(freq, FrequencyScheme::ByteScale, table)?;
                if !byte.is_ascii() {
                    return Err(CodecError::MalformedPayload);
                }
                stream.push(byte as char);
            }
            FrequencyScheme::TokenOctave => {
                stream.push_str(token_for_frequency(freq, table)?);
            }
        }
    }
    progress.finish();
    Ok(stream)
}

/// Iterate the dominant frequency of each tone window.
fn window_frequencies<'a>(
    buffer: &'a PcmBuffer,
    cfg: &AnalyzerConfig,
    progress: &'a Progress,
) -> Result<impl Iterator<Item = Result<f64, CodecError>> + 'a, CodecError> {
    let window = (buffer.sample_rate as f64 * cfg.tone_secs).round() as usize;
    if window == 0 {
        return Err(CodecError::MalformedPayload);
    }
    // A trailing partial window cannot carry a whole value.
    if buffer.samples.len() % window != 0 {
        return Err(CodecError::MalformedPayload);
    }

    let fft_len = match cfg.resolution {
        SpectralResolution::WholeWindow => window,
        SpectralResolution::Fixed(n) => n,
    };
    let plan = SpectrumPlan::new(fft_len);
    let sample_rate = buffer.sample_rate;

    progress.init((buffer.samples.len() / window) as u32);
    Ok(buffer.samples.chunks(window).map(move |chunk| {
        progress.check_cancelled()?;
        let slice = if chunk.len() > plan.fft_len() { &chunk[..plan.fft_len()] } else { chunk };
        let power = plan.power_spectrum(slice);
        let bin = dominant_bin(&power);
        progress.advance();
        Ok(bin_frequency(bin, sample_rate, plan.fft_len()))
    }))
}

/// Invert the byte-scale or token-octave rule for one frequency.
fn byte_for_frequency(
    freq: f64,
    scheme: FrequencyScheme,
    table: &InstructionTable,
) -> Result<u8, CodecError> {
    match scheme {
        FrequencyScheme::ByteScale => {
            let value = (freq / HZ_PER_BYTE).round();
            if !(0.0..=255.0).contains(&value) {
                return Err(CodecError::MalformedPayload);
            }
            Ok(value as u8)
        }
        FrequencyScheme::TokenOctave => {
            Ok(entry_for_octave(freq, table)?.byte)
        }
    }
}

fn token_for_frequency<'t>(
    freq: f64,
    table: &'t InstructionTable,
) -> Result<&'t str, CodecError> {
    Ok(entry_for_octave(freq, table)?.token)
}

/// Octave index = round(log2(freq / 440)); the table entry is selected
/// by token length, first table-order match on ambiguity.
fn entry_for_octave<'t>(
    freq: f64,
    table: &'t InstructionTable,
) -> Result<&'t crate::opcode::OpcodeEntry, CodecError> {
    if freq <= 0.0 {
        return Err(CodecError::MalformedPayload);
    }
    let index = (freq / BASE_FREQUENCY_HZ).log2().round();
    if index < 1.0 {
        return Err(CodecError::MalformedPayload);
    }
    table
        .first_by_token_len(index as usize)
        .ok_or(CodecError::MalformedPayload)
}
