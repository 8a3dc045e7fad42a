// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Canonical uncompressed PCM WAV container writer and reader.
//!
//! Layout written (44-byte header, little-endian):
//!
//! ```text
//! [4] "RIFF"   [4] 36 + data_len   [4] "WAVE"
//! [4] "fmt "   [4] 16              [2] format tag 1 (PCM)
//! [2] channels [4] sample rate     [4] byte rate
//! [2] block align                  [2] 16 bits per sample
//! [4] "data"   [4] data_len        [data_len] i16 samples
//! ```
//!
//! Samples are clipped to [-1, 1] before scaling: values ≥ 0 scale by
//! 32767, values < 0 by 32768, the standard full-scale conversion. The
//! reader accepts any subchunk order, skips unknown subchunks (with RIFF
//! word padding), and is strict about everything the codec depends on:
//! PCM format tag, 16-bit depth, mono.

use std::fmt;

use crate::audio::PcmBuffer;

/// Errors that can occur while parsing a WAV container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WavError {
    /// Input data is too short or truncated.
    UnexpectedEof,
    /// Missing `RIFF` tag at start of data.
    MissingRiffTag,
    /// Missing `WAVE` form type.
    MissingWaveTag,
    /// No `fmt ` subchunk before the `data` subchunk.
    MissingFmtChunk,
    /// No `data` subchunk.
    MissingDataChunk,
    /// Compression or a non-PCM format tag.
    UnsupportedFormat(u16),
    /// Bit depth other than 16.
    UnsupportedBitDepth(u16),
    /// Channel count other than 1.
    UnsupportedChannelCount(u16),
}

impl fmt::Display for WavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of WAV data"),
            Self::MissingRiffTag => write!(f, "missing RIFF tag (not a WAV file)"),
            Self::MissingWaveTag => write!(f, "missing WAVE form type"),
            Self::MissingFmtChunk => write!(f, "missing fmt subchunk"),
            Self::MissingDataChunk => write!(f, "missing data subchunk"),
            Self::UnsupportedFormat(tag) => write!(f, "unsupported WAV format tag: {tag}"),
            Self::UnsupportedBitDepth(bits) => write!(f, "unsupported bit depth: {bits}"),
            Self::UnsupportedChannelCount(n) => write!(f, "unsupported channel count: {n}"),
        }
    }
}

impl std::error::Error for WavError {}

pub type Result<T> = std::result::Result<T, WavError>;

/// Serialize a PCM buffer as an uncompressed 16-bit WAV file.
pub fn serialize(buffer: &PcmBuffer) -> Vec<u8> {
    let channels = buffer.channels.max(1);
    let data_len = buffer.samples.len() * 2;
    let byte_rate = buffer.sample_rate * channels as u32 * 2;
    let block_align = channels * 2;

    let mut out = Vec::with_capacity(44 + data_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM format tag
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    for &sample in &buffer.samples {
        out.extend_from_slice(&quantize(sample).to_le_bytes());
    }
    out
}

/// Clip to [-1, 1] and scale to the signed 16-bit range.
fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Inverse of [`quantize`], up to quantization loss.
fn dequantize(value: i16) -> f32 {
    if value < 0 {
        value as f32 / 32768.0
    } else {
        value as f32 / 32767.0
    }
}

/// Parse an uncompressed 16-bit mono PCM WAV file.
pub fn parse(data: &[u8]) -> Result<PcmBuffer> {
    if data.len() < 12 {
        return Err(WavError::UnexpectedEof);
    }
    if &data[0..4] != b"RIFF" {
        return Err(WavError::MissingRiffTag);
    }
    if &data[8..12] != b"WAVE" {
        return Err(WavError::MissingWaveTag);
    }

    let mut pos = 12usize;
    let mut format: Option<(u16, u16, u32, u16)> = None; // tag, channels, rate, bits
    let mut pcm_data: Option<&[u8]> = None;

    while pos + 8 <= data.len() {
        let id = &data[pos..pos + 4];
        let size = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
            as usize;
        pos += 8;
        if pos + size > data.len() {
            return Err(WavError::UnexpectedEof);
        }
        let body = &data[pos..pos + size];
        match id {
            b"fmt " => {
                if size < 16 {
                    return Err(WavError::UnexpectedEof);
                }
                let tag = u16::from_le_bytes([body[0], body[1]]);
                let channels = u16::from_le_bytes([body[2], body[3]]);
                let rate = u32::from_le_bytes([body[4], body[5], body[6], body[7]]);
                let bits = u16::from_le_bytes([body[14], body[15]]);
                format = Some((tag, channels, rate, bits));
            }
            b"data" => {
                pcm_data = Some(body);
            }
            _ => {}
        }
        // RIFF subchunks are word-aligned; odd sizes carry a pad byte.
        pos += size + (size & 1);
    }

    let (tag, channels, rate, bits) = format.ok_or(WavError::MissingFmtChunk)?;
    if tag != 1 {
        return Err(WavError::UnsupportedFormat(tag));
    }
    if bits != 16 {
        return Err(WavError::UnsupportedBitDepth(bits));
    }
    if channels != 1 {
        return Err(WavError::UnsupportedChannelCount(channels));
    }
    let pcm = pcm_data.ok_or(WavError::MissingDataChunk)?;

    let samples = pcm
        .chunks_exact(2)
        .map(|pair| dequantize(i16::from_le_bytes([pair[0], pair[1]])))
        .collect();

    Ok(PcmBuffer { samples, sample_rate: rate, channels })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(samples: Vec<f32>) -> PcmBuffer {
        PcmBuffer { samples, sample_rate: 44_100, channels: 1 }
    }

    #[test]
    fn header_layout() {
        let wav = serialize(&buffer(vec![0.0; 10]));
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36 + 20);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes([wav[16], wav[17], wav[18], wav[19]]), 16);
        assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 1); // PCM
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1); // mono
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 44_100);
        assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 88_200);
        assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 2); // block align
        assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16); // bit depth
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 20);
    }

    #[test]
    fn file_size_is_44_plus_2n() {
        for n in [0usize, 1, 7, 4410] {
            let wav = serialize(&buffer(vec![0.25; n]));
            assert_eq!(wav.len(), 44 + 2 * n);
        }
    }

    #[test]
    fn full_scale_quantization() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(0.0), 0);
        // Clipping.
        assert_eq!(quantize(1.5), 32767);
        assert_eq!(quantize(-2.0), -32768);
    }

    #[test]
    fn sample_roundtrip_within_quantization() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0, 0.123, -0.987];
        let wav = serialize(&buffer(samples.clone()));
        let parsed = parse(&wav).unwrap();
        assert_eq!(parsed.sample_rate, 44_100);
        assert_eq!(parsed.samples.len(), samples.len());
        for (a, b) in samples.iter().zip(parsed.samples.iter()) {
            assert!((a - b).abs() < 1.0 / 32000.0, "{a} vs {b}");
        }
    }

    #[test]
    fn parse_skips_unknown_subchunks() {
        let mut wav = serialize(&buffer(vec![0.5; 4]));
        // Splice a LIST subchunk with an odd size between fmt and data.
        let mut spliced = wav[..36].to_vec();
        spliced.extend_from_slice(b"LIST");
        spliced.extend_from_slice(&3u32.to_le_bytes());
        spliced.extend_from_slice(b"abc\0"); // 3 bytes + pad
        spliced.extend_from_slice(&wav[36..]);
        // Fix the RIFF size.
        let riff_size = (spliced.len() - 8) as u32;
        spliced[4..8].copy_from_slice(&riff_size.to_le_bytes());
        wav = spliced;
        let parsed = parse(&wav).unwrap();
        assert_eq!(parsed.samples.len(), 4);
    }

    #[test]
    fn rejects_non_wav_data() {
        assert_eq!(parse(b"OggS").unwrap_err(), WavError::UnexpectedEof);
        assert_eq!(parse(&[0u8; 16]).unwrap_err(), WavError::MissingRiffTag);
        let mut wav = serialize(&buffer(vec![0.0; 2]));
        wav[8..12].copy_from_slice(b"AVI ");
        assert_eq!(parse(&wav).unwrap_err(), WavError::MissingWaveTag);
    }

    #[test]
    fn rejects_unsupported_formats() {
        let mut wav = serialize(&buffer(vec![0.0; 2]));
        wav[20..22].copy_from_slice(&3u16.to_le_bytes()); // IEEE float tag
        assert_eq!(parse(&wav).unwrap_err(), WavError::UnsupportedFormat(3));

        let mut wav = serialize(&buffer(vec![0.0; 2]));
        wav[34..36].copy_from_slice(&8u16.to_le_bytes());
        assert_eq!(parse(&wav).unwrap_err(), WavError::UnsupportedBitDepth(8));

        let mut wav = serialize(&buffer(vec![0.0; 2]));
        wav[22..24].copy_from_slice(&2u16.to_le_bytes());
        assert_eq!(parse(&wav).unwrap_err(), WavError::UnsupportedChannelCount(2));
    }

    #[test]
    fn truncated_data_chunk_is_eof() {
        let wav = serialize(&buffer(vec![0.0; 8]));
        assert_eq!(parse(&wav[..50]).unwrap_err(), WavError::UnexpectedEof);
    }
}
