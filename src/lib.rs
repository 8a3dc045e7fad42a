// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! # murmur-core
//!
//! Pure-Rust multi-channel steganography codec. Hides an arbitrary byte
//! payload inside an innocuous carrier and recovers it exactly, over
//! three independent channels that share one design idea — map payload
//! bits to carrier symbols, and back:
//!
//! - **Text** (`text` module): payload bits as invisible zero-width
//!   Unicode code points interleaved into visible text, or wrapped in
//!   boundary markers and spliced at the text's midpoint.
//! - **Audio** (`audio` module): payload bytes as short pure tones,
//!   synthesized to PCM, serialized as an uncompressed WAV container,
//!   and recovered by dominant-frequency spectral analysis.
//! - **MIDI** (`midi` module): note numbers as opcodes in a fixed
//!   note→instruction table, reassembled in onset-time order into an
//!   instruction stream.
//!
//! All channels are synchronous transformations over fully materialized
//! in-memory buffers. The shared instruction table (`opcode` module) is
//! process-wide read-only state. Trigonometry goes through the
//! deterministic kernels in `det_math`, so encode and decode produce
//! bit-identical signals across platforms.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use murmur_core::{text, EmbedScheme};
//!
//! let carrier = text::encode("Hello, World!", b"Hi", EmbedScheme::OneBit);
//! let decoded = text::decode(&carrier).unwrap();
//! assert_eq!(decoded.hidden, b"Hi");
//! assert_eq!(decoded.visible, "Hello, World!");
//! ```

pub mod audio;
pub mod bits;
pub mod det_math;
pub mod error;
pub mod midi;
pub mod opcode;
pub mod progress;
pub mod session;
pub mod text;

pub use error::CodecError;

pub use audio::{
    decode_from_wav, encode_to_wav, AnalyzerConfig, FrequencyScheme, PcmBuffer,
    SpectralResolution, ToneConfig, WavError,
};
pub use bits::{from_bits, to_bits, BitSeq};
pub use midi::{
    compile as midi_compile, compile_chunked as midi_compile_chunked, parse as midi_parse,
    MidiError, ParsedMidi,
};
pub use opcode::{InstructionTable, OpcodeEntry, TokenKind};
pub use progress::Progress;
pub use session::{ChannelState, Session};
pub use text::{decode as text_decode, encode as text_encode, Decoded, EmbedScheme};
