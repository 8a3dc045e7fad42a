// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Encode a message as a tone sequence WAV file, then decode it back.
//!
//! Usage: `cargo run --example tones_to_wav -- "message" out.wav`

use murmur_core::audio::{decode_from_wav, encode_to_wav, AnalyzerConfig, ToneConfig};
use murmur_core::InstructionTable;

fn main() {
    let mut args = std::env::args().skip(1);
    let message = args.next().unwrap_or_else(|| "hidden in plain sound".to_string());
    let path = args.next().unwrap_or_else(|| "encoded.wav".to_string());

    let table = InstructionTable::global();
    let wav = encode_to_wav(message.as_bytes(), &ToneConfig::default(), table)
        .expect("encode");
    std::fs::write(&path, &wav).expect("write WAV");
    println!("wrote {} bytes to {path}", wav.len());

    let recovered = decode_from_wav(&wav, &AnalyzerConfig::default(), table).expect("decode");
    println!("recovered: {}", String::from_utf8_lossy(&recovered));
}
