// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Hide a message in visible text and recover it.
//!
//! Usage: `cargo run --example hide_in_text -- "visible text" "secret"`

use murmur_core::text::{decode, encode};
use murmur_core::EmbedScheme;

fn main() {
    let mut args = std::env::args().skip(1);
    let visible = args.next().unwrap_or_else(|| "Hello, World!".to_string());
    let hidden = args.next().unwrap_or_else(|| "Hi".to_string());

    let carrier = encode(&visible, hidden.as_bytes(), EmbedScheme::TwoBit);
    println!("carrier ({} chars, looks like {} chars):", carrier.chars().count(), visible.chars().count());
    println!("{carrier}");

    let decoded = decode(&carrier).expect("round trip");
    println!("visible: {}", decoded.visible);
    println!("hidden:  {}", String::from_utf8_lossy(&decoded.hidden));
}
