// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! The note→instruction mapping table shared by the MIDI and audio
//! channels.
//!
//! A static bijective table keyed by MIDI note number 0–127. Each entry
//! carries a short opcode token (the payload vocabulary is externally
//! interpretable as Brainfuck instructions) and a redundant raw byte
//! value. Notes without a rule resolve to the reserved `"nop"` entry,
//! which carries no payload information and is skipped on decode.
//!
//! The table is process-wide read-only state: constructed once behind
//! [`InstructionTable::global`] and injected by reference everywhere it
//! is needed. Reverse lookups come in a strict flavor that surfaces
//! [`CodecError::AmbiguousMapping`] when more than one entry matches, and
//! a first-table-order flavor mirroring the legacy decoder.

use std::sync::OnceLock;

use crate::error::CodecError;

/// Classification of a mapped token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Payload-bearing opcode.
    Brainfuck,
    /// Reserved no-op; contributes nothing to a decoded stream.
    Reserved,
}

/// One rule of the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeEntry {
    /// MIDI note number, 0–127.
    pub note: u8,
    /// Opcode token.
    pub token: &'static str,
    /// Raw byte value, redundant with the token.
    pub byte: u8,
    pub kind: TokenKind,
}

impl OpcodeEntry {
    /// Whether this entry carries payload.
    pub fn is_payload(&self) -> bool {
        self.kind == TokenKind::Brainfuck
    }
}

/// The reserved no-op entry returned for unmapped notes.
pub static NOP: OpcodeEntry = OpcodeEntry {
    note: 0,
    token: "nop",
    byte: 0,
    kind: TokenKind::Reserved,
};

/// Built-in rules. Single-character opcodes sit on one octave of the C
/// major scale, compound patterns on the next; middle C itself is the
/// in-table no-op. Byte values for single-character tokens are their
/// ASCII codes; compound tokens take values past the ASCII range.
const RULES: &[OpcodeEntry] = &[
    OpcodeEntry { note: 60, token: "nop", byte: 0, kind: TokenKind::Reserved },
    OpcodeEntry { note: 62, token: "+", byte: 43, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 64, token: "-", byte: 45, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 65, token: ">", byte: 62, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 67, token: "<", byte: 60, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 69, token: ".", byte: 46, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 71, token: ",", byte: 44, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 72, token: "[", byte: 91, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 74, token: "]", byte: 93, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 76, token: ">.", byte: 128, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 77, token: "[-]", byte: 129, kind: TokenKind::Brainfuck },
    OpcodeEntry { note: 79, token: "[->+<]", byte: 130, kind: TokenKind::Brainfuck },
];

/// The note→instruction mapping table.
#[derive(Debug)]
pub struct InstructionTable {
    entries: Vec<OpcodeEntry>,
}

impl InstructionTable {
    /// Build a table from explicit rules, validating that note numbers and
    /// tokens are each unique. Byte values and token lengths are allowed
    /// to collide — those collisions surface lazily as
    /// [`CodecError::AmbiguousMapping`] from the strict reverse lookups.
    pub fn new(entries: Vec<OpcodeEntry>) -> Result<Self, CodecError> {
        for (i, a) in entries.iter().enumerate() {
            if a.note > 127 {
                return Err(CodecError::MalformedPayload);
            }
            for b in &entries[..i] {
                if a.note == b.note {
                    return Err(CodecError::AmbiguousMapping { key: "note", value: a.note as u32 });
                }
                if a.token == b.token {
                    return Err(CodecError::AmbiguousMapping { key: "token", value: a.note as u32 });
                }
            }
        }
        Ok(Self { entries })
    }

    /// The process-wide table with the built-in rules.
    pub fn global() -> &'static InstructionTable {
        static TABLE: OnceLock<InstructionTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            InstructionTable::new(RULES.to_vec()).expect("built-in mapping table is valid")
        })
    }

    /// All rules in table order.
    pub fn entries(&self) -> &[OpcodeEntry] {
        &self.entries
    }

    /// Look up a note number. Unmapped notes resolve to the reserved
    /// no-op entry.
    pub fn by_note(&self, note: u8) -> &OpcodeEntry {
        self.entries.iter().find(|e| e.note == note).unwrap_or(&NOP)
    }

    /// Reverse lookup by token. Tokens are unique by construction.
    pub fn by_token(&self, token: &str) -> Option<&OpcodeEntry> {
        self.entries.iter().find(|e| e.token == token)
    }

    /// Strict reverse lookup by byte value over payload-bearing entries.
    ///
    /// # Errors
    /// [`CodecError::AmbiguousMapping`] if more than one payload entry
    /// claims the byte value.
    pub fn by_byte(&self, byte: u8) -> Result<Option<&OpcodeEntry>, CodecError> {
        let mut matches = self.entries.iter().filter(|e| e.is_payload() && e.byte == byte);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(CodecError::AmbiguousMapping { key: "byte", value: byte as u32 });
        }
        Ok(first)
    }

    /// Strict reverse lookup by token length over payload-bearing entries.
    ///
    /// # Errors
    /// [`CodecError::AmbiguousMapping`] if more than one payload entry has
    /// a token of that length.
    pub fn by_token_len(&self, len: usize) -> Result<Option<&OpcodeEntry>, CodecError> {
        let mut matches = self.entries.iter().filter(|e| e.is_payload() && e.token.len() == len);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(CodecError::AmbiguousMapping { key: "token length", value: len as u32 });
        }
        Ok(first)
    }

    /// First-table-order reverse lookup by token length, mirroring the
    /// legacy decoder's behavior when the length is ambiguous.
    pub fn first_by_token_len(&self, len: usize) -> Option<&OpcodeEntry> {
        self.entries.iter().find(|e| e.is_payload() && e.token.len() == len)
    }
}
