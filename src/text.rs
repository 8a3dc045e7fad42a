// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Text carrier channel: payload bits as zero-width Unicode code points
//! woven into visible text.
//!
//! Three embedding strategies share the capability "embed N bits per
//! visible-carrier unit", selected by [`EmbedScheme`]:
//!
//! - [`EmbedScheme::OneBit`] — one marker per visible character, alphabet
//!   of two zero-width characters (U+200B = 0, U+200C = 1).
//! - [`EmbedScheme::TwoBit`] — one marker per visible character, alphabet
//!   of four zero-width characters carrying two bits each.
//! - [`EmbedScheme::Boundary`] — the whole hidden segment is rendered as
//!   space-grouped octets, mapped to zero-width characters, wrapped in a
//!   reserved boundary character (U+FEFF) and spliced into the visible
//!   text at its midpoint.
//!
//! In every strategy, markers left over after the visible text is
//! exhausted are appended after the last visible character. Decoding
//! strips markers back out of the visible text; the reserved boundary
//! character must appear exactly twice or not at all.

use crate::bits::BitSeq;
use crate::error::CodecError;

/// Zero-width space — binary 0 (one-bit alphabet), dibit 00 (two-bit).
const ZERO_WIDTH_SPACE: char = '\u{200B}';
/// Zero-width non-joiner — binary 1 (one-bit alphabet), dibit 01 (two-bit).
const ZERO_WIDTH_NON_JOINER: char = '\u{200C}';
/// Zero-width joiner — dibit 10 (two-bit alphabet only).
const ZERO_WIDTH_JOINER: char = '\u{200D}';
/// Word joiner — dibit 11 (two-bit alphabet), octet separator (boundary mode).
const WORD_JOINER: char = '\u{2060}';
/// Zero-width no-break space — reserved boundary marker, never a bit carrier.
const BOUNDARY: char = '\u{FEFF}';

/// Strategy for embedding payload bits into visible text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedScheme {
    /// One bit per marker, two-symbol alphabet.
    OneBit,
    /// Two bits per marker, four-symbol alphabet.
    TwoBit,
    /// Whole hidden segment wrapped in boundary markers and spliced at the
    /// visible midpoint. Uses the one-bit alphabet plus the word joiner as
    /// octet separator.
    Boundary,
}

/// Result of decoding a text carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The visible text with all marker characters removed.
    pub visible: String,
    /// The recovered hidden payload bytes.
    pub hidden: Vec<u8>,
}

/// Embed `hidden` into `visible` using the given strategy.
pub fn encode(visible: &str, hidden: &[u8], scheme: EmbedScheme) -> String {
    match scheme {
        EmbedScheme::OneBit => interleave(visible, hidden, 1),
        EmbedScheme::TwoBit => interleave(visible, hidden, 2),
        EmbedScheme::Boundary => boundary_splice(visible, hidden),
    }
}

/// Interleave one marker per visible character, `bits_per_marker` ∈ {1, 2}.
/// Leftover markers are appended after the last visible character.
fn interleave(visible: &str, hidden: &[u8], bits_per_marker: usize) -> String {
    let seq = BitSeq::from_bytes(hidden);
    let mut groups = seq.digits().chunks(bits_per_marker);
    let mut out = String::with_capacity(visible.len() + seq.len());

    for ch in visible.chars() {
        out.push(ch);
        if let Some(group) = groups.next() {
            out.push(marker_for(group));
        }
    }
    for group in groups {
        out.push(marker_for(group));
    }
    out
}

/// Marker character for a 1- or 2-bit group.
fn marker_for(group: &[u8]) -> char {
    match group {
        [0] | [0, 0] => ZERO_WIDTH_SPACE,
        [1] | [0, 1] => ZERO_WIDTH_NON_JOINER,
        [1, 0] => ZERO_WIDTH_JOINER,
        [1, 1] => WORD_JOINER,
        _ => unreachable!("bit groups are 1 or 2 digits"),
    }
}

/// Render the hidden payload as boundary-wrapped markers and splice the
/// segment into `visible` at its midpoint (character count rounded to
/// nearest).
fn boundary_splice(visible: &str, hidden: &[u8]) -> String {
    let grouped = BitSeq::from_bytes(hidden).render_grouped();
    let mut segment = String::with_capacity(grouped.len() + 2);
    segment.push(BOUNDARY);
    for ch in grouped.chars() {
        segment.push(match ch {
            ' ' => WORD_JOINER,
            '0' => ZERO_WIDTH_SPACE,
            _ => ZERO_WIDTH_NON_JOINER,
        });
    }
    segment.push(BOUNDARY);

    let chars: Vec<char> = visible.chars().collect();
    let half = (chars.len() as f64 / 2.0).round() as usize;
    let mut out = String::with_capacity(visible.len() + segment.len());
    out.extend(&chars[..half]);
    out.push_str(&segment);
    out.extend(&chars[half..]);
    out
}

/// Identify the embedding strategy present in `encoded`.
///
/// # Errors
/// - [`CodecError::MalformedPayload`] if the boundary marker appears a
///   number of times other than 0 or 2.
/// - [`CodecError::UnsupportedCarrier`] if no marker character is present
///   at all.
pub fn detect(encoded: &str) -> Result<EmbedScheme, CodecError> {
    let boundaries = encoded.chars().filter(|&c| c == BOUNDARY).count();
    match boundaries {
        2 => return Ok(EmbedScheme::Boundary),
        0 => {}
        _ => return Err(CodecError::MalformedPayload),
    }
    let mut saw_one_bit = false;
    for ch in encoded.chars() {
        match ch {
            ZERO_WIDTH_JOINER | WORD_JOINER => return Ok(EmbedScheme::TwoBit),
            ZERO_WIDTH_SPACE | ZERO_WIDTH_NON_JOINER => saw_one_bit = true,
            _ => {}
        }
    }
    if saw_one_bit {
        Ok(EmbedScheme::OneBit)
    } else {
        Err(CodecError::UnsupportedCarrier)
    }
}

/// Decode a text carrier, auto-detecting the embedding strategy.
///
/// A carrier with no markers at all decodes to an empty hidden payload
/// with the input returned unchanged as visible text.
///
/// # Errors
/// [`CodecError::MalformedPayload`] if the boundary marker count is wrong
/// or the recovered bit count is ≥ 8 and not a multiple of 8.
pub fn decode(encoded: &str) -> Result<Decoded, CodecError> {
    match detect(encoded) {
        Ok(scheme) => decode_with(encoded, scheme),
        Err(CodecError::UnsupportedCarrier) => Ok(Decoded {
            visible: encoded.to_string(),
            hidden: Vec::new(),
        }),
        Err(e) => Err(e),
    }
}

/// Decode a text carrier with an explicitly chosen strategy.
///
/// Characters outside the strategy's marker alphabet are treated as
/// visible text. Fewer than 8 recovered bits yield an empty hidden
/// payload; 8 or more that do not decompose into whole octets are a
/// [`CodecError::MalformedPayload`] error.
pub fn decode_with(encoded: &str, scheme: EmbedScheme) -> Result<Decoded, CodecError> {
    match scheme {
        EmbedScheme::OneBit => deinterleave(encoded, 1),
        EmbedScheme::TwoBit => deinterleave(encoded, 2),
        EmbedScheme::Boundary => boundary_extract(encoded),
    }
}

fn deinterleave(encoded: &str, bits_per_marker: usize) -> Result<Decoded, CodecError> {
    let mut visible = String::with_capacity(encoded.len());
    let mut seq = BitSeq::new();

    for ch in encoded.chars() {
        match (ch, bits_per_marker) {
            (ZERO_WIDTH_SPACE, 1) => seq.push(0),
            (ZERO_WIDTH_NON_JOINER, 1) => seq.push(1),
            (ZERO_WIDTH_SPACE, _) => {
                seq.push(0);
                seq.push(0);
            }
            (ZERO_WIDTH_NON_JOINER, _) => {
                seq.push(0);
                seq.push(1);
            }
            (ZERO_WIDTH_JOINER, 2) => {
                seq.push(1);
                seq.push(0);
            }
            (WORD_JOINER, 2) => {
                seq.push(1);
                seq.push(1);
            }
            _ => visible.push(ch),
        }
    }

    let hidden = if seq.len() < 8 { Vec::new() } else { seq.to_bytes()? };
    Ok(Decoded { visible, hidden })
}

fn boundary_extract(encoded: &str) -> Result<Decoded, CodecError> {
    let parts: Vec<&str> = encoded.split(BOUNDARY).collect();
    if parts.len() != 3 {
        return Err(CodecError::MalformedPayload);
    }
    let visible = format!("{}{}", parts[0], parts[2]);

    let mut grouped = String::with_capacity(parts[1].len());
    let mut bit_count = 0usize;
    for ch in parts[1].chars() {
        match ch {
            WORD_JOINER => grouped.push(' '),
            ZERO_WIDTH_SPACE => {
                grouped.push('0');
                bit_count += 1;
            }
            ZERO_WIDTH_NON_JOINER => {
                grouped.push('1');
                bit_count += 1;
            }
            _ => return Err(CodecError::MalformedPayload),
        }
    }

    let hidden = if bit_count < 8 {
        Vec::new()
    } else {
        BitSeq::parse_grouped(&grouped)?.to_bytes()?
    };
    Ok(Decoded { visible, hidden })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bit_roundtrip() {
        let encoded = encode("Hello, World!", b"Hi", EmbedScheme::OneBit);
        let decoded = decode_with(&encoded, EmbedScheme::OneBit).unwrap();
        assert_eq!(decoded.visible, "Hello, World!");
        assert_eq!(decoded.hidden, b"Hi");
    }

    #[test]
    fn two_bit_roundtrip_auto_detect() {
        // 0xDB = 11011011 guarantees high dibits, so detection sees the
        // four-symbol alphabet.
        let hidden = [0xDB, 0x42, 0xFF];
        let encoded = encode("carrier text", &hidden, EmbedScheme::TwoBit);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.visible, "carrier text");
        assert_eq!(decoded.hidden, hidden);
    }

    #[test]
    fn boundary_roundtrip_auto_detect() {
        let encoded = encode("public message", b"secret", EmbedScheme::Boundary);
        assert_eq!(detect(&encoded).unwrap(), EmbedScheme::Boundary);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.visible, "public message");
        assert_eq!(decoded.hidden, b"secret");
    }

    #[test]
    fn boundary_splices_at_midpoint() {
        let encoded = encode("abcd", b"", EmbedScheme::Boundary);
        // Two chars, then boundary pair, then two chars.
        let chars: Vec<char> = encoded.chars().collect();
        assert_eq!(chars[0], 'a');
        assert_eq!(chars[1], 'b');
        assert_eq!(chars[2], BOUNDARY);
        assert_eq!(chars[3], BOUNDARY);
        assert_eq!(chars[4], 'c');
    }

    #[test]
    fn midpoint_rounds_to_nearest() {
        // 5 visible chars → insert at index round(2.5) = 3.
        let encoded = encode("abcde", b"", EmbedScheme::Boundary);
        let chars: Vec<char> = encoded.chars().collect();
        assert_eq!(chars[2], 'c');
        assert_eq!(chars[3], BOUNDARY);
    }

    #[test]
    fn markers_overflow_past_visible_text() {
        // One visible char, two payload bytes → 15 markers appended after.
        let encoded = encode("x", b"Hi", EmbedScheme::OneBit);
        assert_eq!(encoded.chars().count(), 1 + 16);
        let decoded = decode_with(&encoded, EmbedScheme::OneBit).unwrap();
        assert_eq!(decoded.visible, "x");
        assert_eq!(decoded.hidden, b"Hi");
    }

    #[test]
    fn empty_visible_text() {
        let encoded = encode("", b"Hi", EmbedScheme::TwoBit);
        let decoded = decode_with(&encoded, EmbedScheme::TwoBit).unwrap();
        assert_eq!(decoded.visible, "");
        assert_eq!(decoded.hidden, b"Hi");
    }

    #[test]
    fn empty_hidden_payload() {
        let encoded = encode("just text", b"", EmbedScheme::OneBit);
        assert_eq!(encoded, "just text");
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.visible, "just text");
        assert!(decoded.hidden.is_empty());
    }

    #[test]
    fn unicode_visible_text_survives() {
        let visible = "héllo wörld 🌍";
        let encoded = encode(visible, b"\x00\xFF", EmbedScheme::TwoBit);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.visible, visible);
        assert_eq!(decoded.hidden, [0x00, 0xFF]);
    }

    #[test]
    fn single_boundary_marker_is_malformed() {
        let mut s = String::from("abc");
        s.push(BOUNDARY);
        s.push_str("def");
        match decode(&s) {
            Err(CodecError::MalformedPayload) => {}
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }

    #[test]
    fn foreign_char_inside_boundary_segment() {
        let mut s = String::from("ab");
        s.push(BOUNDARY);
        s.push(ZERO_WIDTH_SPACE);
        s.push('x'); // visible char inside the hidden segment
        s.push(BOUNDARY);
        s.push_str("cd");
        assert!(decode(&s).is_err());
    }

    #[test]
    fn truncated_bit_stream_is_malformed() {
        // 9 one-bit markers: ≥ 8 bits but not a whole number of octets.
        let mut s = String::from("v");
        for _ in 0..9 {
            s.push(ZERO_WIDTH_NON_JOINER);
        }
        match decode_with(&s, EmbedScheme::OneBit) {
            Err(CodecError::MalformedPayload) => {}
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }

    #[test]
    fn below_one_byte_yields_empty_payload() {
        let mut s = String::from("v");
        for _ in 0..5 {
            s.push(ZERO_WIDTH_SPACE);
        }
        let decoded = decode_with(&s, EmbedScheme::OneBit).unwrap();
        assert_eq!(decoded.visible, "v");
        assert!(decoded.hidden.is_empty());
    }

    #[test]
    fn detect_without_markers() {
        match detect("plain text, nothing hidden") {
            Err(CodecError::UnsupportedCarrier) => {}
            other => panic!("expected UnsupportedCarrier, got {other:?}"),
        }
    }

    #[test]
    fn decode_without_markers_is_empty() {
        let decoded = decode("plain text").unwrap();
        assert_eq!(decoded.visible, "plain text");
        assert!(decoded.hidden.is_empty());
    }
}
