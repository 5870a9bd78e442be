//! Modified UTF-8, the string encoding of class-file `Utf8` constants.
//!
//! It differs from standard UTF-8 in two ways:
//!
//! - U+0000 is encoded as the two bytes `C0 80`
//! - supplementary characters are encoded as a surrogate pair, each half
//!   taking three bytes (six bytes total)

use std::borrow::Cow;

/// Decodes modified UTF-8.
///
/// Input that is also valid standard UTF-8 is borrowed. Returns `None` for
/// malformed input and for lone surrogates, which Rust strings cannot hold.
pub fn decode(bytes: &[u8]) -> Option<Cow<'_, str>> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(Cow::Borrowed(s));
    }

    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let (unit, len) = decode_unit(&bytes[i..])?;
        i += len;

        if (0xD800..0xDC00).contains(&unit) {
            let (low, low_len) = decode_unit(&bytes[i..])?;
            if !(0xDC00..0xE000).contains(&low) {
                return None;
            }
            i += low_len;
            let c = 0x10000 + (((unit - 0xD800) << 10) | (low - 0xDC00));
            out.push(char::from_u32(c)?);
        } else {
            out.push(char::from_u32(unit)?);
        }
    }
    Some(Cow::Owned(out))
}

/// Decodes one UTF-16 code unit from 1-3 bytes.
fn decode_unit(bytes: &[u8]) -> Option<(u32, usize)> {
    let b0 = *bytes.first()? as u32;
    match b0 {
        0x01..=0x7F => Some((b0, 1)),
        0xC0..=0xDF => {
            let b1 = continuation(bytes, 1)?;
            Some((((b0 & 0x1F) << 6) | b1, 2))
        }
        0xE0..=0xEF => {
            let b1 = continuation(bytes, 1)?;
            let b2 = continuation(bytes, 2)?;
            Some((((b0 & 0x0F) << 12) | (b1 << 6) | b2, 3))
        }
        _ => None,
    }
}

fn continuation(bytes: &[u8], at: usize) -> Option<u32> {
    let b = *bytes.get(at)?;
    if b & 0xC0 == 0x80 {
        Some((b & 0x3F) as u32)
    } else {
        None
    }
}

/// Encodes a string as modified UTF-8.
pub fn encode(s: &str) -> Vec<u8> {
    if !s.chars().any(|c| c == '\0' || c as u32 > 0xFFFF) {
        return s.as_bytes().to_vec();
    }

    let mut out = Vec::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c as u32 {
            0 => out.extend_from_slice(&[0xC0, 0x80]),
            cp if cp > 0xFFFF => {
                let v = cp - 0x10000;
                encode_unit(&mut out, 0xD800 | (v >> 10));
                encode_unit(&mut out, 0xDC00 | (v & 0x3FF));
            }
            _ => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out
}

/// Encodes a UTF-16 code unit in the three-byte form.
fn encode_unit(out: &mut Vec<u8>, unit: u32) {
    out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
    out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
    out.push(0x80 | (unit & 0x3F) as u8);
}
