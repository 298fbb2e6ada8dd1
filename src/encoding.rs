//! Hand-rolled UTF-8 <-> UTF-16LE conversion for directory entry names and
//! paths.
//!
//! The spec calls for avoiding a dependency on the platform's `iconv`;
//! this module implements the two directions directly, including surrogate
//! pairs and the UTF-16 NUL terminator, rather than reaching for a
//! character-set crate.

use crate::error::{Error, Result};

/// Decodes a sequence of UTF-16LE code units (no terminator) into a `String`,
/// replacing unpaired surrogates with the replacement character.
pub fn utf16le_units_to_string(units: &[u16]) -> String {
    char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decodes raw little-endian bytes (an even number of them) into a `String`.
pub fn utf16le_bytes_to_string(bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::Encoding(format!(
            "odd number of bytes ({}) cannot be UTF-16LE",
            bytes.len()
        )));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(utf16le_units_to_string(&units))
}

/// Encodes a `&str` into UTF-16LE code units, handling characters outside
/// the BMP as surrogate pairs. No terminator is appended.
pub fn string_to_utf16le_units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

/// Encodes a `&str` into UTF-16LE bytes with a trailing NUL code unit,
/// matching the on-disk directory entry name encoding.
pub fn string_to_utf16le_bytes_with_nul(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() * 2 + 2);
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_roundtrip() {
        let bytes = string_to_utf16le_bytes_with_nul("Root Entry");
        // strip the trailing NUL code unit before decoding back
        let decoded = utf16le_bytes_to_string(&bytes[..bytes.len() - 2]).unwrap();
        assert_eq!(decoded, "Root Entry");
    }

    #[test]
    fn surrogate_pair_roundtrip() {
        let s = "A\u{1F600}B"; // outside the BMP
        let units = string_to_utf16le_units(s);
        assert_eq!(units.len(), 4); // 'A', high+low surrogate, 'B'
        assert_eq!(utf16le_units_to_string(&units), s);
    }

    #[test]
    fn odd_length_is_rejected() {
        assert!(utf16le_bytes_to_string(&[0u8; 3]).is_err());
    }

    #[test]
    fn unpaired_surrogate_is_replaced_not_fatal() {
        let units = [0xD800u16]; // lone high surrogate
        let s = utf16le_units_to_string(&units);
        assert_eq!(s, "\u{FFFD}");
    }
}
