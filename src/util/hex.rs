//! # Hex Encoding/Decoding Utilities
//!
//! Captured service-port responses are exchanged as hex text, either packed
//! (`0218b411`) or spaced the way serial monitors print them
//! (`02 18 B4 11`, `02:18:b4:11`).
//!
//! ```rust
//! use intergas_rs::util::hex::{decode_hex, format_hex_compact};
//!
//! let data = decode_hex("02 18 b4 11").unwrap();
//! assert_eq!(data, vec![0x02, 0x18, 0xB4, 0x11]);
//! assert_eq!(format_hex_compact(&data), "02 18 B4 11");
//! ```

use crate::error::IntergasError;

/// Encode bytes to a lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode hex text to bytes, ignoring whitespace, `:` and `-` separators
/// and an optional `0x` prefix.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, IntergasError> {
    let trimmed = hex_str.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();

    if cleaned.is_empty() || cleaned.len() % 2 != 0 {
        return Err(IntergasError::InvalidHexString);
    }
    hex::decode(&cleaned).map_err(|_| IntergasError::InvalidHexString)
}

/// Uppercase hex with a space between bytes, for logs
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_separators() {
        let expected = vec![0x7E, 0x00, 0xCC];
        assert_eq!(decode_hex("7e00cc").unwrap(), expected);
        assert_eq!(decode_hex("7E 00 CC").unwrap(), expected);
        assert_eq!(decode_hex("7e:00:cc").unwrap(), expected);
        assert_eq!(decode_hex("0x7E00CC\n").unwrap(), expected);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_hex(""), Err(IntergasError::InvalidHexString)));
        assert!(matches!(decode_hex("7e0"), Err(IntergasError::InvalidHexString)));
        assert!(matches!(decode_hex("zz"), Err(IntergasError::InvalidHexString)));
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode_hex(&[0x53, 0x3F, 0x0D]), "533f0d");
        assert_eq!(format_hex_compact(&[0x53, 0x3F, 0x0D]), "53 3F 0D");
        assert_eq!(format_hex_compact(&[]), "");
    }
}
