//! Fixed-width hex decoding.
//! Manual parsing so the crate stays usable without `std`.

use core::fmt;

use crate::leaf::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexError {
    TooShort,
    TooLong,
    InvalidCharacter,
}

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HexError::TooShort => write!(f, "hex string too short"),
            HexError::TooLong => write!(f, "hex string too long"),
            HexError::InvalidCharacter => write!(f, "invalid hex character"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HexError {}

/// Decode exactly `N` bytes from a hex string, optionally prefixed with `0x`.
pub fn hex_to_array<const N: usize>(hex_str: &str) -> Result<[u8; N], HexError> {
    let hex_clean = hex_str.strip_prefix("0x").unwrap_or(hex_str).as_bytes();

    if hex_clean.len() < N * 2 {
        return Err(HexError::TooShort);
    }
    if hex_clean.len() > N * 2 {
        return Err(HexError::TooLong);
    }

    let mut bytes = [0u8; N];
    for (i, pair) in hex_clean.chunks_exact(2).enumerate() {
        let high = hex_char_to_nibble(pair[0])?;
        let low = hex_char_to_nibble(pair[1])?;
        bytes[i] = (high << 4) | low;
    }
    Ok(bytes)
}

/// Convert hex string to 32-byte array.
pub fn hex_to_bytes32(hex_str: &str) -> Result<[u8; 32], HexError> {
    hex_to_array::<32>(hex_str)
}

/// Convert hex string to a 20-byte account address.
pub fn hex_to_address(hex_str: &str) -> Result<Address, HexError> {
    hex_to_array::<20>(hex_str.trim())
}

fn hex_char_to_nibble(c: u8) -> Result<u8, HexError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(HexError::InvalidCharacter),
    }
}
