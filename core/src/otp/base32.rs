//! Base32 codec for secret key material
//!
//! Secrets are accepted from the outside world only as RFC 4648 Base32
//! text. Decoding is tolerant of the forms that appear in the wild:
//! whitespace is ignored, letters may be lower case, and trailing `=`
//! padding is optional. Encoding always produces the canonical
//! uppercase, padded form.

use thiserror::Error;

/// The RFC 4648 Base32 alphabet.
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Errors produced while decoding Base32 secret text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input was empty (or contained only whitespace and padding).
    #[error("secret text is empty")]
    Empty,

    /// Input contained a character outside the Base32 alphabet.
    #[error("invalid base32 character '{0}'")]
    InvalidCharacter(char),

    /// Input length leaves bits that do not form a whole output byte.
    #[error("truncated base32 input: left-over bits do not form a whole byte")]
    TrailingBits,
}

/// Decode Base32 text into raw key bytes.
///
/// Whitespace is stripped, letters are folded to upper case, and any
/// trailing `=` padding is accepted but not required.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let unpadded = cleaned.trim_end_matches('=');

    if unpadded.is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut output = Vec::with_capacity(unpadded.len() * 5 / 8);
    let mut buffer = 0u32;
    let mut bits_left = 0u32;

    for c in unpadded.chars() {
        let position = c
            .is_ascii()
            .then(|| ALPHABET.iter().position(|&a| a == c.to_ascii_uppercase() as u8))
            .flatten();
        let value = match position {
            Some(v) => v as u32,
            None => return Err(DecodeError::InvalidCharacter(c)),
        };

        buffer = (buffer << 5) | value;
        bits_left += 5;

        if bits_left >= 8 {
            output.push((buffer >> (bits_left - 8)) as u8);
            bits_left -= 8;
        }
    }

    // Valid encodings leave at most 4 dangling bits; 5 or more means the
    // input length cannot come from whole bytes.
    if bits_left >= 5 {
        return Err(DecodeError::TrailingBits);
    }

    Ok(output)
}

/// Encode raw bytes as uppercase, padded Base32 text.
///
/// Inverse of [`decode`]; used for round-trip verification and for the
/// persistence format of stored secrets.
pub fn encode(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len().div_ceil(5) * 8);
    let mut buffer = 0u32;
    let mut bits_left = 0u32;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits_left += 8;

        while bits_left >= 5 {
            let index = (buffer >> (bits_left - 5)) & 0x1f;
            output.push(ALPHABET[index as usize] as char);
            bits_left -= 5;
        }
    }

    if bits_left > 0 {
        let index = (buffer << (5 - bits_left)) & 0x1f;
        output.push(ALPHABET[index as usize] as char);
    }

    while output.len() % 8 != 0 {
        output.push('=');
    }

    output
}
