//! Hex sequence codec.
//!
//! Patch definitions spell byte sequences as whitespace-separated two-digit
//! hexadecimal tokens (`"4F 50 45"`). Each token must be exactly one byte;
//! shorthand such as `F` or `0F0F` is rejected rather than guessed at.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("hex sequence is empty")]
    Empty,

    #[error("invalid hex byte '{token}' at token {index} (expected two hex digits)")]
    InvalidToken { token: String, index: usize },
}

/// Decode a whitespace-separated list of two-digit hex tokens.
///
/// Single spaces are the canonical separator; runs of spaces or tabs are
/// tolerated.
///
/// ```
/// use byteseq_patcher::codec::decode;
///
/// assert_eq!(decode("4F 50 45").unwrap(), vec![0x4F, 0x50, 0x45]);
/// assert!(decode("4F5").is_err());
/// ```
pub fn decode(text: &str) -> Result<Vec<u8>, HexError> {
    let mut bytes = Vec::new();

    for (index, token) in text.split_whitespace().enumerate() {
        bytes.push(decode_token(token, index)?);
    }

    if bytes.is_empty() {
        return Err(HexError::Empty);
    }

    Ok(bytes)
}

fn decode_token(token: &str, index: usize) -> Result<u8, HexError> {
    let mut byte = [0u8; 1];
    // decode_to_slice enforces the exact length: two digits for one byte
    hex::decode_to_slice(token, &mut byte).map_err(|_| HexError::InvalidToken {
        token: token.to_string(),
        index,
    })?;
    Ok(byte[0])
}

/// Encode bytes as uppercase two-digit tokens joined by single spaces.
pub fn encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}
