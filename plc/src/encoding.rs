//! # Encoding Utilities
//!
//! The string encodings the PLC protocol is built out of: base64url for
//! signatures, base32 for CIDs and `did:plc` suffixes, and multibase
//! (base58btc with a multicodec type prefix) for key material.
//!
//! Every encoding here is self-checking on decode — an unknown character,
//! an unknown multibase indicator, or a truncated multicodec prefix is an
//! [`EncodingError`], never a best-effort guess. Corrupt input at this layer
//! means corrupt keys or a broken hash chain at every layer above, so we
//! fail fast and loudly.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use thiserror::Error;

/// The RFC 4648 base32 alphabet, lowercase. The PLC method renders CIDs and
/// DID suffixes in lowercase; decode accepts either case.
const BASE32_CHARS: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// The multibase indicator for base58btc — the only base the PLC key
/// encoding uses.
const MULTIBASE_BASE58BTC: char = 'z';

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from decoding malformed input.
///
/// All of these indicate corrupt or foreign data. None are recoverable by
/// retrying — the caller has to find better input.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// A base32 string contained a character outside the RFC 4648 alphabet.
    #[error("unexpected base32 character {0:?} at offset {1}")]
    InvalidBase32Char(char, usize),

    /// A base64url string failed to decode.
    #[error("invalid base64url data: {0}")]
    InvalidBase64(String),

    /// A multibase string used a base we don't support (anything but 'z').
    #[error("unsupported multibase indicator {0:?} (expected 'z')")]
    UnsupportedMultibase(char),

    /// A multibase string decoded to fewer bytes than its multicodec prefix.
    #[error("multibase payload too short to carry a multicodec prefix")]
    TruncatedMulticodec,

    /// The base58btc payload of a multibase string failed to decode.
    #[error("invalid base58btc data: {0}")]
    InvalidBase58(String),
}

// ---------------------------------------------------------------------------
// base64url (RFC 4648 §5)
// ---------------------------------------------------------------------------

/// Encode bytes as base64url without padding.
///
/// This is the form PLC signatures travel in.
pub fn base64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64url string, tolerating both padded and unpadded input.
pub fn base64url_decode(data: &str) -> Result<Vec<u8>, EncodingError> {
    let trimmed = data.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| URL_SAFE.decode(data))
        .map_err(|e| EncodingError::InvalidBase64(e.to_string()))
}

// ---------------------------------------------------------------------------
// base32 (RFC 4648, lowercase, unpadded)
// ---------------------------------------------------------------------------

/// Encode bytes as lowercase unpadded base32.
///
/// Bits are consumed big-endian, five at a time; a final partial group is
/// left-padded with zero bits, exactly as RFC 4648 specifies.
pub fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buf: u16 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        buf = (buf << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let idx = ((buf >> bits) & 0x1f) as usize;
            out.push(BASE32_CHARS[idx] as char);
        }
    }
    if bits > 0 {
        let idx = ((buf << (5 - bits)) & 0x1f) as usize;
        out.push(BASE32_CHARS[idx] as char);
    }
    out
}

/// Decode a base32 string.
///
/// Accepts either case, skips whitespace and trailing `=` padding, and
/// rejects anything else with [`EncodingError::InvalidBase32Char`].
pub fn base32_decode(data: &str) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(data.len() * 5 / 8);
    let mut buf: u16 = 0;
    let mut bits: u32 = 0;

    for (offset, c) in data.chars().enumerate() {
        if c.is_whitespace() || c == '=' {
            continue;
        }
        let lower = c.to_ascii_lowercase();
        let value = BASE32_CHARS
            .iter()
            .position(|&b| b as char == lower)
            .ok_or(EncodingError::InvalidBase32Char(c, offset))?;

        buf = (buf << 5) | value as u16;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buf >> bits) as u8);
        }
    }
    // Leftover bits are the zero-padding of the final group; discard.
    Ok(out)
}

// ---------------------------------------------------------------------------
// multibase (base58btc + 2-byte multicodec prefix)
// ---------------------------------------------------------------------------

/// Encode a multicodec-prefixed payload as a multibase string.
///
/// The result is `'z'` followed by the base58btc encoding of
/// `prefix ++ data`. The two-byte prefix identifies the key type; see
/// [`crate::keys`] for the prefixes the PLC method recognizes.
pub fn multibase_encode(prefix: [u8; 2], data: &[u8]) -> String {
    let mut payload = Vec::with_capacity(2 + data.len());
    payload.extend_from_slice(&prefix);
    payload.extend_from_slice(data);
    format!("{}{}", MULTIBASE_BASE58BTC, bs58::encode(payload).into_string())
}

/// Decode a multibase string into its multicodec prefix and raw payload.
///
/// Callers branch on the returned prefix to decide what kind of key (and
/// whether public or private material) they are holding.
pub fn multibase_decode(data: &str) -> Result<([u8; 2], Vec<u8>), EncodingError> {
    let mut chars = data.chars();
    match chars.next() {
        Some(MULTIBASE_BASE58BTC) => {}
        Some(other) => return Err(EncodingError::UnsupportedMultibase(other)),
        None => return Err(EncodingError::TruncatedMulticodec),
    }

    let decoded = bs58::decode(chars.as_str())
        .into_vec()
        .map_err(|e| EncodingError::InvalidBase58(e.to_string()))?;
    if decoded.len() < 2 {
        return Err(EncodingError::TruncatedMulticodec);
    }

    let prefix = [decoded[0], decoded[1]];
    Ok((prefix, decoded[2..].to_vec()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
