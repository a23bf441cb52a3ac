//! # CID Computation
//!
//! Content identifiers link PLC operations into the append-only chain:
//! every operation names the CID of the previous one in its `prev` field,
//! and the `did:plc` identifier itself is derived from the hash of the
//! genesis operation.
//!
//! A CID here is always "CIDv1, dag-cbor, sha2-256": canonically encode the
//! value as DAG-CBOR, SHA-256 the bytes, prepend the multiformat header
//! `0x01 0x71 0x12 0x20`, and render the whole thing as multibase base32
//! (lowercase, `b` indicator).
//!
//! The encoder below is deliberately small. It covers exactly the value
//! shapes a PLC operation can contain — null, bool, integers, strings,
//! arrays, string-keyed maps — and refuses anything else. DAG-CBOR
//! canonical form requires minimal-length integer heads and map keys sorted
//! shortest-first, then bytewise; get either wrong and the directory
//! computes a different CID than we do, which silently breaks the chain.

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::encoding::base32_encode;

/// Multiformat header for "CIDv1, dag-cbor codec, sha2-256 multihash,
/// 32-byte digest".
const CID_HEADER: [u8; 4] = [0x01, 0x71, 0x12, 0x20];

/// Multibase indicator for lowercase base32.
const MULTIBASE_BASE32: char = 'b';

/// Errors from canonical encoding.
#[derive(Debug, Error)]
pub enum CidError {
    /// DAG-CBOR canonical form has no representation for floats, and no
    /// PLC operation legitimately contains one.
    #[error("cannot canonically encode non-integer number {0}")]
    NonIntegerNumber(f64),
}

// ---------------------------------------------------------------------------
// Canonical DAG-CBOR
// ---------------------------------------------------------------------------

/// Canonically encode a JSON value as DAG-CBOR.
///
/// Deterministic by construction: minimal-length heads, map keys sorted by
/// length then bytewise. Two logically identical values always produce the
/// same bytes regardless of the order their maps were built in.
pub fn canonical_cbor(value: &Value) -> Result<Vec<u8>, CidError> {
    let mut out = Vec::new();
    encode_value(value, &mut out)?;
    Ok(out)
}

/// Write a CBOR head: 3-bit major type plus minimal-length argument.
fn encode_head(major: u8, arg: u64, out: &mut Vec<u8>) {
    let major = major << 5;
    match arg {
        0..=23 => out.push(major | arg as u8),
        24..=0xff => {
            out.push(major | 24);
            out.push(arg as u8);
        }
        0x100..=0xffff => {
            out.push(major | 25);
            out.extend_from_slice(&(arg as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(major | 26);
            out.extend_from_slice(&(arg as u32).to_be_bytes());
        }
        _ => {
            out.push(major | 27);
            out.extend_from_slice(&arg.to_be_bytes());
        }
    }
}

fn encode_value(value: &Value, out: &mut Vec<u8>) -> Result<(), CidError> {
    match value {
        Value::Null => out.push(0xf6),
        Value::Bool(false) => out.push(0xf4),
        Value::Bool(true) => out.push(0xf5),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                encode_head(0, u, out);
            } else if let Some(i) = n.as_i64() {
                // Major type 1 encodes -1 - n.
                encode_head(1, (-1 - i) as u64, out);
            } else {
                return Err(CidError::NonIntegerNumber(n.as_f64().unwrap_or(f64::NAN)));
            }
        }
        Value::String(s) => {
            encode_head(3, s.len() as u64, out);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            encode_head(4, items.len() as u64, out);
            for item in items {
                encode_value(item, out)?;
            }
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

            encode_head(5, keys.len() as u64, out);
            for key in keys {
                encode_head(3, key.len() as u64, out);
                out.extend_from_slice(key.as_bytes());
                encode_value(&map[key.as_str()], out)?;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CID strings
// ---------------------------------------------------------------------------

/// Compute the CID string for a value.
///
/// This is the `prev` pointer format: `b` + base32 of
/// `0x01 0x71 0x12 0x20 ++ sha256(dag-cbor(value))`.
pub fn cid_for_value(value: &Value) -> Result<String, CidError> {
    let encoded = canonical_cbor(value)?;
    let digest = Sha256::digest(&encoded);

    let mut bytes = Vec::with_capacity(CID_HEADER.len() + digest.len());
    bytes.extend_from_slice(&CID_HEADER);
    bytes.extend_from_slice(&digest);
    Ok(format!("{}{}", MULTIBASE_BASE32, base32_encode(&bytes)))
}

/// Compute the 24-character `did:plc` suffix for a signed genesis value:
/// the truncated base32 of the bare SHA-256 of its canonical encoding.
pub fn plc_suffix(value: &Value) -> Result<String, CidError> {
    let encoded = canonical_cbor(value)?;
    let digest = Sha256::digest(&encoded);
    Ok(base32_encode(&digest)[..24].to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
