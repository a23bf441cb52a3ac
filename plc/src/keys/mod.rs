//! # Key Abstraction
//!
//! Polymorphic key material for the PLC protocol. Two key families exist,
//! with strictly separated duties:
//!
//! 1. **EC (secp256k1)** — rotation keys. These sign PLC operations and
//!    therefore control the identity itself.
//! 2. **Ed25519** — verification keys. These sign published artifacts
//!    attributed to the identity.
//!
//! Keys travel as multibase strings: a base58btc payload (`z` indicator)
//! whose first two bytes are a multicodec prefix naming the key type and
//! whether the material is public or private (see the atproto cryptography
//! spec). Public keys additionally render as `did:key:` strings on the wire.
//!
//! A [`Key`] is either fully private (it can sign and export private
//! material) or public-only (it can verify). There is no in-between, and
//! signing with a public-only key is an error, not a panic.
//!
//! ## The legacy encoding
//!
//! Early versions of the publisher tooling encoded Ed25519 *private* keys
//! under the *public* multicodec prefix. That data exists in the wild, so
//! [`Key::from_private`] still decodes it and revocation matching checks it
//! as a fallback. Nothing ever writes it again.

pub mod ec;
pub mod ed25519;

pub use ec::EcKey;
pub use ed25519::Ed25519Key;

use crate::encoding::{multibase_decode, EncodingError};
use std::fmt;
use thiserror::Error;

/// Multicodec prefix for a secp256k1 public key (compressed SEC1 point).
pub const PREFIX_K256_PUBLIC: [u8; 2] = [0xe7, 0x01];

/// Multicodec prefix for a secp256k1 private scalar (varint of 0x1301).
pub const PREFIX_K256_PRIVATE: [u8; 2] = [0x81, 0x26];

/// Multicodec prefix for an Ed25519 public key.
pub const PREFIX_ED25519_PUBLIC: [u8; 2] = [0xed, 0x01];

/// Multicodec prefix for an Ed25519 private key (varint of 0x1300).
pub const PREFIX_ED25519_PRIVATE: [u8; 2] = [0x80, 0x26];

/// Prefix of the wire rendering of a public key.
pub const DID_KEY_PREFIX: &str = "did:key:";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from key construction and use.
#[derive(Debug, Error)]
pub enum KeyError {
    /// An operation that needs private material was attempted on a
    /// public-only key.
    #[error("cannot {0} with a public-only key")]
    NotPrivate(&'static str),

    /// A multicodec prefix we don't recognize at all.
    #[error("unsupported multicodec prefix 0x{:02x}{:02x}", .0[0], .0[1])]
    UnsupportedPrefix([u8; 2]),

    /// A multicodec prefix for the wrong curve or the wrong
    /// public/private flavor for this constructor.
    #[error("multicodec prefix 0x{:02x}{:02x} does not match {expected} key material", .got[0], .got[1])]
    WrongPrefix {
        /// What the constructor was asked to decode.
        expected: &'static str,
        /// The prefix actually found.
        got: [u8; 2],
    },

    /// The raw bytes were not a valid key for the curve.
    #[error("invalid {0} key material: {1}")]
    InvalidMaterial(&'static str, String),

    /// A wire key string was not in `did:key:` form.
    #[error("not a did:key string: {0}")]
    NotDidKey(String),

    /// The multibase envelope itself was malformed.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

// ---------------------------------------------------------------------------
// Curve
// ---------------------------------------------------------------------------

/// The curve / signature scheme a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    /// secp256k1 with ECDSA-SHA256 (rotation keys).
    K256,
    /// Ed25519 with pure EdDSA (verification keys).
    Ed25519,
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::K256 => write!(f, "secp256k1"),
            Curve::Ed25519 => write!(f, "ed25519"),
        }
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A PLC key: one of the two supported families, public-only or private.
///
/// Call sites dispatch through this enum's methods and never assume a
/// concrete variant — the variant only matters at construction time and
/// inside the signing/verification math.
#[derive(Clone)]
pub enum Key {
    /// secp256k1 (rotation keys).
    Ec(EcKey),
    /// Ed25519 (verification keys).
    Ed25519(Ed25519Key),
}

impl Key {
    /// Generate a fresh private key on the given curve, using the OS
    /// cryptographic RNG.
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::K256 => Key::Ec(EcKey::generate()),
            Curve::Ed25519 => Key::Ed25519(Ed25519Key::generate()),
        }
    }

    /// Decode a multibase public key, dispatching on its multicodec prefix.
    pub fn from_public(encoded: &str) -> Result<Self, KeyError> {
        let (prefix, _) = multibase_decode(encoded)?;
        match prefix {
            PREFIX_K256_PUBLIC => Ok(Key::Ec(EcKey::from_public(encoded)?)),
            PREFIX_ED25519_PUBLIC => Ok(Key::Ed25519(Ed25519Key::from_public(encoded)?)),
            other => Err(KeyError::UnsupportedPrefix(other)),
        }
    }

    /// Decode a multibase private key, dispatching on its multicodec prefix.
    ///
    /// Accepts the legacy Ed25519 encoding (private material under the
    /// public prefix) for compatibility with old persisted records.
    pub fn from_private(encoded: &str) -> Result<Self, KeyError> {
        let (prefix, _) = multibase_decode(encoded)?;
        match prefix {
            PREFIX_K256_PRIVATE => Ok(Key::Ec(EcKey::from_private(encoded)?)),
            PREFIX_ED25519_PRIVATE | PREFIX_ED25519_PUBLIC => {
                Ok(Key::Ed25519(Ed25519Key::from_private(encoded)?))
            }
            other => Err(KeyError::UnsupportedPrefix(other)),
        }
    }

    /// Parse a wire `did:key:` string into a public-only key.
    pub fn from_did_key(did_key: &str) -> Result<Self, KeyError> {
        let encoded = did_key
            .strip_prefix(DID_KEY_PREFIX)
            .ok_or_else(|| KeyError::NotDidKey(did_key.to_string()))?;
        Self::from_public(encoded)
    }

    /// The curve this key lives on.
    pub fn curve(&self) -> Curve {
        match self {
            Key::Ec(_) => Curve::K256,
            Key::Ed25519(_) => Curve::Ed25519,
        }
    }

    /// Whether this key holds private (signing) material.
    pub fn is_private(&self) -> bool {
        match self {
            Key::Ec(k) => k.is_private(),
            Key::Ed25519(k) => k.is_private(),
        }
    }

    /// Sign a message.
    ///
    /// EC keys produce a 64-byte low-S-normalized compact ECDSA signature
    /// over SHA-256 of the message. Ed25519 keys produce a 64-byte pure
    /// EdDSA signature over the message bytes themselves.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        match self {
            Key::Ec(k) => k.sign(data),
            Key::Ed25519(k) => k.sign(data),
        }
    }

    /// Verify a signature produced by [`Key::sign`] against this key's
    /// public half.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self {
            Key::Ec(k) => k.verify(data, signature),
            Key::Ed25519(k) => k.verify(data, signature),
        }
    }

    /// Encode the public half as a multibase string.
    pub fn encode_public(&self) -> String {
        match self {
            Key::Ec(k) => k.encode_public(),
            Key::Ed25519(k) => k.encode_public(),
        }
    }

    /// Encode the private material as a multibase string.
    ///
    /// Fails on a public-only key.
    pub fn encode_private(&self) -> Result<String, KeyError> {
        match self {
            Key::Ec(k) => k.encode_private(),
            Key::Ed25519(k) => k.encode_private(),
        }
    }

    /// The legacy private encoding (public prefix over private material).
    ///
    /// Only Ed25519 keys ever had one. Returns `None` for EC keys and for
    /// public-only keys. Used exclusively to match records persisted under
    /// the old encoding during revocation — never for new writes.
    pub fn encode_private_legacy(&self) -> Option<String> {
        match self {
            Key::Ec(_) => None,
            Key::Ed25519(k) => k.encode_private_legacy(),
        }
    }

    /// Render the public half as a wire `did:key:` string.
    pub fn encode_did_key(&self) -> String {
        format!("{}{}", DID_KEY_PREFIX, self.encode_public())
    }
}

impl PartialEq for Key {
    /// Two keys are equal when they share a curve and public point.
    /// Private material does not participate — a public-only key equals
    /// its private counterpart.
    fn eq(&self, other: &Self) -> bool {
        self.curve() == other.curve() && self.encode_public() == other.encode_public()
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    /// Private material never appears in debug output — only the curve tag
    /// and the public encoding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("curve", &self.curve())
            .field("public", &self.encode_public())
            .field("private", &self.is_private())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
