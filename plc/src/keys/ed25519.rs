//! Ed25519 keys — the verification key family.
//!
//! Verification keys sign content attributed to the identity: release
//! artifacts, metadata documents, anything a package client might want to
//! check against the DID document. They never sign PLC operations.
//!
//! Signing is pure Ed25519 (RFC 8032) over the message bytes. The artifact
//! pipeline hashes first and signs the digest — see [`crate::artifact`].

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use super::{KeyError, PREFIX_ED25519_PRIVATE, PREFIX_ED25519_PUBLIC};
use crate::encoding::{multibase_decode, multibase_encode};

/// An Ed25519 key, private or public-only.
#[derive(Clone)]
pub struct Ed25519Key {
    /// Present only for private keys.
    signing: Option<SigningKey>,
    /// Always present; derived from the signing key when private.
    verifying: VerifyingKey,
}

impl Ed25519Key {
    /// Generate a fresh private key from the OS RNG.
    pub fn generate() -> Self {
        let signing = SigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        Self {
            signing: Some(signing),
            verifying,
        }
    }

    /// Decode a multibase public key. The multicodec prefix must be the
    /// Ed25519 public prefix (`0xed01`).
    pub fn from_public(encoded: &str) -> Result<Self, KeyError> {
        let (prefix, bytes) = multibase_decode(encoded)?;
        if prefix != PREFIX_ED25519_PUBLIC {
            return Err(KeyError::WrongPrefix {
                expected: "ed25519 public",
                got: prefix,
            });
        }

        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidMaterial("ed25519 public", "not 32 bytes".into()))?;
        let verifying = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| KeyError::InvalidMaterial("ed25519 public", e.to_string()))?;
        Ok(Self {
            signing: None,
            verifying,
        })
    }

    /// Decode a multibase private key.
    ///
    /// Accepts the proper private prefix (`0x8026`) and, as a
    /// compatibility fallback, the legacy encoding that put private
    /// material behind the *public* prefix (`0xed01`). The legacy form is
    /// never produced on encode.
    pub fn from_private(encoded: &str) -> Result<Self, KeyError> {
        let (prefix, bytes) = multibase_decode(encoded)?;
        if prefix != PREFIX_ED25519_PRIVATE && prefix != PREFIX_ED25519_PUBLIC {
            return Err(KeyError::WrongPrefix {
                expected: "ed25519 private",
                got: prefix,
            });
        }

        // The old tooling persisted the full 64-byte libsodium secret
        // (seed ++ public); the seed is the first 32 bytes.
        let seed: [u8; 32] = bytes
            .get(..32)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                KeyError::InvalidMaterial("ed25519 private", "fewer than 32 bytes".into())
            })?;
        let signing = SigningKey::from_bytes(&seed);
        let verifying = signing.verifying_key();
        Ok(Self {
            signing: Some(signing),
            verifying,
        })
    }

    /// Whether private material is present.
    pub fn is_private(&self) -> bool {
        self.signing.is_some()
    }

    /// Sign `data` with pure Ed25519, returning the 64-byte signature.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        let signing = self.signing.as_ref().ok_or(KeyError::NotPrivate("sign"))?;
        Ok(signing.sign(data).to_bytes().to_vec())
    }

    /// Verify a 64-byte Ed25519 signature over `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.verifying.verify(data, &signature).is_ok()
    }

    /// Encode the public key as a multibase string (32 raw bytes behind
    /// the Ed25519 public prefix).
    pub fn encode_public(&self) -> String {
        multibase_encode(PREFIX_ED25519_PUBLIC, self.verifying.as_bytes())
    }

    /// Encode the private seed as a multibase string.
    pub fn encode_private(&self) -> Result<String, KeyError> {
        let signing = self
            .signing
            .as_ref()
            .ok_or(KeyError::NotPrivate("encode private material"))?;
        Ok(multibase_encode(PREFIX_ED25519_PRIVATE, &signing.to_bytes()))
    }

    /// The legacy private encoding: private seed behind the public prefix.
    ///
    /// Exists only so revocation can match records persisted by old
    /// tooling. `None` for public-only keys.
    pub fn encode_private_legacy(&self) -> Option<String> {
        let signing = self.signing.as_ref()?;
        Some(multibase_encode(PREFIX_ED25519_PUBLIC, &signing.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let key = Ed25519Key::generate();
        let sig = key.sign(b"artifact digest").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(key.verify(b"artifact digest", &sig));
        assert!(!key.verify(b"tampered", &sig));
    }

    #[test]
    fn signing_is_deterministic() {
        let key = Ed25519Key::generate();
        assert_eq!(key.sign(b"x").unwrap(), key.sign(b"x").unwrap());
    }

    #[test]
    fn public_encoding_is_32_bytes() {
        let key = Ed25519Key::generate();
        let (prefix, bytes) = multibase_decode(&key.encode_public()).unwrap();
        assert_eq!(prefix, PREFIX_ED25519_PUBLIC);
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn legacy_64_byte_secret_decodes() {
        // Old records carry seed ++ public (64 bytes) behind the public
        // prefix; decoding must recover the same signing identity.
        let key = Ed25519Key::generate();
        let signing = key.signing.as_ref().unwrap();
        let mut libsodium_secret = signing.to_bytes().to_vec();
        libsodium_secret.extend_from_slice(key.verifying.as_bytes());

        let legacy = multibase_encode(PREFIX_ED25519_PUBLIC, &libsodium_secret);
        let decoded = Ed25519Key::from_private(&legacy).unwrap();
        assert_eq!(decoded.encode_public(), key.encode_public());
    }

    #[test]
    fn truncated_private_material_rejected() {
        let short = multibase_encode(PREFIX_ED25519_PRIVATE, &[1u8; 16]);
        assert!(matches!(
            Ed25519Key::from_private(&short),
            Err(KeyError::InvalidMaterial(_, _))
        ));
    }
}
