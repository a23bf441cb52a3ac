//! secp256k1 (K-256) keys — the rotation key family.
//!
//! Rotation keys sign PLC operations, which makes them the keys that
//! actually control an identity. The PLC directory verifies these as
//! ECDSA-SHA256 signatures in 64-byte compact form and requires the S
//! component to be in the low half of the curve order, so signing here is
//! RFC 6979 deterministic followed by low-S normalization.

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use super::{KeyError, PREFIX_K256_PRIVATE, PREFIX_K256_PUBLIC};
use crate::encoding::{multibase_decode, multibase_encode};

/// A secp256k1 key, private or public-only.
#[derive(Clone, Debug)]
pub struct EcKey {
    /// Present only for private keys.
    signing: Option<SigningKey>,
    /// Always present; derived from the signing key when private.
    verifying: VerifyingKey,
}

impl EcKey {
    /// Generate a fresh private key from the OS RNG.
    pub fn generate() -> Self {
        let signing = SigningKey::random(&mut OsRng);
        let verifying = *signing.verifying_key();
        Self {
            signing: Some(signing),
            verifying,
        }
    }

    /// Decode a multibase public key. The multicodec prefix must be the
    /// secp256k1 public prefix (`0xe701`).
    pub fn from_public(encoded: &str) -> Result<Self, KeyError> {
        let (prefix, bytes) = multibase_decode(encoded)?;
        if prefix != PREFIX_K256_PUBLIC {
            return Err(KeyError::WrongPrefix {
                expected: "secp256k1 public",
                got: prefix,
            });
        }

        let verifying = VerifyingKey::from_sec1_bytes(&bytes)
            .map_err(|e| KeyError::InvalidMaterial("secp256k1 public", e.to_string()))?;
        Ok(Self {
            signing: None,
            verifying,
        })
    }

    /// Decode a multibase private key. The multicodec prefix must be the
    /// secp256k1 private prefix (`0x8126`).
    pub fn from_private(encoded: &str) -> Result<Self, KeyError> {
        let (prefix, bytes) = multibase_decode(encoded)?;
        if prefix != PREFIX_K256_PRIVATE {
            return Err(KeyError::WrongPrefix {
                expected: "secp256k1 private",
                got: prefix,
            });
        }

        let signing = SigningKey::from_slice(&bytes)
            .map_err(|e| KeyError::InvalidMaterial("secp256k1 private", e.to_string()))?;
        let verifying = *signing.verifying_key();
        Ok(Self {
            signing: Some(signing),
            verifying,
        })
    }

    /// Whether private material is present.
    pub fn is_private(&self) -> bool {
        self.signing.is_some()
    }

    /// ECDSA-sign SHA-256 of `data`, returning the 64-byte compact form.
    ///
    /// Deterministic per RFC 6979 and always low-S normalized; two signs of
    /// the same payload with the same key verify identically but callers
    /// must not rely on byte equality of signatures in general.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        let signing = self.signing.as_ref().ok_or(KeyError::NotPrivate("sign"))?;
        let signature: Signature = signing.sign(data);
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_bytes().to_vec())
    }

    /// Verify a 64-byte compact signature over SHA-256 of `data`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.verifying.verify(data, &signature).is_ok()
    }

    /// Encode the public point as a multibase string (compressed SEC1,
    /// 33 bytes, behind the secp256k1 public prefix).
    pub fn encode_public(&self) -> String {
        let point = self.verifying.to_encoded_point(true);
        multibase_encode(PREFIX_K256_PUBLIC, point.as_bytes())
    }

    /// Encode the private scalar as a multibase string.
    pub fn encode_private(&self) -> Result<String, KeyError> {
        let signing = self
            .signing
            .as_ref()
            .ok_or(KeyError::NotPrivate("encode private material"))?;
        Ok(multibase_encode(
            PREFIX_K256_PRIVATE,
            signing.to_bytes().as_slice(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_encoding_is_compressed_sec1() {
        let key = EcKey::generate();
        let (prefix, bytes) = multibase_decode(&key.encode_public()).unwrap();
        assert_eq!(prefix, PREFIX_K256_PUBLIC);
        assert_eq!(bytes.len(), 33);
        assert!(bytes[0] == 0x02 || bytes[0] == 0x03);
    }

    #[test]
    fn private_encoding_is_raw_scalar() {
        let key = EcKey::generate();
        let (prefix, bytes) = multibase_decode(&key.encode_private().unwrap()).unwrap();
        assert_eq!(prefix, PREFIX_K256_PRIVATE);
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn signature_is_low_s() {
        // normalize_s() on an already-normalized signature returns None,
        // so re-parsing our own output must find nothing to normalize.
        let key = EcKey::generate();
        let sig = key.sign(b"low-s check").unwrap();
        let parsed = Signature::from_slice(&sig).unwrap();
        assert!(parsed.normalize_s().is_none());
    }

    #[test]
    fn deterministic_signing() {
        // RFC 6979: same key + same payload = same signature bytes.
        let key = EcKey::generate();
        assert_eq!(key.sign(b"rfc6979").unwrap(), key.sign(b"rfc6979").unwrap());
    }

    #[test]
    fn wrong_prefix_rejected() {
        let key = EcKey::generate();
        let err = EcKey::from_public(&key.encode_private().unwrap()).unwrap_err();
        assert!(matches!(err, KeyError::WrongPrefix { .. }));
        let err = EcKey::from_private(&key.encode_public()).unwrap_err();
        assert!(matches!(err, KeyError::WrongPrefix { .. }));
    }

    #[test]
    fn garbage_point_rejected() {
        let bogus = multibase_encode(PREFIX_K256_PUBLIC, &[0x02; 33]);
        assert!(matches!(
            EcKey::from_public(&bogus),
            Err(KeyError::InvalidMaterial(_, _))
        ));
    }
}
