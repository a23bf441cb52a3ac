//! # Artifact Signing
//!
//! Package providers attach two proofs to every release artifact they
//! publish under an identity:
//!
//! - a content hash: `sha256:<hex>` of the artifact bytes, and
//! - a signature: SHA-384 of the bytes, signed by a verification key,
//!   rendered as unpadded base64url.
//!
//! Clients resolve the identity's DID document, pick the verification
//! keys out of it, and check both. The *last* verification key in the
//! identity's list signs new artifacts; older keys stay listed so
//! already-published artifacts keep verifying until their keys are
//! revoked.
//!
//! Batch signing is the one place in this crate that aggregates errors:
//! when a provider regenerates metadata for many versions at once, every
//! failing version is reported, not just the first.

use sha2::{Digest, Sha256, Sha384};
use std::collections::BTreeMap;
use std::fmt;

use crate::encoding::base64url_encode;
use crate::keys::{Key, KeyError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// One or more versions in a batch failed to sign. Lists every failure.
#[derive(Debug)]
pub struct BatchSignError {
    /// (version, cause) for each version that failed.
    pub failures: Vec<(String, KeyError)>,
}

impl fmt::Display for BatchSignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to sign {} version(s):", self.failures.len())?;
        for (version, cause) in &self.failures {
            write!(f, " [{version}: {cause}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchSignError {}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Proofs for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMetadata {
    /// `sha256:<hex>` content hash of the artifact bytes.
    pub sha256: String,
    /// base64url signature over the SHA-384 of the artifact bytes.
    pub signature: String,
}

/// The `sha256:<hex>` content hash of an artifact.
pub fn content_hash(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}

/// Sign artifact bytes with a verification key.
///
/// Hash first, then sign the 48-byte digest — large artifacts never pass
/// through the signature primitive directly.
pub fn sign_artifact(key: &Key, data: &[u8]) -> Result<String, KeyError> {
    let digest = Sha384::digest(data);
    let signature = key.sign(&digest)?;
    Ok(base64url_encode(&signature))
}

/// Verify an artifact signature produced by [`sign_artifact`] against a
/// key's public half.
pub fn verify_artifact(key: &Key, data: &[u8], signature_b64: &str) -> bool {
    let Ok(signature) = crate::encoding::base64url_decode(signature_b64) else {
        return false;
    };
    key.verify(&Sha384::digest(data), &signature)
}

/// Hash and sign one artifact.
pub fn artifact_metadata(key: &Key, data: &[u8]) -> Result<ArtifactMetadata, KeyError> {
    Ok(ArtifactMetadata {
        sha256: content_hash(data),
        signature: sign_artifact(key, data)?,
    })
}

/// Hash and sign a batch of artifact versions.
///
/// Processes every version even after a failure and returns either the
/// complete metadata map or a [`BatchSignError`] naming every version
/// that failed.
pub fn sign_artifacts<'a, I>(key: &Key, versions: I) -> Result<BTreeMap<String, ArtifactMetadata>, BatchSignError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut metadata = BTreeMap::new();
    let mut failures = Vec::new();

    for (version, data) in versions {
        match artifact_metadata(key, data) {
            Ok(meta) => {
                metadata.insert(version.to_string(), meta);
            }
            Err(cause) => failures.push((version.to_string(), cause)),
        }
    }

    if failures.is_empty() {
        Ok(metadata)
    } else {
        Err(BatchSignError { failures })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Curve;

    #[test]
    fn content_hash_known_vector() {
        // sha256("hello"), straight from `printf hello | sha256sum`.
        assert_eq!(
            content_hash(b"hello"),
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn artifact_signature_verifies() {
        let key = Key::generate(Curve::Ed25519);
        let sig = sign_artifact(&key, b"hello").unwrap();
        assert!(verify_artifact(&key, b"hello", &sig));
        assert!(!verify_artifact(&key, b"hello!", &sig));

        // The signature is over the SHA-384 digest, not the raw bytes.
        let digest = Sha384::digest(b"hello");
        let raw = crate::encoding::base64url_decode(&sig).unwrap();
        let public = Key::from_public(&key.encode_public()).unwrap();
        assert!(public.verify(&digest, &raw));
    }

    #[test]
    fn signing_requires_private_key() {
        let key = Key::generate(Curve::Ed25519);
        let public = Key::from_public(&key.encode_public()).unwrap();
        assert!(matches!(
            sign_artifact(&public, b"hello"),
            Err(KeyError::NotPrivate(_))
        ));
    }

    #[test]
    fn batch_signs_every_version() {
        let key = Key::generate(Curve::Ed25519);
        let versions: Vec<(&str, &[u8])> =
            vec![("1.0.0", b"one".as_slice()), ("1.1.0", b"two".as_slice())];
        let metadata = sign_artifacts(&key, versions).unwrap();
        assert_eq!(metadata.len(), 2);
        assert!(metadata["1.0.0"].sha256.starts_with("sha256:"));
        assert!(verify_artifact(&key, b"two", &metadata["1.1.0"].signature));
    }

    #[test]
    fn batch_reports_all_failures() {
        // A public-only key fails for every version; the combined error
        // names each one instead of stopping at the first.
        let key = Key::generate(Curve::Ed25519);
        let public = Key::from_public(&key.encode_public()).unwrap();
        let versions: Vec<(&str, &[u8])> =
            vec![("1.0.0", b"one".as_slice()), ("1.1.0", b"two".as_slice())];

        let err = sign_artifacts(&public, versions).unwrap_err();
        assert_eq!(err.failures.len(), 2);
        let rendered = err.to_string();
        assert!(rendered.contains("1.0.0"));
        assert!(rendered.contains("1.1.0"));
    }
}
