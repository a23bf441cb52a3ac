//! # Operation Model
//!
//! PLC operations are the entries of the identity's append-only log. An
//! [`Operation`] is the unsigned draft: the full key and service state of
//! the identity plus a `prev` CID pointing at the entry it extends (absent
//! only for genesis). A [`SignedOperation`] is that draft plus a base64url
//! signature from a rotation key, and is the only thing the directory will
//! accept.
//!
//! Two projections of an operation exist and must agree byte-for-byte with
//! what the directory computes:
//!
//! - the **wire form** ([`WireOperation`]) — JSON with a fixed key order
//!   (`type, rotationKeys, verificationMethods, alsoKnownAs, services,
//!   prev, sig`), keys rendered as `did:key:` strings;
//! - the **canonical form** — DAG-CBOR of the wire form (see
//!   [`crate::cid`]), which is what gets hashed for CIDs and signed.
//!
//! `validate()` runs before every sign and every submit. An operation that
//! fails validation must never reach the directory — a malformed entry that
//! somehow got accepted would corrupt the chain for good.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::cid::{canonical_cbor, cid_for_value};
use crate::encoding::base64url_encode;
use crate::error::Error;
use crate::keys::Key;

/// The ordinary operation type: replaces the identity's current state.
pub const TYPE_OPERATION: &str = "plc_operation";

/// The tombstone type: marks the identity as deactivated. Recognized by
/// validation, but this crate never builds one.
pub const TYPE_TOMBSTONE: &str = "plc_tombstone";

/// Required prefix for verification method ids in this deployment.
pub const VERIFICATION_METHOD_PREFIX: &str = "fair_";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A rule an operation violated. Unrecoverable: the operation must not be
/// signed or submitted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The operation type is empty.
    #[error("operation type is empty")]
    EmptyType,

    /// The operation type is not one of the recognized values.
    #[error("unrecognized operation type {0:?}")]
    UnknownType(String),

    /// The rotation key list is empty.
    #[error("rotation keys are empty")]
    EmptyRotationKeys,

    /// The verification method map is empty.
    #[error("verification methods are empty")]
    EmptyVerificationMethods,

    /// A verification method id lacks the recognized prefix.
    #[error("invalid verification method id {0:?}")]
    InvalidMethodId(String),

    /// A genesis operation (no `prev`) is missing key material.
    #[error("genesis operation missing rotation keys or verification methods")]
    GenesisMissingKeys,

    /// A signed operation carries an empty signature.
    #[error("signature is empty")]
    EmptySignature,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// A service endpoint advertised by the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service type tag, e.g. `FairPackageManagementRepo`.
    #[serde(rename = "type")]
    pub service_type: String,
    /// The service's URL.
    pub endpoint: String,
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// An unsigned PLC operation: a complete draft of the identity's state.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// `plc_operation` or `plc_tombstone`.
    pub op_type: String,
    /// Ordered rotation keys; the first is the authoritative signer.
    pub rotation_keys: Vec<Key>,
    /// Verification methods, keyed by `fair_`-prefixed method id.
    pub verification_methods: BTreeMap<String, Key>,
    /// Alternative URIs for the identity.
    pub also_known_as: Vec<String>,
    /// Advertised service endpoints, keyed by service id.
    pub services: BTreeMap<String, Service>,
    /// CID of the previous operation; `None` only for genesis.
    pub prev: Option<String>,
}

impl Operation {
    /// Check every structural rule, reporting the first violation.
    ///
    /// Must be called (and pass) before an operation is signed or
    /// submitted — both [`Operation::sign`] and the directory client do so.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.op_type.is_empty() {
            return Err(ValidationError::EmptyType);
        }
        if self.op_type != TYPE_OPERATION && self.op_type != TYPE_TOMBSTONE {
            return Err(ValidationError::UnknownType(self.op_type.clone()));
        }

        if self.rotation_keys.is_empty() {
            return Err(ValidationError::EmptyRotationKeys);
        }

        if self.verification_methods.is_empty() {
            return Err(ValidationError::EmptyVerificationMethods);
        }
        for id in self.verification_methods.keys() {
            if !id.starts_with(VERIFICATION_METHOD_PREFIX) {
                return Err(ValidationError::InvalidMethodId(id.clone()));
            }
        }

        if self.prev.is_none()
            && (self.rotation_keys.is_empty() || self.verification_methods.is_empty())
        {
            return Err(ValidationError::GenesisMissingKeys);
        }

        Ok(())
    }

    /// Sign this operation with a rotation key.
    ///
    /// Validates first, then signs the canonical DAG-CBOR bytes of the
    /// unsigned wire form (ECDSA over their SHA-256). By convention the
    /// caller supplies the first key in the rotation list.
    pub fn sign(&self, rotation_key: &Key) -> Result<SignedOperation, Error> {
        self.validate()?;

        let bytes = canonical_cbor(&self.to_value()?)?;
        let signature = rotation_key.sign(&bytes)?;

        Ok(SignedOperation {
            operation: self.clone(),
            sig: base64url_encode(&signature),
        })
    }

    /// The unsigned wire form.
    pub fn to_wire(&self) -> WireOperation {
        WireOperation {
            op_type: self.op_type.clone(),
            rotation_keys: self.rotation_keys.iter().map(Key::encode_did_key).collect(),
            verification_methods: self
                .verification_methods
                .iter()
                .map(|(id, key)| (id.clone(), key.encode_did_key()))
                .collect(),
            also_known_as: self.also_known_as.clone(),
            services: self.services.clone(),
            prev: self.prev.clone(),
            sig: None,
        }
    }

    /// The unsigned wire form as a JSON value (input to canonicalization).
    pub fn to_value(&self) -> Result<Value, Error> {
        Ok(serde_json::to_value(self.to_wire())?)
    }
}

// ---------------------------------------------------------------------------
// SignedOperation
// ---------------------------------------------------------------------------

/// An [`Operation`] plus its rotation-key signature — the submittable form.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedOperation {
    /// The embedded unsigned operation.
    pub operation: Operation,
    /// base64url signature over the canonical bytes of `operation`.
    pub sig: String,
}

impl SignedOperation {
    /// Validate the signature's presence, then the embedded operation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sig.is_empty() {
            return Err(ValidationError::EmptySignature);
        }
        self.operation.validate()
    }

    /// The signed wire form.
    pub fn to_wire(&self) -> WireOperation {
        let mut wire = self.operation.to_wire();
        wire.sig = Some(self.sig.clone());
        wire
    }

    /// The signed wire form as a JSON value.
    pub fn to_value(&self) -> Result<Value, Error> {
        Ok(serde_json::to_value(self.to_wire())?)
    }

    /// The CID of this operation's canonical form — what the next
    /// operation in the chain will carry as `prev`.
    pub fn cid(&self) -> Result<String, Error> {
        Ok(cid_for_value(&self.to_value()?)?)
    }
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

/// The JSON shape operations take on the wire, exactly as the directory
/// serves and accepts them. Field order here *is* the canonical JSON key
/// order; keys are `did:key:` strings rather than key objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireOperation {
    /// Operation type.
    #[serde(rename = "type")]
    pub op_type: String,
    /// Rotation keys as `did:key:` strings.
    #[serde(rename = "rotationKeys")]
    pub rotation_keys: Vec<String>,
    /// Verification methods as `did:key:` strings, keyed by method id.
    #[serde(rename = "verificationMethods")]
    pub verification_methods: BTreeMap<String, String>,
    /// Alternative URIs.
    #[serde(rename = "alsoKnownAs", default)]
    pub also_known_as: Vec<String>,
    /// Advertised services.
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
    /// CID of the previous operation; explicit `null` for genesis.
    pub prev: Option<String>,
    /// Signature; absent on the unsigned canonical form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl WireOperation {
    /// Decode the wire form back into a typed [`SignedOperation`].
    ///
    /// Key strings become public-only [`Key`]s; a missing or empty `sig`
    /// is a validation error, since everything the directory serves is
    /// signed.
    pub fn into_signed(self) -> Result<SignedOperation, Error> {
        let rotation_keys = self
            .rotation_keys
            .iter()
            .map(|s| Key::from_did_key(s))
            .collect::<Result<Vec<_>, _>>()?;

        let verification_methods = self
            .verification_methods
            .iter()
            .map(|(id, s)| Ok((id.clone(), Key::from_did_key(s)?)))
            .collect::<Result<BTreeMap<_, _>, Error>>()?;

        let sig = match self.sig {
            Some(sig) if !sig.is_empty() => sig,
            _ => return Err(ValidationError::EmptySignature.into()),
        };

        Ok(SignedOperation {
            operation: Operation {
                op_type: self.op_type,
                rotation_keys,
                verification_methods,
                also_known_as: self.also_known_as,
                services: self.services,
                prev: self.prev,
            },
            sig,
        })
    }
}

// ---------------------------------------------------------------------------
// DID document rendering
// ---------------------------------------------------------------------------

/// A DID document projected from an operation — what resolvers see once
/// the directory has accepted the operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidDocument {
    /// JSON-LD context URIs.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The `did:plc:` identifier.
    pub id: String,
    /// Alternative URIs.
    #[serde(rename = "alsoKnownAs")]
    pub also_known_as: Vec<String>,
    /// Verification keys, one entry per method.
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,
    /// Advertised services.
    pub service: Vec<DocumentService>,
}

/// One verification key in a DID document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// DID URL fragment: `<did>#<method id>`.
    pub id: String,
    /// Key type tag.
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID that controls this key.
    pub controller: String,
    /// Public key in multibase form.
    #[serde(rename = "publicKeyMultibase")]
    pub public_key_multibase: String,
}

/// One service entry in a DID document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentService {
    /// DID URL fragment: `<did>#<service id>`.
    pub id: String,
    /// Service type tag.
    #[serde(rename = "type")]
    pub service_type: String,
    /// The service's URL.
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
}

/// Project an operation into the DID document it implies.
pub fn operation_to_did_document(id: &str, op: &Operation) -> DidDocument {
    let verification_method = op
        .verification_methods
        .iter()
        .map(|(method_id, key)| VerificationMethod {
            id: format!("{id}#{method_id}"),
            method_type: "Multikey".to_string(),
            controller: id.to_string(),
            public_key_multibase: key.encode_public(),
        })
        .collect();

    let service = op
        .services
        .iter()
        .map(|(service_id, service)| DocumentService {
            id: format!("{id}#{service_id}"),
            service_type: service.service_type.clone(),
            service_endpoint: service.endpoint.clone(),
        })
        .collect();

    DidDocument {
        context: vec![
            "https://www.w3.org/ns/did/v1".to_string(),
            "https://w3id.org/security/multikey/v1".to_string(),
        ],
        id: id.to_string(),
        also_known_as: op.also_known_as.clone(),
        verification_method,
        service,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Curve;

    fn method_map(key: &Key) -> BTreeMap<String, Key> {
        let mut map = BTreeMap::new();
        map.insert("fair_abc123".to_string(), key.clone());
        map
    }

    fn genesis_op() -> Operation {
        Operation {
            op_type: TYPE_OPERATION.to_string(),
            rotation_keys: vec![Key::generate(Curve::K256)],
            verification_methods: method_map(&Key::generate(Curve::Ed25519)),
            also_known_as: vec![],
            services: BTreeMap::new(),
            prev: None,
        }
    }

    #[test]
    fn valid_genesis_passes() {
        assert!(genesis_op().validate().is_ok());
    }

    #[test]
    fn unknown_type_rejected() {
        let mut op = genesis_op();
        op.op_type = "plc_create".to_string();
        assert!(matches!(
            op.validate(),
            Err(ValidationError::UnknownType(_))
        ));

        op.op_type = String::new();
        assert!(matches!(op.validate(), Err(ValidationError::EmptyType)));
    }

    #[test]
    fn empty_rotation_keys_rejected() {
        let mut op = genesis_op();
        op.rotation_keys.clear();
        assert!(matches!(
            op.validate(),
            Err(ValidationError::EmptyRotationKeys)
        ));
    }

    #[test]
    fn empty_verification_methods_rejected() {
        let mut op = genesis_op();
        op.verification_methods.clear();
        assert!(matches!(
            op.validate(),
            Err(ValidationError::EmptyVerificationMethods)
        ));
    }

    #[test]
    fn bad_method_id_rejected() {
        let mut op = genesis_op();
        op.verification_methods
            .insert("atproto".to_string(), Key::generate(Curve::Ed25519));
        assert!(matches!(
            op.validate(),
            Err(ValidationError::InvalidMethodId(_))
        ));
    }

    #[test]
    fn wire_form_key_order_and_shape() {
        let op = genesis_op();
        let json = serde_json::to_string(&op.to_value().unwrap()).unwrap();

        let type_pos = json.find("\"type\"").unwrap();
        let rot_pos = json.find("\"rotationKeys\"").unwrap();
        let ver_pos = json.find("\"verificationMethods\"").unwrap();
        let aka_pos = json.find("\"alsoKnownAs\"").unwrap();
        let svc_pos = json.find("\"services\"").unwrap();
        let prev_pos = json.find("\"prev\"").unwrap();
        assert!(type_pos < rot_pos && rot_pos < ver_pos && ver_pos < aka_pos);
        assert!(aka_pos < svc_pos && svc_pos < prev_pos);

        // Genesis serializes prev as an explicit null, no sig key at all.
        assert!(json.contains("\"prev\":null"));
        assert!(!json.contains("\"sig\""));
        assert!(json.contains("did:key:z"));
    }

    #[test]
    fn sign_produces_verifiable_signature() {
        let op = genesis_op();
        let rotation = op.rotation_keys[0].clone();
        let signed = op.sign(&rotation).unwrap();
        assert!(!signed.sig.is_empty());
        signed.validate().unwrap();

        let bytes = canonical_cbor(&op.to_value().unwrap()).unwrap();
        let sig = crate::encoding::base64url_decode(&signed.sig).unwrap();
        assert!(rotation.verify(&bytes, &sig));
    }

    #[test]
    fn sign_refuses_invalid_operation() {
        let mut op = genesis_op();
        let rotation = op.rotation_keys[0].clone();
        op.rotation_keys.clear();
        assert!(op.sign(&rotation).is_err());
    }

    #[test]
    fn signed_validate_rejects_empty_sig() {
        let op = genesis_op();
        let signed = SignedOperation {
            operation: op,
            sig: String::new(),
        };
        assert!(matches!(
            signed.validate(),
            Err(ValidationError::EmptySignature)
        ));
    }

    #[test]
    fn wire_roundtrip_preserves_public_state() {
        let op = genesis_op();
        let signed = op.sign(&op.rotation_keys[0].clone()).unwrap();

        let json = serde_json::to_string(&signed.to_wire()).unwrap();
        let wire: WireOperation = serde_json::from_str(&json).unwrap();
        let decoded = wire.into_signed().unwrap();

        assert_eq!(decoded.sig, signed.sig);
        assert_eq!(decoded.operation.op_type, signed.operation.op_type);
        // Decoded keys are public-only but compare equal on public identity.
        assert_eq!(decoded.operation.rotation_keys, signed.operation.rotation_keys);
        assert_eq!(
            decoded.operation.verification_methods,
            signed.operation.verification_methods
        );
        assert_eq!(decoded.cid().unwrap(), signed.cid().unwrap());
    }

    #[test]
    fn cid_is_stable_and_chains() {
        let op = genesis_op();
        let signed = op.sign(&op.rotation_keys[0].clone()).unwrap();
        let cid = signed.cid().unwrap();
        assert_eq!(signed.cid().unwrap(), cid);
        assert!(cid.starts_with('b'));

        let mut next = op.clone();
        next.prev = Some(cid.clone());
        let next_signed = next.sign(&op.rotation_keys[0].clone()).unwrap();
        assert_eq!(next_signed.operation.prev.as_deref(), Some(cid.as_str()));
        assert_ne!(next_signed.cid().unwrap(), cid);
    }

    #[test]
    fn did_document_projection() {
        let mut op = genesis_op();
        op.also_known_as.push("https://example.com/".to_string());
        op.services.insert(
            "fairpm_repo".to_string(),
            Service {
                service_type: "FairPackageManagementRepo".to_string(),
                endpoint: "https://example.com/wp-json/minifair/v1/packages/did:plc:x".to_string(),
            },
        );

        let doc = operation_to_did_document("did:plc:abc234", &op);
        assert_eq!(doc.id, "did:plc:abc234");
        assert_eq!(doc.also_known_as, vec!["https://example.com/"]);
        assert_eq!(doc.verification_method.len(), 1);
        assert!(doc.verification_method[0].id.starts_with("did:plc:abc234#fair_"));
        assert!(doc.verification_method[0].public_key_multibase.starts_with('z'));
        assert_eq!(doc.service.len(), 1);
        assert_eq!(doc.service[0].service_type, "FairPackageManagementRepo");
    }
}
