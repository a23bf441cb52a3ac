//! # Identity Manager
//!
//! [`Did`] is the aggregate that ties the whole engine together: it holds
//! the local private key lists, builds and signs operations, talks to the
//! directory, and persists itself through a [`DidStore`].
//!
//! The mental model matters here: the identity's *authoritative* state is
//! the latest entry of an append-only remote log. The key lists held
//! locally are a working draft. Producing a new operation always means
//! fetching the directory's current tail, diffing the draft against it,
//! and — only if something actually changed — signing a new entry whose
//! `prev` is the tail's CID. The chain is never mutated locally.
//!
//! Key mutations ([`Did::generate_verification_key`],
//! [`Did::invalidate_verification_key`]) touch only the in-memory draft.
//! Nothing is rolled back if a later [`Did::update`] or [`Did::save`]
//! fails; the caller decides whether to retry or discard.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::{PlcConfig, SERVICE_ID_PACKAGE_REPO, SERVICE_TYPE_PACKAGE_REPO};
use crate::directory::{DirectoryClient, PublicationStatus};
use crate::error::{Error, NotFoundError, Result};
use crate::keys::{Curve, Key};
use crate::operation::{
    operation_to_did_document, DidDocument, Operation, Service, SignedOperation, WireOperation,
    TYPE_OPERATION, VERIFICATION_METHOD_PREFIX,
};
use crate::store::{DidRecord, DidStore};

/// Length of the hex id fragment in a verification method id.
const METHOD_ID_HEX_CHARS: usize = 6;

/// What [`Did::update`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// A new operation was signed and accepted by the directory.
    Updated(SignedOperation),
    /// Local state already matches the directory's tail. Not an error.
    NoChanges,
}

/// A publisher identity under local control.
#[derive(Clone)]
pub struct Did {
    /// The immutable `did:plc:` identifier, fixed at genesis.
    id: String,
    /// Encoded-private rotation keys; the first signs operations.
    rotation_keys: Vec<String>,
    /// Encoded-private verification keys; the last signs new artifacts.
    verification_keys: Vec<String>,
    /// Deployment configuration.
    config: PlcConfig,
    /// Client for the configured directory.
    directory: DirectoryClient,
}

impl Did {
    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create a brand-new identity: generate a rotation and a verification
    /// key, sign the genesis operation, derive the identifier from it,
    /// register it with the directory, and persist.
    ///
    /// If submission fails the error is fatal and nothing is persisted —
    /// an unregistered identifier is not usable.
    pub fn create(store: &dyn DidStore, config: &PlcConfig) -> Result<Self> {
        let rotation = Key::generate(Curve::K256);
        let verification = Key::generate(Curve::Ed25519);

        let mut did = Self {
            id: String::new(),
            rotation_keys: vec![rotation.encode_private()?],
            verification_keys: vec![verification.encode_private()?],
            config: config.clone(),
            directory: DirectoryClient::new(&config.directory_url),
        };

        let genesis = Operation {
            op_type: TYPE_OPERATION.to_string(),
            rotation_keys: vec![rotation.clone()],
            verification_methods: did.verification_methods_for_op()?,
            also_known_as: vec![],
            services: BTreeMap::new(),
            prev: None,
        };
        let signed = genesis.sign(&rotation)?;

        let suffix = crate::cid::plc_suffix(&signed.to_value()?)?;
        did.id = format!("did:plc:{suffix}");
        info!(id = %did.id, "derived identifier from genesis operation");

        did.directory.submit(&did.id, &signed)?;
        did.save(store)?;
        Ok(did)
    }

    /// Load an identity from the store.
    pub fn load(store: &dyn DidStore, id: &str, config: &PlcConfig) -> Result<Self> {
        let record = store.get(id)?.ok_or(NotFoundError {
            kind: "identity",
            id: id.to_string(),
        })?;
        Ok(Self::from_record(record, config))
    }

    /// Rehydrate an identity from a persisted record.
    ///
    /// Also the entry point for importing an identity created elsewhere.
    pub fn from_record(record: DidRecord, config: &PlcConfig) -> Self {
        Self {
            id: record.id,
            rotation_keys: record.rotation_keys,
            verification_keys: record.verification_keys,
            config: config.clone(),
            directory: DirectoryClient::new(&config.directory_url),
        }
    }

    /// Persist the identity's record.
    pub fn save(&self, store: &dyn DidStore) -> Result<()> {
        store.put(&DidRecord {
            id: self.id.clone(),
            rotation_keys: self.rotation_keys.clone(),
            verification_keys: self.verification_keys.clone(),
        })?;
        Ok(())
    }

    /// The `did:plc:` identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    // -----------------------------------------------------------------------
    // Key access & lifecycle
    // -----------------------------------------------------------------------

    /// Decode the rotation keys (private form).
    pub fn rotation_keys(&self) -> Result<Vec<Key>> {
        self.rotation_keys
            .iter()
            .map(|k| Ok(Key::from_private(k)?))
            .collect()
    }

    /// Decode the verification keys (private form).
    pub fn verification_keys(&self) -> Result<Vec<Key>> {
        self.verification_keys
            .iter()
            .map(|k| Ok(Key::from_private(k)?))
            .collect()
    }

    /// Generate a fresh Ed25519 verification key and append it to the
    /// draft. Does not persist and does not touch the directory — follow
    /// with [`Did::update`] and [`Did::save`].
    pub fn generate_verification_key(&mut self) -> Result<Key> {
        let key = Key::generate(Curve::Ed25519);
        self.verification_keys.push(key.encode_private()?);
        Ok(key)
    }

    /// Remove a verification key from the draft.
    ///
    /// Matches by exact encoded-private string; if that misses, the
    /// legacy encoding is tried once (old records persisted it). Returns
    /// `false`, leaving the list untouched, when neither form matches.
    /// Removes exactly one entry otherwise.
    ///
    /// This method does not stop you removing the last key — callers
    /// (the admin surface) are responsible for that safeguard.
    pub fn invalidate_verification_key(&mut self, key: &Key) -> Result<bool> {
        let mut encoded = key.encode_private()?;

        if !self.verification_keys.contains(&encoded) {
            match key.encode_private_legacy() {
                Some(legacy) if self.verification_keys.contains(&legacy) => {
                    warn!(id = %self.id, "matched verification key via legacy encoding");
                    encoded = legacy;
                }
                _ => return Ok(false),
            }
        }

        self.verification_keys.retain(|k| k != &encoded);
        Ok(true)
    }

    /// The key that signs new artifacts: the newest (last) verification
    /// key. Older keys remain listed so existing artifacts keep verifying.
    pub fn artifact_signing_key(&self) -> Result<Key> {
        let keys = self.verification_keys()?;
        keys.into_iter().next_back().ok_or_else(|| {
            NotFoundError {
                kind: "verification key",
                id: self.id.clone(),
            }
            .into()
        })
    }

    /// Build the verification method map for an operation: each key under
    /// an id of `fair_` plus the first six hex characters of the SHA-256
    /// of its public encoding.
    fn verification_methods_for_op(&self) -> Result<BTreeMap<String, Key>> {
        let mut methods = BTreeMap::new();
        for key in self.verification_keys()? {
            let digest = Sha256::digest(key.encode_public().as_bytes());
            let method_id = format!(
                "{}{}",
                VERIFICATION_METHOD_PREFIX,
                &hex::encode(digest)[..METHOD_ID_HEX_CHARS]
            );
            methods.insert(method_id, key);
        }
        Ok(methods)
    }

    // -----------------------------------------------------------------------
    // Directory interaction
    // -----------------------------------------------------------------------

    /// Fetch the last operation in this identity's log. Always a fresh
    /// read — `prev` computed from a stale tail corrupts the chain.
    pub fn fetch_last_op(&self) -> Result<SignedOperation> {
        Ok(self.directory.fetch_last(&self.id)?)
    }

    /// Fetch the identity's full operation history.
    pub fn fetch_audit_log(&self) -> Result<Vec<WireOperation>> {
        Ok(self.directory.fetch_audit_log(&self.id)?)
    }

    /// Ask the directory whether this identity resolves.
    pub fn is_published(&self) -> Result<PublicationStatus> {
        Ok(self.directory.publication_status(&self.id)?)
    }

    /// Build the update operation, if anything actually changed.
    ///
    /// Fetches the directory's tail, assembles a candidate operation from
    /// the local draft (current keys, the fixed package-repository service
    /// endpoint, the tail's `alsoKnownAs` carried forward, `prev` set to
    /// the tail's CID), and compares field for field. Identical state
    /// returns `None`; otherwise the candidate is signed with the first
    /// rotation key.
    ///
    /// The comparison is order-sensitive for the key lists, matching the
    /// directory's own treatment of them as ordered arrays.
    pub fn prepare_update_op(&self) -> Result<Option<SignedOperation>> {
        let last = self.fetch_last_op()?;
        let last_cid = last.cid()?;

        let mut services = BTreeMap::new();
        services.insert(
            SERVICE_ID_PACKAGE_REPO.to_string(),
            Service {
                service_type: SERVICE_TYPE_PACKAGE_REPO.to_string(),
                endpoint: self.config.repo_endpoint(&self.id),
            },
        );

        let candidate = Operation {
            op_type: TYPE_OPERATION.to_string(),
            rotation_keys: self.rotation_keys()?,
            verification_methods: self.verification_methods_for_op()?,
            also_known_as: last.operation.also_known_as.clone(),
            services,
            prev: Some(last_cid),
        };

        let unchanged = candidate.rotation_keys == last.operation.rotation_keys
            && candidate.verification_methods == last.operation.verification_methods
            && candidate.also_known_as == last.operation.also_known_as
            && candidate.services == last.operation.services;
        if unchanged {
            return Ok(None);
        }

        let rotation_keys = self.rotation_keys()?;
        let signer = rotation_keys.first().ok_or(NotFoundError {
            kind: "rotation key",
            id: self.id.clone(),
        })?;
        Ok(Some(candidate.sign(signer)?))
    }

    /// Push local changes to the directory.
    ///
    /// A no-op outcome is reported, not raised — "nothing changed" is a
    /// perfectly healthy answer.
    pub fn update(&self) -> Result<UpdateOutcome> {
        match self.prepare_update_op()? {
            None => {
                info!(id = %self.id, "no changes to update");
                Ok(UpdateOutcome::NoChanges)
            }
            Some(op) => {
                self.directory.submit(&self.id, &op)?;
                Ok(UpdateOutcome::Updated(op))
            }
        }
    }

    /// The DID document the directory would serve after the pending
    /// update — or the current one, when nothing is pending.
    pub fn expected_document(&self) -> Result<DidDocument> {
        let op = match self.prepare_update_op()? {
            Some(signed) => signed.operation,
            None => self.fetch_last_op()?.operation,
        };
        Ok(operation_to_did_document(&self.id, &op))
    }
}

impl std::fmt::Debug for Did {
    /// Private key material never reaches debug output — only the id and
    /// how many keys of each kind the draft holds.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Did")
            .field("id", &self.id)
            .field("rotation_keys", &self.rotation_keys.len())
            .field("verification_keys", &self.verification_keys.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
