//! # Identity Store
//!
//! Local persistence for identity records. The record is deliberately
//! tiny — the DID string plus two ordered lists of encoded-private keys —
//! because the authoritative state of an identity lives in the directory's
//! operation log, not on disk here. What we persist is exactly what cannot
//! be recovered from the log: the private key material.
//!
//! [`DidStore`] is the seam the identity manager talks through. Production
//! hosts use [`SledStore`] (one sled tree, JSON-encoded records, keyed by
//! DID); tests use [`MemoryStore`].

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Name of the sled tree holding identity records.
const TREE_IDENTITIES: &str = "identities";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying sled database failed.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// A record failed to encode or decode.
    #[error("record serialization error: {0}")]
    Serialization(String),
}

// ---------------------------------------------------------------------------
// DidRecord
// ---------------------------------------------------------------------------

/// The persisted form of an identity: its DID and private key lists.
///
/// Keys are stored in their encoded-private multibase form, in order —
/// order matters, since the first rotation key is the authoritative signer
/// and the last verification key signs new artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidRecord {
    /// The `did:plc:` identifier.
    pub id: String,
    /// Encoded-private rotation keys, authoritative signer first.
    pub rotation_keys: Vec<String>,
    /// Encoded-private verification keys, newest last.
    pub verification_keys: Vec<String>,
}

// ---------------------------------------------------------------------------
// DidStore
// ---------------------------------------------------------------------------

/// Key-value persistence for identity records, keyed by DID.
pub trait DidStore {
    /// Fetch a record, `None` if the DID is unknown to this store.
    fn get(&self, id: &str) -> Result<Option<DidRecord>, StoreError>;

    /// Insert or replace a record.
    fn put(&self, record: &DidRecord) -> Result<(), StoreError>;

    /// All DIDs this store holds records for.
    fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}

// ---------------------------------------------------------------------------
// SledStore
// ---------------------------------------------------------------------------

/// Sled-backed identity store. Records are JSON values in a single tree,
/// keyed by the DID string.
#[derive(Debug, Clone)]
pub struct SledStore {
    identities: sled::Tree,
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self {
            identities: db.open_tree(TREE_IDENTITIES)?,
        })
    }

    /// A temporary store that vanishes on drop. For tests.
    pub fn open_temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            identities: db.open_tree(TREE_IDENTITIES)?,
        })
    }
}

impl DidStore for SledStore {
    fn get(&self, id: &str) -> Result<Option<DidRecord>, StoreError> {
        match self.identities.get(id.as_bytes())? {
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn put(&self, record: &DidRecord) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.identities.insert(record.id.as_bytes(), bytes)?;
        self.identities.flush()?;
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        for entry in self.identities.iter() {
            let (key, _) = entry?;
            ids.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, DidRecord>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DidStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<DidRecord>, StoreError> {
        Ok(self.records.lock().get(id).cloned())
    }

    fn put(&self, record: &DidRecord) -> Result<(), StoreError> {
        self.records.lock().insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records.lock().keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
