// Copyright (c) 2026 FAIR Package Management. MIT License.
// See LICENSE for details.

//! # fair-plc — Publisher Identity Engine
//!
//! Self-sovereign identity for software publishers, built on the PLC DID
//! method: an append-only log of signed, content-hash-chained operations
//! anchored at a public directory. The publisher holds the keys; the
//! directory holds the history; this crate holds the machinery between.
//!
//! ## Architecture
//!
//! The modules layer from encodings up to the identity aggregate:
//!
//! - **encoding** — base32, base64url, multibase. Everything else stands
//!   on these.
//! - **keys** — the two key families: secp256k1 rotation keys (control
//!   the identity) and Ed25519 verification keys (sign content).
//! - **cid** — canonical DAG-CBOR and CID strings; the links of the
//!   operation chain.
//! - **operation** — unsigned and signed operations, validation, and the
//!   wire projection the directory understands.
//! - **directory** — the blocking HTTP client for the PLC directory.
//! - **store** — local persistence of the one thing the directory can't
//!   give back: private key material.
//! - **did** — the identity manager; genesis, key lifecycle, update
//!   diffing.
//! - **artifact** — content hashing and signing for published packages.
//! - **config** — explicit deployment configuration; no globals.
//! - **error** — the crate-wide error taxonomy.
//!
//! ## Design stance
//!
//! 1. The remote log is authoritative; local state is a draft to be
//!    diffed against it, never a chain to be mutated.
//! 2. Wrong canonical bytes are worse than an error — every projection
//!    that gets hashed or signed lives in exactly one code path.
//! 3. `validate()` runs before every sign and every submit. No
//!    exceptions, including our own tests.
//! 4. Remote failures carry the stage they died at and are never
//!    retried silently; a human re-triggers the action.

pub mod artifact;
pub mod cid;
pub mod config;
pub mod did;
pub mod directory;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod operation;
pub mod store;

pub use config::PlcConfig;
pub use did::{Did, UpdateOutcome};
pub use directory::{DirectoryClient, PublicationStatus};
pub use error::{Error, Result};
pub use keys::{Curve, Key};
pub use operation::{Operation, Service, SignedOperation};
pub use store::{DidRecord, DidStore, MemoryStore, SledStore};
