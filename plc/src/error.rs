//! # Error Taxonomy
//!
//! Every module owns its error enum; this
//! module aggregates them into one [`Error`] for callers that drive whole
//! workflows. The taxonomy, and what each class means for the caller:
//!
//! - [`ValidationError`] — malformed operation. Never sign or submit it.
//! - [`KeyError`] — wrong key type, public-only signing, bad material.
//!   Supply a correct key.
//! - [`EncodingError`] / [`CidError`] — corrupt input or unencodable
//!   value. No retry will help.
//! - [`RemoteError`] — the directory interaction failed; carries the
//!   stage and detail. Surfaced to the operator, never auto-retried.
//! - [`NotFoundError`] — a local identity or key lookup missed. Distinct
//!   from remote failures on purpose.
//! - [`StoreError`] — local persistence failed.

use thiserror::Error;

pub use crate::cid::CidError;
pub use crate::directory::RemoteError;
pub use crate::encoding::EncodingError;
pub use crate::keys::KeyError;
pub use crate::operation::ValidationError;
pub use crate::store::StoreError;

/// A local lookup that found nothing.
#[derive(Debug, Error)]
#[error("{kind} not found: {id}")]
pub struct NotFoundError {
    /// What kind of thing was looked up ("identity", "verification key").
    pub kind: &'static str,
    /// The identifier that missed.
    pub id: String,
}

/// Any failure the identity engine can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// A malformed operation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A key problem.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Corrupt encoded input.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// A value outside the canonical-CBOR subset.
    #[error(transparent)]
    Cid(#[from] CidError),

    /// A failed directory interaction.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A missed local lookup.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A JSON (de)serialization failure outside the directory client.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shorthand result for the crate's workflows.
pub type Result<T> = std::result::Result<T, Error>;
