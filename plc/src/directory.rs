//! # Directory Client
//!
//! Blocking HTTP client for the PLC directory service. Four endpoints,
//! no more:
//!
//! | Request                    | Meaning                                |
//! |----------------------------|----------------------------------------|
//! | `GET  /{did}/log/last`     | last operation in the identity's log   |
//! | `GET  /{did}/log/audit`    | the full operation history             |
//! | `GET  /{did}`              | publication status (200 / 404 / 410)   |
//! | `POST /{did}`              | submit a signed operation              |
//!
//! Reads are intentionally uncached — `prev` must always be computed from
//! the directory's current tail, and a stale read here corrupts the hash
//! chain. Failures carry the stage they happened at and are surfaced to
//! the caller; nothing retries automatically (a human operator re-triggers
//! the action).

use reqwest::blocking::Client;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info};

use crate::operation::{SignedOperation, WireOperation};

/// The media type the directory serves DID data as.
const DID_MEDIA_TYPE: &str = "application/did+ld+json";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed interaction with the directory, tagged with the stage it
/// failed at (`fetch-last`, `fetch-audit`, `check-publication`, `submit`).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never completed (DNS, TCP, TLS, timeout...).
    #[error("{stage}: transport error: {source}")]
    Transport {
        /// Which directory interaction failed.
        stage: &'static str,
        /// The underlying client error.
        source: reqwest::Error,
    },

    /// The directory answered with a non-200 status.
    #[error("{stage}: directory returned HTTP {status}: {body}")]
    Status {
        /// Which directory interaction failed.
        stage: &'static str,
        /// The HTTP status code received.
        status: u16,
        /// The response body, verbatim, as error detail.
        body: String,
    },

    /// The directory answered 200 with a body we couldn't parse.
    #[error("{stage}: malformed directory response: {detail}")]
    Malformed {
        /// Which directory interaction failed.
        stage: &'static str,
        /// Parse error detail.
        detail: String,
    },
}

// ---------------------------------------------------------------------------
// Publication status
// ---------------------------------------------------------------------------

/// What `GET /{did}` says about an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationStatus {
    /// 200 — the identity resolves.
    Published,
    /// 404 — the directory has never seen it.
    Unknown,
    /// 410 — tombstoned.
    Tombstoned,
}

// ---------------------------------------------------------------------------
// DirectoryClient
// ---------------------------------------------------------------------------

/// A client bound to one directory base URL.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    base_url: String,
    client: Client,
}

impl DirectoryClient {
    /// Create a client for the given base URL (e.g. `https://plc.directory`).
    /// A trailing slash is tolerated and stripped.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// The directory base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the last operation in an identity's log.
    ///
    /// This is what `prev` gets computed from when preparing an update.
    pub fn fetch_last(&self, did: &str) -> Result<SignedOperation, RemoteError> {
        const STAGE: &str = "fetch-last";
        let url = format!("{}/{}/log/last", self.base_url, did);
        debug!(%url, "fetching last operation");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, DID_MEDIA_TYPE)
            .send()
            .map_err(|source| RemoteError::Transport { stage: STAGE, source })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|source| RemoteError::Transport { stage: STAGE, source })?;
        if status != StatusCode::OK {
            return Err(RemoteError::Status {
                stage: STAGE,
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireOperation =
            serde_json::from_str(&body).map_err(|e| RemoteError::Malformed {
                stage: STAGE,
                detail: e.to_string(),
            })?;
        wire.into_signed().map_err(|e| RemoteError::Malformed {
            stage: STAGE,
            detail: e.to_string(),
        })
    }

    /// Fetch an identity's full operation history.
    pub fn fetch_audit_log(&self, did: &str) -> Result<Vec<WireOperation>, RemoteError> {
        const STAGE: &str = "fetch-audit";
        let url = format!("{}/{}/log/audit", self.base_url, did);
        debug!(%url, "fetching audit log");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, DID_MEDIA_TYPE)
            .send()
            .map_err(|source| RemoteError::Transport { stage: STAGE, source })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|source| RemoteError::Transport { stage: STAGE, source })?;
        if status != StatusCode::OK {
            return Err(RemoteError::Status {
                stage: STAGE,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RemoteError::Malformed {
            stage: STAGE,
            detail: e.to_string(),
        })
    }

    /// Ask the directory whether an identity is published.
    pub fn publication_status(&self, did: &str) -> Result<PublicationStatus, RemoteError> {
        const STAGE: &str = "check-publication";
        let url = format!("{}/{}", self.base_url, did);
        debug!(%url, "checking publication status");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, DID_MEDIA_TYPE)
            .send()
            .map_err(|source| RemoteError::Transport { stage: STAGE, source })?;

        match response.status() {
            StatusCode::OK => Ok(PublicationStatus::Published),
            StatusCode::NOT_FOUND => Ok(PublicationStatus::Unknown),
            StatusCode::GONE => Ok(PublicationStatus::Tombstoned),
            other => Err(RemoteError::Status {
                stage: STAGE,
                status: other.as_u16(),
                body: response.text().unwrap_or_default(),
            }),
        }
    }

    /// Submit a signed operation, extending the identity's log.
    ///
    /// Validates the operation once more on the way out — an invalid
    /// operation must never reach the wire. Any non-200 answer is an
    /// error carrying the response body as detail.
    pub fn submit(&self, did: &str, op: &SignedOperation) -> Result<(), RemoteError> {
        const STAGE: &str = "submit";
        op.validate().map_err(|e| RemoteError::Malformed {
            stage: STAGE,
            detail: format!("refusing to submit invalid operation: {e}"),
        })?;

        let url = format!("{}/{}", self.base_url, did);
        info!(%did, prev = ?op.operation.prev, "submitting operation");

        let response = self
            .client
            .post(&url)
            .json(&op.to_wire())
            .send()
            .map_err(|source| RemoteError::Transport { stage: STAGE, source })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::Status {
                stage: STAGE,
                status: status.as_u16(),
                body,
            });
        }

        info!(%did, "operation accepted by directory");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
