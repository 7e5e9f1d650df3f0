// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! PowerDNS backend abstraction.
//!
//! The reconcile cores consume two capability traits, [`ZoneOperations`] and
//! [`RecordOperations`], instead of a concrete HTTP client. This keeps the
//! state machines testable against mocks and confines the wire protocol to
//! [`client::PdnsClient`].
//!
//! The error taxonomy is deliberately small: the cores only ever distinguish
//! not-found (local idempotence), conflict (pre-existing zone on the
//! backend), validation (the backend rejected the payload, message surfaced
//! verbatim on the resource status) and transport (retried by the runtime).

pub mod client;

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by backend operations.
#[derive(Error, Debug)]
pub enum PdnsError {
    /// The zone or record set does not exist on the backend (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend already holds a conflicting object (HTTP 409)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend rejected the payload (HTTP 400/422); the message is the
    /// backend's own and is surfaced verbatim in status conditions
    #[error("{0}")]
    Validation(String),

    /// Connection-level failure; the reconcile is retried by the runtime
    #[error("backend transport failure: {0}")]
    Transport(String),
}

impl PdnsError {
    /// True when the error is the structured not-found variant
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for PdnsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Error body returned by the backend on failed requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    /// A human readable error message
    #[serde(default)]
    pub error: String,
    /// Optional array of multiple errors encountered during processing
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

/// Snapshot of a zone as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ZoneInfo {
    /// Opaque zone id, safe for embedding in URLs
    #[serde(default)]
    pub id: Option<String>,
    /// Canonical zone name, with trailing dot
    #[serde(default)]
    pub name: Option<String>,
    /// Zone kind: Native, Master, Slave, Producer or Consumer
    #[serde(default)]
    pub kind: Option<String>,
    /// The SOA serial number
    #[serde(default)]
    pub serial: Option<u32>,
    /// The SOA serial notifications have been sent out for
    #[serde(default)]
    pub notified_serial: Option<u32>,
    /// The SOA serial as seen in query responses
    #[serde(default)]
    pub edited_serial: Option<u32>,
    /// IP addresses configured as primaries ("Slave" kind zones only)
    #[serde(default)]
    pub masters: Option<Vec<String>>,
    /// Whether the zone is DNSSEC signed
    #[serde(default)]
    pub dnssec: Option<bool>,
    /// Catalog zone membership
    #[serde(default)]
    pub catalog: Option<String>,
    /// The SOA-EDIT-API metadata item
    #[serde(default)]
    pub soa_edit_api: Option<String>,
    /// RRsets, present only when the zone detail endpoint is queried
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrsets: Option<Vec<RrSet>>,
}

/// Payload for creating a zone on the backend.
///
/// Names are canonicalized by the caller; DNSSEC is always off at creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneCreate {
    /// Canonical zone name
    pub name: String,
    /// Zone kind
    pub kind: String,
    /// Canonical nameserver hostnames for the apex NS record set
    pub nameservers: Vec<String>,
    /// Canonical catalog zone, when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    /// SOA-EDIT-API policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_edit_api: Option<String>,
    /// Forced false at creation; DNSSEC key management is not the operator's job
    pub dnssec: bool,
}

/// Metadata mutation applied to an existing zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneChanges {
    /// New zone kind
    pub kind: String,
    /// New canonical catalog zone; an empty string detaches the zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    /// New SOA-EDIT-API policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_edit_api: Option<String>,
}

/// A resource record set: all records sharing one name and type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RrSet {
    /// Canonical name of the record set
    pub name: String,
    /// Record type (A, AAAA, MX, ...)
    #[serde(rename = "type")]
    pub rtype: String,
    /// DNS TTL of the records, in seconds
    #[serde(default)]
    pub ttl: u32,
    /// REPLACE or DELETE; only sent on mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changetype: Option<String>,
    /// Record contents, in zone order
    #[serde(default)]
    pub records: Vec<Record>,
    /// Comments attached to the record set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

/// Changetype value replacing a record set in place.
pub const CHANGETYPE_REPLACE: &str = "REPLACE";

/// Changetype value deleting all records of a name and type.
pub const CHANGETYPE_DELETE: &str = "DELETE";

/// A single record within a record set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Record {
    /// The content of this record
    pub content: String,
    /// When unset, the record is not disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

/// A comment about a record set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Comment {
    /// The actual comment
    pub content: String,
    /// Name of the account that added the comment
    pub account: String,
    /// Timestamp of the last change to the comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<u64>,
}

/// Replacement payload for one record set, as assembled by the RRset core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RrSetChange {
    /// Canonical name of the record set
    pub name: String,
    /// Record type
    pub rtype: String,
    /// TTL in seconds
    pub ttl: u32,
    /// Record contents in declared order
    pub records: Vec<String>,
    /// Optional comment, attributed to the operator account
    pub comment: Option<String>,
}

/// Zone-level operations the reconcile cores depend on.
#[async_trait]
pub trait ZoneOperations: Send + Sync {
    /// Fetch a zone snapshot; `PdnsError::NotFound` when absent.
    async fn get_zone(&self, zone_name: &str) -> Result<ZoneInfo, PdnsError>;

    /// Create a zone; `PdnsError::Conflict` when the canonical name exists.
    async fn create_zone(&self, zone: &ZoneCreate) -> Result<ZoneInfo, PdnsError>;

    /// Apply a metadata mutation (kind, catalog, SOA-EDIT-API).
    async fn update_zone(&self, zone_name: &str, changes: &ZoneChanges) -> Result<(), PdnsError>;

    /// Delete a zone. Callers treat `NotFound` as success.
    async fn delete_zone(&self, zone_name: &str) -> Result<(), PdnsError>;
}

/// Record-level operations the reconcile cores depend on.
#[async_trait]
pub trait RecordOperations: Send + Sync {
    /// List record sets matching a name and type.
    ///
    /// The backend is known to over-report comments for adjacent record sets
    /// in the same response; callers must filter by exact canonical name and
    /// type before comparing.
    async fn get_rrsets(
        &self,
        zone_name: &str,
        name: &str,
        rtype: &str,
    ) -> Result<Vec<RrSet>, PdnsError>;

    /// Replace a record set in place (REPLACE changetype).
    async fn replace_rrset(&self, zone_name: &str, change: &RrSetChange) -> Result<(), PdnsError>;

    /// Delete a record set (DELETE changetype).
    async fn delete_rrset(
        &self,
        zone_name: &str,
        name: &str,
        rtype: &str,
    ) -> Result<(), PdnsError>;
}
