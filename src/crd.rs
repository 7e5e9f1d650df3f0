// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for PowerDNS management.
//!
//! This module defines the four Kubernetes Custom Resources reconciled by the
//! operator against a PowerDNS authoritative server:
//!
//! - [`Zone`] - a namespace-scoped DNS zone
//! - [`ClusterZone`] - a cluster-scoped DNS zone
//! - [`RRset`] - a namespace-scoped resource record set
//! - [`ClusterRRset`] - a cluster-scoped resource record set
//!
//! The namespaced and cluster-scoped variants of each shape share their spec
//! and status schemas: the cluster-scoped spec flattens the namespaced one,
//! so the two serialize identically and the reconcile cores can be written
//! once against the [`crate::resources`] traits.
//!
//! # Example: Creating a Zone
//!
//! ```yaml
//! apiVersion: dns.cav.enablers.ob/v1alpha2
//! kind: Zone
//! metadata:
//!   name: example1.org
//!   namespace: default
//! spec:
//!   kind: Native
//!   nameservers:
//!     - ns1.example1.org
//!     - ns2.example1.org
//!   catalog: catalog.example1.org.
//! ```
//!
//! # Example: Creating an RRset
//!
//! ```yaml
//! apiVersion: dns.cav.enablers.ob/v1alpha2
//! kind: RRset
//! metadata:
//!   name: test.example1.org
//!   namespace: default
//! spec:
//!   type: A
//!   name: test
//!   ttl: 300
//!   records:
//!     - "192.0.2.1"
//!   zoneRef:
//!     name: example1.org
//!     kind: Zone
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Zone kind as understood by the PowerDNS backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ZoneKind {
    /// Zone data is authoritative on this server, no replication
    #[default]
    Native,
    /// This server is the primary for the zone
    Master,
    /// This server replicates the zone from a primary
    Slave,
    /// Catalog producer zone
    Producer,
    /// Catalog consumer zone
    Consumer,
}

impl ZoneKind {
    /// String form expected by the backend API
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "Native",
            Self::Master => "Master",
            Self::Slave => "Slave",
            Self::Producer => "Producer",
            Self::Consumer => "Consumer",
        }
    }
}

/// Backend policy controlling how a zone's SOA serial is recomputed when the
/// zone content changes through the API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SoaEditApi {
    /// YYYYMMDDnn serial, incremented per change within a day
    #[default]
    Default,
    /// Serial is bumped by one on each change
    Increase,
    /// Serial is set to the UNIX timestamp of the change
    Epoch,
}

impl SoaEditApi {
    /// String form expected by the backend API
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Increase => "INCREASE",
            Self::Epoch => "EPOCH",
        }
    }
}

/// The reconciler's summary verdict for a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SyncStatus {
    /// Backend state matches the declared spec
    Succeeded,
    /// Reconciliation failed; see the Available condition for the cause
    Failed,
    /// Waiting on an external prerequisite (e.g. the parent zone)
    Pending,
}

impl SyncStatus {
    /// Label value used by the status metrics
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Pending => "Pending",
        }
    }
}

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. The operator maintains a single "Available" condition.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,

    /// Generation the condition was set for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

/// Zone status, shared by [`Zone`] and [`ClusterZone`].
///
/// Mirrors the authoritative metadata re-read from the backend after each
/// successful synchronization.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatus {
    /// Opaque zone id assigned by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Canonical zone name as known to the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Zone kind as reported by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// The SOA serial number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial: Option<u32>,

    /// The SOA serial notifications have been sent out for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notified_serial: Option<u32>,

    /// The SOA serial as seen in query responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_serial: Option<u32>,

    /// IP addresses configured as primaries for this zone (Slave kind only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masters: Option<Vec<String>>,

    /// Whether the zone is DNSSEC signed on the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnssec: Option<bool>,

    /// Catalog zone this zone is a member of
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// Generation last acted upon by the reconciler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Summary verdict of the last reconciliation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// `Zone` defines a namespace-scoped DNS zone hosted on the PowerDNS backend.
///
/// The zone's fully qualified name on the backend is derived from the
/// resource's own metadata name. At most one Zone or ClusterZone may own a
/// given canonical name; violators are quiesced into the Failed sync status.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "Zone",
    namespaced,
    shortname = "zo",
    doc = "Zone represents a namespace-scoped DNS zone managed on a PowerDNS authoritative server.",
    printcolumn = r#"{"name":"Serial","type":"integer","jsonPath":".status.serial"}"#,
    printcolumn = r#"{"name":"ID","type":"string","jsonPath":".status.id"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.syncStatus"}"#
)]
#[kube(status = "ZoneStatus")]
#[serde(rename_all = "camelCase")]
pub struct ZoneSpec {
    /// Zone kind on the backend.
    pub kind: ZoneKind,

    /// Ordered list of authoritative nameserver hostnames for the zone apex.
    ///
    /// At least one entry is required. Entries may be bare or canonical;
    /// they are canonicalized before being sent to the backend.
    #[schemars(length(min = 1))]
    #[schemars(inner(regex(
        pattern = r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*\.?$"
    )))]
    pub nameservers: Vec<String>,

    /// Catalog zone to register this zone in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// SOA-EDIT-API policy controlling serial recomputation on change.
    ///
    /// Defaults to DEFAULT (YYYYMMDDnn).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soa_edit_api: Option<SoaEditApi>,
}

/// `ClusterZone` is the cluster-scoped variant of [`Zone`].
///
/// Its spec flattens [`ZoneSpec`], so both kinds persist the same shape.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "ClusterZone",
    shortname = "czo",
    doc = "ClusterZone represents a cluster-scoped DNS zone managed on a PowerDNS authoritative server.",
    printcolumn = r#"{"name":"Serial","type":"integer","jsonPath":".status.serial"}"#,
    printcolumn = r#"{"name":"ID","type":"string","jsonPath":".status.id"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.syncStatus"}"#
)]
#[kube(status = "ZoneStatus")]
pub struct ClusterZoneSpec {
    #[serde(flatten)]
    pub zone: ZoneSpec,
}

/// Kind of resource a [`ZoneRef`] may point at.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ZoneRefKind {
    /// Namespace-scoped zone in the RRset's own namespace
    #[default]
    Zone,
    /// Cluster-scoped zone
    ClusterZone,
}

/// Typed reference from an RRset to its parent zone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRef {
    /// Name of the parent Zone or ClusterZone resource.
    pub name: String,

    /// Kind of the parent resource.
    ///
    /// A namespace-scoped RRset may target either kind; a ClusterRRset may
    /// only target a ClusterZone.
    #[serde(default)]
    pub kind: ZoneRefKind,
}

/// RRset status, shared by [`RRset`] and [`ClusterRRset`].
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RRsetStatus {
    /// Canonical fully qualified name of the record set on the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_entry_name: Option<String>,

    /// Generation last acted upon by the reconciler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Summary verdict of the last reconciliation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,

    /// Last time a change was applied to the backend (RFC3339 format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// `RRset` defines one resource record set of a single type within a parent
/// zone.
///
/// The record's identity on the backend is its canonical entry name plus its
/// type; at most one RRset or ClusterRRset may own a given identity.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "RRset",
    namespaced,
    shortname = "rr",
    doc = "RRset represents a DNS resource record set of one type inside a parent Zone or ClusterZone.",
    printcolumn = r#"{"name":"Zone","type":"string","jsonPath":".spec.zoneRef.name"}"#,
    printcolumn = r#"{"name":"Name","type":"string","jsonPath":".status.dnsEntryName"}"#,
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#,
    printcolumn = r#"{"name":"TTL","type":"integer","jsonPath":".spec.ttl"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.syncStatus"}"#,
    printcolumn = r#"{"name":"Records","type":"string","jsonPath":".spec.records"}"#
)]
#[kube(status = "RRsetStatus")]
#[serde(rename_all = "camelCase")]
pub struct RRsetSpec {
    /// DNS record type (A, AAAA, CNAME, MX, NS, PTR, SRV, TXT, ...).
    #[schemars(regex(pattern = r"^[A-Z0-9]+$"))]
    pub r#type: String,

    /// Record label within the zone.
    ///
    /// May be a bare label ("test"), the apex ("@"), or a canonical name
    /// ("test.example.org."). Immutable after creation.
    pub name: String,

    /// Time To Live of the record set, in seconds.
    pub ttl: u32,

    /// Ordered list of record content strings.
    #[schemars(length(min = 1))]
    pub records: Vec<String>,

    /// Optional comment stored alongside the record set on the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Reference to the parent Zone or ClusterZone.
    pub zone_ref: ZoneRef,
}

/// `ClusterRRset` is the cluster-scoped variant of [`RRset`].
///
/// Its spec flattens [`RRsetSpec`]; the parent reference must point at a
/// ClusterZone.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.cav.enablers.ob",
    version = "v1alpha2",
    kind = "ClusterRRset",
    shortname = "crr",
    doc = "ClusterRRset represents a cluster-scoped DNS resource record set inside a parent ClusterZone.",
    printcolumn = r#"{"name":"Zone","type":"string","jsonPath":".spec.zoneRef.name"}"#,
    printcolumn = r#"{"name":"Name","type":"string","jsonPath":".status.dnsEntryName"}"#,
    printcolumn = r#"{"name":"Type","type":"string","jsonPath":".spec.type"}"#,
    printcolumn = r#"{"name":"TTL","type":"integer","jsonPath":".spec.ttl"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.syncStatus"}"#,
    printcolumn = r#"{"name":"Records","type":"string","jsonPath":".spec.records"}"#
)]
#[kube(status = "RRsetStatus")]
pub struct ClusterRRsetSpec {
    #[serde(flatten)]
    pub rrset: RRsetSpec,
}
