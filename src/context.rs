// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Shared context for all controllers with reflector stores.
//!
//! Every controller receives an `Arc<Context>` carrying the Kubernetes
//! client, the backend capability handles and reflector stores for the four
//! resource kinds. The stores double as the secondary indexes used for
//! cross-resource duplicate detection: each query filters its store by
//! canonical identity and excludes resources already quiesced in the Failed
//! sync status, and callers only inspect the resulting cardinality.

use kube::runtime::reflector::Store;
use std::sync::Arc;

use crate::crd::{ClusterRRset, ClusterZone, RRset, SyncStatus, Zone};
use crate::pdns::{RecordOperations, ZoneOperations};
use crate::resources::{RRsetResource, ZoneResource};

/// Shared context passed to all controllers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: kube::Client,

    /// Reflector stores for all resource kinds
    pub stores: Stores,

    /// Zone-level backend operations
    pub zones_api: Arc<dyn ZoneOperations>,

    /// Record-level backend operations
    pub records_api: Arc<dyn RecordOperations>,
}

/// Collection of reflector stores for cross-resource queries.
///
/// Each store is populated by a dedicated reflector task and provides
/// in-memory access to resources without API calls.
#[derive(Clone)]
pub struct Stores {
    pub zones: Store<Zone>,
    pub cluster_zones: Store<ClusterZone>,
    pub rrsets: Store<RRset>,
    pub cluster_rrsets: Store<ClusterRRset>,
}

impl Stores {
    /// Count non-Failed Zones whose canonical name matches.
    #[must_use]
    pub fn zones_with_name(&self, canonical_name: &str) -> usize {
        self.zones
            .state()
            .iter()
            .filter(|z| z.sync_status() != Some(SyncStatus::Failed))
            .filter(|z| z.canonical_name() == canonical_name)
            .count()
    }

    /// Count non-Failed ClusterZones whose canonical name matches.
    #[must_use]
    pub fn cluster_zones_with_name(&self, canonical_name: &str) -> usize {
        self.cluster_zones
            .state()
            .iter()
            .filter(|z| z.sync_status() != Some(SyncStatus::Failed))
            .filter(|z| z.canonical_name() == canonical_name)
            .count()
    }

    /// Count non-Failed RRsets whose entry name and type match.
    #[must_use]
    pub fn rrsets_with_entry(&self, dns_entry_name: &str, rtype: &str) -> usize {
        self.rrsets
            .state()
            .iter()
            .filter(|r| r.sync_status() != Some(SyncStatus::Failed))
            .filter(|r| r.rrset_spec().r#type == rtype && r.dns_entry_name() == dns_entry_name)
            .count()
    }

    /// Count non-Failed ClusterRRsets whose entry name and type match.
    #[must_use]
    pub fn cluster_rrsets_with_entry(&self, dns_entry_name: &str, rtype: &str) -> usize {
        self.cluster_rrsets
            .state()
            .iter()
            .filter(|r| r.sync_status() != Some(SyncStatus::Failed))
            .filter(|r| r.rrset_spec().r#type == rtype && r.dns_entry_name() == dns_entry_name)
            .count()
    }
}

/// Cardinality rule shared by the zone and RRset duplicate checks.
///
/// Evaluated from the reconciled resource's side: `same_kind` counts index
/// hits of the resource's own kind (the resource itself included, unless it
/// is already Failed), `other_kind` counts hits of the sibling kind.
#[must_use]
pub fn is_duplicated(same_kind: usize, other_kind: usize) -> bool {
    same_kind > 1 || (same_kind >= 1 && other_kind >= 1)
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
