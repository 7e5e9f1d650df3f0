// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Polymorphism layer over the four concrete resource shapes.
//!
//! The reconcile cores are written once per behavioral variant against the
//! [`ZoneResource`] and [`RRsetResource`] traits; each concrete kind supplies
//! a small adaptor: scope-aware `Api` construction, spec/status accessors and
//! routing to the right metrics gauge. The namespaced and cluster-scoped
//! shapes differ only in scope and kind tag.

use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use crate::canonical::{canonicalize, dns_entry_name};
use crate::context::Stores;
use crate::crd::{
    ClusterRRset, ClusterZone, RRset, RRsetSpec, RRsetStatus, SyncStatus, Zone, ZoneSpec,
    ZoneStatus,
};
use crate::metrics;

/// Common surface of every resource the operator reconciles.
///
/// Collapses the namespaced/cluster scope split into a per-impl `api()`
/// method so finalizer and status plumbing can be written once.
pub trait OperatorResource:
    Resource<DynamicType = ()>
    + ResourceExt
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    /// The resource kind tag
    const KIND: &'static str;

    /// Scope-aware Api for this resource
    fn api(&self, client: Client) -> Api<Self>;
}

impl OperatorResource for Zone {
    const KIND: &'static str = crate::constants::KIND_ZONE;

    fn api(&self, client: Client) -> Api<Self> {
        Api::namespaced(client, &self.namespace().unwrap_or_default())
    }
}

impl OperatorResource for ClusterZone {
    const KIND: &'static str = crate::constants::KIND_CLUSTER_ZONE;

    fn api(&self, client: Client) -> Api<Self> {
        Api::all(client)
    }
}

impl OperatorResource for RRset {
    const KIND: &'static str = crate::constants::KIND_RRSET;

    fn api(&self, client: Client) -> Api<Self> {
        Api::namespaced(client, &self.namespace().unwrap_or_default())
    }
}

impl OperatorResource for ClusterRRset {
    const KIND: &'static str = crate::constants::KIND_CLUSTER_RRSET;

    fn api(&self, client: Client) -> Api<Self> {
        Api::all(client)
    }
}

/// Uniform access to a Zone or ClusterZone.
pub trait ZoneResource: OperatorResource {
    /// The shared zone spec
    fn zone_spec(&self) -> &ZoneSpec;

    /// The shared zone status, when present
    fn zone_status(&self) -> Option<&ZoneStatus>;

    /// Canonical zone name on the backend, derived from the resource name
    fn canonical_name(&self) -> String {
        canonicalize(&self.name_any())
    }

    /// Last sync status recorded on the resource
    fn sync_status(&self) -> Option<SyncStatus> {
        self.zone_status().and_then(|s| s.sync_status)
    }

    /// Index cardinalities for the duplicate check, as
    /// (own kind, sibling kind) hits on this zone's canonical name.
    fn duplicate_counts(&self, stores: &Stores) -> (usize, usize);

    /// Write this resource's status gauge series
    fn update_status_metric(&self, status: SyncStatus);

    /// Remove this resource's status gauge series
    fn remove_status_metric(&self);
}

impl ZoneResource for Zone {
    fn zone_spec(&self) -> &ZoneSpec {
        &self.spec
    }

    fn zone_status(&self) -> Option<&ZoneStatus> {
        self.status.as_ref()
    }

    fn duplicate_counts(&self, stores: &Stores) -> (usize, usize) {
        let name = self.canonical_name();
        (
            stores.zones_with_name(&name),
            stores.cluster_zones_with_name(&name),
        )
    }

    fn update_status_metric(&self, status: SyncStatus) {
        metrics::set_zone_status(
            &self.name_any(),
            &self.namespace().unwrap_or_default(),
            status,
        );
    }

    fn remove_status_metric(&self) {
        metrics::remove_zone_status(&self.name_any(), &self.namespace().unwrap_or_default());
    }
}

impl ZoneResource for ClusterZone {
    fn zone_spec(&self) -> &ZoneSpec {
        &self.spec.zone
    }

    fn zone_status(&self) -> Option<&ZoneStatus> {
        self.status.as_ref()
    }

    fn duplicate_counts(&self, stores: &Stores) -> (usize, usize) {
        let name = self.canonical_name();
        (
            stores.cluster_zones_with_name(&name),
            stores.zones_with_name(&name),
        )
    }

    fn update_status_metric(&self, status: SyncStatus) {
        metrics::set_clusterzone_status(&self.name_any(), status);
    }

    fn remove_status_metric(&self) {
        metrics::remove_clusterzone_status(&self.name_any());
    }
}

/// Uniform access to an RRset or ClusterRRset.
pub trait RRsetResource: OperatorResource {
    /// The shared record set spec
    fn rrset_spec(&self) -> &RRsetSpec;

    /// The shared record set status, when present
    fn rrset_status(&self) -> Option<&RRsetStatus>;

    /// Canonical fully qualified name of the record set on the backend
    fn dns_entry_name(&self) -> String {
        let spec = self.rrset_spec();
        dns_entry_name(&spec.name, &spec.zone_ref.name)
    }

    /// Last sync status recorded on the resource
    fn sync_status(&self) -> Option<SyncStatus> {
        self.rrset_status().and_then(|s| s.sync_status)
    }

    /// Index cardinalities for the duplicate check, as
    /// (own kind, sibling kind) hits on this record set's entry name + type.
    fn duplicate_counts(&self, stores: &Stores) -> (usize, usize);

    /// Write this resource's status gauge series
    fn update_status_metric(&self, status: SyncStatus);

    /// Remove this resource's status gauge series
    fn remove_status_metric(&self);
}

impl RRsetResource for RRset {
    fn rrset_spec(&self) -> &RRsetSpec {
        &self.spec
    }

    fn rrset_status(&self) -> Option<&RRsetStatus> {
        self.status.as_ref()
    }

    fn duplicate_counts(&self, stores: &Stores) -> (usize, usize) {
        let entry = self.dns_entry_name();
        let rtype = &self.rrset_spec().r#type;
        (
            stores.rrsets_with_entry(&entry, rtype),
            stores.cluster_rrsets_with_entry(&entry, rtype),
        )
    }

    fn update_status_metric(&self, status: SyncStatus) {
        metrics::set_rrset_status(
            &self.dns_entry_name(),
            &self.rrset_spec().r#type,
            &self.name_any(),
            &self.namespace().unwrap_or_default(),
            status,
        );
    }

    fn remove_status_metric(&self) {
        metrics::remove_rrset_status(&self.name_any(), &self.namespace().unwrap_or_default());
    }
}

impl RRsetResource for ClusterRRset {
    fn rrset_spec(&self) -> &RRsetSpec {
        &self.spec.rrset
    }

    fn rrset_status(&self) -> Option<&RRsetStatus> {
        self.status.as_ref()
    }

    fn duplicate_counts(&self, stores: &Stores) -> (usize, usize) {
        let entry = self.dns_entry_name();
        let rtype = &self.rrset_spec().r#type;
        (
            stores.cluster_rrsets_with_entry(&entry, rtype),
            stores.rrsets_with_entry(&entry, rtype),
        )
    }

    fn update_status_metric(&self, status: SyncStatus) {
        metrics::set_clusterrrset_status(
            &self.dns_entry_name(),
            &self.rrset_spec().r#type,
            &self.name_any(),
            status,
        );
    }

    fn remove_status_metric(&self) {
        metrics::remove_clusterrrset_status(&self.name_any());
    }
}

/// The resolved parent of an RRset, either scope.
#[derive(Clone, Debug)]
pub enum ParentZone {
    Zone(Zone),
    ClusterZone(ClusterZone),
}

impl ParentZone {
    /// Canonical name of the parent zone on the backend
    #[must_use]
    pub fn canonical_name(&self) -> String {
        match self {
            Self::Zone(z) => z.canonical_name(),
            Self::ClusterZone(z) => z.canonical_name(),
        }
    }

    /// Whether the parent zone is currently quiesced in the Failed status
    #[must_use]
    pub fn is_failed(&self) -> bool {
        let status = match self {
            Self::Zone(z) => z.sync_status(),
            Self::ClusterZone(z) => z.sync_status(),
        };
        status == Some(SyncStatus::Failed)
    }

    /// Controller owner reference pointing at the parent zone
    #[must_use]
    pub fn controller_owner_ref(
        &self,
    ) -> Option<k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference> {
        match self {
            Self::Zone(z) => z.controller_owner_ref(&()),
            Self::ClusterZone(z) => z.controller_owner_ref(&()),
        }
    }
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod resources_tests;
