// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Unit tests for the polymorphism adaptors.

use super::{ParentZone, RRsetResource, ZoneResource};
use crate::crd::{
    ClusterZone, ClusterZoneSpec, RRset, RRsetSpec, SyncStatus, Zone, ZoneRef, ZoneRefKind,
    ZoneSpec, ZoneStatus,
};

fn rrset_with_name(record_name: &str, zone_ref_name: &str) -> RRset {
    RRset::new(
        "some-record",
        RRsetSpec {
            r#type: "A".to_string(),
            name: record_name.to_string(),
            ttl: 300,
            records: vec!["127.0.0.1".to_string()],
            comment: None,
            zone_ref: ZoneRef {
                name: zone_ref_name.to_string(),
                kind: ZoneRefKind::Zone,
            },
        },
    )
}

#[test]
fn test_zone_canonical_name_from_metadata() {
    let zone = Zone::new("example1.org", ZoneSpec::default());
    assert_eq!(zone.canonical_name(), "example1.org.");
}

#[test]
fn test_cluster_zone_shares_spec_accessor() {
    let spec = ZoneSpec {
        nameservers: vec!["ns1.example1.org".to_string()],
        ..ZoneSpec::default()
    };
    let cluster = ClusterZone::new("example1.org", ClusterZoneSpec { zone: spec.clone() });
    assert_eq!(cluster.zone_spec().nameservers, spec.nameservers);
}

#[test]
fn test_rrset_entry_name_appends_zone() {
    let rrset = rrset_with_name("test", "example2.org");
    assert_eq!(rrset.dns_entry_name(), "test.example2.org.");
}

#[test]
fn test_rrset_entry_name_keeps_dotted_name() {
    let rrset = rrset_with_name("test.example2.org.", "example2.org");
    assert_eq!(rrset.dns_entry_name(), "test.example2.org.");
}

#[test]
fn test_rrset_entry_name_apex() {
    let rrset = rrset_with_name("@", "example2.org");
    assert_eq!(rrset.dns_entry_name(), "example2.org.");
}

#[test]
fn test_sync_status_accessor() {
    let mut zone = Zone::new("example1.org", ZoneSpec::default());
    assert_eq!(zone.sync_status(), None);
    zone.status = Some(ZoneStatus {
        sync_status: Some(SyncStatus::Pending),
        ..ZoneStatus::default()
    });
    assert_eq!(zone.sync_status(), Some(SyncStatus::Pending));
}

#[test]
fn test_parent_zone_failed() {
    let mut zone = Zone::new("example2.org", ZoneSpec::default());
    zone.status = Some(ZoneStatus {
        sync_status: Some(SyncStatus::Failed),
        ..ZoneStatus::default()
    });
    assert!(ParentZone::Zone(zone).is_failed());

    let healthy = ClusterZone::new("example1.org", ClusterZoneSpec::default());
    assert!(!ParentZone::ClusterZone(healthy).is_failed());
}

#[test]
fn test_parent_zone_canonical_name() {
    let zone = Zone::new("example2.org", ZoneSpec::default());
    assert_eq!(ParentZone::Zone(zone).canonical_name(), "example2.org.");
}
