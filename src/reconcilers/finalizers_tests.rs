// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Unit tests for finalizer inspection.

use super::has_finalizer;
use crate::constants::{LEGACY_FINALIZER, METRICS_FINALIZER, RESOURCES_FINALIZER};
use crate::crd::{Zone, ZoneSpec};

fn zone_with_finalizers(finalizers: &[&str]) -> Zone {
    let mut zone = Zone::new("example.org", ZoneSpec::default());
    zone.metadata.finalizers = Some(finalizers.iter().map(ToString::to_string).collect());
    zone
}

#[test]
fn test_has_finalizer() {
    let zone = zone_with_finalizers(&[METRICS_FINALIZER, RESOURCES_FINALIZER]);
    assert!(has_finalizer(&zone, METRICS_FINALIZER));
    assert!(has_finalizer(&zone, RESOURCES_FINALIZER));
}

#[test]
fn test_missing_finalizer() {
    let zone = zone_with_finalizers(&[METRICS_FINALIZER]);
    assert!(!has_finalizer(&zone, RESOURCES_FINALIZER));
}

#[test]
fn test_no_finalizer_list() {
    let zone = Zone::new("example.org", ZoneSpec::default());
    assert!(!has_finalizer(&zone, METRICS_FINALIZER));
}

#[test]
fn test_legacy_finalizer_is_distinct() {
    // Legacy objects carry the old single finalizer; it never satisfies the
    // checks for the two current ones.
    let zone = zone_with_finalizers(&[LEGACY_FINALIZER]);
    assert!(!has_finalizer(&zone, METRICS_FINALIZER));
    assert!(!has_finalizer(&zone, RESOURCES_FINALIZER));
    assert!(has_finalizer(&zone, LEGACY_FINALIZER));
}
