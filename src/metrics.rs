// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the PowerDNS operator.
//!
//! Four gauges mirror the sync status of the managed resources:
//!
//! - `zones_status{status,name,namespace}`
//! - `clusterzones_status{status,name}`
//! - `rrsets_status{fqdn,type,status,name,namespace}`
//! - `clusterrrsets_status{fqdn,type,status,name}`
//!
//! Each resource contributes at most one series. Writing a new status
//! replaces the resource's previous series; finalizer-driven teardown
//! removes it. Because label values (status, fqdn) move with the resource,
//! the last written label set is remembered per resource identity so the
//! stale series can be dropped exactly.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use crate::crd::SyncStatus;

/// Global Prometheus metrics registry, exposed via the `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Sync status of namespace-scoped zones
pub static ZONES_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new("zones_status", "Status of zone resources");
    let gauge = GaugeVec::new(opts, &["status", "name", "namespace"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Sync status of cluster-scoped zones
pub static CLUSTERZONES_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new("clusterzones_status", "Status of clusterzone resources");
    let gauge = GaugeVec::new(opts, &["status", "name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Sync status of namespace-scoped record sets
pub static RRSETS_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new("rrsets_status", "Status of rrset resources");
    let gauge = GaugeVec::new(opts, &["fqdn", "type", "status", "name", "namespace"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Sync status of cluster-scoped record sets
pub static CLUSTERRRSETS_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new("clusterrrsets_status", "Status of clusterrrset resources");
    let gauge = GaugeVec::new(opts, &["fqdn", "type", "status", "name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Identity of a resource across label changes: (gauge name, resource name,
/// namespace - empty for cluster-scoped kinds).
type SeriesKey = (&'static str, String, String);

/// Last label set written for each resource, so a rewrite can delete the
/// previous series even when status or fqdn labels changed.
static LAST_SERIES: LazyLock<Mutex<HashMap<SeriesKey, Vec<String>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn write_series(gauge: &GaugeVec, key: SeriesKey, labels: Vec<String>) {
    let mut last = LAST_SERIES.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(previous) = last.get(&key) {
        if *previous != labels {
            let refs: Vec<&str> = previous.iter().map(String::as_str).collect();
            let _ = gauge.remove_label_values(&refs);
        }
    }
    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    gauge.with_label_values(&refs).set(1.0);
    last.insert(key, labels);
}

fn drop_series(gauge: &GaugeVec, key: &SeriesKey) {
    let mut last = LAST_SERIES.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(previous) = last.remove(key) {
        let refs: Vec<&str> = previous.iter().map(String::as_str).collect();
        let _ = gauge.remove_label_values(&refs);
    }
}

/// Write the status series for a namespace-scoped zone.
pub fn set_zone_status(name: &str, namespace: &str, status: SyncStatus) {
    write_series(
        &ZONES_STATUS,
        ("zones_status", name.to_string(), namespace.to_string()),
        vec![
            status.as_str().to_string(),
            name.to_string(),
            namespace.to_string(),
        ],
    );
}

/// Remove the status series for a namespace-scoped zone.
pub fn remove_zone_status(name: &str, namespace: &str) {
    drop_series(
        &ZONES_STATUS,
        &("zones_status", name.to_string(), namespace.to_string()),
    );
}

/// Write the status series for a cluster-scoped zone.
pub fn set_clusterzone_status(name: &str, status: SyncStatus) {
    write_series(
        &CLUSTERZONES_STATUS,
        ("clusterzones_status", name.to_string(), String::new()),
        vec![status.as_str().to_string(), name.to_string()],
    );
}

/// Remove the status series for a cluster-scoped zone.
pub fn remove_clusterzone_status(name: &str) {
    drop_series(
        &CLUSTERZONES_STATUS,
        &("clusterzones_status", name.to_string(), String::new()),
    );
}

/// Write the status series for a namespace-scoped record set.
pub fn set_rrset_status(fqdn: &str, rtype: &str, name: &str, namespace: &str, status: SyncStatus) {
    write_series(
        &RRSETS_STATUS,
        ("rrsets_status", name.to_string(), namespace.to_string()),
        vec![
            fqdn.to_string(),
            rtype.to_string(),
            status.as_str().to_string(),
            name.to_string(),
            namespace.to_string(),
        ],
    );
}

/// Remove the status series for a namespace-scoped record set.
pub fn remove_rrset_status(name: &str, namespace: &str) {
    drop_series(
        &RRSETS_STATUS,
        &("rrsets_status", name.to_string(), namespace.to_string()),
    );
}

/// Write the status series for a cluster-scoped record set.
pub fn set_clusterrrset_status(fqdn: &str, rtype: &str, name: &str, status: SyncStatus) {
    write_series(
        &CLUSTERRRSETS_STATUS,
        ("clusterrrsets_status", name.to_string(), String::new()),
        vec![
            fqdn.to_string(),
            rtype.to_string(),
            status.as_str().to_string(),
            name.to_string(),
        ],
    );
}

/// Remove the status series for a cluster-scoped record set.
pub fn remove_clusterrrset_status(name: &str) {
    drop_series(
        &CLUSTERRRSETS_STATUS,
        &("clusterrrsets_status", name.to_string(), String::new()),
    );
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
///
/// Returns an error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_write_replaces_previous_series() {
        set_zone_status("replace.org", "default", SyncStatus::Pending);
        set_zone_status("replace.org", "default", SyncStatus::Succeeded);

        let succeeded = ZONES_STATUS.with_label_values(&["Succeeded", "replace.org", "default"]);
        assert!((succeeded.get() - 1.0).abs() < f64::EPSILON);

        // The Pending series must be gone, not merely zeroed
        let text = gather_metrics().unwrap();
        assert!(!text.contains(r#"zones_status{name="replace.org",namespace="default",status="Pending"}"#));

        remove_zone_status("replace.org", "default");
    }

    #[test]
    fn test_teardown_removes_series() {
        set_clusterzone_status("teardown.org", SyncStatus::Failed);
        remove_clusterzone_status("teardown.org");

        let text = gather_metrics().unwrap();
        assert!(!text.contains("teardown.org"));
    }

    #[test]
    fn test_rrset_series_tracks_fqdn_change() {
        set_rrset_status("a.example.org.", "A", "rec", "ns1", SyncStatus::Succeeded);
        // Same resource, new fqdn: old series must be replaced
        set_rrset_status("b.example.org.", "A", "rec", "ns1", SyncStatus::Succeeded);

        let text = gather_metrics().unwrap();
        assert!(!text.contains("a.example.org."));
        assert!(text.contains("b.example.org."));

        remove_rrset_status("rec", "ns1");
    }

    #[test]
    fn test_gather_metrics_contains_gauges() {
        set_zone_status("gather.org", "default", SyncStatus::Succeeded);
        let text = gather_metrics().unwrap();
        assert!(text.contains("zones_status"));
        remove_zone_status("gather.org", "default");
    }
}
