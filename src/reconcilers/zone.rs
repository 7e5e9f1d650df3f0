// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Zone reconciliation core, shared by Zone and ClusterZone.
//!
//! One reconcile pass walks the state machine: finalizer lifecycle, deletion
//! cleanup, duplicate quiescing, diff against the backend (zone metadata and
//! apex NS record set are updated independently), then a status patch built
//! from a fresh backend read so the observable status is never ahead of the
//! backend.

use kube::runtime::controller::Action;
use kube::Resource;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use super::status::{available_condition, clear_available_condition, patch_status, set_condition};
use super::{conflict_requeue, is_conflict, is_modified, ReconcileError};
use crate::canonical::{canonicalize, canonicalize_all};
use crate::constants::{DEFAULT_NS_TTL_SECS, METRICS_FINALIZER, RESOURCES_FINALIZER};
use crate::context::{is_duplicated, Context};
use crate::crd::{SyncStatus, ZoneSpec};
use crate::pdns::{PdnsError, RrSet, RrSetChange, ZoneChanges, ZoneCreate, ZoneInfo};
use crate::resources::ZoneResource;
use crate::status_reasons::{
    REASON_NS_SYNCHRONIZATION_FAILED, REASON_SYNCHRONIZATION_FAILED, REASON_ZONE_DUPLICATED,
    REASON_ZONE_SYNCED,
};

/// Controller entry point for a zone kind.
///
/// Computes the reconcile situation from generation tracking and the
/// deletion timestamp, then dispatches to the shared core.
///
/// # Errors
///
/// Returns a [`ReconcileError`] on transport or store failures so the
/// runtime retries with backoff.
pub async fn reconcile<Z: ZoneResource>(
    zone: Arc<Z>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let modified = is_modified(
        zone.meta().generation,
        zone.zone_status().and_then(|s| s.observed_generation),
    );
    let deleted = zone.meta().deletion_timestamp.is_some();
    reconcile_zone(&ctx, (*zone).clone(), modified, deleted).await
}

/// Canonical catalog declared by the spec; empty values normalize to `None`.
fn desired_catalog(spec: &ZoneSpec) -> Option<String> {
    spec.catalog
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(canonicalize)
}

/// SOA-EDIT-API policy string declared by the spec.
fn desired_soa_edit_api(spec: &ZoneSpec) -> String {
    spec.soa_edit_api.clone().unwrap_or_default().as_str().to_string()
}

/// Whether the backend zone metadata matches the spec.
///
/// Compares kind, catalog (canonical, empty normalized to absent) and
/// SOA-EDIT-API (absent normalized to DEFAULT).
#[must_use]
pub fn zone_is_identical(spec: &ZoneSpec, current: &ZoneInfo) -> bool {
    let current_catalog = current
        .catalog
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(canonicalize);
    let current_soa = current
        .soa_edit_api
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("DEFAULT");

    current.kind.as_deref() == Some(spec.kind.as_str())
        && current_catalog == desired_catalog(spec)
        && current_soa == desired_soa_edit_api(spec)
}

/// Whether the backend apex NS record set matches the declared nameservers.
///
/// Both sides are compared in canonical form; the backend returns apex NS
/// records in arbitrary order, so the comparison is order-insensitive.
#[must_use]
pub fn ns_is_identical(declared: &[String], apex_ns: Option<&RrSet>) -> bool {
    let mut desired = canonicalize_all(declared);
    desired.sort_unstable();

    let mut current: Vec<String> = apex_ns
        .map(|rrset| rrset.records.iter().map(|r| canonicalize(&r.content)).collect())
        .unwrap_or_default();
    current.sort_unstable();

    desired == current
}

/// Outcome of the backend synchronization phase.
enum SyncOutcome {
    Synced,
    Failed {
        reason: &'static str,
        message: String,
    },
}

/// Shared reconcile core for both zone kinds.
#[allow(clippy::too_many_lines)]
pub async fn reconcile_zone<Z: ZoneResource>(
    ctx: &Context,
    zone: Z,
    modified: bool,
    deleted: bool,
) -> Result<Action, ReconcileError> {
    let client = ctx.client.clone();
    let name = zone.canonical_name();
    debug!(kind = Z::KIND, zone = %name, modified, deleted, "reconciling zone");

    // Deletion: backend cleanup first, then finalizers in strict order.
    if deleted {
        let mut zone = zone;
        if has_finalizer(&zone, RESOURCES_FINALIZER) {
            match ctx.zones_api.delete_zone(&name).await {
                Ok(()) => info!(zone = %name, "deleted zone from backend"),
                Err(e) if e.is_not_found() => {
                    debug!(zone = %name, "zone already absent from backend");
                }
                Err(e) => return Err(anyhow::Error::new(e).into()),
            }
            zone = remove_finalizer(&client, &zone, RESOURCES_FINALIZER)
                .await
                .map_err(ReconcileError)?;
        }
        if has_finalizer(&zone, METRICS_FINALIZER) {
            zone.remove_status_metric();
            remove_finalizer(&client, &zone, METRICS_FINALIZER)
                .await
                .map_err(ReconcileError)?;
        }
        return Ok(Action::await_change());
    }

    let zone = ensure_finalizer(&client, &zone, METRICS_FINALIZER)
        .await
        .map_err(ReconcileError)?;

    // Force a fresh transition timestamp on the next condition write.
    let zone = if modified {
        match clear_available_condition(&client, &zone).await {
            Ok(z) => z,
            Err(e) if is_conflict(&e) => return Ok(conflict_requeue()),
            Err(e) => return Err(anyhow::Error::new(e).into()),
        }
    } else {
        zone
    };

    // A quiesced zone stays quiet until its spec changes.
    if zone.sync_status() == Some(SyncStatus::Failed) && !modified {
        zone.update_status_metric(SyncStatus::Failed);
        return Ok(Action::await_change());
    }

    let (same_kind, other_kind) = zone.duplicate_counts(&ctx.stores);
    if is_duplicated(same_kind, other_kind) {
        warn!(kind = Z::KIND, zone = %name, "zone name already owned by another resource");
        return quiesce_duplicate(ctx, &zone, &name).await;
    }

    let outcome = sync_with_backend(ctx, &zone, &name).await?;

    finalize_status(ctx, &zone, &name, outcome).await
}

/// Quiesce a duplicate zone into the Failed status without touching the
/// backend.
async fn quiesce_duplicate<Z: ZoneResource>(
    ctx: &Context,
    zone: &Z,
    name: &str,
) -> Result<Action, ReconcileError> {
    let generation = zone.meta().generation;
    let mut status = zone.zone_status().cloned().unwrap_or_default();
    status.observed_generation = generation;
    status.sync_status = Some(SyncStatus::Failed);
    set_condition(
        &mut status.conditions,
        available_condition(
            false,
            REASON_ZONE_DUPLICATED,
            &format!("Zone {name} already exists"),
            generation,
        ),
    );

    match patch_status(&ctx.client, zone, &status).await {
        Ok(_) => {}
        Err(e) if is_conflict(&e) => return Ok(conflict_requeue()),
        Err(e) => return Err(anyhow::Error::new(e).into()),
    }

    zone.update_status_metric(SyncStatus::Failed);
    Ok(Action::await_change())
}

/// Diff the declared zone against the backend and apply the minimum set of
/// changes: create when absent, otherwise independent updates of the apex NS
/// record set and the zone metadata.
async fn sync_with_backend<Z: ZoneResource>(
    ctx: &Context,
    zone: &Z,
    name: &str,
) -> Result<SyncOutcome, ReconcileError> {
    let spec = zone.zone_spec();

    let current = match ctx.zones_api.get_zone(name).await {
        Ok(current) => Some(current),
        Err(e) if e.is_not_found() => None,
        Err(e @ PdnsError::Transport(_)) => return Err(anyhow::Error::new(e).into()),
        Err(e) => {
            return Ok(SyncOutcome::Failed {
                reason: REASON_SYNCHRONIZATION_FAILED,
                message: e.to_string(),
            })
        }
    };

    let Some(current) = current else {
        // Absent on the backend: create it. DNSSEC is always off at creation.
        let create = ZoneCreate {
            name: name.to_string(),
            kind: spec.kind.as_str().to_string(),
            nameservers: canonicalize_all(&spec.nameservers),
            catalog: desired_catalog(spec),
            soa_edit_api: Some(desired_soa_edit_api(spec)),
            dnssec: false,
        };
        return match ctx.zones_api.create_zone(&create).await {
            Ok(_) => {
                info!(zone = %name, "created zone on backend");
                Ok(SyncOutcome::Synced)
            }
            Err(e @ PdnsError::Transport(_)) => Err(anyhow::Error::new(e).into()),
            Err(e) => Ok(SyncOutcome::Failed {
                reason: REASON_SYNCHRONIZATION_FAILED,
                message: e.to_string(),
            }),
        };
    };

    // Present: fetch the apex NS record set and compute both diffs.
    let apex_rrsets = match ctx.records_api.get_rrsets(name, name, "NS").await {
        Ok(rrsets) => rrsets,
        Err(e @ PdnsError::Transport(_)) => return Err(anyhow::Error::new(e).into()),
        Err(e) => {
            return Ok(SyncOutcome::Failed {
                reason: REASON_NS_SYNCHRONIZATION_FAILED,
                message: e.to_string(),
            })
        }
    };
    let apex_ns = apex_rrsets
        .iter()
        .find(|r| canonicalize(&r.name) == name && r.rtype == "NS");

    if !ns_is_identical(&spec.nameservers, apex_ns) {
        let change = RrSetChange {
            name: name.to_string(),
            rtype: "NS".to_string(),
            ttl: apex_ns.map_or(DEFAULT_NS_TTL_SECS, |r| r.ttl),
            records: canonicalize_all(&spec.nameservers),
            comment: None,
        };
        match ctx.records_api.replace_rrset(name, &change).await {
            Ok(()) => info!(zone = %name, "updated apex NS record set on backend"),
            Err(e @ PdnsError::Transport(_)) => return Err(anyhow::Error::new(e).into()),
            Err(e) => {
                return Ok(SyncOutcome::Failed {
                    reason: REASON_NS_SYNCHRONIZATION_FAILED,
                    message: e.to_string(),
                })
            }
        }
    }

    if !zone_is_identical(spec, &current) {
        let changes = ZoneChanges {
            kind: spec.kind.as_str().to_string(),
            // Always sent: an empty catalog detaches the zone.
            catalog: Some(desired_catalog(spec).unwrap_or_default()),
            soa_edit_api: Some(desired_soa_edit_api(spec)),
        };
        match ctx.zones_api.update_zone(name, &changes).await {
            Ok(()) => info!(zone = %name, "updated zone metadata on backend"),
            Err(e @ PdnsError::Transport(_)) => return Err(anyhow::Error::new(e).into()),
            Err(e) => {
                return Ok(SyncOutcome::Failed {
                    reason: REASON_SYNCHRONIZATION_FAILED,
                    message: e.to_string(),
                })
            }
        }
    }

    Ok(SyncOutcome::Synced)
}

/// Re-read the zone for authoritative metadata, patch the status and update
/// the gauge. The resources finalizer is installed once the backend holds
/// the zone.
async fn finalize_status<Z: ZoneResource>(
    ctx: &Context,
    zone: &Z,
    name: &str,
    outcome: SyncOutcome,
) -> Result<Action, ReconcileError> {
    let generation = zone.meta().generation;
    let mut status = zone.zone_status().cloned().unwrap_or_default();
    let mut backend_has_zone = false;

    // Authoritative serials and ids come from the backend, never computed
    // locally. A failed sync keeps the previously mirrored fields.
    match ctx.zones_api.get_zone(name).await {
        Ok(info) => {
            backend_has_zone = true;
            status.id = info.id;
            status.name = info.name;
            status.kind = info.kind;
            status.serial = info.serial;
            status.notified_serial = info.notified_serial;
            status.edited_serial = info.edited_serial;
            status.masters = info.masters;
            status.dnssec = info.dnssec;
            status.catalog = info.catalog;
        }
        Err(e) if e.is_not_found() => {}
        Err(e @ PdnsError::Transport(_)) => return Err(anyhow::Error::new(e).into()),
        Err(e) => {
            warn!(zone = %name, error = %e, "failed to re-read zone after sync");
        }
    }

    status.observed_generation = generation;
    let (sync_status, condition) = match outcome {
        SyncOutcome::Synced => (
            SyncStatus::Succeeded,
            available_condition(
                true,
                REASON_ZONE_SYNCED,
                &format!("Zone {name} is synchronized with the backend"),
                generation,
            ),
        ),
        SyncOutcome::Failed { reason, message } => (
            SyncStatus::Failed,
            available_condition(false, reason, &message, generation),
        ),
    };
    status.sync_status = Some(sync_status);
    set_condition(&mut status.conditions, condition);

    match patch_status(&ctx.client, zone, &status).await {
        Ok(_) => {}
        Err(e) if is_conflict(&e) => return Ok(conflict_requeue()),
        Err(e) => return Err(anyhow::Error::new(e).into()),
    }

    // The backend holds the zone, so deletion must clean it up even if this
    // pass only partially synced.
    if sync_status == SyncStatus::Succeeded || backend_has_zone {
        ensure_finalizer(&ctx.client, zone, RESOURCES_FINALIZER)
            .await
            .map_err(ReconcileError)?;
    }

    zone.update_status_metric(sync_status);
    Ok(Action::await_change())
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
