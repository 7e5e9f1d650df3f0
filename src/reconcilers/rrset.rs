// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! RRset reconciliation core, shared by RRset and ClusterRRset.
//!
//! The record set's life is coupled to its parent zone: an absent parent
//! parks the resource in Pending with a short requeue (zone-then-rrset
//! creation races resolve themselves), a Failed parent quiesces it, and an
//! available parent drives the idempotent diff-and-apply against the
//! backend. After a successful registration the parent zone is installed as
//! controller owner, so deleting the zone cascades onto its record sets.

use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, Resource, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use super::status::{available_condition, clear_available_condition, patch_status, set_condition};
use super::{conflict_requeue, is_conflict, is_modified, ReconcileError};
use crate::canonical::canonicalize;
use crate::constants::{METRICS_FINALIZER, RESOURCES_FINALIZER, ZONE_PENDING_REQUEUE_SECS};
use crate::context::{is_duplicated, Context};
use crate::crd::{ClusterZone, SyncStatus, Zone, ZoneRefKind};
use crate::pdns::{Comment, PdnsError, RrSet, RrSetChange};
use crate::resources::{ParentZone, RRsetResource};
use crate::status_reasons::{
    REASON_RRSET_DUPLICATED, REASON_RRSET_SYNCED, REASON_SYNCHRONIZATION_FAILED,
    REASON_ZONE_NOT_AVAILABLE,
};

/// Controller entry point for a record set kind.
///
/// # Errors
///
/// Returns a [`ReconcileError`] on transport or store failures so the
/// runtime retries with backoff.
pub async fn reconcile<R: RRsetResource>(
    rrset: Arc<R>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let modified = is_modified(
        rrset.meta().generation,
        rrset.rrset_status().and_then(|s| s.observed_generation),
    );
    let deleted = rrset.meta().deletion_timestamp.is_some();
    reconcile_rrset(&ctx, (*rrset).clone(), modified, deleted).await
}

/// Whether the declared comment matches the backend's.
///
/// Absent on both sides and equal content both count as matching; the
/// operator writes at most one comment per record set.
#[must_use]
pub fn comment_matches(desired: Option<&str>, found: Option<&Vec<Comment>>) -> bool {
    let comments: &[Comment] = found.map_or(&[], Vec::as_slice);
    match desired {
        None => comments.is_empty(),
        Some(content) => comments.len() == 1 && comments[0].content == content,
    }
}

/// Identity rule between the declared record set and the backend's.
///
/// Compares canonical name, type, TTL, record contents in declared order and
/// comment presence-and-content. Any mismatch triggers a replace.
#[must_use]
pub fn rrset_is_identical(desired: &RrSetChange, found: &RrSet) -> bool {
    if canonicalize(&found.name) != desired.name
        || found.rtype != desired.rtype
        || found.ttl != desired.ttl
        || found.records.len() != desired.records.len()
    {
        return false;
    }
    let records_match = found
        .records
        .iter()
        .zip(desired.records.iter())
        .all(|(have, want)| have.content == *want);

    records_match && comment_matches(desired.comment.as_deref(), found.comments.as_ref())
}

/// Resolve the parent zone declared by the record set's `zoneRef`.
async fn resolve_parent<R: RRsetResource>(
    ctx: &Context,
    rrset: &R,
) -> Result<Option<ParentZone>, kube::Error> {
    let zone_ref = &rrset.rrset_spec().zone_ref;
    match zone_ref.kind {
        ZoneRefKind::Zone => {
            // Only a namespaced RRset can target a namespaced Zone.
            let Some(namespace) = rrset.namespace() else {
                return Ok(None);
            };
            let api: Api<Zone> = Api::namespaced(ctx.client.clone(), &namespace);
            Ok(api.get_opt(&zone_ref.name).await?.map(ParentZone::Zone))
        }
        ZoneRefKind::ClusterZone => {
            let api: Api<ClusterZone> = Api::all(ctx.client.clone());
            Ok(api
                .get_opt(&zone_ref.name)
                .await?
                .map(ParentZone::ClusterZone))
        }
    }
}

/// Install the parent zone as controller owner of the record set.
///
/// Returns a requeue action when the patch hits a store conflict.
async fn ensure_owner_reference<R: RRsetResource>(
    ctx: &Context,
    rrset: &R,
    parent: &ParentZone,
) -> Result<Option<Action>, ReconcileError> {
    let Some(owner_ref) = parent.controller_owner_ref() else {
        return Ok(None);
    };

    let already_owned = rrset
        .meta()
        .owner_references
        .as_ref()
        .is_some_and(|refs| refs.iter().any(|r| r.uid == owner_ref.uid));
    if already_owned {
        return Ok(None);
    }

    info!(
        rrset = %rrset.name_any(),
        zone = %owner_ref.name,
        "installing controller owner reference"
    );
    let patch = json!({ "metadata": { "ownerReferences": [owner_ref] } });
    match rrset
        .api(ctx.client.clone())
        .patch(&rrset.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await
    {
        Ok(_) => Ok(None),
        Err(e) if is_conflict(&e) => Ok(Some(conflict_requeue())),
        Err(e) => Err(anyhow::Error::new(e).into()),
    }
}

/// Tear down the record set's finalizers and metrics during deletion, in
/// strict order: external resources first, metrics last.
async fn teardown<R: RRsetResource>(ctx: &Context, rrset: R) -> Result<Action, ReconcileError> {
    let mut rrset = rrset;
    if has_finalizer(&rrset, RESOURCES_FINALIZER) {
        rrset = remove_finalizer(&ctx.client, &rrset, RESOURCES_FINALIZER)
            .await
            .map_err(ReconcileError)?;
    }
    if has_finalizer(&rrset, METRICS_FINALIZER) {
        rrset.remove_status_metric();
        remove_finalizer(&ctx.client, &rrset, METRICS_FINALIZER)
            .await
            .map_err(ReconcileError)?;
    }
    Ok(Action::await_change())
}

/// Patch the record set into Pending or Failed because of its parent zone.
async fn park_for_zone<R: RRsetResource>(
    ctx: &Context,
    rrset: &R,
    entry_name: &str,
    sync_status: SyncStatus,
    message: &str,
) -> Result<(), ReconcileError> {
    let generation = rrset.meta().generation;
    let mut status = rrset.rrset_status().cloned().unwrap_or_default();
    status.dns_entry_name = Some(entry_name.to_string());
    status.observed_generation = generation;
    status.sync_status = Some(sync_status);
    set_condition(
        &mut status.conditions,
        available_condition(false, REASON_ZONE_NOT_AVAILABLE, message, generation),
    );

    match patch_status(&ctx.client, rrset, &status).await {
        Ok(_) => {}
        Err(e) if is_conflict(&e) => return Ok(()),
        Err(e) => return Err(anyhow::Error::new(e).into()),
    }

    rrset.update_status_metric(sync_status);
    Ok(())
}

/// Shared reconcile core for both record set kinds.
#[allow(clippy::too_many_lines)]
pub async fn reconcile_rrset<R: RRsetResource>(
    ctx: &Context,
    rrset: R,
    modified: bool,
    deleted: bool,
) -> Result<Action, ReconcileError> {
    let client = ctx.client.clone();
    let entry_name = rrset.dns_entry_name();
    let rtype = rrset.rrset_spec().r#type.clone();
    debug!(kind = R::KIND, entry = %entry_name, rtype = %rtype, modified, deleted, "reconciling record set");

    let rrset = if deleted {
        rrset
    } else {
        ensure_finalizer(&client, &rrset, METRICS_FINALIZER)
            .await
            .map_err(ReconcileError)?
    };

    let rrset = if !deleted && modified {
        match clear_available_condition(&client, &rrset).await {
            Ok(r) => r,
            Err(e) if is_conflict(&e) => return Ok(conflict_requeue()),
            Err(e) => return Err(anyhow::Error::new(e).into()),
        }
    } else {
        rrset
    };

    let parent = resolve_parent(ctx, &rrset)
        .await
        .map_err(|e| ReconcileError(anyhow::Error::new(e)))?;

    let Some(parent) = parent else {
        if deleted {
            // Nothing left to clean on the backend without a zone.
            return teardown(ctx, rrset).await;
        }
        let zone_ref = &rrset.rrset_spec().zone_ref;
        debug!(entry = %entry_name, zone = %zone_ref.name, "parent zone not found, waiting");
        let rrset = remove_finalizer(&client, &rrset, RESOURCES_FINALIZER)
            .await
            .map_err(ReconcileError)?;
        park_for_zone(
            ctx,
            &rrset,
            &entry_name,
            SyncStatus::Pending,
            &format!("Zone {} is not available", zone_ref.name),
        )
        .await?;
        return Ok(Action::requeue(Duration::from_secs(
            ZONE_PENDING_REQUEUE_SECS,
        )));
    };

    if parent.is_failed() {
        if deleted {
            // The zone is quiesced; skip the backend and let the store
            // collect the resource.
            return teardown(ctx, rrset).await;
        }
        warn!(entry = %entry_name, zone = %parent.canonical_name(), "parent zone is in Failed status");
        park_for_zone(
            ctx,
            &rrset,
            &entry_name,
            SyncStatus::Failed,
            &format!("Zone {} is not available", parent.canonical_name()),
        )
        .await?;
        return Ok(Action::await_change());
    }

    let zone_name = parent.canonical_name();

    if deleted {
        let mut rrset = rrset;
        if has_finalizer(&rrset, RESOURCES_FINALIZER) {
            match ctx
                .records_api
                .delete_rrset(&zone_name, &entry_name, &rtype)
                .await
            {
                Ok(()) => info!(entry = %entry_name, rtype = %rtype, "deleted record set from backend"),
                Err(e) if e.is_not_found() => {
                    debug!(entry = %entry_name, "record set already absent from backend");
                }
                Err(e) => return Err(anyhow::Error::new(e).into()),
            }
            rrset = remove_finalizer(&client, &rrset, RESOURCES_FINALIZER)
                .await
                .map_err(ReconcileError)?;
        }
        return teardown(ctx, rrset).await;
    }

    // A quiesced record set stays quiet until its spec changes.
    if rrset.sync_status() == Some(SyncStatus::Failed) && !modified {
        rrset.update_status_metric(SyncStatus::Failed);
        return Ok(Action::await_change());
    }

    let (same_kind, other_kind) = rrset.duplicate_counts(&ctx.stores);
    if is_duplicated(same_kind, other_kind) {
        warn!(entry = %entry_name, rtype = %rtype, "record set identity already owned by another resource");
        let generation = rrset.meta().generation;
        let mut status = rrset.rrset_status().cloned().unwrap_or_default();
        status.dns_entry_name = Some(entry_name.clone());
        status.observed_generation = generation;
        status.sync_status = Some(SyncStatus::Failed);
        set_condition(
            &mut status.conditions,
            available_condition(
                false,
                REASON_RRSET_DUPLICATED,
                &format!("RRset {entry_name} with type {rtype} already exists"),
                generation,
            ),
        );
        match patch_status(&client, &rrset, &status).await {
            Ok(_) => {}
            Err(e) if is_conflict(&e) => return Ok(conflict_requeue()),
            Err(e) => return Err(anyhow::Error::new(e).into()),
        }
        rrset.update_status_metric(SyncStatus::Failed);
        return Ok(Action::await_change());
    }

    // Backend sync: replace only when the backend's view differs.
    let spec = rrset.rrset_spec();
    let desired = RrSetChange {
        name: entry_name.clone(),
        rtype: rtype.clone(),
        ttl: spec.ttl,
        records: spec.records.clone(),
        comment: spec.comment.clone(),
    };

    let found = match ctx
        .records_api
        .get_rrsets(&zone_name, &entry_name, &rtype)
        .await
    {
        Ok(rrsets) => rrsets
            .into_iter()
            // The backend over-reports comments for adjacent record sets;
            // only an exact canonical name + type match counts.
            .find(|r| canonicalize(&r.name) == entry_name && r.rtype == rtype),
        Err(e) if e.is_not_found() => {
            // The zone vanished from the backend between the store read and
            // this call; treat it like an absent parent.
            park_for_zone(
                ctx,
                &rrset,
                &entry_name,
                SyncStatus::Pending,
                &format!("Zone {zone_name} is not available"),
            )
            .await?;
            return Ok(Action::requeue(Duration::from_secs(
                ZONE_PENDING_REQUEUE_SECS,
            )));
        }
        Err(e @ PdnsError::Transport(_)) => return Err(anyhow::Error::new(e).into()),
        Err(e) => {
            return fail_sync(ctx, &rrset, &entry_name, &e.to_string()).await;
        }
    };

    let in_sync = found.as_ref().is_some_and(|f| rrset_is_identical(&desired, f));
    let mut change_applied = false;
    let mut failure: Option<String> = None;
    if !in_sync {
        match ctx.records_api.replace_rrset(&zone_name, &desired).await {
            Ok(()) => {
                info!(entry = %entry_name, rtype = %rtype, "replaced record set on backend");
                change_applied = true;
            }
            Err(e @ PdnsError::Transport(_)) => return Err(anyhow::Error::new(e).into()),
            Err(e) => failure = Some(e.to_string()),
        }
    }

    if let Some(action) = ensure_owner_reference(ctx, &rrset, &parent).await? {
        return Ok(action);
    }

    if let Some(message) = failure {
        return fail_sync(ctx, &rrset, &entry_name, &message).await;
    }

    // Status: LastUpdateTime moves only when a change was actually applied.
    let generation = rrset.meta().generation;
    let mut status = rrset.rrset_status().cloned().unwrap_or_default();
    status.dns_entry_name = Some(entry_name.clone());
    status.observed_generation = generation;
    status.sync_status = Some(SyncStatus::Succeeded);
    if change_applied || status.last_update_time.is_none() {
        status.last_update_time = Some(Utc::now().to_rfc3339());
    }
    set_condition(
        &mut status.conditions,
        available_condition(
            true,
            REASON_RRSET_SYNCED,
            &format!("RRset {entry_name} is synchronized with the backend"),
            generation,
        ),
    );
    match patch_status(&client, &rrset, &status).await {
        Ok(_) => {}
        Err(e) if is_conflict(&e) => return Ok(conflict_requeue()),
        Err(e) => return Err(anyhow::Error::new(e).into()),
    }

    ensure_finalizer(&client, &rrset, RESOURCES_FINALIZER)
        .await
        .map_err(ReconcileError)?;

    rrset.update_status_metric(SyncStatus::Succeeded);
    Ok(Action::await_change())
}

/// Record a backend rejection on the status, verbatim, and quiesce.
async fn fail_sync<R: RRsetResource>(
    ctx: &Context,
    rrset: &R,
    entry_name: &str,
    message: &str,
) -> Result<Action, ReconcileError> {
    let generation = rrset.meta().generation;
    let mut status = rrset.rrset_status().cloned().unwrap_or_default();
    status.dns_entry_name = Some(entry_name.to_string());
    status.observed_generation = generation;
    status.sync_status = Some(SyncStatus::Failed);
    set_condition(
        &mut status.conditions,
        available_condition(false, REASON_SYNCHRONIZATION_FAILED, message, generation),
    );
    match patch_status(&ctx.client, rrset, &status).await {
        Ok(_) => {}
        Err(e) if is_conflict(&e) => return Ok(conflict_requeue()),
        Err(e) => return Err(anyhow::Error::new(e).into()),
    }
    rrset.update_status_metric(SyncStatus::Failed);
    Ok(Action::await_change())
}

#[cfg(test)]
#[path = "rrset_tests.rs"]
mod rrset_tests;
