// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Finalizer management for the operator's resources.
//!
//! Two finalizers protect each resource:
//!
//! - `dns.cav.enablers.ob/external-resources` guards the backend objects and
//!   is installed after the first successful backend registration;
//! - `dns.cav.enablers.ob/metrics` guards the status gauge series and is
//!   installed on every non-deleted resource.
//!
//! On deletion the external-resources finalizer is removed strictly before
//! the metrics finalizer, and the metrics series teardown happens in the
//! same step as the metrics finalizer removal. The legacy v1alpha1 single
//! finalizer is stripped alongside so pre-migration objects drain.

use anyhow::Result;
use kube::api::{Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use serde_json::json;
use tracing::info;

use crate::constants::LEGACY_FINALIZER;
use crate::resources::OperatorResource;

/// Whether the resource currently carries the given finalizer.
#[must_use]
pub fn has_finalizer<T: ResourceExt>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == finalizer))
}

/// Add a finalizer to a resource if not already present.
///
/// Returns the patched resource so callers can thread the fresh metadata
/// into subsequent finalizer operations within the same reconcile.
/// Idempotent: a no-op when the finalizer is already set.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn ensure_finalizer<T: OperatorResource>(
    client: &Client,
    resource: &T,
    finalizer: &str,
) -> Result<T> {
    if has_finalizer(resource, finalizer) {
        return Ok(resource.clone());
    }

    let name = resource.name_any();
    info!("Adding finalizer {} to {} {}", finalizer, T::KIND, name);

    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.push(finalizer.to_string());

    let patch = json!({ "metadata": { "finalizers": finalizers } });
    let patched = resource
        .api(client.clone())
        .patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(patched)
}

/// Remove a finalizer from a resource.
///
/// Returns the patched resource. The legacy v1alpha1 finalizer is dropped in
/// the same patch whenever it is still present. Idempotent: a no-op when
/// neither finalizer is set.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn remove_finalizer<T: OperatorResource>(
    client: &Client,
    resource: &T,
    finalizer: &str,
) -> Result<T> {
    if !has_finalizer(resource, finalizer) && !has_finalizer(resource, LEGACY_FINALIZER) {
        return Ok(resource.clone());
    }

    let name = resource.name_any();
    info!("Removing finalizer {} from {} {}", finalizer, T::KIND, name);

    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.retain(|f| f != finalizer && f != LEGACY_FINALIZER);

    let patch = json!({ "metadata": { "finalizers": finalizers } });
    let patched = resource
        .api(client.clone())
        .patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    Ok(patched)
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
