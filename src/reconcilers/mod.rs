// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Reconciliation cores for the operator's resources.
//!
//! The operator follows the standard controller pattern: watch the resource
//! store, compare the declared spec with the backend's state, apply the
//! minimum set of backend operations, then report the outcome through the
//! status subresource and the status gauges.
//!
//! Each behavioral variant has one shared core:
//!
//! - [`zone::reconcile_zone`] - Zone and ClusterZone
//! - [`rrset::reconcile_rrset`] - RRset and ClusterRRset
//!
//! The per-kind entry points are thin: they compute the reconcile situation
//! (modified, deleted) from generation tracking and the deletion timestamp
//! and dispatch to the shared core for their variant.

pub mod finalizers;
pub mod rrset;
pub mod status;
pub mod zone;

use kube::runtime::controller::Action;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

use crate::constants::ERROR_REQUEUE_DURATION_SECS;

/// Reconciliation error wrapper
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ReconcileError(#[from] pub anyhow::Error);

/// Error policy shared by all four controllers.
///
/// Returns an action to requeue the resource after a delay when
/// reconciliation fails.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
pub fn error_policy<T, C>(resource: Arc<T>, err: &ReconcileError, _ctx: Arc<C>) -> Action
where
    T: Debug,
{
    error!(
        error = %err,
        resource = ?resource,
        "Reconciliation error - will retry in {}s",
        ERROR_REQUEUE_DURATION_SECS
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

/// Compute whether the spec changed since the reconciler last acted.
///
/// `metadata.generation` is incremented by the API server only on spec
/// changes, while `status.observed_generation` is recorded by the controller
/// after processing one. A resource that has never been reconciled
/// (`observed_generation` absent) is treated as created, not modified.
#[must_use]
pub fn is_modified(current_generation: Option<i64>, observed_generation: Option<i64>) -> bool {
    match (current_generation, observed_generation) {
        (Some(current), Some(observed)) => current != observed,
        _ => false,
    }
}

/// Whether a Kubernetes API error is an optimistic-concurrency conflict.
///
/// Conflicts on status or finalizer patches are not user-visible failures;
/// the reconcile simply requeues and re-reads.
#[must_use]
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(e) if e.code == 409)
}

/// Short requeue used after a store conflict.
#[must_use]
pub fn conflict_requeue() -> Action {
    Action::requeue(Duration::from_secs(1))
}

#[cfg(test)]
mod mod_tests;
