// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Status condition helpers for the operator's resources.
//!
//! Each resource carries a single "Available" condition. Its
//! `lastTransitionTime` is preserved while the observable status does not
//! change, and the condition is cleared before re-running a modified spec so
//! the next write always records a fresh transition.

use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde::Serialize;
use serde_json::json;

use crate::crd::Condition;
use crate::resources::OperatorResource;
use crate::status_reasons::CONDITION_AVAILABLE;

/// Create a new condition with the current timestamp.
///
/// # Example
///
/// ```rust
/// use pdns_operator::reconcilers::status::create_condition;
///
/// let condition = create_condition("Available", "True", "ZoneSynced", "zone is in sync", Some(2));
/// assert_eq!(condition.r#type, "Available");
/// assert_eq!(condition.status, "True");
/// ```
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
    observed_generation: Option<i64>,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
        observed_generation,
    }
}

/// Build the "Available" condition for a reconcile outcome.
#[must_use]
pub fn available_condition(
    available: bool,
    reason: &str,
    message: &str,
    observed_generation: Option<i64>,
) -> Condition {
    create_condition(
        CONDITION_AVAILABLE,
        if available { "True" } else { "False" },
        reason,
        message,
        observed_generation,
    )
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Insert or update a condition in place, preserving `lastTransitionTime`
/// when the observable status did not change.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) {
    if let Some(existing) = conditions
        .iter_mut()
        .find(|c| c.r#type == condition.r#type)
    {
        let unchanged = existing.status == condition.status
            && existing.reason == condition.reason
            && existing.message == condition.message;
        if unchanged {
            condition.last_transition_time = existing.last_transition_time.clone();
        }
        *existing = condition;
    } else {
        conditions.push(condition);
    }
}

/// Remove a condition by type, returning whether it was present.
pub fn clear_condition(conditions: &mut Vec<Condition>, condition_type: &str) -> bool {
    let before = conditions.len();
    conditions.retain(|c| c.r#type != condition_type);
    conditions.len() != before
}

/// Merge-patch the status subresource of a resource.
///
/// # Errors
///
/// Returns the raw API error so callers can distinguish optimistic
/// concurrency conflicts (requeue) from real failures.
pub async fn patch_status<T, S>(client: &Client, resource: &T, status: &S) -> Result<T, kube::Error>
where
    T: OperatorResource,
    S: Serialize,
{
    resource
        .api(client.clone())
        .patch_status(
            &resource.name_any(),
            &PatchParams::default(),
            &Patch::Merge(&json!({ "status": status })),
        )
        .await
}

/// Merge-patch an empty conditions list onto the status subresource.
///
/// Run when a modified spec is observed, so the next condition write always
/// records a fresh `lastTransitionTime`.
///
/// # Errors
///
/// Returns the raw API error; see [`patch_status`].
pub async fn clear_available_condition<T>(client: &Client, resource: &T) -> Result<T, kube::Error>
where
    T: OperatorResource,
{
    resource
        .api(client.clone())
        .patch_status(
            &resource.name_any(),
            &PatchParams::default(),
            &Patch::Merge(&json!({ "status": { "conditions": [] } })),
        )
        .await
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
