// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Unit tests for condition construction and transitions.

use super::{available_condition, clear_condition, find_condition, set_condition};
use crate::status_reasons::{CONDITION_AVAILABLE, REASON_ZONE_SYNCED};

#[test]
fn test_available_condition_true() {
    let cond = available_condition(true, REASON_ZONE_SYNCED, "in sync", Some(1));
    assert_eq!(cond.r#type, CONDITION_AVAILABLE);
    assert_eq!(cond.status, "True");
    assert_eq!(cond.reason.as_deref(), Some(REASON_ZONE_SYNCED));
    assert_eq!(cond.observed_generation, Some(1));
    assert!(cond.last_transition_time.is_some());
}

#[test]
fn test_available_condition_false() {
    let cond = available_condition(false, "SynchronizationFailed", "boom", None);
    assert_eq!(cond.status, "False");
    assert_eq!(cond.message.as_deref(), Some("boom"));
}

#[test]
fn test_set_condition_preserves_transition_time_when_unchanged() {
    let mut conditions = Vec::new();
    let mut first = available_condition(true, REASON_ZONE_SYNCED, "in sync", Some(1));
    first.last_transition_time = Some("2024-01-01T00:00:00+00:00".to_string());
    set_condition(&mut conditions, first);

    let second = available_condition(true, REASON_ZONE_SYNCED, "in sync", Some(2));
    set_condition(&mut conditions, second);

    let current = find_condition(&conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(
        current.last_transition_time.as_deref(),
        Some("2024-01-01T00:00:00+00:00")
    );
    // The generation still moves with every write
    assert_eq!(current.observed_generation, Some(2));
}

#[test]
fn test_set_condition_refreshes_transition_time_on_change() {
    let mut conditions = Vec::new();
    let mut first = available_condition(true, REASON_ZONE_SYNCED, "in sync", Some(1));
    first.last_transition_time = Some("2024-01-01T00:00:00+00:00".to_string());
    set_condition(&mut conditions, first);

    let second = available_condition(false, "SynchronizationFailed", "boom", Some(2));
    set_condition(&mut conditions, second);

    let current = find_condition(&conditions, CONDITION_AVAILABLE).unwrap();
    assert_eq!(current.status, "False");
    assert_ne!(
        current.last_transition_time.as_deref(),
        Some("2024-01-01T00:00:00+00:00")
    );
}

#[test]
fn test_set_condition_keeps_single_entry_per_type() {
    let mut conditions = Vec::new();
    set_condition(
        &mut conditions,
        available_condition(true, REASON_ZONE_SYNCED, "in sync", Some(1)),
    );
    set_condition(
        &mut conditions,
        available_condition(false, "SynchronizationFailed", "boom", Some(2)),
    );
    assert_eq!(conditions.len(), 1);
}

#[test]
fn test_clear_condition() {
    let mut conditions = Vec::new();
    set_condition(
        &mut conditions,
        available_condition(true, REASON_ZONE_SYNCED, "in sync", Some(1)),
    );
    assert!(clear_condition(&mut conditions, CONDITION_AVAILABLE));
    assert!(conditions.is_empty());
    assert!(!clear_condition(&mut conditions, CONDITION_AVAILABLE));
}
