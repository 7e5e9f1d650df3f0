// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Unit tests for the shared reconcile helpers.

use super::is_modified;

#[test]
fn test_modified_when_generation_advanced() {
    assert!(is_modified(Some(2), Some(1)));
}

#[test]
fn test_unmodified_when_generations_match() {
    assert!(!is_modified(Some(3), Some(3)));
}

#[test]
fn test_first_reconciliation_is_not_a_modification() {
    // A freshly created resource has no observed generation yet
    assert!(!is_modified(Some(1), None));
}

#[test]
fn test_no_generation_tracking() {
    assert!(!is_modified(None, None));
    assert!(!is_modified(None, Some(1)));
}
