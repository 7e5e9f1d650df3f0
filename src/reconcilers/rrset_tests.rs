// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Unit tests for the record set identity rule.

use super::{comment_matches, rrset_is_identical};
use crate::pdns::{Comment, Record, RrSet, RrSetChange};

fn desired() -> RrSetChange {
    RrSetChange {
        name: "test.example2.org.".to_string(),
        rtype: "A".to_string(),
        ttl: 300,
        records: vec!["127.0.0.1".to_string(), "127.0.0.2".to_string()],
        comment: None,
    }
}

fn found() -> RrSet {
    RrSet {
        name: "test.example2.org.".to_string(),
        rtype: "A".to_string(),
        ttl: 300,
        changetype: None,
        records: vec![
            Record {
                content: "127.0.0.1".to_string(),
                disabled: Some(false),
            },
            Record {
                content: "127.0.0.2".to_string(),
                disabled: Some(false),
            },
        ],
        comments: None,
    }
}

#[test]
fn test_identical_record_sets() {
    assert!(rrset_is_identical(&desired(), &found()));
}

#[test]
fn test_record_order_is_significant() {
    let mut found = found();
    found.records.reverse();
    assert!(!rrset_is_identical(&desired(), &found));
}

#[test]
fn test_differs_on_ttl() {
    let mut found = found();
    found.ttl = 600;
    assert!(!rrset_is_identical(&desired(), &found));
}

#[test]
fn test_differs_on_name() {
    // An adjacent record set from the backend's over-reporting never matches
    let mut found = found();
    found.name = "other.example2.org.".to_string();
    assert!(!rrset_is_identical(&desired(), &found));
}

#[test]
fn test_differs_on_type() {
    let mut found = found();
    found.rtype = "AAAA".to_string();
    assert!(!rrset_is_identical(&desired(), &found));
}

#[test]
fn test_differs_on_record_count() {
    let mut found = found();
    found.records.pop();
    assert!(!rrset_is_identical(&desired(), &found));
}

#[test]
fn test_matching_comments() {
    let mut desired = desired();
    desired.comment = Some("managed records".to_string());
    let mut found = found();
    found.comments = Some(vec![Comment {
        content: "managed records".to_string(),
        account: "pdns-operator".to_string(),
        modified_at: Some(1_700_000_000),
    }]);
    assert!(rrset_is_identical(&desired, &found));
}

#[test]
fn test_comment_content_mismatch() {
    let mut desired = desired();
    desired.comment = Some("managed records".to_string());
    let mut found = found();
    found.comments = Some(vec![Comment {
        content: "someone else's note".to_string(),
        account: "admin".to_string(),
        modified_at: None,
    }]);
    assert!(!rrset_is_identical(&desired, &found));
}

#[test]
fn test_declared_comment_missing_on_backend() {
    let mut desired = desired();
    desired.comment = Some("managed records".to_string());
    assert!(!rrset_is_identical(&desired, &found()));
}

#[test]
fn test_comment_matches_none_none() {
    assert!(comment_matches(None, None));
    assert!(comment_matches(None, Some(&vec![])));
}

#[test]
fn test_comment_matches_rejects_unexpected_backend_comment() {
    let comments = vec![Comment {
        content: "stale".to_string(),
        account: "admin".to_string(),
        modified_at: None,
    }];
    assert!(!comment_matches(None, Some(&comments)));
}

#[test]
fn test_comment_matches_rejects_multiple_comments() {
    let comments = vec![
        Comment {
            content: "one".to_string(),
            account: "pdns-operator".to_string(),
            modified_at: None,
        },
        Comment {
            content: "two".to_string(),
            account: "pdns-operator".to_string(),
            modified_at: None,
        },
    ];
    assert!(!comment_matches(Some("one"), Some(&comments)));
}
