// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! Standard condition reasons for the operator's resources.
//!
//! Reasons are programmatic identifiers in CamelCase carried by the single
//! "Available" condition each resource maintains. They are part of the
//! stable status surface together with `observedGeneration` and
//! `syncStatus`.

/// Condition type maintained on every resource.
pub const CONDITION_AVAILABLE: &str = "Available";

// ============================================================================
// Zone Reasons
// ============================================================================

/// The zone is synchronized with the backend.
pub const REASON_ZONE_SYNCED: &str = "ZoneSynced";

/// Another Zone or ClusterZone already owns this canonical name.
pub const REASON_ZONE_DUPLICATED: &str = "ZoneDuplicated";

/// Creating or updating the zone on the backend failed.
pub const REASON_SYNCHRONIZATION_FAILED: &str = "SynchronizationFailed";

/// Updating the apex NS record set on the backend failed.
pub const REASON_NS_SYNCHRONIZATION_FAILED: &str = "NSSynchronizationFailed";

// ============================================================================
// RRset Reasons
// ============================================================================

/// The record set is synchronized with the backend.
pub const REASON_RRSET_SYNCED: &str = "RrsetSynced";

/// Another RRset or ClusterRRset already owns this entry name and type.
pub const REASON_RRSET_DUPLICATED: &str = "RrsetDuplicated";

/// The referenced parent zone does not exist or is itself Failed.
pub const REASON_ZONE_NOT_AVAILABLE: &str = "ZoneNotAvailable";
