// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! DNS name canonicalization and RRset name assembly.
//!
//! Every name sent to or compared against the backend uses canonical form:
//! a non-empty name terminated by exactly one trailing dot. The computed
//! entry name of an RRset is the backend-facing identity of the record set.

/// Return the canonical form of a DNS name.
///
/// The empty string canonicalizes to itself; any other name ends with
/// exactly one trailing dot.
///
/// # Example
///
/// ```rust
/// use pdns_operator::canonical::canonicalize;
///
/// assert_eq!(canonicalize("example.org"), "example.org.");
/// assert_eq!(canonicalize("example.org."), "example.org.");
/// assert_eq!(canonicalize(""), "");
/// ```
#[must_use]
pub fn canonicalize(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    format!("{}.", name.trim_end_matches('.'))
}

/// Canonicalize every element of a nameserver or record list, preserving order.
#[must_use]
pub fn canonicalize_all(names: &[String]) -> Vec<String> {
    names.iter().map(|n| canonicalize(n)).collect()
}

/// Compute the canonical DNS entry name of an RRset.
///
/// A record name that already ends with a dot is used verbatim (after
/// canonicalization, which collapses redundant trailing dots); otherwise it
/// is concatenated with the parent zone's name. The zone apex is addressed
/// with `"@"`, which resolves to the zone name itself.
///
/// # Example
///
/// ```rust
/// use pdns_operator::canonical::dns_entry_name;
///
/// assert_eq!(dns_entry_name("test", "example.org"), "test.example.org.");
/// assert_eq!(dns_entry_name("test.example.org.", "example.org"), "test.example.org.");
/// assert_eq!(dns_entry_name("@", "example.org"), "example.org.");
/// ```
#[must_use]
pub fn dns_entry_name(record_name: &str, zone_name: &str) -> String {
    if record_name == "@" {
        return canonicalize(zone_name);
    }
    if record_name.ends_with('.') {
        return canonicalize(record_name);
    }
    canonicalize(&format!("{record_name}.{zone_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_adds_single_trailing_dot() {
        assert_eq!(canonicalize("example.org"), "example.org.");
        assert_eq!(canonicalize("a.b.c"), "a.b.c.");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let once = canonicalize("example.org");
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn test_canonicalize_empty_is_empty() {
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn test_canonicalize_collapses_extra_dots() {
        assert_eq!(canonicalize("example.org.."), "example.org.");
    }

    #[test]
    fn test_canonicalize_all_preserves_order() {
        let input = vec!["ns2.example.org".to_string(), "ns1.example.org.".to_string()];
        assert_eq!(
            canonicalize_all(&input),
            vec!["ns2.example.org.".to_string(), "ns1.example.org.".to_string()]
        );
    }

    #[test]
    fn test_entry_name_bare_label() {
        assert_eq!(dns_entry_name("test", "example.org"), "test.example.org.");
    }

    #[test]
    fn test_entry_name_preserves_dotted_name() {
        assert_eq!(
            dns_entry_name("test.example.org.", "example.org"),
            "test.example.org."
        );
    }

    #[test]
    fn test_entry_name_apex() {
        assert_eq!(dns_entry_name("@", "example.org"), "example.org.");
    }

    #[test]
    fn test_entry_name_with_canonical_zone_ref() {
        // zone_ref names may themselves be canonical already
        assert_eq!(dns_entry_name("www", "example.org."), "www.example.org.");
    }
}
