// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Structured difference between two directive maps

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::policy::{DirectiveMap, HashToken};

/// What a differing source token is, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Hash,
    Link,
}

impl SourceKind {
    pub fn of(source: &str) -> Self {
        if HashToken::is_hash_source(source) {
            SourceKind::Hash
        } else {
            SourceKind::Link
        }
    }
}

/// Per-directive hash and link difference counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffCounts {
    pub missing_hashes: usize,
    pub extra_hashes: usize,
    pub missing_links: usize,
    pub extra_links: usize,
}

impl DiffCounts {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.missing_hashes + self.extra_hashes + self.missing_links + self.extra_links
    }

    fn add(&mut self, other: DiffCounts) {
        self.missing_hashes += other.missing_hashes;
        self.extra_hashes += other.extra_hashes;
        self.missing_links += other.missing_links;
        self.extra_links += other.extra_links;
    }
}

/// Token differences within one directive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectiveDiff {
    pub directive: String,
    /// Discovered but absent from the stored policy
    pub missing: BTreeSet<String>,
    /// In the stored policy but not discovered
    pub extra: BTreeSet<String>,
}

impl DirectiveDiff {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    pub fn counts(&self) -> DiffCounts {
        let mut counts = DiffCounts::default();
        for source in &self.missing {
            match SourceKind::of(source) {
                SourceKind::Hash => counts.missing_hashes += 1,
                SourceKind::Link => counts.missing_links += 1,
            }
        }
        for source in &self.extra {
            match SourceKind::of(source) {
                SourceKind::Hash => counts.extra_hashes += 1,
                SourceKind::Link => counts.extra_links += 1,
            }
        }
        counts
    }
}

/// Difference between a stored policy and a discovered one.
///
/// Discovered directives with no sources are never serialized, so they count
/// as absent. Stored directives count even when valueless, as with
/// `upgrade-insecure-requests`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyDiff {
    /// Directives with differing tokens, sorted by name
    pub directives: Vec<DirectiveDiff>,
    /// Discovered directives the stored policy lacks entirely
    pub missing_directives: BTreeSet<String>,
    /// Stored directives that discovery did not produce
    pub extra_directives: BTreeSet<String>,
}

impl PolicyDiff {
    pub fn compute(stored: &DirectiveMap, discovered: &DirectiveMap) -> Self {
        let stored = stored.to_source_sets();
        let discovered = non_empty(discovered);
        let empty = BTreeSet::new();

        let names: BTreeSet<&String> = stored.keys().chain(discovered.keys()).collect();
        let directives = names
            .into_iter()
            .filter_map(|name| {
                let have = stored.get(name).unwrap_or(&empty);
                let want = discovered.get(name).unwrap_or(&empty);
                let diff = DirectiveDiff {
                    directive: name.clone(),
                    missing: want.difference(have).cloned().collect(),
                    extra: have.difference(want).cloned().collect(),
                };
                (!diff.is_empty()).then_some(diff)
            })
            .collect();

        Self {
            directives,
            missing_directives: discovered
                .keys()
                .filter(|name| !stored.contains_key(*name))
                .cloned()
                .collect(),
            extra_directives: stored
                .keys()
                .filter(|name| !discovered.contains_key(*name))
                .cloned()
                .collect(),
        }
    }

    /// No token or directive-level difference
    pub fn is_valid(&self) -> bool {
        self.directives.is_empty()
            && self.missing_directives.is_empty()
            && self.extra_directives.is_empty()
    }

    pub fn get(&self, directive: &str) -> Option<&DirectiveDiff> {
        self.directives.iter().find(|d| d.directive == directive)
    }

    /// Counts summed over every directive
    pub fn counts(&self) -> DiffCounts {
        let mut total = DiffCounts::default();
        for diff in &self.directives {
            total.add(diff.counts());
        }
        total
    }
}

fn non_empty(map: &DirectiveMap) -> BTreeMap<String, BTreeSet<String>> {
    map.to_source_sets()
        .into_iter()
        .filter(|(_, sources)| !sources.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &[&str])]) -> DirectiveMap {
        pairs
            .iter()
            .map(|(name, sources)| (*name, sources.to_vec()))
            .collect()
    }

    #[test]
    fn test_identical_maps_are_valid() {
        let a = map(&[
            ("default-src", &["'self'"]),
            ("script-src", &["'self'", "'sha256-abc'", "https://cdn.example.com"]),
        ]);
        let diff = PolicyDiff::compute(&a, &a);
        assert!(diff.is_valid());
        assert!(diff.directives.is_empty());
        assert!(diff.counts().is_empty());
    }

    #[test]
    fn test_missing_and_extra_tokens() {
        let stored = map(&[
            ("script-src", &["'self'", "'sha256-old'", "https://old.example.com"]),
            ("frame-src", &["'self'"]),
        ]);
        let discovered = map(&[
            ("script-src", &["'self'", "'sha256-new'", "https://cdn.example.com"]),
            ("img-src", &["'self'"]),
        ]);

        let diff = PolicyDiff::compute(&stored, &discovered);
        assert!(!diff.is_valid());

        let script = diff.get("script-src").unwrap();
        assert!(script.missing.contains("'sha256-new'"));
        assert!(script.extra.contains("'sha256-old'"));
        assert_eq!(
            script.counts(),
            DiffCounts {
                missing_hashes: 1,
                extra_hashes: 1,
                missing_links: 1,
                extra_links: 1,
            }
        );

        assert!(diff.missing_directives.contains("img-src"));
        assert!(diff.extra_directives.contains("frame-src"));
        // directive-level mismatches also show up as token differences
        assert_eq!(diff.get("img-src").unwrap().missing.len(), 1);
        assert_eq!(diff.counts().total(), 6);
    }

    #[test]
    fn test_empty_directives_count_as_absent() {
        let stored = map(&[("script-src", &["'self'"])]);
        let discovered = map(&[("script-src", &["'self'"]), ("style-src-attr", &[])]);
        assert!(PolicyDiff::compute(&stored, &discovered).is_valid());
    }

    #[test]
    fn test_valueless_stored_directive_is_extra() {
        let stored = DirectiveMap::parse_policy("upgrade-insecure-requests; default-src 'self';");
        let discovered = map(&[("default-src", &["'self'"])]);

        let diff = PolicyDiff::compute(&stored, &discovered);
        assert!(!diff.is_valid());
        assert!(diff.extra_directives.contains("upgrade-insecure-requests"));
        assert!(diff.directives.is_empty());
        assert!(diff.counts().is_empty());
    }

    #[test]
    fn test_source_kind() {
        assert_eq!(SourceKind::of("'sha256-00ff'"), SourceKind::Hash);
        assert_eq!(SourceKind::of("'self'"), SourceKind::Link);
        assert_eq!(SourceKind::of("https://cdn.example.com"), SourceKind::Link);
    }
}
