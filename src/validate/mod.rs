// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Policy validation
//!
//! Serialization keeps insertion order, so the textual comparison decides
//! validity. [`PolicyDiff`] explains a mismatch.

mod diff;

pub use diff::{DiffCounts, DirectiveDiff, PolicyDiff, SourceKind};

use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::policy::{DirectiveMap, PolicyState};

/// Result of comparing a stored policy with the current state
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// Policy generated from the current state
    pub generated: String,
    pub diff: PolicyDiff,
}

/// Diff stored policy text against a discovered directive map
pub fn validate(stored_text: &str, discovered: &DirectiveMap) -> PolicyDiff {
    let stored = DirectiveMap::parse_policy(stored_text);
    PolicyDiff::compute(&stored, discovered)
}

/// Compare a stored policy with the one `state` generates now
pub fn validate_policy(stored_text: &str, state: &mut PolicyState) -> ValidationOutcome {
    let stored = stored_text.trim();
    let generated = state.generate_serialized(false);
    let valid = stored == generated;

    let diff = if valid {
        PolicyDiff::default()
    } else {
        validate(stored, &DirectiveMap::parse_policy(&generated))
    };

    if valid {
        info!(operation = "validate_policy", "CSP header validation successful");
    } else {
        let counts = diff.counts();
        warn!(
            operation = "validate_policy",
            error_code = %ErrorCode::ValidationError,
            differing_directives = diff.directives.len(),
            missing_directives = diff.missing_directives.len(),
            extra_directives = diff.extra_directives.len(),
            missing_hashes = counts.missing_hashes,
            extra_hashes = counts.extra_hashes,
            missing_links = counts.missing_links,
            extra_links = counts.extra_links,
            "CSP header mismatch"
        );
    }

    ValidationOutcome {
        valid,
        generated,
        diff,
    }
}
