// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Policy state engine
//!
//! Owns the directive map, the inline-content hash buckets and the discovery
//! counters, plus the text format shared by generation and validation.

mod directives;
mod hash;
mod resource;
mod serialize;
mod state;
mod stats;

pub use directives::DirectiveMap;
pub use hash::{compute_hash, normalize_css, HashToken, HASH_PREFIX};
pub use resource::ResourceKind;
pub use state::{
    default_directives, HashBucket, LintWarning, PolicyState, SharedPolicy, UNSAFE_SOURCES,
};
pub use stats::{DiscoveryStats, Stat};
