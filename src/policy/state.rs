// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-run policy aggregate

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::directives::DirectiveMap;
use super::hash::HashToken;
use super::resource::ResourceKind;
use super::stats::{DiscoveryStats, Stat};
use crate::error::ErrorCode;

/// Policy state shared between the orchestrator and request callbacks
pub type SharedPolicy = Arc<Mutex<PolicyState>>;

/// Sources that weaken a policy enough to be reported by the linter
pub const UNSAFE_SOURCES: [&str; 3] = ["*", "data:", "'unsafe-inline'"];

/// Baseline directives used when nothing was declared
pub fn default_directives() -> DirectiveMap {
    let baseline: [(&str, &[&str]); 12] = [
        ("default-src", &["'self'"]),
        ("script-src", &["'self'"]),
        ("style-src", &["'self'"]),
        ("style-src-attr", &[]),
        ("img-src", &["'self'"]),
        ("font-src", &["'self'"]),
        ("media-src", &["'self'"]),
        ("connect-src", &["'self'"]),
        ("frame-src", &["'self'"]),
        ("worker-src", &["'self'"]),
        ("manifest-src", &["'self'"]),
        ("object-src", &["'none'"]),
    ];

    baseline
        .into_iter()
        .map(|(name, sources)| (name, sources.to_vec()))
        .collect()
}

/// Which inline content a hash permits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashBucket {
    Script,
    Style,
    StyleAttr,
}

impl HashBucket {
    /// Merge order at serialization time
    pub const ALL: [HashBucket; 3] = [HashBucket::Script, HashBucket::Style, HashBucket::StyleAttr];

    pub fn directive(&self) -> &'static str {
        match self {
            HashBucket::Script => "script-src",
            HashBucket::Style => "style-src",
            HashBucket::StyleAttr => "style-src-attr",
        }
    }

    fn stat(&self) -> Stat {
        match self {
            HashBucket::Script => Stat::UniqueScriptHashes,
            HashBucket::Style | HashBucket::StyleAttr => Stat::UniqueStyleHashes,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct HashBuckets {
    script: Vec<HashToken>,
    style: Vec<HashToken>,
    style_attr: Vec<HashToken>,
}

impl HashBuckets {
    fn get(&self, bucket: HashBucket) -> &Vec<HashToken> {
        match bucket {
            HashBucket::Script => &self.script,
            HashBucket::Style => &self.style,
            HashBucket::StyleAttr => &self.style_attr,
        }
    }

    fn get_mut(&mut self, bucket: HashBucket) -> &mut Vec<HashToken> {
        match bucket {
            HashBucket::Script => &mut self.script,
            HashBucket::Style => &mut self.style,
            HashBucket::StyleAttr => &mut self.style_attr,
        }
    }
}

/// One unsafe source found by [`PolicyState::lint_directives`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    pub directive: String,
    pub source: String,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsafe source '{}' found in {}", self.source, self.directive)
    }
}

/// Directives, hash buckets and counters for one run.
///
/// Every mutation is a single `&mut self` call, so wrapping the state in a
/// [`SharedPolicy`] makes each check-then-insert atomic.
#[derive(Debug, Clone, Default)]
pub struct PolicyState {
    directives: DirectiveMap,
    hashes: HashBuckets,
    stats: DiscoveryStats,
}

impl PolicyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap for sharing with request callbacks
    pub fn into_shared(self) -> SharedPolicy {
        Arc::new(Mutex::new(self))
    }

    /// Declared and discovered directives, without hashes
    pub fn directives(&self) -> &DirectiveMap {
        &self.directives
    }

    pub fn stats(&self) -> &DiscoveryStats {
        &self.stats
    }

    pub fn hashes(&self, bucket: HashBucket) -> &[HashToken] {
        self.hashes.get(bucket)
    }

    /// Install the baseline directives if none exist yet
    pub fn set_default_directives(&mut self) {
        if !self.directives.is_empty() {
            return;
        }
        self.directives = default_directives();
        debug!(
            operation = "set_default_directives",
            directives = self.directives.len(),
            "Applied default directives"
        );
    }

    /// Replace the sources of `name`.
    ///
    /// Blank tokens are dropped. If nothing remains the call is a no-op and
    /// returns false.
    pub fn update_directive<S: AsRef<str>>(&mut self, name: &str, sources: &[S]) -> bool {
        let name = name.trim();
        let cleaned: Vec<String> = sources
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if name.is_empty() || cleaned.is_empty() {
            warn!(
                operation = "update_directive",
                directive = name,
                error_code = %ErrorCode::ValidationError,
                "Ignoring directive update without sources"
            );
            return false;
        }

        debug!(
            operation = "update_directive",
            directive = name,
            sources = cleaned.len(),
            "Updated directive"
        );
        self.directives.set(name, cleaned);
        true
    }

    /// Allow an external resource. Returns true if the URL was new.
    pub fn add_external_resource(&mut self, url: &str, kind: ResourceKind) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }

        let directive = kind.directive();
        if !self.directives.insert_source(directive, url) {
            return false;
        }

        self.stats.increment(kind.stat());
        debug!(
            operation = "add_external_resource",
            url,
            resource_type = kind.as_str(),
            directive,
            "Added external resource"
        );
        true
    }

    /// Like [`PolicyState::add_external_resource`] for a kind given by name.
    /// Unknown kinds are logged and dropped.
    pub fn add_external_resource_named(&mut self, url: &str, kind: &str) -> bool {
        match ResourceKind::from_name(kind) {
            Some(kind) => self.add_external_resource(url, kind),
            None => {
                warn!(
                    operation = "add_external_resource",
                    url,
                    resource_type = kind,
                    error_code = %ErrorCode::ValidationError,
                    "Unknown resource type"
                );
                false
            }
        }
    }

    /// Record a hash. Returns true if it was new to the bucket.
    pub fn add_hash(&mut self, bucket: HashBucket, token: HashToken, source: &str) -> bool {
        let hashes = self.hashes.get_mut(bucket);
        if hashes.contains(&token) {
            return false;
        }

        debug!(
            operation = "add_hash",
            source,
            hash = %token,
            directive = bucket.directive(),
            "Added inline content hash"
        );
        hashes.push(token);
        self.stats.increment(bucket.stat());
        true
    }

    /// Count a scanned document
    pub fn record_file_processed(&mut self, has_inline: bool) {
        self.stats.increment(Stat::FilesProcessed);
        if !has_inline {
            self.stats.increment(Stat::FilesWithNoInline);
        }
    }

    /// Report every unsafe source, per directive
    pub fn lint_directives(&self) -> Vec<LintWarning> {
        let mut warnings = Vec::new();

        for (directive, sources) in self.directives.iter() {
            for source in sources {
                if UNSAFE_SOURCES.contains(&source.as_str()) {
                    error!(
                        operation = "lint_directives",
                        directive,
                        source = source.as_str(),
                        error_code = %ErrorCode::UnsafeDirective,
                        "Unsafe source in directive"
                    );
                    warnings.push(LintWarning {
                        directive: directive.to_string(),
                        source: source.clone(),
                    });
                }
            }
        }

        warnings
    }

    /// Directives with the hash buckets merged in. The state is not modified,
    /// so repeated calls give the same result.
    pub fn merged_directives(&self) -> DirectiveMap {
        let mut merged = self.directives.clone();
        for bucket in HashBucket::ALL {
            for token in self.hashes.get(bucket) {
                merged.insert_source(bucket.directive(), token.as_str());
            }
        }
        merged
    }

    /// Serialize the policy, applying defaults first if nothing was declared
    pub fn generate_serialized(&mut self, report: bool) -> String {
        self.set_default_directives();
        let policy = self.merged_directives().to_policy_string();

        if report {
            info!(
                operation = "generate_serialized",
                files_processed = self.stats.get(Stat::FilesProcessed),
                files_with_no_inline_scripts = self.stats.get(Stat::FilesWithNoInline),
                unique_script_hashes = self.stats.get(Stat::UniqueScriptHashes),
                unique_style_hashes = self.stats.get(Stat::UniqueStyleHashes),
                external_scripts = self.stats.get(Stat::ExternalScripts),
                external_styles = self.stats.get(Stat::ExternalStyles),
                external_images = self.stats.get(Stat::ExternalImages),
                external_fonts = self.stats.get(Stat::ExternalFonts),
                external_media = self.stats.get(Stat::ExternalMedia),
                external_connections = self.stats.get(Stat::ExternalConnections),
                policy_length = policy.len(),
                "CSP generation summary"
            );
        }

        policy
    }

    /// Parse policy text into a directive map
    pub fn parse_serialized(text: &str) -> DirectiveMap {
        DirectiveMap::parse_policy(text)
    }
}
