// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # hashcsp - Content-Security-Policy generator
//!
//! Builds a CSP from what a site actually loads: inline scripts and styles
//! are hashed, external resources are allowed per directive, and the result
//! can be checked against a stored policy later.
//!
//! ## Features
//!
//! - Local scan: walks a directory of HTML files
//! - Remote fetch: drives headless Chrome (or plain HTTP) with retry,
//!   simulated scrolling / clicking / hovering and DOM mutation capture
//! - Network observation: every request the page makes lands in the right
//!   `*-src` directive
//! - Validation: structured diff of a stored policy against fresh discovery
//! - Lint: flags `*`, `data:` and `'unsafe-inline'`
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use hashcsp::{LocalScanner, PolicyState};
//!
//! fn main() -> hashcsp::Result<()> {
//!     let mut state = PolicyState::new();
//!     state.set_default_directives();
//!
//!     LocalScanner::new(&mut state).scan_directory(Path::new("./public"))?;
//!     println!("{}", state.generate_serialized(false));
//!     Ok(())
//! }
//! ```

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod policy;
pub mod report;
pub mod scanner;
pub mod validate;

// Re-exports for convenience

// Policy
pub use policy::{
    compute_hash, normalize_css, DirectiveMap, DiscoveryStats, HashBucket, HashToken,
    LintWarning, PolicyState, ResourceKind, SharedPolicy, Stat,
};

// Discovery
pub use dom::ObservedElement;
pub use fetcher::{FetchOptions, FetchOutcome, InteractionLevel, RemoteFetcher};
pub use scanner::{FileScan, LocalScanner, ScanSummary};

// Browser engines
#[cfg(feature = "chrome")]
pub use browser::ChromeDriver;
pub use browser::{BrowserDriver, HttpDriver, PageSession, SessionConfig};

// Validation
pub use validate::{validate, validate_policy, PolicyDiff, ValidationOutcome};

// Config
pub use config::CspConfig;

// Error types
pub use error::{Error, ErrorCode, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
