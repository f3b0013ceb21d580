// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Discovery from documents
//!
//! [`ElementIngestor`] is the single path from an observed element to the
//! policy state; [`LocalScanner`] drives it over a directory of HTML files.

mod ingest;
mod local;

pub use ingest::{ElementIngestor, StyleHashing};
pub use local::{FileScan, LocalScanner, ScanSummary, SkipReason};
