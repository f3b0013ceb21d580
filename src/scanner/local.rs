// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Local HTML tree scanner

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use super::ingest::ElementIngestor;
use crate::dom::extract_elements;
use crate::error::{Error, ErrorCode, Result};
use crate::policy::PolicyState;

/// Why a file was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// File could not be read
    Read(String),
    /// Not valid UTF-8
    InvalidEncoding,
    /// HTML could not be parsed
    Parse(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Read(e) => write!(f, "read failed: {}", e),
            SkipReason::InvalidEncoding => f.write_str("invalid encoding"),
            SkipReason::Parse(e) => write!(f, "parse failed: {}", e),
        }
    }
}

/// Result of scanning one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileScan {
    Scanned { has_inline: bool },
    Skipped(SkipReason),
}

impl FileScan {
    pub fn is_scanned(&self) -> bool {
        matches!(self, FileScan::Scanned { .. })
    }
}

/// Outcome of a directory walk
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub files_found: usize,
    pub files_scanned: usize,
    pub skipped: Vec<(PathBuf, SkipReason)>,
}

/// Walks a directory and feeds every HTML document into a policy state
pub struct LocalScanner<'a> {
    state: &'a mut PolicyState,
    ingestor: ElementIngestor,
}

impl<'a> LocalScanner<'a> {
    pub fn new(state: &'a mut PolicyState) -> Self {
        Self {
            state,
            ingestor: ElementIngestor::local(),
        }
    }

    /// Scan every `.html` / `.htm` file below `root`.
    ///
    /// Files are visited in sorted order. Individual failures are recorded in
    /// the summary; only a missing root is an error.
    pub fn scan_directory(&mut self, root: &Path) -> Result<ScanSummary> {
        if !root.is_dir() {
            error!(
                directory = %root.display(),
                operation = "scan_directory",
                error_code = %ErrorCode::FileNotFound,
                "Directory does not exist"
            );
            return Err(Error::NotADirectory(root.to_path_buf()));
        }

        info!(directory = %root.display(), operation = "scan_directory", "Starting directory scan");

        let files = collect_html_files(root);

        let mut summary = ScanSummary {
            files_found: files.len(),
            ..Default::default()
        };

        for path in files {
            match self.scan_file(&path) {
                FileScan::Scanned { .. } => summary.files_scanned += 1,
                FileScan::Skipped(reason) => summary.skipped.push((path, reason)),
            }
        }

        info!(
            directory = %root.display(),
            operation = "scan_directory",
            files_found = summary.files_found,
            files_scanned = summary.files_scanned,
            files_skipped = summary.skipped.len(),
            "Directory scan completed"
        );

        Ok(summary)
    }

    /// Scan one HTML document
    pub fn scan_file(&mut self, path: &Path) -> FileScan {
        let file_path = path.display().to_string();
        debug!(file_path = %file_path, operation = "scan_file", "Starting file scan");

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = Error::from(e);
                error!(
                    file_path = %file_path,
                    operation = "scan_file",
                    error = %err,
                    error_code = %err.code(),
                    "Could not read file"
                );
                return FileScan::Skipped(SkipReason::Read(err.to_string()));
            }
        };

        let html = match String::from_utf8(bytes) {
            Ok(html) => html,
            Err(_) => {
                error!(
                    file_path = %file_path,
                    operation = "scan_file",
                    error_code = %ErrorCode::InvalidEncoding,
                    "Invalid file encoding"
                );
                return FileScan::Skipped(SkipReason::InvalidEncoding);
            }
        };

        let elements = match extract_elements(&html) {
            Ok(elements) => elements,
            Err(e) => {
                error!(
                    file_path = %file_path,
                    operation = "scan_file",
                    error = %e,
                    error_code = %ErrorCode::FileProcessingError,
                    "Error processing file"
                );
                return FileScan::Skipped(SkipReason::Parse(e.to_string()));
            }
        };

        let has_inline = elements.iter().any(|e| e.is_inline_block());
        for element in &elements {
            self.ingestor.ingest(self.state, element, &file_path);
        }

        if !has_inline {
            info!(file_path = %file_path, operation = "scan_file", "No inline scripts or styles found");
        }
        self.state.record_file_processed(has_inline);

        debug!(
            file_path = %file_path,
            operation = "scan_file",
            elements = elements.len(),
            "File scan completed"
        );
        FileScan::Scanned { has_inline }
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

/// Depth-first, entries sorted by name. Symlinks are not followed;
/// unreadable entries are logged and skipped.
fn collect_html_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(
                    directory = %e.path().unwrap_or(root).display(),
                    operation = "scan_directory",
                    error = %e,
                    error_code = %ErrorCode::FileIoError,
                    "Could not read directory entry"
                );
                continue;
            }
        };
        if entry.file_type().is_file() && is_html(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files
}
