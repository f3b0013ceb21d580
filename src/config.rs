// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Declared policy configuration (`hashcsp.json`)

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{Error, ErrorCode, Result};
use crate::policy::{default_directives, DirectiveMap, PolicyState};

/// Config file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "hashcsp.json";

/// Directive sources declared before discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CspConfig {
    #[serde(default = "default_directives")]
    pub directives: DirectiveMap,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            directives: default_directives(),
        }
    }
}

impl CspConfig {
    pub fn new(directives: DirectiveMap) -> Self {
        Self { directives }
    }

    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] from the working directory.
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Option<Self>> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(file_path = %path.display(), operation = "load_config", "No config file found");
                Ok(None)
            }
            Err(e) => {
                let err = Error::from(e);
                error!(
                    file_path = %path.display(),
                    error = %err,
                    operation = "load_config",
                    error_code = %err.code(),
                    "Unexpected error loading config"
                );
                Err(err)
            }
        }
    }

    /// Load and validate `path`, which must exist
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            let err = Error::from(e);
            error!(
                file_path = %path.display(),
                error = %err,
                operation = "validate_json_config",
                error_code = %err.code(),
                "Config file not readable"
            );
            err
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self> {
        let config: CspConfig = serde_json::from_str(text).map_err(|e| {
            error!(
                file_path = %path.display(),
                error = %e,
                operation = "load_config",
                error_code = %ErrorCode::InvalidJson,
                "Invalid CSP config"
            );
            Error::Serialization(e)
        })?;

        info!(
            file_path = %path.display(),
            operation = "load_config",
            directive_count = config.directives.len(),
            "Loaded config successfully"
        );
        Ok(config)
    }

    /// Pretty JSON text of this config
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write to `path` unless `dry_run`; returns the JSON text either way
    pub fn save(&self, path: &Path, dry_run: bool) -> Result<String> {
        let json = self.to_json()?;
        if dry_run {
            info!(file_path = %path.display(), operation = "save_config", "Dry run, config not written");
            return Ok(json);
        }

        fs::write(path, &json).map_err(|e| {
            let err = Error::from(e);
            error!(
                file_path = %path.display(),
                error = %err,
                operation = "save_config",
                error_code = %err.code(),
                "Failed to write config"
            );
            err
        })?;
        info!(file_path = %path.display(), operation = "save_config", "Config written");
        Ok(json)
    }

    /// Seed `state` through [`PolicyState::update_directive`]. Returns how
    /// many directives were applied.
    pub fn apply_to(&self, state: &mut PolicyState) -> usize {
        self.directives
            .iter()
            .filter(|&(name, sources)| state.update_directive(name, sources))
            .count()
    }
}

/// Parse `script-src:'self' https://x,style-src:'self'` into directive pairs.
///
/// Pairs split on `,`, name and sources on the first `:`, sources on
/// whitespace. Blank pairs are ignored.
pub fn parse_directive_pairs(text: &str) -> Result<Vec<(String, Vec<String>)>> {
    let mut pairs = Vec::new();

    for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, sources) = pair.split_once(':').ok_or_else(|| {
            Error::config(format!(
                "Invalid directive format: '{}'. Expected 'directive:value'",
                pair
            ))
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::config(format!("Empty directive in '{}'", pair)));
        }

        let sources: Vec<String> = sources.split_whitespace().map(str::to_string).collect();
        if sources.is_empty() {
            return Err(Error::config(format!(
                "No sources provided for directive '{}' in '{}'",
                name, pair
            )));
        }

        pairs.push((name.to_string(), sources));
    }

    if pairs.is_empty() {
        warn!(operation = "parse_directives", error_code = %ErrorCode::ValidationError, "No directives given");
    }
    Ok(pairs)
}
