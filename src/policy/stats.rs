// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Discovery counters

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Named discovery counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    FilesProcessed,
    FilesWithNoInline,
    UniqueScriptHashes,
    UniqueStyleHashes,
    ExternalScripts,
    ExternalStyles,
    ExternalImages,
    ExternalFonts,
    ExternalMedia,
    ExternalConnections,
}

impl Stat {
    pub const ALL: [Stat; 10] = [
        Stat::FilesProcessed,
        Stat::FilesWithNoInline,
        Stat::UniqueScriptHashes,
        Stat::UniqueStyleHashes,
        Stat::ExternalScripts,
        Stat::ExternalStyles,
        Stat::ExternalImages,
        Stat::ExternalFonts,
        Stat::ExternalMedia,
        Stat::ExternalConnections,
    ];

    /// Key used in logs and JSON
    pub fn key(&self) -> &'static str {
        match self {
            Stat::FilesProcessed => "files_processed",
            Stat::FilesWithNoInline => "files_with_no_inline_scripts",
            Stat::UniqueScriptHashes => "unique_script_hashes",
            Stat::UniqueStyleHashes => "unique_style_hashes",
            Stat::ExternalScripts => "external_scripts",
            Stat::ExternalStyles => "external_styles",
            Stat::ExternalImages => "external_images",
            Stat::ExternalFonts => "external_fonts",
            Stat::ExternalMedia => "external_media",
            Stat::ExternalConnections => "external_connections",
        }
    }

    /// Human label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Stat::FilesProcessed => "Files processed",
            Stat::FilesWithNoInline => "Files with no inline content",
            Stat::UniqueScriptHashes => "Unique script hashes",
            Stat::UniqueStyleHashes => "Unique style hashes",
            Stat::ExternalScripts => "External scripts",
            Stat::ExternalStyles => "External styles",
            Stat::ExternalImages => "External images",
            Stat::ExternalFonts => "External fonts",
            Stat::ExternalMedia => "External media",
            Stat::ExternalConnections => "External connections",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Monotonic counters for one run. There is no way to decrement or reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    counters: [u64; 10],
}

impl DiscoveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, stat: Stat) {
        self.counters[stat.index()] += 1;
    }

    pub fn get(&self, stat: Stat) -> u64 {
        self.counters[stat.index()]
    }

    /// All counters in a fixed order
    pub fn iter(&self) -> impl Iterator<Item = (Stat, u64)> + '_ {
        Stat::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

impl Serialize for DiscoveryStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Stat::ALL.len()))?;
        for (stat, value) in self.iter() {
            map.serialize_entry(stat.key(), &value)?;
        }
        map.end()
    }
}
