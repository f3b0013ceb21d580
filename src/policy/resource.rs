// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! External resource kinds and the directive each one is governed by

use std::fmt;

use serde::{Deserialize, Serialize};

use super::stats::Stat;

/// Kind of an externally loaded resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Stylesheet,
    Image,
    Font,
    Media,
    Fetch,
    WebSocket,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Script,
        ResourceKind::Stylesheet,
        ResourceKind::Image,
        ResourceKind::Font,
        ResourceKind::Media,
        ResourceKind::Fetch,
        ResourceKind::WebSocket,
    ];

    /// Directive that must allow this kind of resource
    pub fn directive(&self) -> &'static str {
        match self {
            ResourceKind::Script => "script-src",
            ResourceKind::Stylesheet => "style-src",
            ResourceKind::Image => "img-src",
            ResourceKind::Font => "font-src",
            ResourceKind::Media => "media-src",
            ResourceKind::Fetch | ResourceKind::WebSocket => "connect-src",
        }
    }

    /// Counter bumped when a new resource of this kind is recorded
    pub fn stat(&self) -> Stat {
        match self {
            ResourceKind::Script => Stat::ExternalScripts,
            ResourceKind::Stylesheet => Stat::ExternalStyles,
            ResourceKind::Image => Stat::ExternalImages,
            ResourceKind::Font => Stat::ExternalFonts,
            ResourceKind::Media => Stat::ExternalMedia,
            ResourceKind::Fetch | ResourceKind::WebSocket => Stat::ExternalConnections,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Script => "script",
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Image => "image",
            ResourceKind::Font => "font",
            ResourceKind::Media => "media",
            ResourceKind::Fetch => "fetch",
            ResourceKind::WebSocket => "websocket",
        }
    }

    /// Parse a kind name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
