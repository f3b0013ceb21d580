// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser session configuration

use std::path::PathBuf;
use std::time::Duration;

/// Desktop Chrome user agent presented by every session
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Upper bound on elements clicked or hovered per selector
pub const MAX_INTERACTIONS: usize = 5;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// User agent string
    pub user_agent: String,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Bound on one navigation (including the network idle wait)
    pub navigation_timeout: Duration,
    /// Quiet period that counts as network idle
    pub network_idle_window: Duration,
    /// Pause after scrolling
    pub settle_delay: Duration,
    /// Pause after hovering an element
    pub hover_settle: Duration,
    /// Maximum elements clicked / hovered per selector
    pub max_interactions: usize,
    /// Run without a window
    pub headless: bool,
    /// Chrome binary, detected when unset
    pub executable: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport_width: 1920,
            viewport_height: 1080,
            navigation_timeout: Duration::from_secs(30),
            network_idle_window: Duration::from_millis(500),
            settle_delay: Duration::from_secs(1),
            hover_settle: Duration::from_millis(500),
            max_interactions: MAX_INTERACTIONS,
            headless: true,
            executable: None,
        }
    }
}

impl SessionConfig {
    /// Create a new session config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set viewport size
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set navigation timeout
    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Set network idle window
    pub fn network_idle_window(mut self, window: Duration) -> Self {
        self.network_idle_window = window;
        self
    }

    /// Set scroll and hover settle delays
    pub fn settle(mut self, after_scroll: Duration, after_hover: Duration) -> Self {
        self.settle_delay = after_scroll;
        self.hover_settle = after_hover;
        self
    }

    /// Cap interactions per selector, at most [`MAX_INTERACTIONS`]
    pub fn max_interactions(mut self, max: usize) -> Self {
        self.max_interactions = max.min(MAX_INTERACTIONS);
        self
    }

    /// Show or hide the browser window
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Use a specific Chrome binary
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// No settle delays and a short idle window, for tests
    pub fn for_testing() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(5),
            network_idle_window: Duration::from_millis(20),
            settle_delay: Duration::ZERO,
            hover_settle: Duration::ZERO,
            ..Default::default()
        }
    }
}
