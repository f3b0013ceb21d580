// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Remote fetch options

use std::time::Duration;

use crate::error::{Error, Result};

/// How much user behaviour is simulated after load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum InteractionLevel {
    /// Load only
    #[default]
    None,
    /// Scroll to the bottom and let the network settle
    Basic,
    /// Basic, plus clicking and hovering interactive elements
    Advanced,
}

impl InteractionLevel {
    /// Parse the numeric level used on the command line (0, 1 or 2)
    pub fn from_level(level: u8) -> Result<Self> {
        match level {
            0 => Ok(InteractionLevel::None),
            1 => Ok(InteractionLevel::Basic),
            2 => Ok(InteractionLevel::Advanced),
            other => Err(Error::config(format!(
                "interaction level must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }

    pub fn level(&self) -> u8 {
        *self as u8
    }
}

/// Options for one remote fetch
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Extra wait before teardown for late loads
    pub wait: Duration,
    pub interaction_level: InteractionLevel,
    /// Retries after the first navigation attempt
    pub retries: u32,
    /// Capture elements inserted after load
    pub observe_dom: bool,
    /// Wait before retry `n` is `backoff_base * 2^n`
    pub backoff_base: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(2),
            interaction_level: InteractionLevel::None,
            retries: 2,
            observe_dom: false,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn interaction_level(mut self, level: InteractionLevel) -> Self {
        self.interaction_level = level;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn observe_dom(mut self, observe: bool) -> Self {
        self.observe_dom = observe;
        self
    }

    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }
}
