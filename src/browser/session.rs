// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Driver and page session traits
//!
//! The orchestrator only talks to these traits, so a real Chrome, the
//! lightweight HTTP engine and scripted test sessions are interchangeable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::config::SessionConfig;
use crate::error::Result;
use crate::policy::ResourceKind;

/// A sub-resource request seen on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRequest {
    pub url: String,
    pub kind: ResourceKind,
}

/// Callback invoked for every classified request. Registered at launch,
/// before any page exists.
pub type RequestCallback = Arc<dyn Fn(&ObservedRequest) + Send + Sync>;

/// Main document response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationResponse {
    /// HTTP status
    pub status: Option<u16>,
    /// `content-security-policy` header, if sent
    pub csp_header: Option<String>,
}

/// Element matched for interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionTarget {
    /// Position among the matches of the last query
    pub index: usize,
    pub visible: bool,
    pub enabled: bool,
}

impl InteractionTarget {
    pub fn is_interactable(&self) -> bool {
        self.visible && self.enabled
    }
}

/// Launches page sessions
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &'static str;

    /// Start a browser with one page, reporting requests through
    /// `on_request` from the start
    async fn launch(
        &self,
        config: &SessionConfig,
        on_request: RequestCallback,
    ) -> Result<Box<dyn PageSession>>;
}

/// One page owned by one fetch
#[async_trait]
pub trait PageSession: Send {
    /// Run `script` in every document before its own scripts
    async fn install_observer(&mut self, script: &str) -> Result<()>;

    /// Load `url`. `Ok(None)` means navigation finished without a response.
    async fn navigate(&mut self, url: &str) -> Result<Option<NavigationResponse>>;

    /// Wait for network quiescence
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()>;

    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Match up to `limit` elements for `selector`, replacing earlier matches
    async fn query_targets(&mut self, selector: &str, limit: usize) -> Result<Vec<InteractionTarget>>;

    async fn click(&mut self, target: &InteractionTarget) -> Result<()>;

    async fn hover(&mut self, target: &InteractionTarget) -> Result<()>;

    /// Evaluate an expression and return its JSON value
    async fn evaluate_json(&mut self, script: &str) -> Result<serde_json::Value>;

    /// Rendered document markup
    async fn content(&mut self) -> Result<String>;

    /// Tear the browser down. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}
