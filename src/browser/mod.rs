// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Browser engines
//!
//! [`BrowserDriver`] / [`PageSession`] abstract one page in one browser.
//! `ChromeDriver` (feature `chrome`) drives real Chrome; [`HttpDriver`] is a
//! JavaScript-free fallback.

#[cfg(feature = "chrome")]
mod chrome;
mod config;
mod http;
mod network;
mod session;

#[cfg(feature = "chrome")]
pub use chrome::{classify_resource, ChromeDriver};
pub use config::{SessionConfig, DEFAULT_USER_AGENT, MAX_INTERACTIONS};
pub use http::{HttpDriver, HttpSession};
pub use network::{is_network_url, NetworkActivity};
pub use session::{
    BrowserDriver, InteractionTarget, NavigationResponse, ObservedRequest, PageSession,
    RequestCallback,
};
