// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Remote site discovery
//!
//! [`RemoteFetcher`] loads a URL through a [`BrowserDriver`](crate::browser::BrowserDriver),
//! records every network request the page makes and hashes the inline
//! content of the rendered document.

mod observer;
mod options;
mod orchestrator;
mod retry;

pub use observer::{decode_observed, RawObservedElement, COLLECT_SCRIPT, DISCONNECT_SCRIPT, OBSERVER_SCRIPT};
pub use options::{FetchOptions, InteractionLevel};
pub use orchestrator::{
    request_recorder, validate_url, FetchFailure, FetchOutcome, FetchStage, RemoteFetcher,
    CLICK_SELECTOR, HOVER_SELECTOR,
};
pub use retry::{RetryDecision, RetryState};
