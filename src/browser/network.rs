// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! In-flight request tracking for network idle detection

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Only network URLs belong in a policy; `data:` and `blob:` loads are inline
pub fn is_network_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    ["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

#[derive(Debug)]
struct Activity {
    in_flight: HashSet<String>,
    last_change: Instant,
}

/// Network activity shared between event listeners and the session.
///
/// The network is idle once nothing is in flight and nothing has started or
/// finished for the idle window.
#[derive(Debug, Clone)]
pub struct NetworkActivity {
    inner: Arc<Mutex<Activity>>,
}

impl Default for NetworkActivity {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Activity {
                in_flight: HashSet::new(),
                last_change: Instant::now(),
            })),
        }
    }
}

impl NetworkActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_started(&self, request_id: impl Into<String>) {
        let mut activity = self.inner.lock();
        activity.in_flight.insert(request_id.into());
        activity.last_change = Instant::now();
    }

    pub fn request_finished(&self, request_id: &str) {
        let mut activity = self.inner.lock();
        if activity.in_flight.remove(request_id) {
            activity.last_change = Instant::now();
        }
    }

    /// Forget every in-flight request, e.g. after a navigation was abandoned
    pub fn reset(&self) {
        let mut activity = self.inner.lock();
        activity.in_flight.clear();
        activity.last_change = Instant::now();
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    pub fn is_idle(&self, window: Duration) -> bool {
        let activity = self.inner.lock();
        activity.in_flight.is_empty() && activity.last_change.elapsed() >= window
    }

    /// Wait until idle for `window`, failing with a timeout error after
    /// `timeout`
    pub async fn wait_for_idle(&self, window: Duration, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_idle(window) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::timeout("network idle", timeout.as_millis() as u64));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok, block_on};

    #[test]
    fn test_idle_after_window() {
        let activity = NetworkActivity::new();
        assert_ok!(block_on(
            activity.wait_for_idle(Duration::from_millis(20), Duration::from_secs(2))
        ));

        activity.request_started("late");
        assert_err!(block_on(
            activity.wait_for_idle(Duration::from_millis(10), Duration::from_millis(80))
        ));
    }

    #[tokio::test]
    async fn test_in_flight_blocks_idle() {
        let activity = NetworkActivity::new();
        activity.request_started("1");
        assert_eq!(activity.in_flight(), 1);

        let err = activity
            .wait_for_idle(Duration::from_millis(10), Duration::from_millis(150))
            .await
            .unwrap_err();
        assert!(err.is_timeout());

        activity.request_finished("1");
        activity
            .wait_for_idle(Duration::from_millis(10), Duration::from_secs(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_finish_from_other_task() {
        let activity = NetworkActivity::new();
        activity.request_started("doc");

        let listener = activity.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            listener.request_finished("doc");
        });

        activity
            .wait_for_idle(Duration::from_millis(10), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(activity.in_flight(), 0);
    }

    #[test]
    fn test_network_url_filter() {
        assert!(is_network_url("https://cdn.example.com/a.js"));
        assert!(is_network_url("WSS://live.example.com/socket"));
        assert!(!is_network_url("data:image/png;base64,AAAA"));
        assert!(!is_network_url("blob:https://example.com/1234"));
    }

    #[test]
    fn test_unknown_finish_is_ignored() {
        let activity = NetworkActivity::new();
        activity.request_finished("nope");
        assert_eq!(activity.in_flight(), 0);
    }
}
