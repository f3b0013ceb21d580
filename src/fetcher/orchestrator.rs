// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Remote fetch pipeline
//!
//! One fetch owns one page session and walks it through a fixed sequence of
//! stages. Only navigation is retried; every later stage degrades to partial
//! results instead of failing the fetch. The session is closed on every
//! path once it has been launched.

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use super::observer::{decode_observed, COLLECT_SCRIPT, DISCONNECT_SCRIPT, OBSERVER_SCRIPT};
use super::options::{FetchOptions, InteractionLevel};
use super::retry::{RetryDecision, RetryState};
use crate::browser::{
    BrowserDriver, InteractionTarget, NavigationResponse, ObservedRequest, PageSession,
    RequestCallback, SessionConfig, MAX_INTERACTIONS,
};
use crate::dom::{extract_elements, ObservedElement};
use crate::error::{Error, ErrorCode, Result};
use crate::policy::SharedPolicy;
use crate::scanner::ElementIngestor;

/// Clickable elements for advanced interaction
pub const CLICK_SELECTOR: &str = "button, a[href], [onclick]";
/// Hoverable elements for advanced interaction
pub const HOVER_SELECTOR: &str = "[onmouseover]";

lazy_static! {
    static ref HTTP_URL: Regex = Regex::new(r"^https?://").unwrap();
}

/// Pipeline stage, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    ValidatingUrl,
    Launching,
    Navigating { attempt: u32 },
    Interacting,
    ScrapingStatic,
    ProcessingDynamic,
    Finalizing,
    Done,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::ValidatingUrl => f.write_str("VALIDATING_URL"),
            FetchStage::Launching => f.write_str("LAUNCHING"),
            FetchStage::Navigating { attempt } => write!(f, "NAVIGATING({})", attempt),
            FetchStage::Interacting => f.write_str("INTERACTING"),
            FetchStage::ScrapingStatic => f.write_str("SCRAPING_STATIC"),
            FetchStage::ProcessingDynamic => f.write_str("PROCESSING_DYNAMIC"),
            FetchStage::Finalizing => f.write_str("FINALIZING"),
            FetchStage::Done => f.write_str("DONE"),
        }
    }
}

/// Why a fetch reported failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// URL without an http(s) scheme; nothing was launched
    InvalidUrl { suggestion: String },
    /// Every navigation attempt failed
    NavigationExhausted { attempts: u32 },
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::InvalidUrl { suggestion } => {
                write!(f, "invalid URL, did you mean '{}'?", suggestion)
            }
            FetchFailure::NavigationExhausted { attempts } => {
                write!(f, "navigation failed after {} attempt(s)", attempts)
            }
        }
    }
}

/// Result of one fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub success: bool,
    /// The site's own `content-security-policy` header
    pub site_policy: Option<String>,
    /// Navigation attempts that failed before success or exhaustion
    pub failed_attempts: u32,
    pub failure: Option<FetchFailure>,
}

impl FetchOutcome {
    fn failed(failure: FetchFailure, failed_attempts: u32) -> Self {
        Self {
            success: false,
            site_policy: None,
            failed_attempts,
            failure: Some(failure),
        }
    }
}

/// Check the scheme, returning a corrected suggestion on failure
pub fn validate_url(url: &str) -> std::result::Result<(), String> {
    if HTTP_URL.is_match(url) {
        Ok(())
    } else {
        Err(format!("https://{}", url.trim().trim_start_matches('/')))
    }
}

/// Callback that records every observed request in the policy
pub fn request_recorder(policy: SharedPolicy) -> RequestCallback {
    Arc::new(move |request: &ObservedRequest| {
        policy
            .lock()
            .add_external_resource(&request.url, request.kind);
    })
}

/// Drives a browser session against one URL and feeds the shared policy
pub struct RemoteFetcher {
    driver: Box<dyn BrowserDriver>,
    config: SessionConfig,
    policy: SharedPolicy,
}

impl RemoteFetcher {
    pub fn new(driver: Box<dyn BrowserDriver>, config: SessionConfig, policy: SharedPolicy) -> Self {
        Self {
            driver,
            config,
            policy,
        }
    }

    pub fn policy(&self) -> &SharedPolicy {
        &self.policy
    }

    /// Fetch `url` and populate the policy.
    ///
    /// Invalid URLs and exhausted navigation are reported through
    /// [`FetchOutcome`]; only a browser that cannot be launched is an error.
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchOutcome> {
        enter(FetchStage::ValidatingUrl, url);
        if let Err(suggestion) = validate_url(url) {
            error!(
                url,
                suggested_url = %suggestion,
                operation = "fetch_remote_site",
                error_code = %ErrorCode::ValidationError,
                "Invalid URL"
            );
            return Ok(FetchOutcome::failed(FetchFailure::InvalidUrl { suggestion }, 0));
        }

        enter(FetchStage::Launching, url);
        let mut session = self
            .driver
            .launch(&self.config, request_recorder(self.policy.clone()))
            .await
            .map_err(|e| {
                error!(
                    url,
                    engine = self.driver.name(),
                    error = %e,
                    operation = "fetch_remote_site",
                    error_code = %ErrorCode::BrowserError,
                    "Failed to launch browser"
                );
                e
            })?;

        let outcome = self.run(session.as_mut(), url, options).await;

        if let Err(e) = session.close().await {
            warn!(
                url,
                error = %e,
                operation = "fetch_remote_site",
                error_code = %ErrorCode::BrowserError,
                "Browser teardown failed"
            );
        }

        Ok(outcome)
    }

    async fn run(&self, session: &mut dyn PageSession, url: &str, options: &FetchOptions) -> FetchOutcome {
        let mut observing = options.observe_dom;
        if observing {
            match session.install_observer(OBSERVER_SCRIPT).await {
                Ok(()) => info!(url, operation = "setup_mutation_observer", "MutationObserver enabled"),
                Err(e) => {
                    warn!(
                        url,
                        error = %e,
                        operation = "setup_mutation_observer",
                        error_code = %e.code(),
                        "DOM observation unavailable"
                    );
                    observing = false;
                }
            }
        }

        let (response, failed_attempts) = match self.navigate_with_retry(session, url, options).await {
            Ok(navigated) => navigated,
            Err(outcome) => return outcome,
        };

        self.interact(session, url, options.interaction_level).await;

        let mut ingestor = ElementIngestor::session();

        enter(FetchStage::ScrapingStatic, url);
        self.scrape_static(session, url, &mut ingestor).await;

        if observing {
            enter(FetchStage::ProcessingDynamic, url);
            self.process_dynamic(session, url, &mut ingestor).await;
        }

        enter(FetchStage::Finalizing, url);
        tokio::time::sleep(options.wait).await;
        self.settle(session, url).await;

        enter(FetchStage::Done, url);
        {
            let state = self.policy.lock();
            info!(
                url,
                operation = "fetch_remote_site",
                failed_attempts,
                processed_hashes = ingestor.processed_count(),
                directives = state.directives().len(),
                has_site_policy = response.csp_header.is_some(),
                "Successfully fetched and analyzed site"
            );
        }

        FetchOutcome {
            success: true,
            site_policy: response.csp_header,
            failed_attempts,
            failure: None,
        }
    }

    /// Returns the response and the number of failed attempts, or the final
    /// failure outcome
    async fn navigate_with_retry(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        options: &FetchOptions,
    ) -> std::result::Result<(NavigationResponse, u32), FetchOutcome> {
        let timeout = self.config.navigation_timeout;
        let mut retry = RetryState::new(options.retries, options.backoff_base);

        loop {
            let attempt = retry.attempt() + 1;
            enter(FetchStage::Navigating { attempt }, url);
            info!(
                url,
                attempt,
                total_attempts = retry.total_attempts(),
                operation = "fetch_remote_site",
                "Attempting to fetch URL"
            );

            let result = tokio::time::timeout(timeout, async {
                let response = session.navigate(url).await?;
                if response.is_some() {
                    session.wait_for_network_idle(timeout).await?;
                }
                Ok::<_, Error>(response)
            })
            .await;

            let failure = match result {
                Ok(Ok(Some(response))) => {
                    info!(
                        url,
                        status = ?response.status,
                        operation = "fetch_remote_site",
                        "{} CSP header",
                        if response.csp_header.is_some() { "Found" } else { "No" }
                    );
                    return Ok((response, retry.failures()));
                }
                Ok(Ok(None)) => Error::navigation(url, "no response received"),
                Ok(Err(e)) => e,
                Err(_) => Error::timeout("navigation", timeout.as_millis() as u64),
            };

            error!(
                url,
                attempt,
                error = %failure,
                operation = "fetch_remote_site",
                error_code = %failure.code(),
                "Attempt {} failed to fetch {}",
                attempt,
                url
            );

            match retry.record_failure() {
                RetryDecision::Retry { backoff, .. } => {
                    debug!(url, backoff_ms = backoff.as_millis() as u64, "Backing off before retry");
                    tokio::time::sleep(backoff).await;
                }
                RetryDecision::Exhausted { attempts } => {
                    error!(
                        url,
                        attempts,
                        operation = "fetch_remote_site",
                        error_code = %ErrorCode::NetworkError,
                        "Giving up on URL"
                    );
                    return Err(FetchOutcome::failed(
                        FetchFailure::NavigationExhausted { attempts },
                        retry.failures(),
                    ));
                }
            }
        }
    }

    async fn interact(&self, session: &mut dyn PageSession, url: &str, level: InteractionLevel) {
        if level == InteractionLevel::None {
            return;
        }
        enter(FetchStage::Interacting, url);

        debug!(url, operation = "fetch_remote_site", "Performing basic interactions");
        match session.scroll_to_bottom().await {
            Ok(()) => {
                tokio::time::sleep(self.config.settle_delay).await;
                self.settle(session, url).await;
            }
            Err(e) => warn!(
                url,
                error = %e,
                operation = "fetch_remote_site",
                error_code = %e.code(),
                "Scroll failed"
            ),
        }

        if level < InteractionLevel::Advanced {
            return;
        }

        debug!(url, operation = "fetch_remote_site", "Performing advanced interactions");
        let clickable = self.query(session, url, CLICK_SELECTOR).await;
        for target in clickable {
            let n = target.index + 1;
            if !target.is_interactable() {
                debug!(url, element = n, "Skipped clicking element: not visible or enabled");
                continue;
            }
            match session.click(&target).await {
                Ok(()) => {
                    debug!(url, element = n, "Clicked element");
                    tokio::time::sleep(self.config.settle_delay).await;
                    self.settle(session, url).await;
                }
                Err(e) => warn!(
                    url,
                    element = n,
                    error = %e,
                    operation = "fetch_remote_site",
                    error_code = %e.code(),
                    "Failed to click element"
                ),
            }
        }

        let hoverable = self.query(session, url, HOVER_SELECTOR).await;
        for target in hoverable {
            let n = target.index + 1;
            if !target.visible {
                debug!(url, element = n, "Skipped hovering element: not visible");
                continue;
            }
            match session.hover(&target).await {
                Ok(()) => {
                    debug!(url, element = n, "Hovered over element");
                    tokio::time::sleep(self.config.hover_settle).await;
                    self.settle(session, url).await;
                }
                Err(e) => warn!(
                    url,
                    element = n,
                    error = %e,
                    operation = "fetch_remote_site",
                    error_code = %e.code(),
                    "Failed to hover over element"
                ),
            }
        }
    }

    async fn query(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        selector: &str,
    ) -> Vec<InteractionTarget> {
        let limit = self.config.max_interactions.min(MAX_INTERACTIONS);
        match session.query_targets(selector, limit).await {
            Ok(targets) => targets,
            Err(e) => {
                warn!(
                    url,
                    selector,
                    error = %e,
                    operation = "fetch_remote_site",
                    error_code = %e.code(),
                    "Element query failed"
                );
                Vec::new()
            }
        }
    }

    /// Network idle wait that proceeds on timeout
    async fn settle(&self, session: &mut dyn PageSession, url: &str) {
        if let Err(e) = session.wait_for_network_idle(self.config.navigation_timeout).await {
            debug!(url, error = %e, "Network did not settle, proceeding");
        }
    }

    async fn scrape_static(&self, session: &mut dyn PageSession, url: &str, ingestor: &mut ElementIngestor) {
        let html = match session.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!(
                    url,
                    error = %e,
                    operation = "scrape_static",
                    error_code = %e.code(),
                    "Could not read rendered document"
                );
                return;
            }
        };

        let elements = match extract_elements(&html) {
            Ok(elements) => elements,
            Err(e) => {
                warn!(
                    url,
                    error = %e,
                    operation = "scrape_static",
                    error_code = %ErrorCode::FileProcessingError,
                    "Could not parse rendered document"
                );
                return;
            }
        };

        let added = self.ingest(ingestor, &elements, url, false);
        debug!(url, elements = elements.len(), added, operation = "scrape_static", "Processed rendered document");
    }

    async fn process_dynamic(&self, session: &mut dyn PageSession, url: &str, ingestor: &mut ElementIngestor) {
        let elements = match session.evaluate_json(COLLECT_SCRIPT).await {
            Ok(value) => decode_observed(value),
            Err(e) => {
                error!(
                    url,
                    error = %e,
                    operation = "get_observed_elements",
                    error_code = %ErrorCode::BrowserError,
                    "Failed to retrieve observed elements"
                );
                Vec::new()
            }
        };

        let added = self.ingest(ingestor, &elements, url, true);
        debug!(url, elements = elements.len(), added, operation = "process_observed_elements", "Processed observed elements");

        match session.evaluate_json(DISCONNECT_SCRIPT).await {
            Ok(_) => debug!(url, "Disconnected MutationObserver"),
            Err(e) => warn!(
                url,
                error = %e,
                operation = "process_observed_elements",
                error_code = %ErrorCode::BrowserError,
                "Failed to disconnect MutationObserver"
            ),
        }
    }

    /// One lock acquisition for the whole batch. Returns how many elements
    /// added something new.
    fn ingest(&self, ingestor: &mut ElementIngestor, elements: &[ObservedElement], url: &str, external: bool) -> usize {
        let mut state = self.policy.lock();
        elements
            .iter()
            .filter(|element| {
                if external {
                    ingestor.ingest(&mut state, element, url)
                } else {
                    ingestor.ingest_inline(&mut state, element, url)
                }
            })
            .count()
    }
}

fn enter(stage: FetchStage, url: &str) {
    debug!(url, stage = %stage, "Entering stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use tracing::field::{Field, Visit};
    use tracing::instrument::WithSubscriber;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    use crate::policy::{HashBucket, PolicyState, ResourceKind, Stat};

    /// What a scripted navigation attempt does
    #[derive(Clone)]
    enum Attempt {
        Fail,
        NoResponse,
        Hang,
        Respond(Option<String>),
    }

    #[derive(Default)]
    struct Script {
        attempts: VecDeque<Attempt>,
        html: String,
        requests: Vec<ObservedRequest>,
        observed: serde_json::Value,
        click_targets: Vec<InteractionTarget>,
        hover_targets: Vec<InteractionTarget>,
        fail_clicks: bool,
        observer_supported: bool,
        // recorded
        launches: u32,
        navigations: u32,
        clicks: Vec<usize>,
        hovers: Vec<usize>,
        scrolls: u32,
        observer_installed: bool,
        disconnected: bool,
        closed: u32,
    }

    #[derive(Clone)]
    struct ScriptedDriver {
        script: Arc<Mutex<Script>>,
        fail_launch: bool,
    }

    impl ScriptedDriver {
        fn new(script: Script) -> (Self, Arc<Mutex<Script>>) {
            let script = Arc::new(Mutex::new(script));
            (
                Self {
                    script: script.clone(),
                    fail_launch: false,
                },
                script,
            )
        }
    }

    struct ScriptedSession {
        script: Arc<Mutex<Script>>,
        on_request: RequestCallback,
    }

    #[async_trait]
    impl BrowserDriver for ScriptedDriver {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn launch(&self, _config: &SessionConfig, on_request: RequestCallback) -> Result<Box<dyn PageSession>> {
            if self.fail_launch {
                return Err(Error::browser("no chrome binary"));
            }
            self.script.lock().launches += 1;
            Ok(Box::new(ScriptedSession {
                script: self.script.clone(),
                on_request,
            }))
        }
    }

    #[async_trait]
    impl PageSession for ScriptedSession {
        async fn install_observer(&mut self, _script: &str) -> Result<()> {
            let mut script = self.script.lock();
            if !script.observer_supported {
                return Err(Error::Unsupported("DOM mutation observation".into()));
            }
            script.observer_installed = true;
            Ok(())
        }

        async fn navigate(&mut self, url: &str) -> Result<Option<NavigationResponse>> {
            let (attempt, requests) = {
                let mut script = self.script.lock();
                script.navigations += 1;
                let attempt = script.attempts.pop_front().unwrap_or(Attempt::Fail);
                (attempt, script.requests.clone())
            };
            match attempt {
                Attempt::Fail => Err(Error::navigation(url, "net::ERR_CONNECTION_RESET")),
                Attempt::NoResponse => Ok(None),
                Attempt::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(None)
                }
                Attempt::Respond(csp_header) => {
                    for request in &requests {
                        (self.on_request)(request);
                    }
                    Ok(Some(NavigationResponse {
                        status: Some(200),
                        csp_header,
                    }))
                }
            }
        }

        async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        async fn scroll_to_bottom(&mut self) -> Result<()> {
            self.script.lock().scrolls += 1;
            Ok(())
        }

        async fn query_targets(&mut self, selector: &str, limit: usize) -> Result<Vec<InteractionTarget>> {
            let script = self.script.lock();
            let targets = if selector == CLICK_SELECTOR {
                &script.click_targets
            } else {
                &script.hover_targets
            };
            Ok(targets.iter().take(limit).copied().collect())
        }

        async fn click(&mut self, target: &InteractionTarget) -> Result<()> {
            let mut script = self.script.lock();
            if script.fail_clicks {
                return Err(Error::browser("element detached"));
            }
            script.clicks.push(target.index);
            Ok(())
        }

        async fn hover(&mut self, target: &InteractionTarget) -> Result<()> {
            self.script.lock().hovers.push(target.index);
            Ok(())
        }

        async fn evaluate_json(&mut self, script_text: &str) -> Result<serde_json::Value> {
            let mut script = self.script.lock();
            if script_text == DISCONNECT_SCRIPT {
                script.disconnected = true;
                return Ok(serde_json::Value::Null);
            }
            Ok(std::mem::take(&mut script.observed))
        }

        async fn content(&mut self) -> Result<String> {
            Ok(self.script.lock().html.clone())
        }

        async fn close(&mut self) -> Result<()> {
            self.script.lock().closed += 1;
            Ok(())
        }
    }

    /// Collects the message of every error-level event
    #[derive(Clone, Default)]
    struct ErrorEvents(Arc<Mutex<Vec<String>>>);

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for ErrorEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                let mut visitor = MessageVisitor(String::new());
                event.record(&mut visitor);
                self.0.lock().push(visitor.0);
            }
        }
    }

    fn fetcher(driver: ScriptedDriver) -> RemoteFetcher {
        RemoteFetcher::new(
            Box::new(driver),
            SessionConfig::for_testing(),
            PolicyState::new().into_shared(),
        )
    }

    fn options(retries: u32) -> FetchOptions {
        FetchOptions::new()
            .retries(retries)
            .wait(Duration::ZERO)
            .backoff_base(Duration::from_millis(1))
    }

    fn target(index: usize, visible: bool, enabled: bool) -> InteractionTarget {
        InteractionTarget {
            index,
            visible,
            enabled,
        }
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://localhost:8080/x").is_ok());
        assert_eq!(validate_url("example.com").unwrap_err(), "https://example.com");
        assert_eq!(validate_url("ftp://example.com").unwrap_err(), "https://ftp://example.com");
    }

    #[tokio::test]
    async fn test_invalid_url_never_launches() {
        let (driver, script) = ScriptedDriver::new(Script::default());
        let outcome = fetcher(driver).fetch("example.com", &options(2)).await.unwrap();

        assert!(!outcome.success);
        assert_eq!(
            outcome.failure,
            Some(FetchFailure::InvalidUrl {
                suggestion: "https://example.com".into()
            })
        );
        assert_eq!(script.lock().launches, 0);
    }

    #[tokio::test]
    async fn test_retry_then_success() {
        let (driver, script) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![
                Attempt::Fail,
                Attempt::Fail,
                Attempt::Respond(Some("default-src 'self';".into())),
            ]),
            ..Default::default()
        });
        let events = ErrorEvents::default();
        let subscriber = Registry::default().with(events.clone());

        let outcome = fetcher(driver)
            .fetch("https://example.com", &options(3))
            .with_subscriber(subscriber)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.failed_attempts, 2);
        assert_eq!(outcome.site_policy.as_deref(), Some("default-src 'self';"));
        assert_eq!(
            *events.0.lock(),
            vec![
                "Attempt 1 failed to fetch https://example.com".to_string(),
                "Attempt 2 failed to fetch https://example.com".to_string(),
            ]
        );
        let script = script.lock();
        assert_eq!(script.navigations, 3);
        assert_eq!(script.closed, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_close_session() {
        let (driver, script) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![Attempt::Fail, Attempt::NoResponse]),
            ..Default::default()
        });
        let outcome = fetcher(driver).fetch("https://example.com", &options(1)).await.unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.site_policy, None);
        assert_eq!(outcome.failed_attempts, 2);
        assert_eq!(outcome.failure, Some(FetchFailure::NavigationExhausted { attempts: 2 }));
        assert_eq!(script.lock().closed, 1);
    }

    #[tokio::test]
    async fn test_navigation_timeout_is_retried() {
        let (driver, _) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![Attempt::Hang, Attempt::Respond(None)]),
            ..Default::default()
        });
        let mut fetcher = fetcher(driver);
        fetcher.config = fetcher.config.clone().navigation_timeout(Duration::from_millis(50));

        let outcome = fetcher.fetch("https://example.com", &options(1)).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.failed_attempts, 1);
        assert_eq!(outcome.site_policy, None);
    }

    #[tokio::test]
    async fn test_launch_failure_propagates() {
        let (mut driver, _) = ScriptedDriver::new(Script::default());
        driver.fail_launch = true;
        let err = fetcher(driver).fetch("https://example.com", &options(0)).await.unwrap_err();
        assert!(matches!(err, Error::Browser(_)));
    }

    #[tokio::test]
    async fn test_requests_and_static_scrape() {
        let (driver, _) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![Attempt::Respond(None)]),
            html: r#"<html><head><style>a { color: red }</style>
                     <script src="/app.js"></script></head>
                     <body style="margin: 0"><script>init()</script></body></html>"#
                .into(),
            requests: vec![
                ObservedRequest {
                    url: "https://example.com/app.js".into(),
                    kind: ResourceKind::Script,
                },
                ObservedRequest {
                    url: "wss://example.com/live".into(),
                    kind: ResourceKind::WebSocket,
                },
            ],
            ..Default::default()
        });
        let fetcher = fetcher(driver);
        fetcher.fetch("https://example.com", &options(0)).await.unwrap();

        let state = fetcher.policy().lock();
        assert_eq!(state.hashes(HashBucket::Script).len(), 1);
        assert_eq!(state.hashes(HashBucket::Style).len(), 1);
        assert_eq!(state.hashes(HashBucket::StyleAttr).len(), 1);
        assert_eq!(state.stats().get(Stat::ExternalScripts), 1);
        assert_eq!(state.stats().get(Stat::ExternalConnections), 1);
        // external resources come from the network, not from the markup
        assert!(!state.directives().contains_source("script-src", "/app.js"));
    }

    #[tokio::test]
    async fn test_dynamic_elements_deduplicated_against_static() {
        let (driver, script) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![Attempt::Respond(None)]),
            html: "<script>init()</script><style>a{color:red}</style>".into(),
            observed: json!([
                {"tag": "script", "content": "init()", "src": null, "style": null},
                {"tag": "style", "content": "a {\n  color: red;\n}", "src": null, "style": null},
                {"tag": "script", "content": "lateAd()", "src": null, "style": null},
                {"tag": "img", "content": null, "src": "https://ads.example.com/pixel.gif", "style": null}
            ]),
            observer_supported: true,
            ..Default::default()
        });
        let fetcher = fetcher(driver);
        let opts = options(0).observe_dom(true);
        fetcher.fetch("https://example.com", &opts).await.unwrap();

        {
            let script = script.lock();
            assert!(script.observer_installed);
            assert!(script.disconnected);
        }
        let state = fetcher.policy().lock();
        assert_eq!(state.hashes(HashBucket::Script).len(), 2);
        assert_eq!(state.hashes(HashBucket::Style).len(), 1);
        assert!(state
            .directives()
            .contains_source("img-src", "https://ads.example.com/pixel.gif"));
    }

    #[tokio::test]
    async fn test_observer_unsupported_skips_dynamic_stage() {
        let (driver, script) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![Attempt::Respond(None)]),
            observed: json!([{"tag": "script", "content": "x()"}]),
            ..Default::default()
        });
        let fetcher = fetcher(driver);
        let outcome = fetcher
            .fetch("https://example.com", &options(0).observe_dom(true))
            .await
            .unwrap();

        assert!(outcome.success);
        assert!(!script.lock().disconnected);
        assert!(fetcher.policy().lock().hashes(HashBucket::Script).is_empty());
    }

    #[tokio::test]
    async fn test_interaction_levels() {
        let script = Script {
            attempts: VecDeque::from(vec![Attempt::Respond(None)]),
            click_targets: vec![
                target(0, true, true),
                target(1, false, true),
                target(2, true, false),
                target(3, true, true),
            ],
            hover_targets: vec![target(0, true, false), target(1, false, true)],
            ..Default::default()
        };

        let (driver, recorded) = ScriptedDriver::new(script);
        fetcher(driver)
            .fetch(
                "https://example.com",
                &options(0).interaction_level(InteractionLevel::Basic),
            )
            .await
            .unwrap();
        {
            let recorded = recorded.lock();
            assert_eq!(recorded.scrolls, 1);
            assert!(recorded.clicks.is_empty());
        }

        let mut script = std::mem::take(&mut *recorded.lock());
        script.attempts = VecDeque::from(vec![Attempt::Respond(None)]);
        script.scrolls = 0;
        let (driver, recorded) = ScriptedDriver::new(script);
        fetcher(driver)
            .fetch(
                "https://example.com",
                &options(0).interaction_level(InteractionLevel::Advanced),
            )
            .await
            .unwrap();

        let recorded = recorded.lock();
        assert_eq!(recorded.scrolls, 1);
        assert_eq!(recorded.clicks, vec![0, 3]);
        assert_eq!(recorded.hovers, vec![0]);
    }

    #[tokio::test]
    async fn test_interaction_cap() {
        let (driver, recorded) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![Attempt::Respond(None)]),
            click_targets: (0..8).map(|i| target(i, true, true)).collect(),
            ..Default::default()
        });
        fetcher(driver)
            .fetch(
                "https://example.com",
                &options(0).interaction_level(InteractionLevel::Advanced),
            )
            .await
            .unwrap();
        assert_eq!(recorded.lock().clicks.len(), 5);
    }

    #[tokio::test]
    async fn test_interaction_cap_ignores_raised_config() {
        let (driver, recorded) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![Attempt::Respond(None)]),
            click_targets: (0..8).map(|i| target(i, true, true)).collect(),
            ..Default::default()
        });
        let mut config = SessionConfig::for_testing();
        config.max_interactions = 8;
        RemoteFetcher::new(Box::new(driver), config, PolicyState::new().into_shared())
            .fetch(
                "https://example.com",
                &options(0).interaction_level(InteractionLevel::Advanced),
            )
            .await
            .unwrap();
        assert_eq!(recorded.lock().clicks.len(), MAX_INTERACTIONS);
    }

    #[tokio::test]
    async fn test_failed_clicks_do_not_abort() {
        let (driver, recorded) = ScriptedDriver::new(Script {
            attempts: VecDeque::from(vec![Attempt::Respond(None)]),
            html: "<script>a()</script>".into(),
            click_targets: vec![target(0, true, true), target(1, true, true)],
            hover_targets: vec![target(0, true, true)],
            fail_clicks: true,
            ..Default::default()
        });
        let fetcher = fetcher(driver);
        let outcome = fetcher
            .fetch(
                "https://example.com",
                &options(0).interaction_level(InteractionLevel::Advanced),
            )
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(recorded.lock().hovers, vec![0]);
        assert_eq!(fetcher.policy().lock().hashes(HashBucket::Script).len(), 1);
    }
}
