// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Headless Chrome driver over the DevTools protocol

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
    EventResponseReceived, EventWebSocketCreated, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::config::SessionConfig;
use super::network::{is_network_url, NetworkActivity};
use super::session::{
    BrowserDriver, InteractionTarget, NavigationResponse, ObservedRequest, PageSession,
    RequestCallback,
};
use crate::error::{Error, ErrorCode, ErrorContext, Result};
use crate::policy::ResourceKind;

const VISIBLE_FN: &str = "function() { \
    const r = this.getBoundingClientRect(); \
    const s = window.getComputedStyle(this); \
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; \
}";

const ENABLED_FN: &str = "function() { return !this.disabled; }";

const RESPONSE_POLL: Duration = Duration::from_millis(20);

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body ? document.body.scrollHeight : 0)";

/// Map a CDP resource type to a policy resource kind
pub fn classify_resource(resource_type: &ResourceType) -> Option<ResourceKind> {
    match resource_type {
        ResourceType::Script => Some(ResourceKind::Script),
        ResourceType::Stylesheet => Some(ResourceKind::Stylesheet),
        ResourceType::Image => Some(ResourceKind::Image),
        ResourceType::Font => Some(ResourceKind::Font),
        ResourceType::Media => Some(ResourceKind::Media),
        ResourceType::Fetch | ResourceType::Xhr | ResourceType::EventSource => {
            Some(ResourceKind::Fetch)
        }
        ResourceType::WebSocket => Some(ResourceKind::WebSocket),
        _ => None,
    }
}

/// Launches Chrome through chromiumoxide
#[derive(Debug, Clone, Default)]
pub struct ChromeDriver;

impl ChromeDriver {
    pub fn new() -> Self {
        Self
    }

    fn browser_config(config: &SessionConfig) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.navigation_timeout)
            .args(vec![
                "--disable-background-networking",
                "--disable-default-apps",
                "--disable-dev-shm-usage",
                "--disable-extensions",
                "--disable-popup-blocking",
                "--disable-sync",
                "--mute-audio",
                "--no-first-run",
                "--no-default-browser-check",
            ]);

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref executable) = config.executable {
            builder = builder.chrome_executable(executable.clone());
        }

        builder
            .build()
            .map_err(|e| Error::browser(format!("browser config error: {}", e)))
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn launch(
        &self,
        config: &SessionConfig,
        on_request: RequestCallback,
    ) -> Result<Box<dyn PageSession>> {
        let (browser, mut handler) = Browser::launch(Self::browser_config(config)?)
            .await
            .browser_context("failed to launch chromium")?;

        let mut tasks: Vec<JoinHandle<()>> = Vec::new();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        }));

        let mut session = ChromeSession {
            browser,
            page: None,
            activity: NetworkActivity::new(),
            document: Arc::new(Mutex::new(None)),
            targets: Vec::new(),
            tasks,
            idle_window: config.network_idle_window,
            closed: false,
        };

        // Nothing may leak if page setup fails half way
        if let Err(e) = session.open_page(config, on_request).await {
            let _ = session.close().await;
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

/// Main document response captured from `Network.responseReceived`
type DocumentSlot = Arc<Mutex<Option<NavigationResponse>>>;

struct ChromeSession {
    browser: Browser,
    page: Option<Page>,
    activity: NetworkActivity,
    document: DocumentSlot,
    targets: Vec<Element>,
    tasks: Vec<JoinHandle<()>>,
    idle_window: Duration,
    closed: bool,
}

impl ChromeSession {
    async fn open_page(&mut self, config: &SessionConfig, on_request: RequestCallback) -> Result<()> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .browser_context("failed to open page")?;

        page.execute(SetUserAgentOverrideParams::new(config.user_agent.clone()))
            .await
            .browser_context("failed to set user agent")?;
        page.execute(SetDeviceMetricsOverrideParams::new(
            config.viewport_width as i64,
            config.viewport_height as i64,
            1.0,
            false,
        ))
        .await
        .browser_context("failed to set viewport")?;
        page.execute(EnableParams::default())
            .await
            .browser_context("failed to enable network domain")?;

        self.spawn_listeners(&page, on_request).await?;
        self.page = Some(page);
        Ok(())
    }

    async fn spawn_listeners(&mut self, page: &Page, on_request: RequestCallback) -> Result<()> {
        let mut requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .browser_context("failed to listen for requests")?;
        let activity = self.activity.clone();
        let callback = on_request.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = requests.next().await {
                activity.request_started(event.request_id.inner().clone());

                let url = &event.request.url;
                let kind = match event.r#type.as_ref().and_then(classify_resource) {
                    Some(kind) => kind,
                    None => {
                        debug!(url = %url, resource_type = ?event.r#type, operation = "handle_request", "Ignored resource type");
                        continue;
                    }
                };
                if !is_network_url(url) {
                    continue;
                }
                callback(&ObservedRequest {
                    url: url.clone(),
                    kind,
                });
            }
        }));

        let mut finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .browser_context("failed to listen for finished loads")?;
        let activity = self.activity.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = finished.next().await {
                activity.request_finished(event.request_id.inner());
            }
        }));

        let mut failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .browser_context("failed to listen for failed loads")?;
        let activity = self.activity.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = failed.next().await {
                activity.request_finished(event.request_id.inner());
            }
        }));

        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .browser_context("failed to listen for responses")?;
        let main_frame = page.mainframe().await.browser_context("failed to resolve main frame")?;
        let document = self.document.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                if event.r#type != ResourceType::Document {
                    continue;
                }
                if main_frame.is_some() && event.frame_id != main_frame {
                    continue;
                }

                let csp_header = event.response.headers.inner().as_object().and_then(|headers| {
                    headers
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-security-policy"))
                        .and_then(|(_, value)| value.as_str().map(str::to_string))
                });
                *document.lock() = Some(NavigationResponse {
                    status: u16::try_from(event.response.status).ok(),
                    csp_header,
                });
            }
        }));

        let mut sockets = page
            .event_listener::<EventWebSocketCreated>()
            .await
            .browser_context("failed to listen for websockets")?;
        self.tasks.push(tokio::spawn(async move {
            while let Some(event) = sockets.next().await {
                on_request(&ObservedRequest {
                    url: event.url.clone(),
                    kind: ResourceKind::WebSocket,
                });
            }
        }));

        Ok(())
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::browser("page is not open"))
    }

    fn target(&self, target: &InteractionTarget) -> Result<&Element> {
        self.targets
            .get(target.index)
            .ok_or_else(|| Error::browser(format!("no element at index {}", target.index)))
    }
}

async fn element_flag(element: &Element, function: &str) -> bool {
    match element.call_js_fn(function, false).await {
        Ok(returns) => returns
            .result
            .value
            .as_ref()
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        Err(e) => {
            debug!(error = %e, "Element check failed");
            false
        }
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn install_observer(&mut self, script: &str) -> Result<()> {
        self.page()?
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await
            .browser_context("failed to install observer")?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<Option<NavigationResponse>> {
        *self.document.lock() = None;
        self.activity.reset();
        self.targets.clear();

        self.page()?
            .goto(url)
            .await
            .map_err(|e| Error::navigation(url, e.to_string()))?;

        // the response event is handled on a listener task and can trail goto
        let deadline = Instant::now() + self.idle_window;
        loop {
            let captured = self.document.lock().clone();
            if captured.is_some() {
                return Ok(captured);
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(RESPONSE_POLL).await;
        }

        debug!(url, "No main document response observed");
        Ok(Some(NavigationResponse::default()))
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()> {
        self.activity.wait_for_idle(self.idle_window, timeout).await
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page()?
            .evaluate(SCROLL_TO_BOTTOM)
            .await
            .browser_context("scroll failed")?;
        Ok(())
    }

    async fn query_targets(&mut self, selector: &str, limit: usize) -> Result<Vec<InteractionTarget>> {
        let mut elements = self
            .page()?
            .find_elements(selector)
            .await
            .browser_context("element query failed")?;
        elements.truncate(limit);

        let mut targets = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            targets.push(InteractionTarget {
                index,
                visible: element_flag(element, VISIBLE_FN).await,
                enabled: element_flag(element, ENABLED_FN).await,
            });
        }

        self.targets = elements;
        Ok(targets)
    }

    async fn click(&mut self, target: &InteractionTarget) -> Result<()> {
        self.target(target)?
            .click()
            .await
            .browser_context("click failed")?;
        Ok(())
    }

    async fn hover(&mut self, target: &InteractionTarget) -> Result<()> {
        self.target(target)?
            .hover()
            .await
            .browser_context("hover failed")?;
        Ok(())
    }

    async fn evaluate_json(&mut self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page()?
            .evaluate(script)
            .await
            .browser_context("evaluation failed")?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn content(&mut self) -> Result<String> {
        self.page()?
            .content()
            .await
            .browser_context("failed to read page content")
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.targets.clear();
        self.page = None;

        let closed = self.browser.close().await;
        if let Err(ref e) = closed {
            warn!(
                error = %e,
                operation = "close_browser",
                error_code = %ErrorCode::BrowserError,
                "Browser did not close cleanly"
            );
        }
        let _ = self.browser.wait().await;

        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!(operation = "close_browser", "Browser closed");
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_resource() {
        assert_eq!(classify_resource(&ResourceType::Script), Some(ResourceKind::Script));
        assert_eq!(classify_resource(&ResourceType::Xhr), Some(ResourceKind::Fetch));
        assert_eq!(classify_resource(&ResourceType::EventSource), Some(ResourceKind::Fetch));
        assert_eq!(classify_resource(&ResourceType::WebSocket), Some(ResourceKind::WebSocket));
        assert_eq!(classify_resource(&ResourceType::Document), None);
        assert_eq!(classify_resource(&ResourceType::Manifest), None);
    }
}
