// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Lightweight engine: plain HTTP, no JavaScript
//!
//! Sub-resources are not fetched; they are read from the markup and reported
//! through the request callback as if they had been loaded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_SECURITY_POLICY};
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::config::SessionConfig;
use super::network::is_network_url;
use super::session::{
    BrowserDriver, InteractionTarget, NavigationResponse, ObservedRequest, PageSession,
    RequestCallback,
};
use crate::dom::extract_elements;
use crate::error::{Error, Result};

const MAX_REDIRECTS: usize = 10;

/// Driver for [`HttpSession`]
#[derive(Debug, Clone, Default)]
pub struct HttpDriver;

impl HttpDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserDriver for HttpDriver {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn launch(
        &self,
        config: &SessionConfig,
        on_request: RequestCallback,
    ) -> Result<Box<dyn PageSession>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "accept",
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert("accept-language", HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.navigation_timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .default_headers(headers)
            .build()?;

        Ok(Box::new(HttpSession {
            client,
            on_request,
            document: None,
        }))
    }
}

/// Page session backed by a single GET
pub struct HttpSession {
    client: Client,
    on_request: RequestCallback,
    document: Option<String>,
}

impl HttpSession {
    fn report_subresources(&self, base: &Url, html: &str) {
        let elements = match extract_elements(html) {
            Ok(elements) => elements,
            Err(e) => {
                debug!(url = %base, error = %e, "Could not parse document for sub-resources");
                return;
            }
        };

        for element in &elements {
            let Some((raw, kind)) = element.external_resource() else {
                continue;
            };
            let resolved = match base.join(raw) {
                Ok(resolved) => resolved,
                Err(e) => {
                    debug!(url = raw, error = %e, "Unresolvable resource URL");
                    continue;
                }
            };
            if !is_network_url(resolved.as_str()) {
                continue;
            }
            (self.on_request)(&ObservedRequest {
                url: resolved.to_string(),
                kind,
            });
        }
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn install_observer(&mut self, _script: &str) -> Result<()> {
        Err(Error::Unsupported("DOM mutation observation".to_string()))
    }

    async fn navigate(&mut self, url: &str) -> Result<Option<NavigationResponse>> {
        self.document = None;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::navigation(url, e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let csp_header = response
            .headers()
            .get(CONTENT_SECURITY_POLICY)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .text()
            .await
            .map_err(|e| Error::navigation(url, e.to_string()))?;

        debug!(url = %final_url, status, bytes = body.len(), "Fetched document");
        self.report_subresources(&final_url, &body);
        self.document = Some(body);

        Ok(Some(NavigationResponse {
            status: Some(status),
            csp_header,
        }))
    }

    async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        Err(Error::Unsupported("scrolling".to_string()))
    }

    async fn query_targets(&mut self, _selector: &str, _limit: usize) -> Result<Vec<InteractionTarget>> {
        Ok(Vec::new())
    }

    async fn click(&mut self, _target: &InteractionTarget) -> Result<()> {
        Err(Error::Unsupported("clicking".to_string()))
    }

    async fn hover(&mut self, _target: &InteractionTarget) -> Result<()> {
        Err(Error::Unsupported("hovering".to_string()))
    }

    async fn evaluate_json(&mut self, _script: &str) -> Result<serde_json::Value> {
        Err(Error::Unsupported("script evaluation".to_string()))
    }

    async fn content(&mut self) -> Result<String> {
        self.document
            .clone()
            .ok_or_else(|| Error::browser("no document loaded"))
    }

    async fn close(&mut self) -> Result<()> {
        self.document = None;
        Ok(())
    }
}
