// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Feeding observed elements into the policy state

use std::collections::HashSet;

use tracing::trace;

use crate::dom::ObservedElement;
use crate::policy::{compute_hash, normalize_css, HashBucket, HashToken, PolicyState};

/// How style text is turned into hash input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleHashing {
    /// Hash the text exactly as written
    Raw,
    /// Hash [`normalize_css`] output
    Normalized,
}

/// Shared hashing and external-resource logic for every discovery path.
///
/// A remote session keeps a set of tokens it has already handled so content
/// seen again by a later stage is skipped before it reaches the buckets.
#[derive(Debug, Clone)]
pub struct ElementIngestor {
    style_hashing: StyleHashing,
    style_attributes: bool,
    /// Icons and media count as external resources
    all_resources: bool,
    processed: Option<HashSet<HashToken>>,
}

impl ElementIngestor {
    /// Local files: raw styles, no `style` attributes, and only script,
    /// stylesheet and image references
    pub fn local() -> Self {
        Self {
            style_hashing: StyleHashing::Raw,
            style_attributes: false,
            all_resources: false,
            processed: None,
        }
    }

    /// Browser sessions: normalized styles, `style` attributes hashed, and a
    /// per-session processed set
    pub fn session() -> Self {
        Self {
            style_hashing: StyleHashing::Normalized,
            style_attributes: true,
            all_resources: true,
            processed: Some(HashSet::new()),
        }
    }

    /// Number of tokens handled this session
    pub fn processed_count(&self) -> usize {
        self.processed.as_ref().map(HashSet::len).unwrap_or(0)
    }

    /// Ingest inline content and the external resource of `element`.
    /// Returns true if anything new was recorded.
    pub fn ingest(&mut self, state: &mut PolicyState, element: &ObservedElement, source: &str) -> bool {
        let inline = self.ingest_inline(state, element, source);
        let external = match element {
            ObservedElement::Icon { .. } | ObservedElement::Media { .. } if !self.all_resources => false,
            _ => match element.external_resource() {
                Some((url, kind)) => state.add_external_resource(url, kind),
                None => false,
            },
        };
        inline || external
    }

    /// Ingest inline content only; external resources are left to network
    /// observation
    pub fn ingest_inline(
        &mut self,
        state: &mut PolicyState,
        element: &ObservedElement,
        source: &str,
    ) -> bool {
        let (bucket, text) = match element {
            ObservedElement::Script {
                content: Some(content),
                src: None,
            } => (HashBucket::Script, content.clone()),
            ObservedElement::Style { content } => (HashBucket::Style, self.style_text(content)),
            ObservedElement::StyleAttribute { style, .. } if self.style_attributes => {
                (HashBucket::StyleAttr, self.style_text(style))
            }
            _ => return false,
        };

        if text.trim().is_empty() {
            return false;
        }

        let token = match compute_hash(&text, source) {
            Some(token) => token,
            None => return false,
        };

        if let Some(processed) = self.processed.as_mut() {
            if !processed.insert(token.clone()) {
                trace!(source, hash = %token, "Hash already processed this session");
                return false;
            }
        }

        state.add_hash(bucket, token, source)
    }

    fn style_text(&self, css: &str) -> String {
        match self.style_hashing {
            StyleHashing::Raw => css.to_string(),
            StyleHashing::Normalized => normalize_css(css),
        }
    }
}
