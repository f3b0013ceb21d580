// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Elements relevant to a content security policy

use crate::policy::ResourceKind;

/// An element found by a static parse or by the mutation observer.
///
/// Consumed as soon as it is ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedElement {
    /// `<script>`; inline when `src` is absent
    Script {
        content: Option<String>,
        src: Option<String>,
    },
    /// Inline `<style>` block
    Style { content: String },
    /// Any element carrying a `style` attribute
    StyleAttribute { tag: String, style: String },
    /// `<link rel="stylesheet" href>`
    Stylesheet { href: String },
    /// `<link rel="icon" href>`
    Icon { href: String },
    /// `<img src>`
    Image { src: String },
    /// `<audio>`, `<video>` or `<source>` with `src`
    Media { src: String },
}

impl ObservedElement {
    /// Tag name, lowercase
    pub fn tag(&self) -> &str {
        match self {
            ObservedElement::Script { .. } => "script",
            ObservedElement::Style { .. } => "style",
            ObservedElement::StyleAttribute { tag, .. } => tag,
            ObservedElement::Stylesheet { .. } | ObservedElement::Icon { .. } => "link",
            ObservedElement::Image { .. } => "img",
            ObservedElement::Media { .. } => "source",
        }
    }

    /// Inline `<script>` or `<style>` element, regardless of content
    pub fn is_inline_block(&self) -> bool {
        matches!(
            self,
            ObservedElement::Script { src: None, .. } | ObservedElement::Style { .. }
        )
    }

    /// URL and kind of the resource this element loads, if any
    pub fn external_resource(&self) -> Option<(&str, ResourceKind)> {
        let (url, kind) = match self {
            ObservedElement::Script { src: Some(src), .. } => (src, ResourceKind::Script),
            ObservedElement::Stylesheet { href } => (href, ResourceKind::Stylesheet),
            ObservedElement::Icon { href } => (href, ResourceKind::Image),
            ObservedElement::Image { src } => (src, ResourceKind::Image),
            ObservedElement::Media { src } => (src, ResourceKind::Media),
            _ => return None,
        };

        let url = url.trim();
        if url.is_empty() {
            None
        } else {
            Some((url, kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_block() {
        let inline = ObservedElement::Script {
            content: Some("a()".into()),
            src: None,
        };
        let external = ObservedElement::Script {
            content: None,
            src: Some("/app.js".into()),
        };
        assert!(inline.is_inline_block());
        assert!(!external.is_inline_block());
        assert_eq!(external.external_resource(), Some(("/app.js", ResourceKind::Script)));
        assert_eq!(inline.external_resource(), None);
    }

    #[test]
    fn test_blank_url_is_ignored() {
        let img = ObservedElement::Image { src: "  ".into() };
        assert_eq!(img.external_resource(), None);
    }
}
