// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Mutation observer injected before navigation

use serde::Deserialize;
use tracing::warn;

use crate::dom::ObservedElement;
use crate::error::ErrorCode;

/// Installed on every new document. Buffers inserted scripts, styles and
/// `style` attribute changes until read back.
pub const OBSERVER_SCRIPT: &str = r#"
(() => {
    window.__hashcsp_observed_elements = [];
    window.__hashcsp_disconnect_observer = () => {};
    const record = (el) => {
        const tag = el.tagName ? el.tagName.toLowerCase() : null;
        const inline = tag === 'script' || tag === 'style';
        let src = null;
        if (tag === 'script' && el.getAttribute('src')) src = el.src;
        else if (tag === 'link' && el.getAttribute('href')) src = el.href;
        else if (tag === 'img' && el.getAttribute('src')) src = el.src;
        window.__hashcsp_observed_elements.push({
            tag: tag,
            rel: tag === 'link' ? el.getAttribute('rel') : null,
            content: inline ? el.textContent : null,
            src: src,
            style: el.getAttribute('style')
        });
    };
    const observer = new MutationObserver((mutations) => {
        for (const mutation of mutations) {
            if (mutation.type === 'attributes') {
                if (mutation.attributeName === 'style' && mutation.target.nodeType === 1) {
                    const style = mutation.target.getAttribute('style');
                    if (style) {
                        window.__hashcsp_observed_elements.push({
                            tag: mutation.target.tagName.toLowerCase(),
                            rel: null, content: null, src: null, style: style
                        });
                    }
                }
                continue;
            }
            mutation.addedNodes.forEach((node) => {
                if (node.nodeType !== 1) return;
                const tag = node.tagName.toLowerCase();
                if (['script', 'style', 'link', 'img'].includes(tag) || node.hasAttribute('style')) {
                    record(node);
                }
                node.querySelectorAll('script, style, link, img, [style]').forEach(record);
            });
        }
    });
    observer.observe(document, {
        childList: true,
        subtree: true,
        attributes: true,
        attributeFilter: ['style']
    });
    window.__hashcsp_disconnect_observer = () => observer.disconnect();
})();
"#;

/// Reads and clears the buffer
pub const COLLECT_SCRIPT: &str = r#"
(() => {
    const elements = window.__hashcsp_observed_elements || [];
    window.__hashcsp_observed_elements = [];
    return elements;
})()
"#;

pub const DISCONNECT_SCRIPT: &str =
    "if (window.__hashcsp_disconnect_observer) { window.__hashcsp_disconnect_observer(); }";

/// Element record as produced by [`OBSERVER_SCRIPT`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawObservedElement {
    pub tag: Option<String>,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

impl RawObservedElement {
    /// Typed elements carried by this record. A record can yield both an
    /// element and its `style` attribute.
    pub fn into_elements(self) -> Vec<ObservedElement> {
        let tag = match self.tag {
            Some(tag) => tag.to_ascii_lowercase(),
            None => {
                warn!(
                    operation = "process_observed_elements",
                    error_code = %ErrorCode::ValidationError,
                    "Skipping element without tag"
                );
                return Vec::new();
            }
        };

        let mut elements = Vec::new();
        match tag.as_str() {
            "script" => elements.push(match self.src {
                Some(src) => ObservedElement::Script {
                    content: None,
                    src: Some(src),
                },
                None => ObservedElement::Script {
                    content: self.content,
                    src: None,
                },
            }),
            "style" => {
                if let Some(content) = self.content {
                    elements.push(ObservedElement::Style { content });
                }
            }
            "link" => {
                let rel = self.rel.unwrap_or_default().to_ascii_lowercase();
                if let Some(href) = self.src {
                    if rel.split_whitespace().any(|r| r == "stylesheet") {
                        elements.push(ObservedElement::Stylesheet { href });
                    } else if rel.split_whitespace().any(|r| r == "icon") {
                        elements.push(ObservedElement::Icon { href });
                    }
                }
            }
            "img" => {
                if let Some(src) = self.src {
                    elements.push(ObservedElement::Image { src });
                }
            }
            _ => {}
        }

        if let Some(style) = self.style {
            elements.push(ObservedElement::StyleAttribute { tag, style });
        }
        elements
    }
}

/// Decode the buffer returned by [`COLLECT_SCRIPT`]. Malformed entries are
/// dropped.
pub fn decode_observed(value: serde_json::Value) -> Vec<ObservedElement> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => return Vec::new(),
        other => {
            warn!(
                operation = "get_observed_elements",
                error_code = %ErrorCode::BrowserError,
                value_type = %json_type(&other),
                "Observed elements buffer is not an array"
            );
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawObservedElement>(item) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(
                    operation = "get_observed_elements",
                    error = %e,
                    error_code = %ErrorCode::ValidationError,
                    "Malformed observed element"
                );
                None
            }
        })
        .flat_map(RawObservedElement::into_elements)
        .collect()
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_observed() {
        let value = json!([
            {"tag": "SCRIPT", "rel": null, "content": "late()", "src": null, "style": null},
            {"tag": "script", "rel": null, "content": null, "src": "https://ads.example.com/t.js", "style": null},
            {"tag": "div", "rel": null, "content": null, "src": null, "style": "color: blue"},
            {"tag": "link", "rel": "stylesheet", "content": null, "src": "https://cdn.example.com/x.css", "style": null},
            {"tag": null, "content": "dropped()"},
            {"tag": 7}
        ]);

        let elements = decode_observed(value);
        assert_eq!(
            elements,
            vec![
                ObservedElement::Script {
                    content: Some("late()".into()),
                    src: None
                },
                ObservedElement::Script {
                    content: None,
                    src: Some("https://ads.example.com/t.js".into())
                },
                ObservedElement::StyleAttribute {
                    tag: "div".into(),
                    style: "color: blue".into()
                },
                ObservedElement::Stylesheet {
                    href: "https://cdn.example.com/x.css".into()
                },
            ]
        );
    }

    #[test]
    fn test_style_element_with_attribute() {
        let raw = RawObservedElement {
            tag: Some("style".into()),
            content: Some("p{}".into()),
            style: Some("display:none".into()),
            ..Default::default()
        };
        assert_eq!(raw.into_elements().len(), 2);
    }

    #[test]
    fn test_non_array_buffer() {
        assert!(decode_observed(json!({"tag": "script"})).is_empty());
        assert!(decode_observed(serde_json::Value::Null).is_empty());
    }
}
