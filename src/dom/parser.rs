// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTML extraction using html5ever

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::debug;

use super::element::ObservedElement;
use crate::error::{Error, Result};

/// Parse a document and collect every policy-relevant element in document
/// order
pub fn extract_elements(html: &str) -> Result<Vec<ObservedElement>> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let dom = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| Error::html(e.to_string()))?;

    let parse_errors = dom.errors.len();
    if parse_errors > 0 {
        debug!(parse_errors, "HTML parsed with recoverable errors");
    }

    let mut elements = Vec::new();
    collect(&dom.document, &mut elements);
    Ok(elements)
}

fn collect(handle: &Handle, out: &mut Vec<ObservedElement>) {
    if let NodeData::Element {
        ref name, ref attrs, ..
    } = handle.data
    {
        let tag = name.local.to_string();
        let attrs = attrs.borrow();
        let attr = |key: &str| {
            attrs
                .iter()
                .find(|a| &*a.name.local == key)
                .map(|a| a.value.to_string())
        };

        match tag.as_str() {
            "script" => {
                let src = attr("src");
                let content = if src.is_none() {
                    Some(text_content(handle))
                } else {
                    None
                };
                out.push(ObservedElement::Script { content, src });
            }
            "style" => out.push(ObservedElement::Style {
                content: text_content(handle),
            }),
            "link" => {
                let rel = attr("rel").unwrap_or_default().to_ascii_lowercase();
                if let Some(href) = attr("href") {
                    let mut rels = rel.split_whitespace();
                    if rels.clone().any(|r| r == "stylesheet") {
                        out.push(ObservedElement::Stylesheet { href });
                    } else if rels.any(|r| r == "icon") {
                        out.push(ObservedElement::Icon { href });
                    }
                }
            }
            "img" => {
                if let Some(src) = attr("src") {
                    out.push(ObservedElement::Image { src });
                }
            }
            "audio" | "video" | "source" => {
                if let Some(src) = attr("src") {
                    out.push(ObservedElement::Media { src });
                }
            }
            _ => {}
        }

        if let Some(style) = attr("style") {
            out.push(ObservedElement::StyleAttribute { tag, style });
        }
    }

    for child in handle.children.borrow().iter() {
        collect(child, out);
    }
}

/// Concatenated text of the direct text children
fn text_content(handle: &Handle) -> String {
    let mut text = String::new();
    for child in handle.children.borrow().iter() {
        if let NodeData::Text { ref contents } = child.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}
