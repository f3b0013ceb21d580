// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Content hashing for inline scripts and styles
//!
//! Tokens are always `'sha256-<hex>'`. Generation and validation share this
//! module, so a policy written by one run compares cleanly with the next.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::ErrorCode;

/// Prefix shared by every hash source token
pub const HASH_PREFIX: &str = "'sha256-";

lazy_static! {
    static ref CSS_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref CSS_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref CSS_SEPARATOR: Regex = Regex::new(r"\s*([{}:;])\s*").unwrap();
}

/// A `'sha256-<hex>'` source token
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashToken(String);

impl HashToken {
    /// Get the token text, quotes included
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the token text
    pub fn into_string(self) -> String {
        self.0
    }

    /// Check whether a source token is a hash source
    pub fn is_hash_source(source: &str) -> bool {
        source.starts_with(HASH_PREFIX)
    }
}

impl fmt::Display for HashToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HashToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the hash token for `content` (UTF-8 bytes, SHA-256, hex).
///
/// Empty content has no hash; the caller must skip insertion. `source` only
/// labels the log events.
pub fn compute_hash(content: &str, source: &str) -> Option<HashToken> {
    if content.is_empty() {
        warn!(
            source,
            operation = "compute_hash",
            error_code = %ErrorCode::HashComputationError,
            "Empty content provided for hashing"
        );
        return None;
    }

    let digest = Sha256::digest(content.as_bytes());
    let token = HashToken(format!("{}{}'", HASH_PREFIX, hex::encode(digest)));
    debug!(source, hash = %token, operation = "compute_hash", "Computed content hash");
    Some(token)
}

/// Canonicalize CSS text so incidental formatting does not change its hash.
///
/// Comments are dropped, whitespace collapsed, spacing around `{ } : ;`
/// removed, and every declaration list ends with `;`. Blank input yields an
/// empty string.
pub fn normalize_css(content: &str) -> String {
    let stripped = CSS_COMMENT.replace_all(content, "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let collapsed = CSS_WHITESPACE.replace_all(trimmed, " ");
    let tight = CSS_SEPARATOR.replace_all(&collapsed, "$1");

    if tight.contains('{') {
        normalize_blocks(&tight)
    } else {
        normalize_declarations(&tight)
    }
}

/// `color:red;;margin:0` -> `color:red;margin:0;`
fn normalize_declarations(css: &str) -> String {
    let props: Vec<&str> = css
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if props.is_empty() {
        return String::new();
    }
    format!("{};", props.join(";"))
}

/// Terminates every non-empty declaration block with `;` and drops empty
/// declarations. Nested blocks (`@media`) are handled the same way.
fn normalize_blocks(css: &str) -> String {
    let mut out = String::with_capacity(css.len() + 8);

    for ch in css.chars() {
        match ch {
            ';' => {
                if !matches!(out.chars().last(), None | Some(';') | Some('{') | Some('}')) {
                    out.push(';');
                }
            }
            '}' => {
                if !matches!(out.chars().last(), None | Some(';') | Some('{') | Some('}')) {
                    out.push(';');
                }
                out.push('}');
            }
            c => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash_hex_token() {
        let token = compute_hash("console.log('test');", "test").unwrap();
        let expected = format!(
            "'sha256-{}'",
            hex::encode(Sha256::digest("console.log('test');".as_bytes()))
        );
        assert_eq!(token.as_str(), expected);
        // "'sha256-" + 64 hex chars + "'"
        assert_eq!(token.as_str().len(), 8 + 64 + 1);
    }

    #[test]
    fn test_compute_hash_empty_is_none() {
        assert!(compute_hash("", "test").is_none());
    }

    #[test]
    fn test_compute_hash_is_stable_for_unicode() {
        let a = compute_hash("alert('Hello, 世界!');", "a").unwrap();
        let b = compute_hash("alert('Hello, 世界!');", "b").unwrap();
        assert_eq!(a, b);
        assert!(HashToken::is_hash_source(a.as_str()));
    }

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        let token = compute_hash("abc", "test").unwrap();
        assert_eq!(
            token.as_str(),
            "'sha256-ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad'"
        );
    }

    #[test]
    fn test_normalize_block_spacing() {
        assert_eq!(normalize_css("a { color : red }"), "a{color:red;}");
        assert_eq!(normalize_css("a{color:red;}"), "a{color:red;}");
        assert_eq!(
            normalize_css("body {\n  margin: 0;\n  padding: 0\n}\n"),
            "body{margin:0;padding:0;}"
        );
    }

    #[test]
    fn test_normalize_strips_comments() {
        assert_eq!(
            normalize_css("/* reset */ p { margin: 0; /* inner */ }"),
            "p{margin:0;}"
        );
        assert_eq!(normalize_css("/* only a comment */"), "");
    }

    #[test]
    fn test_normalize_attribute_declarations() {
        assert_eq!(normalize_css("color: red"), "color:red;");
        assert_eq!(normalize_css(" color:red ;; margin : 0 "), "color:red;margin:0;");
        assert_eq!(normalize_css(";"), "");
        assert_eq!(normalize_css("   "), "");
    }

    #[test]
    fn test_normalize_nested_blocks() {
        assert_eq!(
            normalize_css("@media (max-width: 600px) { a { color: red } }"),
            "@media (max-width:600px){a{color:red;}}"
        );
    }

    #[test]
    fn test_equivalent_styles_hash_identically() {
        let a = normalize_css("a{color:red}");
        let b = normalize_css("a {\n\tcolor: red;\n}");
        assert_eq!(compute_hash(&a, "a"), compute_hash(&b, "b"));
    }
}
