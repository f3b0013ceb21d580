// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Generate, store and re-validate a policy for a directory of HTML files

use std::fs;

use tempfile::TempDir;

use hashcsp::config::CspConfig;
use hashcsp::{validate_policy, LocalScanner, PolicyState};

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("index.html"),
        "<html><head><style>h1 { color: navy }</style></head><body><script>init()</script></body></html>",
    )
    .unwrap();
    fs::create_dir(dir.path().join("blog")).unwrap();
    fs::write(
        dir.path().join("blog").join("post.htm"),
        r#"<script src="https://cdn.example.com/comments.js"></script><p>no inline</p>"#,
    )
    .unwrap();
    dir
}

fn scan(dir: &TempDir) -> PolicyState {
    let mut state = PolicyState::new();
    CspConfig::default().apply_to(&mut state);
    LocalScanner::new(&mut state).scan_directory(dir.path()).unwrap();
    state
}

#[test]
fn test_generate_then_validate() {
    let dir = site();
    let stored = scan(&dir).generate_serialized(true);
    assert!(stored.contains("script-src 'self' https://cdn.example.com/comments.js 'sha256-"));

    let outcome = validate_policy(&stored, &mut scan(&dir));
    assert!(outcome.valid);
}

#[test]
fn test_new_inline_script_fails_validation() {
    let dir = site();
    let stored = scan(&dir).generate_serialized(false);

    fs::write(
        dir.path().join("blog").join("post.htm"),
        r#"<script src="https://cdn.example.com/comments.js"></script><script>track()</script>"#,
    )
    .unwrap();

    let outcome = validate_policy(&stored, &mut scan(&dir));
    assert!(!outcome.valid);
    let script = outcome.diff.get("script-src").unwrap();
    assert_eq!(script.missing.len(), 1);
    assert!(script.missing.iter().all(|s| s.starts_with("'sha256-")));
    assert!(script.extra.is_empty());
}

#[test]
fn test_output_is_deterministic() {
    let dir = site();
    assert_eq!(
        scan(&dir).generate_serialized(false),
        scan(&dir).generate_serialized(false)
    );
}
