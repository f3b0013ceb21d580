// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hashcsp::dom::extract_elements;
use hashcsp::{compute_hash, normalize_css, HashBucket, PolicyState, ResourceKind};

fn hashing_benchmark(c: &mut Criterion) {
    let script = "window.dataLayer = window.dataLayer || []; function gtag(){dataLayer.push(arguments);} gtag('js', new Date());".repeat(20);

    c.bench_function("compute_hash", |b| {
        b.iter(|| black_box(compute_hash(black_box(&script), "bench")))
    });
}

fn normalize_benchmark(c: &mut Criterion) {
    let css = r#"
        /* layout */
        body { margin : 0 ; padding: 0 }
        .nav > a:hover { color : #333;; text-decoration: underline }
        @media (max-width: 600px) { .nav { display: none } }
    "#
    .repeat(10);

    c.bench_function("normalize_css", |b| {
        b.iter(|| black_box(normalize_css(black_box(&css))))
    });
}

fn serialization_benchmark(c: &mut Criterion) {
    let mut state = PolicyState::new();
    state.set_default_directives();
    for i in 0..200 {
        if let Some(token) = compute_hash(&format!("init({})", i), "bench") {
            state.add_hash(HashBucket::Script, token, "bench");
        }
        state.add_external_resource(&format!("https://cdn{}.example.com/lib.js", i), ResourceKind::Script);
    }

    c.bench_function("generate_serialized", |b| {
        b.iter(|| black_box(state.generate_serialized(false)))
    });
}

fn extraction_benchmark(c: &mut Criterion) {
    let html = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <style>body { color: red }</style>
            <script src="/app.js"></script>
            <link rel="stylesheet" href="/site.css">
        </head>
        <body style="margin: 0">
            <script>console.log('ready')</script>
            <img src="/logo.png">
        </body>
        </html>
    "#;

    c.bench_function("extract_elements", |b| {
        b.iter(|| black_box(extract_elements(black_box(html))))
    });
}

criterion_group!(
    benches,
    hashing_benchmark,
    normalize_benchmark,
    serialization_benchmark,
    extraction_benchmark
);
criterion_main!(benches);
