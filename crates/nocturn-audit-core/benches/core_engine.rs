use std::fs;
use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nocturn_audit_adapters::{Capabilities, RealFs};
use nocturn_audit_core::{
    extract::{extract_content_blocks, extract_venues, template_text},
    run_checks, RunOptions, RunRequest, Selectors,
};

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("workspace")
        .parent()
        .expect("repo")
        .join("fixtures")
        .join("demo-site")
}

fn bench_extraction(c: &mut Criterion) {
    let content =
        fs::read_to_string(fixture_root().join("src/data/venueContent.ts")).expect("content");
    let venues = fs::read_to_string(fixture_root().join("src/data/venues.ts")).expect("venues");

    c.bench_function("extract_content_blocks", |b| {
        b.iter(|| extract_content_blocks(black_box(&content)).expect("blocks"))
    });
    c.bench_function("extract_venues", |b| {
        b.iter(|| extract_venues(black_box(&venues)).expect("venues"))
    });
    c.bench_function("template_text", |b| {
        b.iter(|| template_text(black_box(&content)).expect("text"))
    });
}

fn bench_full_run(c: &mut Criterion) {
    let request = RunRequest {
        repo_root: fixture_root(),
        domain: None,
        capabilities: Capabilities::deny_all(),
        artifacts_root: None,
        run_id: None,
        command: None,
    };
    c.bench_function("run_checks_default", |b| {
        b.iter(|| {
            run_checks(
                &RealFs,
                black_box(&request),
                &Selectors::default(),
                &RunOptions::default(),
            )
            .expect("run")
        })
    });
}

criterion_group!(benches, bench_extraction, bench_full_run);
criterion_main!(benches);
