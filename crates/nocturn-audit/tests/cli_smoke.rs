use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("workspace")
        .parent()
        .expect("repo")
        .join("fixtures")
        .join("demo-site")
}

fn copy_tree(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("create_dir_all");
    for entry in fs::read_dir(from).expect("read_dir") {
        let entry = entry.expect("entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("copy");
        }
    }
}

fn scratch_site() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    copy_tree(&fixture_root(), dir.path());
    dir
}

fn bin() -> Command {
    Command::cargo_bin("nocturn-audit").expect("bin")
}

#[test]
fn version_smoke() {
    bin()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nocturn-audit"));
}

#[test]
fn run_clean_site_passes() {
    bin()
        .args(["check", "run", "--format", "text"])
        .arg("--repo-root")
        .arg(fixture_root())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "summary: passed=33 failed=0 skipped=0 errors=0 total=33",
        ));
}

#[test]
fn run_emits_json_report() {
    let output = bin()
        .args(["check", "run", "--format", "json", "--run-id", "smoke_run"])
        .arg("--repo-root")
        .arg(fixture_root())
        .output()
        .expect("output");
    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid json report");
    assert_eq!(report["run_id"], "smoke_run");
    assert_eq!(report["summary"]["failed"], 0);
    assert_eq!(report["results"].as_array().map(Vec::len), Some(33));
}

#[test]
fn run_exits_two_on_failures() {
    let site = scratch_site();
    let content = site.path().join("src/data/venueContent.ts");
    let text = fs::read_to_string(&content).expect("read");
    fs::write(&content, text.replace("keeps the pitch short", "keeps the bespoke pitch short"))
        .expect("write");

    let assert = bin()
        .args(["check", "run", "--format", "text"])
        .arg("--repo-root")
        .arg(site.path())
        .assert()
        .code(2);
    assert.stderr(predicate::str::contains("fail: checks_content_text_banned_words"));
}

#[test]
fn run_with_allow_write_leaves_artifacts() {
    let site = scratch_site();
    bin()
        .args([
            "check",
            "run",
            "--allow-write",
            "--run-id",
            "evidence_run",
            "--format",
            "text",
        ])
        .arg("--repo-root")
        .arg(site.path())
        .assert()
        .success();

    let run_dir = site.path().join("artifacts/audit/evidence_run");
    let report = fs::read_to_string(run_dir.join("report.json")).expect("report artifact");
    assert!(report.contains("\"run_id\": \"evidence_run\""));
    let digest = fs::read_to_string(run_dir.join("report.sha256")).expect("digest artifact");
    assert_eq!(digest.trim().len(), 64);
}

#[test]
fn list_filters_by_domain() {
    bin()
        .args(["check", "list", "--domain", "seo"])
        .arg("--repo-root")
        .arg(fixture_root())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("checks_seo_feeds_contracts")
                .and(predicate::str::contains("checks_content_").not()),
        );
}

#[test]
fn explain_prints_registry_metadata() {
    bin()
        .args(["check", "explain", "checks_content_faq_opener_diversity"])
        .arg("--repo-root")
        .arg(fixture_root())
        .assert()
        .success()
        .stdout(predicate::str::contains("domain: Content"));
}

#[test]
fn doctor_is_healthy_on_fixture_and_fails_on_empty_dir() {
    bin()
        .args(["check", "doctor"])
        .arg("--repo-root")
        .arg(fixture_root())
        .assert()
        .success()
        .stdout(predicate::str::contains("doctor: ok"));

    let empty = TempDir::new().expect("tempdir");
    bin()
        .args(["check", "doctor"])
        .arg("--repo-root")
        .arg(empty.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("registry.toml"));
}

#[test]
fn urls_map_prints_legacy_to_canonical() {
    bin()
        .args(["urls", "map"])
        .arg("--repo-root")
        .arg(fixture_root())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("/venue/gangnam-velvet")
                .and(predicate::str::contains("/gangnam/velvet"))
                .and(predicate::str::contains("deduped")),
        );
}

#[test]
fn search_query_finds_exact_and_partial() {
    bin()
        .args(["search", "query", "Velvet Room"])
        .arg("--repo-root")
        .arg(fixture_root())
        .assert()
        .success()
        .stdout(predicate::str::contains("exact"));

    bin()
        .args(["search", "query", "haeundae", "--format", "json"])
        .arg("--repo-root")
        .arg(fixture_root())
        .assert()
        .success()
        .stdout(predicate::str::contains("busan-harbor"));
}
