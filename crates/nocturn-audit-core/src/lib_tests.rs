// SPDX-License-Identifier: Apache-2.0

use super::*;
use std::fs;
use std::path::{Path, PathBuf};

use nocturn_audit_adapters::RealFs;
use nocturn_audit_model::CheckStatus;
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

/// Clone the clean fixture site into a temp dir so a test can break it.
fn scratch_site() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    copy_tree(&fixture_root(), dir.path());
    dir
}

fn rewrite(root: &Path, relative: &str, from: &str, to: &str) {
    let path = root.join(relative);
    let text = fs::read_to_string(&path).expect("read");
    assert!(text.contains(from), "fixture lost marker `{from}`");
    fs::write(&path, text.replace(from, to)).expect("write");
}

fn request_for(root: &Path) -> RunRequest {
    RunRequest {
        repo_root: root.to_path_buf(),
        domain: None,
        capabilities: Capabilities::deny_all(),
        artifacts_root: None,
        run_id: Some(RunId::parse("test_run").expect("run id")),
        command: Some("test".to_string()),
    }
}

#[test]
fn registry_parses_and_validates() {
    let registry = load_registry(&RealFs, &fixture_root()).expect("registry");
    assert_eq!(registry.checks.len(), 35);
    assert!(validate_registry(&registry).is_empty());
    assert!(registry.tags_vocabulary.contains("lint"));
}

#[test]
fn profile_loads_with_defaults() {
    let profile = load_profile(&RealFs, &fixture_root()).expect("profile");
    assert_eq!(profile.site.base_url, "https://nocturn.example");
    assert_eq!(profile.content.banned_words, vec!["bespoke", "vibey"]);
    assert_eq!(profile.content.name_mentions_min, 8);
}

#[test]
fn suite_expansion_covers_fast_domains() {
    let registry = load_registry(&RealFs, &fixture_root()).expect("registry");
    let suite = SuiteId::parse("ci_fast").expect("suite");
    let checks = expand_suite(&registry, &suite).expect("expand");
    assert_eq!(checks.len(), 16);
    assert!(checks
        .iter()
        .all(|c| matches!(c.domain, DomainId::Content | DomainId::Cards)));
}

#[test]
fn default_selection_excludes_slow_and_internal() {
    let registry = load_registry(&RealFs, &fixture_root()).expect("registry");
    let selected = select_checks(&registry, &Selectors::default()).expect("select");
    assert_eq!(selected.len(), 33);
    assert!(!selected
        .iter()
        .any(|c| c.id.as_str() == "checks_content_text_phrase_repetition"));
    assert!(!selected
        .iter()
        .any(|c| c.id.as_str() == "checks_urls_slug_dedupe_util"));

    let all = select_checks(
        &registry,
        &Selectors {
            include_internal: true,
            include_slow: true,
            ..Selectors::default()
        },
    )
    .expect("select all");
    assert_eq!(all.len(), 35);
}

#[test]
fn selection_by_domain_tag_and_glob() {
    let registry = load_registry(&RealFs, &fixture_root()).expect("registry");
    let seo_only = select_checks(
        &registry,
        &Selectors {
            domain: Some(DomainId::Seo),
            ..Selectors::default()
        },
    )
    .expect("select");
    assert_eq!(seo_only.len(), 7);

    let dupes = select_checks(
        &registry,
        &Selectors {
            tag: Some(Tag::parse("dupe").expect("tag")),
            ..Selectors::default()
        },
    )
    .expect("select");
    assert!(dupes
        .iter()
        .all(|c| c.tags.iter().any(|t| t.as_str() == "dupe")));

    let faq = select_checks(
        &registry,
        &Selectors {
            id_glob: Some("checks_content_faq_*".to_string()),
            ..Selectors::default()
        },
    )
    .expect("select");
    assert_eq!(faq.len(), 2);
}

#[test]
fn clean_fixture_run_passes_everything() {
    let report = run_checks(
        &RealFs,
        &request_for(&fixture_root()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    assert_eq!(report.summary.total, 33);
    assert_eq!(report.summary.passed, 33);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.errors, 0);
    assert_eq!(report.summary.skipped, 0);
    assert_eq!(exit_code_for_report(&report), 0);
}

#[test]
fn clean_fixture_passes_slow_and_internal_checks_too() {
    let report = run_checks(
        &RealFs,
        &request_for(&fixture_root()),
        &Selectors {
            include_internal: true,
            include_slow: true,
            ..Selectors::default()
        },
        &RunOptions::default(),
    )
    .expect("run");
    assert_eq!(report.summary.total, 35);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(report.summary.errors, 0);
}

#[test]
fn banned_word_in_content_fails_the_lint() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "src/data/venueContent.ts",
        "keeps the pitch short",
        "keeps the bespoke pitch short",
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let result = report
        .results
        .iter()
        .find(|r| r.id.as_str() == "checks_content_text_banned_words")
        .expect("result");
    assert_eq!(result.status, CheckStatus::Fail);
    assert!(result
        .violations
        .iter()
        .any(|v| v.code == "CONTENT_BANNED_WORD" && v.message.contains("bespoke")));
    assert_eq!(exit_code_for_report(&report), 2);
}

#[test]
fn name_mentions_over_the_window_fail() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "src/data/venueContent.ts",
        "posted prices, patient staff",
        "posted prices at Velvet Room, patient Velvet Room staff",
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let result = report
        .results
        .iter()
        .find(|r| r.id.as_str() == "checks_content_name_mention_bounds")
        .expect("result");
    assert_eq!(result.status, CheckStatus::Fail);
    assert!(result
        .violations
        .iter()
        .any(|v| v.code == "CONTENT_NAME_MENTIONS_HIGH" && v.message.contains("gangnam-velvet")));
}

#[test]
fn shared_sentence_across_blocks_is_flagged() {
    let site = scratch_site();
    let shared = "The same long sentence that should never appear under two venues.";
    rewrite(
        site.path(),
        "src/data/venueContent.ts",
        "Velvet Room keeps the pitch short:",
        &format!("{shared} Velvet Room keeps the pitch short:"),
    );
    rewrite(
        site.path(),
        "src/data/venueContent.ts",
        "Harbor Lounge trades spectacle",
        &format!("{shared} Harbor Lounge trades spectacle"),
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let result = report
        .results
        .iter()
        .find(|r| r.id.as_str() == "checks_content_text_cross_duplication")
        .expect("result");
    assert_eq!(result.status, CheckStatus::Fail);
    assert!(result.violations.iter().any(|v| {
        v.code == "CONTENT_SENTENCE_DUPLICATE"
            && v.message.contains("busan-harbor")
            && v.message.contains("gangnam-velvet")
    }));
}

#[test]
fn missing_faq_entries_fail_coverage() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "src/data/venueContent.ts",
        "      { q: 'Which nights stay quiet?', a: `Tuesdays, reliably.` },\n",
        "",
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let result = report
        .results
        .iter()
        .find(|r| r.id.as_str() == "checks_content_faq_question_count")
        .expect("result");
    assert_eq!(result.status, CheckStatus::Fail);
    assert!(result
        .violations
        .iter()
        .any(|v| v.message.contains("busan-harbor") && v.message.contains("9 FAQ")));
}

#[test]
fn legacy_link_in_component_fails() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "src/components/VenueCard.tsx",
        "<a href={href}",
        "<a href={'/venue/' + venue.id}",
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let result = report
        .results
        .iter()
        .find(|r| r.id.as_str() == "checks_urls_source_legacy_links")
        .expect("result");
    assert_eq!(result.status, CheckStatus::Fail);
    assert!(result
        .violations
        .iter()
        .any(|v| v.code == "URLS_SOURCE_LEGACY_LINK"
            && v.path.as_deref() == Some("src/components/VenueCard.tsx")));
}

#[test]
fn warn_level_findings_do_not_fail_a_check() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "src/data/venues.ts",
        "'busan · seaside · late night'",
        "'midnight midnight midnight midnight'",
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let result = report
        .results
        .iter()
        .find(|r| r.id.as_str() == "checks_cards_copy_word_repetition")
        .expect("result");
    assert_eq!(result.status, CheckStatus::Pass);
    assert!(result
        .violations
        .iter()
        .any(|v| v.code == "CARDS_WORD_REPETITION" && v.severity == Severity::Warn));
    assert_eq!(exit_code_for_report(&report), 0);
}

#[test]
fn denied_effect_skips_the_check() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "ops/audit/registry.toml",
        "id = \"checks_search_index_name_reachability\"\ndomain = \"search\"\ntitle = \"Every venue name resolves through search\"\ndocs = \"The index built from venue records returns an exact first hit for each name.\"\ntags = [\"search\"]\nsuites = [\"ci\", \"local\"]\neffects_required = [\"fs_read\"]",
        "id = \"checks_search_index_name_reachability\"\ndomain = \"search\"\ntitle = \"Every venue name resolves through search\"\ndocs = \"The index built from venue records returns an exact first hit for each name.\"\ntags = [\"search\"]\nsuites = [\"ci\", \"local\"]\neffects_required = [\"fs_read\", \"fs_write\"]",
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let result = report
        .results
        .iter()
        .find(|r| r.id.as_str() == "checks_search_index_name_reachability")
        .expect("result");
    assert_eq!(result.status, CheckStatus::Skip);
    assert!(result
        .skip_reason
        .as_deref()
        .is_some_and(|reason| reason.contains("FsWrite")));
    assert_eq!(report.summary.skipped, 1);
}

#[test]
fn fail_fast_stops_after_first_failure() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "src/data/venueContent.ts",
        "keeps the pitch short",
        "keeps the bespoke pitch short",
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions {
            fail_fast: true,
            max_failures: None,
        },
    )
    .expect("run");
    assert_eq!(report.summary.failed, 1);
    assert!(report.summary.total < 33);
}

#[test]
fn registry_doctor_reports_missing_files() {
    let site = scratch_site();
    fs::remove_file(site.path().join("ops/audit/registry.toml")).expect("remove");
    let doctor = registry_doctor(&RealFs, site.path());
    assert!(!doctor.errors.is_empty());
    assert!(doctor.errors[0].contains("registry.toml"));

    let clean = registry_doctor(&RealFs, &fixture_root());
    assert!(clean.errors.is_empty());
}

#[test]
fn registry_rejects_checks_without_implementation() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "ops/audit/registry.toml",
        "id = \"checks_search_index_name_reachability\"",
        "id = \"checks_search_index_name_unknowable\"",
    );
    let err = load_registry(&RealFs, site.path()).expect_err("must fail");
    assert!(err.contains("no builtin check implementation"));
}

#[test]
fn text_report_carries_violations_and_durations() {
    let site = scratch_site();
    rewrite(
        site.path(),
        "src/data/venueContent.ts",
        "keeps the pitch short",
        "keeps the bespoke pitch short",
    );
    let report = run_checks(
        &RealFs,
        &request_for(site.path()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let text = render_text_report(&report, 3);
    assert!(text.starts_with("summary: passed="));
    assert!(text.contains("CI_SUMMARY run_id=test_run"));
    assert!(text.contains("fail: checks_content_text_banned_words"));
    assert!(text.contains("[CONTENT_BANNED_WORD]"));
    assert!(text.contains("duration: "));
}

#[test]
fn json_rendering_round_trips() {
    let report = run_checks(
        &RealFs,
        &request_for(&fixture_root()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let json = render_json(&report).expect("json");
    let parsed: RunReport = serde_json::from_str(&json).expect("parse");
    assert_eq!(parsed, report);

    let jsonl = render_jsonl(&report).expect("jsonl");
    assert_eq!(jsonl.lines().count(), report.results.len());
}

#[test]
fn report_digest_tracks_content() {
    let report = run_checks(
        &RealFs,
        &request_for(&fixture_root()),
        &Selectors::default(),
        &RunOptions::default(),
    )
    .expect("run");
    let first = report_digest(&report).expect("digest");
    let second = report_digest(&report).expect("digest");
    assert_eq!(first, second);
    assert_eq!(first.len(), 64);

    let mut altered = report.clone();
    altered.repo_root = "elsewhere".to_string();
    assert_ne!(first, report_digest(&altered).expect("digest"));
}

#[test]
fn wildcard_matching_covers_edges() {
    assert!(wildcard_matches("*", "anything"));
    assert!(wildcard_matches("checks_seo_*", "checks_seo_feeds_contracts"));
    assert!(wildcard_matches("*_feeds_*", "checks_seo_feeds_contracts"));
    assert!(wildcard_matches(
        "checks_*_contracts",
        "checks_seo_feeds_contracts"
    ));
    assert!(!wildcard_matches("checks_urls_*", "checks_seo_feeds_contracts"));
    assert!(!wildcard_matches("checks_seo_feeds_contracts_x", "checks_seo_feeds_contracts"));
}

#[test]
fn explain_output_is_complete() {
    let registry = load_registry(&RealFs, &fixture_root()).expect("registry");
    let id = CheckId::parse("checks_seo_feeds_contracts").expect("id");
    let text = explain_output(&registry, &id).expect("explain");
    assert!(text.contains("id: checks_seo_feeds_contracts"));
    assert!(text.contains("domain: Seo"));
    assert!(text.contains("effects_required: fsread"));
    assert!(explain_output(&registry, &CheckId::parse("checks_seo_feeds_unknown").expect("id")).is_err());
}
