// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use nocturn_audit_adapters::{Capabilities, Fs, FsWrite, RealFs};
use nocturn_audit_core::{
    exit_code_for_report, explain_output, extract::extract_venues, list_output, load_profile,
    load_registry, registry_doctor, render_json, render_jsonl, render_text_report, report_digest,
    run_checks, search::{build_index, search, MatchKind}, select_checks,
    urls::{region_path, venue_path, venue_slug},
    RunOptions, RunRequest, Selectors,
};
use nocturn_audit_model::{CheckId, DomainId, RunId, SuiteId, Tag};
use serde_json::json;

use crate::cli::{CheckCommand, Cli, Command, DomainArg, FormatArg, SearchCommand, UrlsCommand};

pub fn run(cli: Cli) -> i32 {
    let quiet = cli.quiet;
    match cli.command {
        Command::Version { format } => emit(quiet, "version", run_version(format)),
        Command::Check { command } => match command {
            CheckCommand::List {
                repo_root,
                suite,
                domain,
                tag,
                id,
                include_internal,
                include_slow,
                format,
                out,
            } => emit(
                quiet,
                "check list",
                run_check_list(
                    repo_root,
                    suite,
                    domain,
                    tag,
                    id,
                    include_internal,
                    include_slow,
                    format,
                    out,
                ),
            ),
            CheckCommand::Explain {
                check_id,
                repo_root,
                out,
            } => emit(quiet, "check explain", run_check_explain(check_id, repo_root, out)),
            CheckCommand::Doctor {
                repo_root,
                format,
                out,
            } => emit(quiet, "check doctor", run_check_doctor(repo_root, format, out)),
            CheckCommand::Run {
                repo_root,
                artifacts_root,
                run_id,
                suite,
                domain,
                tag,
                id,
                include_internal,
                include_slow,
                allow_write,
                fail_fast,
                max_failures,
                format,
                out,
                durations,
            } => emit(
                quiet,
                "check run",
                run_check_run(CheckRunOptions {
                    repo_root,
                    artifacts_root,
                    run_id,
                    suite,
                    domain,
                    tag,
                    id,
                    include_internal,
                    include_slow,
                    allow_write,
                    fail_fast,
                    max_failures,
                    format,
                    out,
                    durations,
                }),
            ),
        },
        Command::Urls { command } => match command {
            UrlsCommand::Map {
                repo_root,
                format,
                out,
            } => emit(quiet, "urls map", run_urls_map(repo_root, format, out)),
        },
        Command::Search { command } => match command {
            SearchCommand::Query {
                query,
                repo_root,
                format,
                out,
            } => emit(quiet, "search query", run_search_query(query, repo_root, format, out)),
        },
    }
}

fn emit(quiet: bool, label: &str, outcome: Result<(String, i32), String>) -> i32 {
    match outcome {
        Ok((rendered, code)) => {
            if !quiet && !rendered.is_empty() {
                if code == 0 {
                    let _ = writeln!(io::stdout(), "{rendered}");
                } else {
                    let _ = writeln!(io::stderr(), "{rendered}");
                }
            }
            code
        }
        Err(err) => {
            let _ = writeln!(io::stderr(), "nocturn-audit {label} failed: {err}");
            1
        }
    }
}

fn resolve_repo_root(repo_root: Option<PathBuf>) -> Result<PathBuf, String> {
    match repo_root {
        Some(root) => Ok(root),
        None => std::env::current_dir().map_err(|err| format!("cannot resolve cwd: {err}")),
    }
}

fn write_output_if_requested(out: Option<PathBuf>, rendered: &str) -> Result<(), String> {
    if let Some(path) = out {
        fs::write(&path, rendered)
            .map_err(|err| format!("failed to write {}: {err}", path.display()))?;
    }
    Ok(())
}

fn parse_selectors(
    suite: Option<String>,
    domain: Option<DomainArg>,
    tag: Option<String>,
    id_glob: Option<String>,
    include_internal: bool,
    include_slow: bool,
) -> Result<Selectors, String> {
    Ok(Selectors {
        id_glob,
        domain: domain.map(DomainId::from),
        tag: tag.as_deref().map(Tag::parse).transpose()?,
        suite: suite.as_deref().map(SuiteId::parse).transpose()?,
        include_internal,
        include_slow,
    })
}

fn run_version(format: FormatArg) -> Result<(String, i32), String> {
    let version = env!("CARGO_PKG_VERSION");
    let rendered = match format {
        FormatArg::Text => format!("nocturn-audit {version}"),
        FormatArg::Json => {
            serde_json::to_string_pretty(&json!({ "name": "nocturn-audit", "version": version }))
                .map_err(|err| err.to_string())?
        }
        FormatArg::Jsonl => return Err("format jsonl is only supported for check run".to_string()),
    };
    Ok((rendered, 0))
}

#[allow(clippy::too_many_arguments)]
fn run_check_list(
    repo_root: Option<PathBuf>,
    suite: Option<String>,
    domain: Option<DomainArg>,
    tag: Option<String>,
    id: Option<String>,
    include_internal: bool,
    include_slow: bool,
    format: FormatArg,
    out: Option<PathBuf>,
) -> Result<(String, i32), String> {
    let root = resolve_repo_root(repo_root)?;
    let selectors = parse_selectors(suite, domain, tag, id, include_internal, include_slow)?;
    let registry = load_registry(&RealFs, &root)?;
    let checks = select_checks(&registry, &selectors)?;
    let rendered = match format {
        FormatArg::Text => list_output(&checks),
        FormatArg::Json => serde_json::to_string_pretty(&checks).map_err(|err| err.to_string())?,
        FormatArg::Jsonl => return Err("format jsonl is only supported for check run".to_string()),
    };
    write_output_if_requested(out, &rendered)?;
    Ok((rendered, 0))
}

fn run_check_explain(
    check_id: String,
    repo_root: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<(String, i32), String> {
    let root = resolve_repo_root(repo_root)?;
    let registry = load_registry(&RealFs, &root)?;
    let id = CheckId::parse(&check_id)?;
    let rendered = explain_output(&registry, &id)?;
    write_output_if_requested(out, &rendered)?;
    Ok((rendered, 0))
}

fn run_check_doctor(
    repo_root: Option<PathBuf>,
    format: FormatArg,
    out: Option<PathBuf>,
) -> Result<(String, i32), String> {
    let root = resolve_repo_root(repo_root)?;
    let report = registry_doctor(&RealFs, &root);
    let healthy = report.errors.is_empty();
    let rendered = match format {
        FormatArg::Text => {
            if healthy {
                "doctor: ok".to_string()
            } else {
                report
                    .errors
                    .iter()
                    .map(|err| format!("doctor: {err}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        FormatArg::Json => serde_json::to_string_pretty(&json!({ "errors": report.errors }))
            .map_err(|err| err.to_string())?,
        FormatArg::Jsonl => return Err("format jsonl is only supported for check run".to_string()),
    };
    write_output_if_requested(out, &rendered)?;
    Ok((rendered, if healthy { 0 } else { 1 }))
}

struct CheckRunOptions {
    repo_root: Option<PathBuf>,
    artifacts_root: Option<PathBuf>,
    run_id: Option<String>,
    suite: Option<String>,
    domain: Option<DomainArg>,
    tag: Option<String>,
    id: Option<String>,
    include_internal: bool,
    include_slow: bool,
    allow_write: bool,
    fail_fast: bool,
    max_failures: Option<usize>,
    format: FormatArg,
    out: Option<PathBuf>,
    durations: usize,
}

fn run_check_run(options: CheckRunOptions) -> Result<(String, i32), String> {
    let root = resolve_repo_root(options.repo_root)?;
    let selectors = parse_selectors(
        options.suite,
        options.domain,
        options.tag,
        options.id,
        options.include_internal,
        options.include_slow,
    )?;
    let request = RunRequest {
        repo_root: root.clone(),
        domain: selectors.domain,
        capabilities: Capabilities::from_cli_flags(options.allow_write),
        artifacts_root: options.artifacts_root,
        run_id: options.run_id.map(|rid| RunId::parse(&rid)).transpose()?,
        command: Some("nocturn-audit check run".to_string()),
    };
    let run_options = RunOptions {
        fail_fast: options.fail_fast,
        max_failures: options.max_failures,
    };
    let report = run_checks(&RealFs, &request, &selectors, &run_options)?;

    // Evidence artifacts land under the guarded run directory.
    if options.allow_write {
        let json = render_json(&report)?;
        let digest = report_digest(&report)?;
        let run_dir = Path::new("artifacts")
            .join("audit")
            .join(report.run_id.as_str());
        RealFs
            .write_text(&root, report.run_id.as_str(), &run_dir.join("report.json"), &json)
            .map_err(|err| err.to_string())?;
        RealFs
            .write_text(
                &root,
                report.run_id.as_str(),
                &run_dir.join("report.sha256"),
                &format!("{digest}\n"),
            )
            .map_err(|err| err.to_string())?;
    }

    let rendered = match options.format {
        FormatArg::Text => render_text_report(&report, options.durations),
        FormatArg::Json => render_json(&report)?,
        FormatArg::Jsonl => render_jsonl(&report)?,
    };
    write_output_if_requested(options.out, &rendered)?;
    Ok((rendered, exit_code_for_report(&report)))
}

fn run_urls_map(
    repo_root: Option<PathBuf>,
    format: FormatArg,
    out: Option<PathBuf>,
) -> Result<(String, i32), String> {
    let root = resolve_repo_root(repo_root)?;
    let profile = load_profile(&RealFs, &root)?;
    let venues_source = RealFs
        .read_text(&root, &profile.paths.venues)
        .map_err(|err| err.to_string())?;
    let venues = extract_venues(&venues_source)?;

    let rendered = match format {
        FormatArg::Text => {
            let mut lines = Vec::new();
            for venue in &venues {
                let old = format!("/venue/{}", venue.id);
                let new = venue_path(&venue.id, &venue.region);
                let note = if venue_slug(&venue.id, &venue.region) == venue.id {
                    "= same"
                } else {
                    "deduped"
                };
                lines.push(format!("{old:<35} -> {new:<30} {note}"));
            }
            for region in &profile.site.regions {
                let old = format!("/region/{region}");
                lines.push(format!("{old:<35} -> {:<30} deduped", region_path(region)));
            }
            lines.join("\n")
        }
        FormatArg::Json => {
            let venues_json: Vec<_> = venues
                .iter()
                .map(|venue| {
                    json!({
                        "old": format!("/venue/{}", venue.id),
                        "new": venue_path(&venue.id, &venue.region),
                    })
                })
                .collect();
            let regions_json: Vec<_> = profile
                .site
                .regions
                .iter()
                .map(|region| {
                    json!({
                        "old": format!("/region/{region}"),
                        "new": region_path(region),
                    })
                })
                .collect();
            serde_json::to_string_pretty(&json!({ "venues": venues_json, "regions": regions_json }))
                .map_err(|err| err.to_string())?
        }
        FormatArg::Jsonl => return Err("format jsonl is only supported for check run".to_string()),
    };
    write_output_if_requested(out, &rendered)?;
    Ok((rendered, 0))
}

fn run_search_query(
    query: String,
    repo_root: Option<PathBuf>,
    format: FormatArg,
    out: Option<PathBuf>,
) -> Result<(String, i32), String> {
    let root = resolve_repo_root(repo_root)?;
    let profile = load_profile(&RealFs, &root)?;
    let venues_source = RealFs
        .read_text(&root, &profile.paths.venues)
        .map_err(|err| err.to_string())?;
    let venues = extract_venues(&venues_source)?;
    let index = build_index(&venues);
    let hits = search(&index, &query);

    let rendered = match format {
        FormatArg::Text => {
            if hits.is_empty() {
                "no results".to_string()
            } else {
                hits.iter()
                    .map(|hit| {
                        let kind = match hit.kind {
                            MatchKind::Exact => "exact",
                            MatchKind::Partial => "partial",
                        };
                        format!("{}\t{}\t{kind}", hit.name, hit.id)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        FormatArg::Json => {
            let rows: Vec<_> = hits
                .iter()
                .map(|hit| {
                    json!({
                        "id": hit.id,
                        "name": hit.name,
                        "match": match hit.kind {
                            MatchKind::Exact => "exact",
                            MatchKind::Partial => "partial",
                        },
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows).map_err(|err| err.to_string())?
        }
        FormatArg::Jsonl => return Err("format jsonl is only supported for check run".to_string()),
    };
    write_output_if_requested(out, &rendered)?;
    Ok((rendered, 0))
}
