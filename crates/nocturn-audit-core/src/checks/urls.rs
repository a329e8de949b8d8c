// SPDX-License-Identifier: Apache-2.0

//! URL canonicalization rules: region-scoped venue paths, sitemap coverage,
//! and eradication of the legacy `/venue/`//`/region/` route family.

use std::collections::BTreeMap;

use nocturn_audit_model::Violation;

use super::flag;
use crate::extract::count_occurrences;
use crate::urls::{canonical_url, path_tokens, region_path, venue_path};
use crate::{CheckContext, CheckError};

/// A region token appearing twice in one path means the slug still carries
/// its region prefix.
pub fn check_path_region_dedupe(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let regions = &ctx.profile.site.regions;
    let mut violations = Vec::new();
    for venue in &ctx.corpus.venues {
        let path = venue_path(&venue.id, &venue.region);
        let mut seen = Vec::new();
        for token in path_tokens(&path) {
            if seen.contains(&token) && regions.iter().any(|r| r == token) {
                violations.push(flag(
                    "URLS_REGION_TOKEN_DUPLICATE",
                    format!("{path} repeats region token `{token}`"),
                    None,
                ));
            }
            seen.push(token);
        }
    }
    Ok(violations)
}

pub fn check_path_uniqueness(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let mut owners: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for venue in &ctx.corpus.venues {
        owners
            .entry(venue_path(&venue.id, &venue.region))
            .or_default()
            .push(&venue.id);
    }
    Ok(owners
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(path, ids)| {
            flag(
                "URLS_PATH_COLLISION",
                format!("{path} claimed by [{}]", ids.join(",")),
                None,
            )
        })
        .collect())
}

pub fn check_sitemap_canonical_only(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let sitemap = &ctx.sources.sitemap;
    let mut violations = Vec::new();
    for prefix in &ctx.profile.seo.legacy_prefixes {
        let count = count_occurrences(sitemap, prefix);
        if count > 0 {
            violations.push(flag(
                "URLS_SITEMAP_LEGACY",
                format!("sitemap contains {count} legacy `{prefix}` URLs"),
                Some(&ctx.profile.paths.sitemap),
            ));
        }
    }
    Ok(violations)
}

/// Every canonical venue and region URL is present in the sitemap.
pub fn check_sitemap_full_coverage(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let sitemap = &ctx.sources.sitemap;
    let base = &ctx.profile.site.base_url;
    let mut violations = Vec::new();
    for venue in &ctx.corpus.venues {
        let url = canonical_url(base, &venue_path(&venue.id, &venue.region));
        if !sitemap.contains(&url) {
            violations.push(flag(
                "URLS_SITEMAP_VENUE_MISSING",
                format!("missing from sitemap: {url}"),
                Some(&ctx.profile.paths.sitemap),
            ));
        }
    }
    for region in &ctx.profile.site.regions {
        let url = canonical_url(base, &region_path(region));
        if !sitemap.contains(&url) {
            violations.push(flag(
                "URLS_SITEMAP_REGION_MISSING",
                format!("missing region from sitemap: {url}"),
                Some(&ctx.profile.paths.sitemap),
            ));
        }
    }
    Ok(violations)
}

/// Page and component sources must not link legacy routes. The app shell is
/// scanned line-by-line instead: its redirect route declarations are the one
/// sanctioned place legacy paths still appear.
pub fn check_source_legacy_links(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let mut violations = Vec::new();
    for (path, source) in ctx.sources.legacy_scan_targets(ctx.profile) {
        for prefix in &ctx.profile.seo.legacy_prefixes {
            if source.contains(prefix.as_str()) {
                violations.push(flag(
                    "URLS_SOURCE_LEGACY_LINK",
                    format!("source still references `{prefix}`"),
                    Some(path),
                ));
            }
        }
    }

    for (idx, line) in ctx.sources.app.lines().enumerate() {
        let is_redirect = line.contains("path=") || line.contains("Navigate") || line.contains("Redirect");
        for prefix in &ctx.profile.seo.legacy_prefixes {
            if line.contains(prefix.as_str()) && !is_redirect {
                let mut violation = flag(
                    "URLS_APP_LEGACY_LINK",
                    format!("non-redirect `{prefix}` reference"),
                    Some(&ctx.profile.paths.app),
                );
                violation.line = u32::try_from(idx + 1).ok();
                violations.push(violation);
            }
        }
    }
    Ok(violations)
}

/// The slug utility still exports the de-duplication pipeline the canonical
/// paths depend on.
pub fn check_slug_dedupe_util(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let slug = &ctx.sources.slug_util;
    let mut violations = Vec::new();
    for export in ["venueSlug", "venuePath"] {
        if !slug.contains(export) {
            violations.push(flag(
                "URLS_SLUG_UTIL_MISSING",
                format!("slug utility does not export {export}"),
                Some(&ctx.profile.paths.slug_util),
            ));
        }
    }
    Ok(violations)
}

/// The app shell keeps redirect routes alive for every legacy prefix.
pub fn check_app_redirect_routes(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let app = &ctx.sources.app;
    let mut violations = Vec::new();
    if !app.contains("Navigate") {
        violations.push(flag(
            "URLS_REDIRECT_NAVIGATE_MISSING",
            "app shell has no redirect component",
            Some(&ctx.profile.paths.app),
        ));
    }
    for prefix in &ctx.profile.seo.legacy_prefixes {
        let route = format!("{prefix}:");
        if !app.contains(&route) {
            violations.push(flag(
                "URLS_REDIRECT_ROUTE_MISSING",
                format!("no redirect route declared for `{prefix}`"),
                Some(&ctx.profile.paths.app),
            ));
        }
    }
    Ok(violations)
}
