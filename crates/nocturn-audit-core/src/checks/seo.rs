// SPDX-License-Identifier: Apache-2.0

//! Structured-data and crawler-policy rules over the HTML shell, the page
//! sources, robots.txt, and the discovery feeds.

use nocturn_audit_model::Violation;

use super::flag;
use crate::extract::count_occurrences;
use crate::urls::{canonical_url, venue_path};
use crate::{CheckContext, CheckError};

/// JSON-LD `@type` markers appear in both quote styles across the static
/// shell and the TSX page sources.
fn has_schema(source: &str, schema: &str) -> bool {
    source.contains(&format!("\"@type\": \"{schema}\""))
        || source.contains(&format!("'@type': '{schema}'"))
}

pub fn check_jsonld_site_schemas(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let mut violations = Vec::new();
    for schema in ["WebSite", "Organization", "ItemList"] {
        if !has_schema(&ctx.sources.index_html, schema) {
            violations.push(flag(
                "SEO_SITE_SCHEMA_MISSING",
                format!("missing {schema} JSON-LD schema"),
                Some(&ctx.profile.paths.index_html),
            ));
        }
    }
    Ok(violations)
}

pub fn check_jsonld_detail_schemas(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let mut violations = Vec::new();
    for schema in ["BreadcrumbList", "FAQPage"] {
        if !has_schema(&ctx.sources.detail_page, schema) {
            violations.push(flag(
                "SEO_DETAIL_SCHEMA_MISSING",
                format!("detail page does not inject {schema} JSON-LD"),
                Some(&ctx.profile.paths.detail_page),
            ));
        }
    }
    Ok(violations)
}

/// Detail titles lead with the venue name; the page builds them from a
/// template literal opening on the name binding.
pub fn check_title_name_first(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    if ctx.sources.detail_page.contains("`${venue.name}") {
        Ok(Vec::new())
    } else {
        Ok(vec![flag(
            "SEO_TITLE_NOT_NAME_FIRST",
            "detail page title does not start with the venue name",
            Some(&ctx.profile.paths.detail_page),
        )])
    }
}

pub fn check_og_image_per_venue(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    if ctx.sources.detail_page.contains("/og/${venue.id}.svg") {
        Ok(Vec::new())
    } else {
        Ok(vec![flag(
            "SEO_OG_IMAGE_MISSING",
            "detail page does not reference the per-venue OG image",
            Some(&ctx.profile.paths.detail_page),
        )])
    }
}

pub fn check_meta_robots_directives(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let html = &ctx.sources.index_html;
    let mut violations = Vec::new();
    if !html.contains("content=\"index, follow\"") {
        violations.push(flag(
            "SEO_META_ROBOTS_MISSING",
            "missing meta robots index,follow directive",
            Some(&ctx.profile.paths.index_html),
        ));
    }
    if !html.contains("application/rss+xml") {
        violations.push(flag(
            "SEO_RSS_LINK_MISSING",
            "missing RSS alternate link tag",
            Some(&ctx.profile.paths.index_html),
        ));
    }
    Ok(violations)
}

pub fn check_robots_crawler_policy(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let robots = &ctx.sources.robots;
    let mut violations = Vec::new();
    if !robots.contains("Sitemap:") {
        violations.push(flag(
            "SEO_ROBOTS_SITEMAP_MISSING",
            "robots.txt does not declare the sitemap",
            Some(&ctx.profile.paths.robots),
        ));
    }
    for bot in &ctx.profile.seo.crawler_bots {
        if !robots.contains(bot) {
            violations.push(flag(
                "SEO_ROBOTS_BOT_MISSING",
                format!("robots.txt does not allow {bot}"),
                Some(&ctx.profile.paths.robots),
            ));
        }
    }
    Ok(violations)
}

/// RSS and llms.txt discovery feeds exist and cover the full catalog with
/// canonical URLs only.
pub fn check_feeds_contracts(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let mut violations = Vec::new();

    match &ctx.sources.rss {
        None => violations.push(flag(
            "SEO_RSS_FEED_MISSING",
            "RSS feed is missing",
            Some(&ctx.profile.paths.rss),
        )),
        Some(rss) => {
            let items = count_occurrences(rss, "<item>");
            let expected = ctx.corpus.venues.len();
            if items != expected {
                violations.push(flag(
                    "SEO_RSS_ITEM_COUNT",
                    format!("RSS has {items} items, expected {expected}"),
                    Some(&ctx.profile.paths.rss),
                ));
            }
            for prefix in &ctx.profile.seo.legacy_prefixes {
                let count = count_occurrences(rss, prefix);
                if count > 0 {
                    violations.push(flag(
                        "SEO_RSS_LEGACY_URLS",
                        format!("RSS contains {count} legacy `{prefix}` URLs"),
                        Some(&ctx.profile.paths.rss),
                    ));
                }
            }
        }
    }

    match &ctx.sources.llms {
        None => violations.push(flag(
            "SEO_LLMS_MANIFEST_MISSING",
            "llms.txt manifest is missing",
            Some(&ctx.profile.paths.llms),
        )),
        Some(llms) => {
            if !llms.contains("sitemap.xml") {
                violations.push(flag(
                    "SEO_LLMS_SITEMAP_LINK_MISSING",
                    "llms.txt does not link the sitemap",
                    Some(&ctx.profile.paths.llms),
                ));
            }
            for venue in &ctx.corpus.venues {
                let url = canonical_url(
                    &ctx.profile.site.base_url,
                    &venue_path(&venue.id, &venue.region),
                );
                if !llms.contains(&url) {
                    violations.push(flag(
                        "SEO_LLMS_VENUE_MISSING",
                        format!("llms.txt does not list {url}"),
                        Some(&ctx.profile.paths.llms),
                    ));
                }
            }
        }
    }

    Ok(violations)
}
