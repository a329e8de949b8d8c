// SPDX-License-Identifier: Apache-2.0

//! Static markup contracts on the page sources: media order, outbound link
//! behavior, and the presence of editorial sections.

use nocturn_audit_model::Violation;

use super::flag;
use crate::{CheckContext, CheckError};

/// The venue thumbnail renders above the H1 on the detail page.
pub fn check_detail_media_order(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let detail = &ctx.sources.detail_page;
    let thumb = detail.find("/og/${venue.id}.svg");
    let heading = detail.find("<h1");
    let ordered = matches!((thumb, heading), (Some(t), Some(h)) if t < h);
    if ordered {
        Ok(Vec::new())
    } else {
        Ok(vec![flag(
            "MARKUP_THUMBNAIL_NOT_FIRST",
            "detail page thumbnail does not precede the H1",
            Some(&ctx.profile.paths.detail_page),
        )])
    }
}

/// Outbound venue links open in a new tab from cards and search results.
pub fn check_links_new_tab(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let targets = [
        (
            ctx.profile.paths.venue_card.as_path(),
            ctx.sources.venue_card.as_str(),
        ),
        (
            ctx.profile.paths.search_box.as_path(),
            ctx.sources.search_box.as_str(),
        ),
    ];
    let mut violations = Vec::new();
    for (path, source) in targets {
        if !source.contains("target=\"_blank\"") {
            violations.push(flag(
                "MARKUP_NEW_TAB_MISSING",
                "outbound link does not open in a new tab",
                Some(path),
            ));
        }
    }
    Ok(violations)
}

pub fn check_detail_map_link(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    if ctx.sources.detail_page.contains("google.com/maps/search") {
        Ok(Vec::new())
    } else {
        Ok(vec![flag(
            "MARKUP_MAP_LINK_MISSING",
            "detail page has no maps search link",
            Some(&ctx.profile.paths.detail_page),
        )])
    }
}

/// Home and region pages carry an editorial section; any configured marker
/// counts. Unconfigured marker lists opt the page out.
pub fn check_pages_editorial_sections(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let mut violations = Vec::new();
    let rules = &ctx.profile.markup;
    if !rules.home_markers.is_empty()
        && !rules
            .home_markers
            .iter()
            .any(|marker| ctx.sources.home_page.contains(marker.as_str()))
    {
        violations.push(flag(
            "MARKUP_HOME_EDITORIAL_MISSING",
            "home page lacks an editorial section",
            Some(&ctx.profile.paths.home_page),
        ));
    }
    if !rules.region_markers.is_empty()
        && !rules
            .region_markers
            .iter()
            .any(|marker| ctx.sources.region_page.contains(marker.as_str()))
    {
        violations.push(flag(
            "MARKUP_REGION_EDITORIAL_MISSING",
            "region page lacks first-timer guidance",
            Some(&ctx.profile.paths.region_page),
        ));
    }
    Ok(violations)
}
