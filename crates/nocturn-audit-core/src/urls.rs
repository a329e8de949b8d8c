// SPDX-License-Identifier: Apache-2.0

//! Canonical URL construction for venues and regions.
//!
//! A venue id is `<region>-<slug>`; the canonical path drops the region
//! prefix from the slug segment so region tokens never repeat
//! (`/gangnam/velvet`, not `/gangnam/gangnam-velvet`).

/// Venue slug with a leading `<region>-` prefix removed.
pub fn venue_slug<'a>(venue_id: &'a str, region: &str) -> &'a str {
    let prefix_len = region.len() + 1;
    if venue_id.len() > prefix_len
        && venue_id.starts_with(region)
        && venue_id.as_bytes()[region.len()] == b'-'
    {
        &venue_id[prefix_len..]
    } else {
        venue_id
    }
}

pub fn venue_path(venue_id: &str, region: &str) -> String {
    format!("/{region}/{}", venue_slug(venue_id, region))
}

pub fn region_path(region: &str) -> String {
    format!("/{region}")
}

/// Remove repeated path segments, keeping first occurrences in order.
pub fn dedupe_slug(path: &str) -> String {
    let mut seen = Vec::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !seen.contains(&segment) {
            seen.push(segment);
        }
    }
    format!("/{}", seen.join("/"))
}

pub fn canonical_url(base_url: &str, path: &str) -> String {
    let clean = dedupe_slug(path);
    if clean == "/" {
        base_url.to_string()
    } else {
        format!("{base_url}{clean}")
    }
}

/// `-`-separated tokens of every path segment, for region-token audits.
pub fn path_tokens(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .flat_map(|segment| segment.split('-'))
        .collect()
}
