// SPDX-License-Identifier: Apache-2.0

//! In-memory search index over venue records, mirroring the site's client
//! search: exact name matches rank first, then partial token matches.

use crate::extract::VenueRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub id: String,
    pub name: String,
    tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub kind: MatchKind,
}

/// Lowercase with all whitespace removed; queries and tokens normalize the
/// same way so spacing never decides a match.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn build_index(venues: &[VenueRecord]) -> Vec<SearchEntry> {
    venues
        .iter()
        .map(|venue| {
            let mut tokens = vec![normalize(&venue.name)];
            if let Some(area) = &venue.area {
                tokens.push(normalize(area));
            }
            tokens.push(normalize(&venue.region));
            tokens.extend(venue.tags.iter().map(|tag| normalize(tag)));
            SearchEntry {
                id: venue.id.clone(),
                name: venue.name.clone(),
                tokens,
            }
        })
        .collect()
}

pub fn search(entries: &[SearchEntry], query: &str) -> Vec<SearchHit> {
    let q = normalize(query);
    if q.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    let mut seen = Vec::new();

    for entry in entries {
        if normalize(&entry.name) == q {
            hits.push(SearchHit {
                id: entry.id.clone(),
                name: entry.name.clone(),
                kind: MatchKind::Exact,
            });
            seen.push(entry.id.as_str());
        }
    }

    for entry in entries {
        if seen.contains(&entry.id.as_str()) {
            continue;
        }
        if entry.tokens.iter().any(|t| t.contains(&q)) || normalize(&entry.name).contains(&q) {
            hits.push(SearchHit {
                id: entry.id.clone(),
                name: entry.name.clone(),
                kind: MatchKind::Partial,
            });
            seen.push(entry.id.as_str());
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(id: &str, name: &str, region: &str, area: &str, tags: &[&str]) -> VenueRecord {
        VenueRecord {
            id: id.to_string(),
            name: name.to_string(),
            region: region.to_string(),
            area: Some(area.to_string()),
            phone: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            card_hook: None,
            card_value: None,
            card_tags: None,
        }
    }

    fn index() -> Vec<SearchEntry> {
        build_index(&[
            venue("gangnam-velvet", "Velvet Room", "gangnam", "Teheran-ro", &["premium"]),
            venue("busan-harbor", "Harbor Lounge", "busan", "Haeundae", &["seaside"]),
            venue("busan-velodrome", "Velodrome", "busan", "Haeundae", &["late"]),
        ])
    }

    #[test]
    fn exact_name_match_ranks_first() {
        let hits = search(&index(), "velvet room");
        assert_eq!(hits[0].id, "gangnam-velvet");
        assert_eq!(hits[0].kind, MatchKind::Exact);
    }

    #[test]
    fn partial_match_reaches_tokens() {
        let hits = search(&index(), "Haeundae");
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.kind == MatchKind::Partial));
    }

    #[test]
    fn partial_prefix_finds_names() {
        let hits = search(&index(), "velo");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "busan-velodrome");
    }

    #[test]
    fn whitespace_never_decides_a_match() {
        let hits = search(&index(), "  VELVET   room ");
        assert_eq!(hits[0].kind, MatchKind::Exact);
    }

    #[test]
    fn empty_query_yields_nothing() {
        assert!(search(&index(), "").is_empty());
        assert!(search(&index(), "   ").is_empty());
    }

    #[test]
    fn results_deduplicate_by_id() {
        // "velvet" partial-matches both name and tag path of the same entry.
        let hits = search(&index(), "velvet");
        assert_eq!(hits.iter().filter(|h| h.id == "gangnam-velvet").count(), 1);
    }
}
