// SPDX-License-Identifier: Apache-2.0

//! Record extraction over the site's semi-structured data sources.
//!
//! The venues catalog and the content catalog are TypeScript modules; the
//! extractor never evaluates them. It scans for identifier keys, slices the
//! source into per-entity blocks, and pulls named fields out of each block
//! with anchored patterns. Block boundaries run from one key to the next,
//! so every field match stays attributed to its entity.

use regex::Regex;

use crate::profile::SiteProfile;
use crate::sources::SiteSources;

/// One entry of the venues catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueRecord {
    pub id: String,
    pub name: String,
    pub region: String,
    pub area: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
    pub card_hook: Option<String>,
    pub card_value: Option<String>,
    pub card_tags: Option<String>,
}

/// One per-venue block of the content catalog, keyed by the venue id.
#[derive(Debug, Clone)]
pub struct ContentBlock {
    pub id: String,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    pub venues: Vec<VenueRecord>,
    pub blocks: Vec<ContentBlock>,
}

fn re(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|err| format!("invalid extraction pattern `{pattern}`: {err}"))
}

/// Scan the venues catalog for `id` / `name` / `region` record heads, then
/// slice per-record blocks and lift the remaining fields out of each.
pub fn extract_venues(source: &str) -> Result<Vec<VenueRecord>, String> {
    let head =
        re(r"id:\s*'([^']+)',\s*name:\s*'([^']+)',\s*region:\s*'([^']+)'")?;
    let area_re = re(r"area:\s*'([^']+)'")?;
    let phone_re = re(r"phone:\s*'([^']+)'")?;
    let tags_re = re(r"tags:\s*\[([^\]]*)\]")?;
    let quoted_re = re(r"'([^']+)'")?;
    let hook_re = re(r"card_hook:\s*'([^']+)'")?;
    let value_re = re(r"card_value:\s*'([^']+)'")?;
    let card_tags_re = re(r"card_tags:\s*'([^']+)'")?;

    let heads: Vec<(usize, String, String, String)> = head
        .captures_iter(source)
        .map(|caps| {
            let span = caps.get(0).map(|m| m.start()).unwrap_or_default();
            (
                span,
                caps[1].to_string(),
                caps[2].to_string(),
                caps[3].to_string(),
            )
        })
        .collect();

    let mut venues = Vec::with_capacity(heads.len());
    for (idx, (start, id, name, region)) in heads.iter().enumerate() {
        let end = heads
            .get(idx + 1)
            .map(|next| next.0)
            .unwrap_or(source.len());
        let block = &source[*start..end];
        let tags = tags_re
            .captures(block)
            .map(|caps| {
                quoted_re
                    .captures_iter(&caps[1])
                    .map(|t| t[1].to_string())
                    .collect()
            })
            .unwrap_or_default();
        venues.push(VenueRecord {
            id: id.clone(),
            name: name.clone(),
            region: region.clone(),
            area: area_re.captures(block).map(|caps| caps[1].to_string()),
            phone: phone_re.captures(block).map(|caps| caps[1].to_string()),
            tags,
            card_hook: hook_re.captures(block).map(|caps| caps[1].to_string()),
            card_value: value_re.captures(block).map(|caps| caps[1].to_string()),
            card_tags: card_tags_re
                .captures(block)
                .map(|caps| caps[1].to_string()),
        });
    }
    Ok(venues)
}

/// Split the content catalog into per-venue blocks. A block spans from its
/// `'<id>': {` key to the next key, or to the end of the source.
pub fn extract_content_blocks(source: &str) -> Result<Vec<ContentBlock>, String> {
    let key = re(r"'([a-z]+-[a-z0-9-]+)':\s*\{")?;
    let keys: Vec<(usize, String)> = key
        .captures_iter(source)
        .map(|caps| {
            let start = caps.get(0).map(|m| m.start()).unwrap_or_default();
            (start, caps[1].to_string())
        })
        .collect();

    let mut blocks = Vec::with_capacity(keys.len());
    for (idx, (start, id)) in keys.iter().enumerate() {
        let end = keys.get(idx + 1).map(|next| next.0).unwrap_or(source.len());
        blocks.push(ContentBlock {
            id: id.clone(),
            raw: source[*start..end].to_string(),
        });
    }
    Ok(blocks)
}

/// All template-literal strings of a block, joined with spaces. This is the
/// prose the reader actually sees; keys and punctuation stay behind.
pub fn template_text(block: &str) -> Result<String, String> {
    let tpl = re(r"(?s)`([^`]*)`")?;
    Ok(tpl
        .captures_iter(block)
        .map(|caps| caps[1].to_string())
        .collect::<Vec<_>>()
        .join(" "))
}

/// Template literals plus single-quoted strings long enough to be prose
/// rather than object keys.
pub fn prose_text(block: &str) -> Result<String, String> {
    let mut out = template_text(block)?;
    let quoted = re(r"'([^']{6,})'")?;
    for caps in quoted.captures_iter(block) {
        out.push('\n');
        out.push_str(&caps[1]);
    }
    Ok(out)
}

pub fn faq_questions(block: &str) -> Result<Vec<String>, String> {
    let faq = re(r#"q:\s*['"`]([^'"`]+)['"`]"#)?;
    Ok(faq
        .captures_iter(block)
        .map(|caps| caps[1].to_string())
        .collect())
}

pub fn section_titles(block: &str) -> Result<Vec<String>, String> {
    let title = re(r"title:\s*'([^']+)'")?;
    Ok(title
        .captures_iter(block)
        .map(|caps| caps[1].to_string())
        .collect())
}

/// Intro and body texts, the units the per-paragraph density rule applies to.
pub fn narrative_texts(block: &str) -> Result<Vec<String>, String> {
    let body = re(r"(?s)(?:intro|body):\s*`([^`]+)`")?;
    Ok(body
        .captures_iter(block)
        .map(|caps| caps[1].to_string())
        .collect())
}

pub fn has_summary_list(block: &str) -> Result<bool, String> {
    let summary = re(r"summary:\s*\[")?;
    Ok(summary.is_match(block))
}

pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '。'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Literal (non-regex) occurrence count; venue names need no escaping here.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Words for the n-gram scan: whitespace-separated tokens longer than one
/// character, as rendered prose.
pub fn phrase_words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .collect()
}

/// First `chars` characters of a FAQ question; the opener signature used by
/// the diversity rule.
pub fn opener(question: &str, chars: usize) -> String {
    question.chars().take(chars).collect()
}

impl Corpus {
    pub fn extract(sources: &SiteSources, _profile: &SiteProfile) -> Result<Self, String> {
        Ok(Self {
            venues: extract_venues(&sources.venues)?,
            blocks: extract_content_blocks(&sources.content)?,
        })
    }

    pub fn venue_by_id(&self, id: &str) -> Option<&VenueRecord> {
        self.venues.iter().find(|venue| venue.id == id)
    }
}
