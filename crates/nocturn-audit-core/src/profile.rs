// SPDX-License-Identifier: Apache-2.0

//! Site profile: the editorial and structural rulebook of the audited site.
//!
//! Thresholds and word lists are data, not code; they live in
//! `ops/audit/site.toml` inside the audited repository. Every threshold
//! carries the product default so a minimal profile stays valid.

use std::path::{Path, PathBuf};

use nocturn_audit_adapters::Fs;
use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_PROFILE_PATH: &str = "ops/audit/site.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteProfile {
    pub site: SiteSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub content: ContentRules,
    #[serde(default)]
    pub cards: CardRules,
    #[serde(default)]
    pub seo: SeoRules,
    #[serde(default)]
    pub markup: MarkupRules,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Absolute origin used to build canonical URLs, no trailing slash.
    pub base_url: String,
    /// Region ids in canonical order; also the region URL segments.
    pub regions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PathsSection {
    pub venues: PathBuf,
    pub content: PathBuf,
    pub index_html: PathBuf,
    pub sitemap: PathBuf,
    pub robots: PathBuf,
    pub rss: PathBuf,
    pub llms: PathBuf,
    pub detail_page: PathBuf,
    pub home_page: PathBuf,
    pub region_page: PathBuf,
    pub venue_card: PathBuf,
    pub search_box: PathBuf,
    pub layout: PathBuf,
    pub app: PathBuf,
    pub slug_util: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            venues: PathBuf::from("src/data/venues.ts"),
            content: PathBuf::from("src/data/venueContent.ts"),
            index_html: PathBuf::from("index.html"),
            sitemap: PathBuf::from("public/sitemap.xml"),
            robots: PathBuf::from("public/robots.txt"),
            rss: PathBuf::from("public/rss.xml"),
            llms: PathBuf::from("public/llms.txt"),
            detail_page: PathBuf::from("src/pages/VenueDetailPage.tsx"),
            home_page: PathBuf::from("src/pages/HomePage.tsx"),
            region_page: PathBuf::from("src/pages/RegionPage.tsx"),
            venue_card: PathBuf::from("src/components/VenueCard.tsx"),
            search_box: PathBuf::from("src/components/SearchBox.tsx"),
            layout: PathBuf::from("src/components/Layout.tsx"),
            app: PathBuf::from("src/App.tsx"),
            slug_util: PathBuf::from("src/utils/slug.ts"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ContentRules {
    pub banned_words: Vec<String>,
    pub connectors: Vec<String>,
    pub connector_limit: usize,
    pub name_mentions_min: usize,
    pub name_mentions_max: usize,
    pub paragraph_name_limit: usize,
    pub faq_min: usize,
    pub faq_opener_chars: usize,
    pub sentence_min_chars: usize,
    pub phrase_ngram_words: usize,
    pub phrase_repeat_allowance: usize,
    pub phone_pattern: String,
}

impl Default for ContentRules {
    fn default() -> Self {
        Self {
            banned_words: Vec::new(),
            connectors: Vec::new(),
            connector_limit: 20,
            name_mentions_min: 8,
            name_mentions_max: 10,
            paragraph_name_limit: 2,
            faq_min: 10,
            faq_opener_chars: 3,
            sentence_min_chars: 30,
            phrase_ngram_words: 8,
            phrase_repeat_allowance: 5,
            phone_pattern: r"01[0-9]-[0-9]{3,4}-[0-9]{4}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CardRules {
    pub hook_line_limit: usize,
    pub value_char_limit: usize,
    pub word_repeat_limit: usize,
    pub min_word_chars: usize,
}

impl Default for CardRules {
    fn default() -> Self {
        Self {
            hook_line_limit: 2,
            value_char_limit: 60,
            word_repeat_limit: 3,
            min_word_chars: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SeoRules {
    pub crawler_bots: Vec<String>,
    pub legacy_prefixes: Vec<String>,
}

impl Default for SeoRules {
    fn default() -> Self {
        Self {
            crawler_bots: vec![
                "Yeti".to_string(),
                "GPTBot".to_string(),
                "ClaudeBot".to_string(),
                "PerplexityBot".to_string(),
            ],
            legacy_prefixes: vec!["/venue/".to_string(), "/region/".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct MarkupRules {
    /// Any one marker must appear on the home page editorial section.
    pub home_markers: Vec<String>,
    /// Any one marker must appear on the region page guidance section.
    pub region_markers: Vec<String>,
}

impl SiteProfile {
    pub fn phone_regex(&self) -> Result<Regex, String> {
        Regex::new(&self.content.phone_pattern)
            .map_err(|err| format!("invalid phone_pattern: {err}"))
    }
}

pub fn load_profile(fs: &dyn Fs, repo_root: &Path) -> Result<SiteProfile, String> {
    let path = Path::new(DEFAULT_PROFILE_PATH);
    let text = fs
        .read_text(repo_root, path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let profile: SiteProfile = toml::from_str(&text)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    let errors = validate_profile(&profile);
    if errors.is_empty() {
        Ok(profile)
    } else {
        Err(errors.join("; "))
    }
}

pub fn validate_profile(profile: &SiteProfile) -> Vec<String> {
    let mut errors = Vec::new();
    if profile.site.base_url.is_empty() {
        errors.push("site.base_url cannot be empty".to_string());
    }
    if profile.site.base_url.ends_with('/') {
        errors.push("site.base_url must not end with `/`".to_string());
    }
    if profile.site.regions.is_empty() {
        errors.push("site.regions cannot be empty".to_string());
    }
    for region in &profile.site.regions {
        if region.is_empty()
            || !region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            errors.push(format!("invalid region id `{region}`"));
        }
    }
    let content = &profile.content;
    if content.name_mentions_min > content.name_mentions_max {
        errors.push("content.name_mentions_min exceeds name_mentions_max".to_string());
    }
    if content.faq_opener_chars == 0 {
        errors.push("content.faq_opener_chars must be > 0".to_string());
    }
    if content.phrase_ngram_words == 0 {
        errors.push("content.phrase_ngram_words must be > 0".to_string());
    }
    if let Err(err) = Regex::new(&content.phone_pattern) {
        errors.push(format!("content.phone_pattern does not compile: {err}"));
    }
    if profile.cards.hook_line_limit == 0 {
        errors.push("cards.hook_line_limit must be > 0".to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_profile() -> SiteProfile {
        toml::from_str(
            r#"
            [site]
            base_url = "https://nocturn.example"
            regions = ["gangnam", "busan"]
            "#,
        )
        .expect("profile")
    }

    #[test]
    fn minimal_profile_gets_defaults() {
        let profile = minimal_profile();
        assert_eq!(profile.content.name_mentions_min, 8);
        assert_eq!(profile.content.name_mentions_max, 10);
        assert_eq!(profile.content.faq_min, 10);
        assert_eq!(profile.cards.value_char_limit, 60);
        assert_eq!(profile.paths.sitemap, PathBuf::from("public/sitemap.xml"));
        assert!(profile
            .seo
            .legacy_prefixes
            .contains(&"/venue/".to_string()));
        assert!(validate_profile(&profile).is_empty());
    }

    #[test]
    fn trailing_slash_base_url_is_rejected() {
        let mut profile = minimal_profile();
        profile.site.base_url = "https://nocturn.example/".to_string();
        let errors = validate_profile(&profile);
        assert!(errors.iter().any(|e| e.contains("base_url")));
    }

    #[test]
    fn bad_region_and_bounds_are_rejected() {
        let mut profile = minimal_profile();
        profile.site.regions = vec!["Gang-Nam".to_string()];
        profile.content.name_mentions_min = 12;
        let errors = validate_profile(&profile);
        assert!(errors.iter().any(|e| e.contains("region id")));
        assert!(errors.iter().any(|e| e.contains("name_mentions_min")));
    }

    #[test]
    fn phone_pattern_compiles_by_default() {
        let profile = minimal_profile();
        let re = profile.phone_regex().expect("regex");
        assert!(re.is_match("010-5557-8179"));
        assert!(!re.is_match("02-555-8179"));
    }
}
