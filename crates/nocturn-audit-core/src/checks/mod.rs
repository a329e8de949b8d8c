// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod cards;
pub mod content;
pub mod markup;
pub mod search;
pub mod seo;
pub mod urls;

use std::path::Path;

use nocturn_audit_model::{CheckId, Severity, Violation};

use crate::CheckFn;

pub fn builtin_check_fn(check_id: &CheckId) -> Option<CheckFn> {
    match check_id.as_str() {
        "checks_content_text_banned_words" => Some(content::check_text_banned_words),
        "checks_content_text_connector_overuse" => Some(content::check_text_connector_overuse),
        "checks_content_text_phone_numbers" => Some(content::check_text_phone_numbers),
        "checks_content_text_cross_duplication" => Some(content::check_text_cross_duplication),
        "checks_content_text_phrase_repetition" => Some(content::check_text_phrase_repetition),
        "checks_content_name_mention_bounds" => Some(content::check_name_mention_bounds),
        "checks_content_name_paragraph_density" => Some(content::check_name_paragraph_density),
        "checks_content_faq_question_count" => Some(content::check_faq_question_count),
        "checks_content_faq_opener_diversity" => Some(content::check_faq_opener_diversity),
        "checks_content_section_title_uniqueness" => {
            Some(content::check_section_title_uniqueness)
        }
        "checks_content_section_count_diversity" => Some(content::check_section_count_diversity),
        "checks_content_summary_list_coverage" => Some(content::check_summary_list_coverage),
        "checks_cards_copy_banned_words" => Some(cards::check_copy_banned_words),
        "checks_cards_copy_hook_uniqueness" => Some(cards::check_copy_hook_uniqueness),
        "checks_cards_copy_line_budget" => Some(cards::check_copy_line_budget),
        "checks_cards_copy_word_repetition" => Some(cards::check_copy_word_repetition),
        "checks_seo_jsonld_site_schemas" => Some(seo::check_jsonld_site_schemas),
        "checks_seo_jsonld_detail_schemas" => Some(seo::check_jsonld_detail_schemas),
        "checks_seo_title_name_first" => Some(seo::check_title_name_first),
        "checks_seo_og_image_per_venue" => Some(seo::check_og_image_per_venue),
        "checks_seo_meta_robots_directives" => Some(seo::check_meta_robots_directives),
        "checks_seo_robots_crawler_policy" => Some(seo::check_robots_crawler_policy),
        "checks_seo_feeds_contracts" => Some(seo::check_feeds_contracts),
        "checks_urls_path_region_dedupe" => Some(urls::check_path_region_dedupe),
        "checks_urls_path_uniqueness" => Some(urls::check_path_uniqueness),
        "checks_urls_sitemap_canonical_only" => Some(urls::check_sitemap_canonical_only),
        "checks_urls_sitemap_full_coverage" => Some(urls::check_sitemap_full_coverage),
        "checks_urls_source_legacy_links" => Some(urls::check_source_legacy_links),
        "checks_urls_slug_dedupe_util" => Some(urls::check_slug_dedupe_util),
        "checks_urls_app_redirect_routes" => Some(urls::check_app_redirect_routes),
        "checks_markup_detail_media_order" => Some(markup::check_detail_media_order),
        "checks_markup_links_new_tab" => Some(markup::check_links_new_tab),
        "checks_markup_detail_map_link" => Some(markup::check_detail_map_link),
        "checks_markup_pages_editorial_sections" => Some(markup::check_pages_editorial_sections),
        "checks_search_index_name_reachability" => Some(search::check_index_name_reachability),
        _ => None,
    }
}

pub(crate) fn flag(code: &str, message: impl Into<String>, path: Option<&Path>) -> Violation {
    Violation {
        code: code.to_string(),
        message: message.into(),
        hint: None,
        path: path.map(|p| p.display().to_string()),
        line: None,
        severity: Severity::Error,
    }
}

pub(crate) fn warn(code: &str, message: impl Into<String>, path: Option<&Path>) -> Violation {
    Violation {
        severity: Severity::Warn,
        ..flag(code, message, path)
    }
}

pub(crate) fn note(code: &str, message: impl Into<String>, path: Option<&Path>) -> Violation {
    Violation {
        severity: Severity::Info,
        ..flag(code, message, path)
    }
}
