// SPDX-License-Identifier: Apache-2.0

//! Editorial quality rules over the extracted content corpus.

use std::collections::{BTreeMap, BTreeSet};

use nocturn_audit_model::Violation;

use super::{flag, note};
use crate::extract::{
    count_occurrences, faq_questions, narrative_texts, opener, phrase_words, section_titles,
    split_paragraphs, split_sentences, template_text,
};
use crate::{CheckContext, CheckError};

fn extraction(err: String) -> CheckError {
    CheckError::Failed(err)
}

/// Banned vocabulary must not appear in any prose-bearing source.
pub fn check_text_banned_words(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let paths = &ctx.profile.paths;
    let scans = [
        (paths.content.as_path(), ctx.sources.content.as_str()),
        (paths.venues.as_path(), ctx.sources.venues.as_str()),
        (paths.home_page.as_path(), ctx.sources.home_page.as_str()),
        (paths.region_page.as_path(), ctx.sources.region_page.as_str()),
    ];
    let mut violations = Vec::new();
    for word in &ctx.profile.content.banned_words {
        for (path, source) in scans {
            let count = count_occurrences(source, word);
            if count > 0 {
                violations.push(flag(
                    "CONTENT_BANNED_WORD",
                    format!("banned word `{word}` appears {count}x"),
                    Some(path),
                ));
            }
        }
    }
    Ok(violations)
}

/// Stock connectors read as generated text once they pile up; each one has a
/// corpus-wide allowance.
pub fn check_text_connector_overuse(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let all_text = template_text(&ctx.sources.content).map_err(extraction)?;
    let limit = ctx.profile.content.connector_limit;
    let mut violations = Vec::new();
    for connector in &ctx.profile.content.connectors {
        let count = count_occurrences(&all_text, connector);
        if count > limit {
            violations.push(flag(
                "CONTENT_CONNECTOR_OVERUSE",
                format!("connector `{connector}` used {count}x across all content (limit {limit})"),
                Some(&ctx.profile.paths.content),
            ));
        }
    }
    Ok(violations)
}

pub fn check_text_phone_numbers(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let phone = ctx.profile.phone_regex().map_err(extraction)?;
    let found: BTreeSet<&str> = phone
        .find_iter(&ctx.sources.content)
        .map(|m| m.as_str())
        .collect();
    Ok(found
        .into_iter()
        .map(|number| {
            let mut violation = flag(
                "CONTENT_PHONE_NUMBER",
                format!("content carries phone number {number}"),
                Some(&ctx.profile.paths.content),
            );
            violation.hint = Some("move contact details to the venue record".to_string());
            violation
        })
        .collect())
}

/// A sentence of real length appearing under two or more venues means the
/// copy was stamped out from one template.
pub fn check_text_cross_duplication(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let min_chars = ctx.profile.content.sentence_min_chars;
    let mut owners: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for block in &ctx.corpus.blocks {
        let text = template_text(&block.raw).map_err(extraction)?;
        for sentence in split_sentences(&text) {
            if sentence.chars().count() > min_chars {
                owners
                    .entry(sentence.to_string())
                    .or_default()
                    .insert(block.id.as_str());
            }
        }
    }
    let mut violations = Vec::new();
    for (sentence, ids) in owners {
        if ids.len() > 1 {
            let preview: String = sentence.chars().take(60).collect();
            let ids = ids.into_iter().collect::<Vec<_>>().join(",");
            violations.push(flag(
                "CONTENT_SENTENCE_DUPLICATE",
                format!("sentence shared by [{ids}]: \"{preview}...\""),
                Some(&ctx.profile.paths.content),
            ));
        }
    }
    Ok(violations)
}

/// Repeated long n-grams across the whole corpus, with a small allowance for
/// genuinely recurring factual phrasing.
pub fn check_text_phrase_repetition(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let all_text = template_text(&ctx.sources.content).map_err(extraction)?;
    let words = phrase_words(&all_text);
    let n = ctx.profile.content.phrase_ngram_words;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for gram in words.windows(n) {
        *counts.entry(gram.join(" ")).or_default() += 1;
    }
    let repeated: Vec<(&String, &usize)> = counts.iter().filter(|(_, c)| **c > 1).collect();
    let allowance = ctx.profile.content.phrase_repeat_allowance;
    if repeated.len() <= allowance {
        return Ok(Vec::new());
    }
    let mut violations = vec![flag(
        "CONTENT_PHRASE_REPEATED",
        format!(
            "{} repeated {n}-word phrases across pages (allowance {allowance})",
            repeated.len()
        ),
        Some(&ctx.profile.paths.content),
    )];
    for (phrase, count) in repeated.into_iter().take(3) {
        violations.push(note(
            "CONTENT_PHRASE_REPEATED_EXAMPLE",
            format!("`{phrase}` appears {count}x"),
            Some(&ctx.profile.paths.content),
        ));
    }
    Ok(violations)
}

/// Venue name mentions per block stay inside the editorial window.
pub fn check_name_mention_bounds(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let min = ctx.profile.content.name_mentions_min;
    let max = ctx.profile.content.name_mentions_max;
    let mut violations = Vec::new();
    for block in &ctx.corpus.blocks {
        let Some(venue) = ctx.corpus.venue_by_id(&block.id) else {
            continue;
        };
        let count = count_occurrences(&block.raw, &venue.name);
        if count < min {
            violations.push(flag(
                "CONTENT_NAME_MENTIONS_LOW",
                format!("{}: `{}` mentioned {count}x (min {min})", block.id, venue.name),
                Some(&ctx.profile.paths.content),
            ));
        }
        if count > max {
            violations.push(flag(
                "CONTENT_NAME_MENTIONS_HIGH",
                format!("{}: `{}` mentioned {count}x (max {max})", block.id, venue.name),
                Some(&ctx.profile.paths.content),
            ));
        }
    }
    Ok(violations)
}

/// No paragraph may lean on the venue name more than the per-paragraph limit.
pub fn check_name_paragraph_density(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let limit = ctx.profile.content.paragraph_name_limit;
    let mut violations = Vec::new();
    for block in &ctx.corpus.blocks {
        let Some(venue) = ctx.corpus.venue_by_id(&block.id) else {
            continue;
        };
        for text in narrative_texts(&block.raw).map_err(extraction)? {
            for paragraph in split_paragraphs(&text) {
                let count = count_occurrences(paragraph, &venue.name);
                if count > limit {
                    violations.push(flag(
                        "CONTENT_NAME_PARAGRAPH_DENSITY",
                        format!(
                            "{}: `{}` {count}x in one paragraph (max {limit})",
                            block.id, venue.name
                        ),
                        Some(&ctx.profile.paths.content),
                    ));
                }
            }
        }
    }
    Ok(violations)
}

pub fn check_faq_question_count(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let min = ctx.profile.content.faq_min;
    let mut violations = Vec::new();
    for block in &ctx.corpus.blocks {
        let questions = faq_questions(&block.raw).map_err(extraction)?;
        if questions.len() < min {
            violations.push(flag(
                "CONTENT_FAQ_COUNT_LOW",
                format!("{}: {} FAQ entries (min {min})", block.id, questions.len()),
                Some(&ctx.profile.paths.content),
            ));
        }
    }
    Ok(violations)
}

/// FAQ questions within one venue must not share an opener; identical
/// leading characters are the first tell of a question template.
pub fn check_faq_opener_diversity(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let prefix = ctx.profile.content.faq_opener_chars;
    let mut violations = Vec::new();
    for block in &ctx.corpus.blocks {
        let questions = faq_questions(&block.raw).map_err(extraction)?;
        let openers: Vec<String> = questions.iter().map(|q| opener(q, prefix)).collect();
        let mut seen = BTreeSet::new();
        let mut dupes = BTreeSet::new();
        for op in &openers {
            if !seen.insert(op.as_str()) {
                dupes.insert(op.as_str());
            }
        }
        if !dupes.is_empty() {
            let dupes = dupes.into_iter().collect::<Vec<_>>().join(", ");
            violations.push(flag(
                "CONTENT_FAQ_OPENER_DUPLICATE",
                format!("{}: FAQ opener duplicates: {dupes}", block.id),
                Some(&ctx.profile.paths.content),
            ));
        }
    }
    Ok(violations)
}

/// Section headings are unique across the whole catalog.
pub fn check_section_title_uniqueness(
    ctx: &CheckContext<'_>,
) -> Result<Vec<Violation>, CheckError> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for block in &ctx.corpus.blocks {
        for title in section_titles(&block.raw).map_err(extraction)? {
            *counts.entry(title).or_default() += 1;
        }
    }
    Ok(counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(title, count)| {
            flag(
                "CONTENT_SECTION_TITLE_DUPLICATE",
                format!("heading `{title}` used {count}x across venues"),
                Some(&ctx.profile.paths.content),
            )
        })
        .collect())
}

/// Every venue carrying the same number of sections is a template signal.
pub fn check_section_count_diversity(
    ctx: &CheckContext<'_>,
) -> Result<Vec<Violation>, CheckError> {
    if ctx.corpus.blocks.len() <= 3 {
        return Ok(Vec::new());
    }
    let mut counts = BTreeSet::new();
    for block in &ctx.corpus.blocks {
        counts.insert(section_titles(&block.raw).map_err(extraction)?.len());
    }
    if counts.len() == 1 {
        let uniform = counts.into_iter().next().unwrap_or_default();
        return Ok(vec![flag(
            "CONTENT_SECTION_COUNT_UNIFORM",
            format!(
                "all {} venues have exactly {uniform} sections",
                ctx.corpus.blocks.len()
            ),
            Some(&ctx.profile.paths.content),
        )]);
    }
    Ok(Vec::new())
}

/// Every venue record owns a content block, and every block carries the
/// machine-readable summary list.
pub fn check_summary_list_coverage(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let mut violations = Vec::new();
    for venue in &ctx.corpus.venues {
        match ctx.corpus.blocks.iter().find(|b| b.id == venue.id) {
            None => violations.push(flag(
                "CONTENT_BLOCK_MISSING",
                format!("venue {} has no content block", venue.id),
                Some(&ctx.profile.paths.content),
            )),
            Some(block) => {
                if !crate::extract::has_summary_list(&block.raw).map_err(extraction)? {
                    violations.push(flag(
                        "CONTENT_SUMMARY_MISSING",
                        format!("venue {} has no summary list", venue.id),
                        Some(&ctx.profile.paths.content),
                    ));
                }
            }
        }
    }
    Ok(violations)
}
