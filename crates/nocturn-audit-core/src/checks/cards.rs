// SPDX-License-Identifier: Apache-2.0

//! Card copy rules: the short hook/value/tags strings rendered on venue
//! cards. Hooks are stored with literal `\n` escapes in the catalog source,
//! so line budgets count the escape sequence, not raw newlines.

use std::collections::BTreeMap;

use nocturn_audit_model::Violation;

use super::{flag, warn};
use crate::extract::count_occurrences;
use crate::search::normalize;
use crate::{CheckContext, CheckError};

fn joined_copy(ctx: &CheckContext<'_>) -> String {
    let mut parts = Vec::new();
    for venue in &ctx.corpus.venues {
        parts.extend(venue.card_hook.iter().cloned());
        parts.extend(venue.card_value.iter().cloned());
        parts.extend(venue.card_tags.iter().cloned());
    }
    parts.join(" ")
}

pub fn check_copy_banned_words(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let copy = joined_copy(ctx);
    let mut violations = Vec::new();
    for word in &ctx.profile.content.banned_words {
        let count = count_occurrences(&copy, word);
        if count > 0 {
            violations.push(flag(
                "CARDS_BANNED_WORD",
                format!("banned word `{word}` appears {count}x in card copy"),
                Some(&ctx.profile.paths.venues),
            ));
        }
    }
    Ok(violations)
}

pub fn check_copy_hook_uniqueness(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let mut owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for venue in &ctx.corpus.venues {
        if let Some(hook) = &venue.card_hook {
            owners.entry(hook.as_str()).or_default().push(&venue.id);
        }
    }
    Ok(owners
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(hook, ids)| {
            let preview: String = hook.chars().take(40).collect();
            flag(
                "CARDS_HOOK_DUPLICATE",
                format!("hook `{preview}` shared by [{}]", ids.join(",")),
                Some(&ctx.profile.paths.venues),
            )
        })
        .collect())
}

pub fn check_copy_line_budget(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let rules = &ctx.profile.cards;
    let mut violations = Vec::new();
    for venue in &ctx.corpus.venues {
        let Some(hook) = &venue.card_hook else {
            violations.push(flag(
                "CARDS_COPY_MISSING",
                format!("{}: missing card_hook", venue.id),
                Some(&ctx.profile.paths.venues),
            ));
            continue;
        };
        let lines = count_occurrences(hook, "\\n") + 1;
        if lines > rules.hook_line_limit {
            let preview: String = hook.chars().take(40).collect();
            violations.push(flag(
                "CARDS_HOOK_LINE_BUDGET",
                format!(
                    "{}: hook has {lines} lines (max {}): {preview}...",
                    venue.id, rules.hook_line_limit
                ),
                Some(&ctx.profile.paths.venues),
            ));
        }
        match &venue.card_value {
            None => violations.push(flag(
                "CARDS_COPY_MISSING",
                format!("{}: missing card_value", venue.id),
                Some(&ctx.profile.paths.venues),
            )),
            Some(value) => {
                let chars = value.chars().count();
                if chars > rules.value_char_limit {
                    violations.push(flag(
                        "CARDS_VALUE_CHAR_BUDGET",
                        format!(
                            "{}: value is {chars} chars (max {})",
                            venue.id, rules.value_char_limit
                        ),
                        Some(&ctx.profile.paths.venues),
                    ));
                }
            }
        }
        if venue.card_tags.is_none() {
            violations.push(flag(
                "CARDS_COPY_MISSING",
                format!("{}: missing card_tags", venue.id),
                Some(&ctx.profile.paths.venues),
            ));
        }
    }
    Ok(violations)
}

/// Word repetition across all card copy, warn-level. Venue names and region
/// ids repeat legitimately and are exempt.
pub fn check_copy_word_repetition(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let rules = &ctx.profile.cards;
    let copy = joined_copy(ctx)
        .replace("\\n", " ")
        .replace(['·', ',', '—', '-', '(', ')'], " ");
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for word in copy
        .split_whitespace()
        .filter(|w| w.chars().count() >= rules.min_word_chars)
    {
        *counts.entry(word).or_default() += 1;
    }

    let exempt: Vec<String> = ctx
        .corpus
        .venues
        .iter()
        .map(|venue| normalize(&venue.name))
        .chain(ctx.profile.site.regions.iter().map(|r| normalize(r)))
        .collect();

    Ok(counts
        .into_iter()
        .filter(|(word, count)| {
            *count > rules.word_repeat_limit && !exempt.contains(&normalize(word))
        })
        .map(|(word, count)| {
            warn(
                "CARDS_WORD_REPETITION",
                format!(
                    "`{word}` used {count}x across card copy (limit {})",
                    rules.word_repeat_limit
                ),
                Some(&ctx.profile.paths.venues),
            )
        })
        .collect())
}
