// SPDX-License-Identifier: Apache-2.0

//! Search reachability: the index built from venue records must resolve
//! every venue name, with the exact match ranked first.

use nocturn_audit_model::Violation;

use super::{flag, warn};
use crate::search::{build_index, search, MatchKind};
use crate::{CheckContext, CheckError};

pub fn check_index_name_reachability(ctx: &CheckContext<'_>) -> Result<Vec<Violation>, CheckError> {
    let entries = build_index(&ctx.corpus.venues);
    let mut violations = Vec::new();
    for venue in &ctx.corpus.venues {
        let hits = search(&entries, &venue.name);
        match hits.first() {
            None => violations.push(flag(
                "SEARCH_NAME_UNREACHABLE",
                format!("`{}` returns no search results", venue.name),
                Some(&ctx.profile.paths.venues),
            )),
            Some(first) if first.kind != MatchKind::Exact => violations.push(warn(
                "SEARCH_NAME_NOT_EXACT",
                format!(
                    "`{}` resolves as a partial match (got `{}`)",
                    venue.name, first.name
                ),
                Some(&ctx.profile.paths.venues),
            )),
            Some(_) => {}
        }
    }
    Ok(violations)
}
