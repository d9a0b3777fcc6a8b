// src/catalog/locator.rs — Fuzzy manual lookup
//
// Resolves a free-text product reference ("SO 6004", "vestel 40fa9740 tv")
// to one catalog record by multi-term substring scoring. Deterministic:
// ties resolve to catalog order.

use crate::extract::normalize::fold_for_match;
use crate::infra::errors::AftersalesError;

use super::ManualRecord;

/// Split a reference into lowercase, diacritic-stripped terms.
/// Separators are whitespace, hyphens and underscores; terms with no
/// alphanumeric content are discarded.
fn tokenize(query: &str) -> Vec<String> {
    fold_for_match(query)
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|term| term.chars().any(|c| c.is_alphanumeric()))
        .map(|term| term.to_string())
        .collect()
}

fn score(haystack: &str, terms: &[String]) -> u32 {
    let mut total = 0;
    let mut distinctive = false;
    for term in terms {
        if haystack.contains(term.as_str()) {
            total += 1;
            // Model-like tokens beat generic words.
            if term.chars().count() >= 3 {
                distinctive = true;
            }
        }
    }
    if distinctive {
        total += 1;
    }
    total
}

/// Find the single best-matching record for a free-text product reference.
///
/// An empty query (or one with no usable terms) is an input error, reported
/// before the catalog is touched. No candidate scoring above zero is a
/// normal `None`. Equal top scores keep the first record in catalog order.
pub fn locate<'a>(
    records: &'a [ManualRecord],
    query: &str,
) -> Result<Option<&'a ManualRecord>, AftersalesError> {
    let terms = tokenize(query);
    if terms.is_empty() {
        return Err(AftersalesError::InvalidQuery {
            query: query.to_string(),
        });
    }

    let mut best: Option<(u32, &ManualRecord)> = None;
    for record in records {
        let haystack = format!(
            "{} {}",
            fold_for_match(&record.name),
            fold_for_match(&record.model_number)
        );

        // Narrowing filter, not the decision: skip records sharing no term.
        if !terms.iter().any(|t| haystack.contains(t.as_str())) {
            continue;
        }

        let candidate_score = score(&haystack, &terms);
        if candidate_score > 0 && best.map_or(true, |(s, _)| candidate_score > s) {
            best = Some((candidate_score, record));
        }
    }

    Ok(best.map(|(_, record)| record))
}
