// Greedy question selection: ask about the trait most common among the
// remaining candidates. Ties go to the lowest trait id. Traits no candidate
// holds are never offered since no answer to them can narrow the set.
use crate::filter::candidates;
use crate::{Dataset, Session, Trait};
use ahash::AHashMap;

/// Next trait to ask about, or `None` when the candidate set is empty or no
/// unanswered trait is held by any candidate
pub fn next_trait<'a>(dataset: &'a Dataset, session: &Session) -> Option<&'a Trait> {
    rank_traits(dataset, session, 1).into_iter().next().map(|(t, _)| t)
}

/// Up to `n` askable traits with their candidate counts, best first.
/// Every returned count is at least 1.
pub fn rank_traits<'a>(dataset: &'a Dataset, session: &Session, n: usize) -> Vec<(&'a Trait, usize)> {
    if n == 0 {
        return Vec::new();
    }

    let remaining = candidates(dataset, session, None);
    if remaining.is_empty() {
        return Vec::new();
    }

    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    for item in &remaining {
        for trait_id in &item.trait_ids {
            *counts.entry(trait_id.as_str()).or_insert(0) += 1;
        }
    }

    // traits() is in ascending id order and the sort is stable, so equal
    // counts keep the lowest id first
    let mut ranked: Vec<(&Trait, usize)> = dataset
        .traits()
        .iter()
        .filter(|t| !session.is_answered(t.id.as_str()))
        .filter_map(|t| counts.get(t.id.as_str()).map(|&count| (t, count)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);

    tracing::trace!(
        candidates = remaining.len(),
        askable = ranked.len(),
        "ranked traits"
    );
    ranked
}
