//! Pair selection for the judging loop.
//!
//! Stateless with respect to persistence: callers hand in the current item
//! list and the judge's already-voted pair set. Randomness is injected via
//! the `Rng` parameter so tests can seed it.

use std::collections::HashSet;

use rand::Rng;

use crate::models::{PairKey, RankedItem};

/// How many of the closest-rated candidate pairs to sample from.
///
/// Always presenting the single closest pair would be deterministic;
/// sampling from the lowest-difference prefix keeps comparisons
/// informative while varying what judges see.
pub const CANDIDATE_WINDOW: usize = 3;

/// Pick the next pair for a judge, or `None` when fewer than 2 items exist
/// or the judge has covered every pair.
///
/// Candidates are all unordered pairs absent from `voted`, sorted ascending
/// by rating difference; one of the closest `window` is chosen uniformly.
pub fn next_pair<'a, R: Rng + ?Sized>(
    items: &'a [RankedItem],
    voted: &HashSet<PairKey>,
    window: usize,
    rng: &mut R,
) -> Option<(&'a RankedItem, &'a RankedItem)> {
    if items.len() < 2 {
        return None;
    }

    let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if voted.contains(&PairKey::new(items[i].id, items[j].id)) {
                continue;
            }
            let diff = (items[i].rating - items[j].rating).abs();
            candidates.push((i, j, diff));
        }
    }

    if candidates.is_empty() {
        return None;
    }

    candidates.sort_by(|x, y| x.2.total_cmp(&y.2));
    let window = window.max(1).min(candidates.len());
    let (i, j, _) = candidates[rng.random_range(0..window)];
    Some((&items[i], &items[j]))
}

/// Uniform sample of 2 distinct items, ignoring voting history.
/// Auxiliary flows only; the judging loop goes through [`next_pair`].
pub fn random_pair<'a, R: Rng + ?Sized>(
    items: &'a [RankedItem],
    rng: &mut R,
) -> Option<(&'a RankedItem, &'a RankedItem)> {
    if items.len() < 2 {
        return None;
    }
    let picked = rand::seq::index::sample(rng, items.len(), 2);
    Some((&items[picked.index(0)], &items[picked.index(1)]))
}

/// Pairs still unjudged for a judge who has voted on `voted_count` of the
/// `n*(n-1)/2` possible pairs. Zero whenever fewer than 2 items exist.
pub fn count_remaining(item_count: usize, voted_count: usize) -> usize {
    if item_count < 2 {
        return 0;
    }
    let total = item_count * (item_count - 1) / 2;
    total.saturating_sub(voted_count)
}
