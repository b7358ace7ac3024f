//! # rp-service
//!
//! Orchestration layer of the ranking engine. Drives the per-judge state
//! machine (offer a pair, apply the choice), the leaderboard, and the
//! resets, composing the pure rating/pairing functions with a `RankStore`.
//!
//! State machine per judge: no session → `request_pair` offers one and
//! persists the session → `submit_choice` applies the Elo update and
//! clears it. An invalid choice changes nothing; a vanished item clears
//! the session. Discarding a pending offer is the explicit
//! `skip_current_offer` operation, never a side effect of asking again.

use std::sync::Mutex;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use rp_core::elo::{self, DEFAULT_K_FACTOR};
use rp_core::error::{RankError, Result};
use rp_core::models::{RankedItem, Vote, VotingSession};
use rp_core::pairing::{self, CANDIDATE_WINDOW};
use rp_core::traits::RankStore;

/// Engine tuning, constructed once at startup and passed in explicitly.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Elo K-factor, constant for the lifetime of the engine.
    pub k_factor: f64,
    /// Size of the closest-rated candidate prefix sampled by the selector.
    pub candidate_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
            candidate_window: CANDIDATE_WINDOW,
        }
    }
}

/// A pair offered to a judge, plus how many pairs that judge still has
/// left (including this one).
#[derive(Debug, Clone)]
pub struct PairOffer {
    pub item_a: RankedItem,
    pub item_b: RankedItem,
    pub remaining: usize,
}

/// The result of a resolved comparison; both items carry their post-vote
/// ratings.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub winner: RankedItem,
    pub loser: RankedItem,
}

/// Composition root of the engine: pair selection + rating updates +
/// persistence, behind two externally observable verbs per judge.
pub struct RankingService<S> {
    store: S,
    config: EngineConfig,
    rng: Mutex<StdRng>,
}

impl<S: RankStore> RankingService<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_rng(store, config, StdRng::from_os_rng())
    }

    /// Construct with an explicit RNG so selection is deterministic in tests.
    pub fn with_rng(store: S, config: EngineConfig, rng: StdRng) -> Self {
        Self {
            store,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds an item by name, idempotently. The flag is `true` when the
    /// item was newly created, `false` when an existing item (matched
    /// case-insensitively) was returned instead.
    pub async fn add_item(
        &self,
        name: &str,
        created_by: Option<String>,
    ) -> Result<(RankedItem, bool)> {
        let (item, created) = self.store.add_item(name, created_by).await?;
        if created {
            info!(item = %item.name, id = %item.id, "item added");
        }
        Ok((item, created))
    }

    /// Offers the next pair to a judge.
    ///
    /// A pending session is re-offered as-is; it is only replaced through
    /// [`Self::skip_current_offer`] or a submitted choice. A pending
    /// session whose items have disappeared is cleared and selection
    /// restarts.
    pub async fn request_pair(&self, judge_id: &str) -> Result<PairOffer> {
        if let Some(session) = self.store.get_session(judge_id).await? {
            let item_a = self.store.item_by_id(session.item_a_id).await?;
            let item_b = self.store.item_by_id(session.item_b_id).await?;
            match (item_a, item_b) {
                (Some(item_a), Some(item_b)) => {
                    let remaining = self.remaining_pairs(judge_id).await?;
                    debug!(judge = judge_id, "re-offering pending pair");
                    return Ok(PairOffer {
                        item_a,
                        item_b,
                        remaining,
                    });
                }
                _ => {
                    // Stale session from a concurrent reset.
                    self.store.clear_session(judge_id).await?;
                }
            }
        }

        self.offer_fresh_pair(judge_id).await
    }

    /// Explicitly discards any pending offer for this judge and draws a
    /// fresh pair.
    pub async fn skip_current_offer(&self, judge_id: &str) -> Result<PairOffer> {
        self.store.clear_session(judge_id).await?;
        self.offer_fresh_pair(judge_id).await
    }

    async fn offer_fresh_pair(&self, judge_id: &str) -> Result<PairOffer> {
        let items = self.store.all_items().await?;
        if items.len() < 2 {
            return Err(RankError::InsufficientItems(items.len()));
        }

        let voted = self.store.voted_pairs(judge_id).await?;
        let selected = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            pairing::next_pair(&items, &voted, self.config.candidate_window, &mut *rng)
                .map(|(a, b)| (a.clone(), b.clone()))
        };

        let Some((item_a, item_b)) = selected else {
            return Err(RankError::PairsExhausted);
        };

        self.store
            .save_session(VotingSession {
                judge_id: judge_id.to_string(),
                item_a_id: item_a.id,
                item_b_id: item_b.id,
            })
            .await?;

        let remaining = pairing::count_remaining(items.len(), voted.len());
        debug!(judge = judge_id, a = %item_a.name, b = %item_b.name, remaining, "pair offered");
        Ok(PairOffer {
            item_a,
            item_b,
            remaining,
        })
    }

    /// Applies a judge's choice ("1" or "2") to the pending offer.
    ///
    /// Commit order is fixed so the vote log is always written first:
    /// vote log → rating A → rating B → judge history → session cleared.
    /// An invalid choice is rejected before any state changes, so the same
    /// pair stays offered.
    pub async fn submit_choice(&self, judge_id: &str, choice: &str) -> Result<VoteOutcome> {
        let Some(session) = self.store.get_session(judge_id).await? else {
            return Err(RankError::NotFound(
                "voting session".into(),
                judge_id.to_string(),
            ));
        };

        let a_won = match choice.trim() {
            "1" => true,
            "2" => false,
            other => return Err(RankError::InvalidChoice(other.to_string())),
        };

        let Some(item_a) = self.store.item_by_id(session.item_a_id).await? else {
            self.store.clear_session(judge_id).await?;
            return Err(RankError::NotFound(
                "item".into(),
                session.item_a_id.to_string(),
            ));
        };
        let Some(item_b) = self.store.item_by_id(session.item_b_id).await? else {
            self.store.clear_session(judge_id).await?;
            return Err(RankError::NotFound(
                "item".into(),
                session.item_b_id.to_string(),
            ));
        };

        let (new_a, new_b) =
            elo::update_ratings(item_a.rating, item_b.rating, a_won, self.config.k_factor);

        let vote = Vote {
            judge_id: judge_id.to_string(),
            item_a_id: item_a.id,
            item_b_id: item_b.id,
            winner_id: if a_won { item_a.id } else { item_b.id },
            timestamp: Utc::now(),
        };

        self.store.append_vote(vote).await?;
        self.store.update_item_rating(item_a.id, new_a).await?;
        self.store.update_item_rating(item_b.id, new_b).await?;
        self.store
            .mark_pair_judged(judge_id, session.pair_key())
            .await?;
        self.store.clear_session(judge_id).await?;

        let mut item_a = item_a;
        let mut item_b = item_b;
        item_a.rating = new_a;
        item_a.comparison_count += 1;
        item_b.rating = new_b;
        item_b.comparison_count += 1;

        let (winner, loser) = if a_won { (item_a, item_b) } else { (item_b, item_a) };
        info!(
            judge = judge_id,
            winner = %winner.name,
            loser = %loser.name,
            winner_rating = winner.rating,
            loser_rating = loser.rating,
            "vote recorded"
        );
        Ok(VoteOutcome { winner, loser })
    }

    /// All items, best rating first.
    pub async fn leaderboard(&self) -> Result<Vec<RankedItem>> {
        Ok(self.store.items_by_rating().await?)
    }

    /// Pairs this judge has not voted on yet.
    pub async fn remaining_pairs(&self, judge_id: &str) -> Result<usize> {
        let items = self.store.all_items().await?;
        let voted = self.store.voted_pairs(judge_id).await?;
        Ok(pairing::count_remaining(items.len(), voted.len()))
    }

    /// Uniform random pair, ignoring history. Demo flows only.
    pub async fn random_pair(&self) -> Result<(RankedItem, RankedItem)> {
        let items = self.store.all_items().await?;
        let picked = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            pairing::random_pair(&items, &mut *rng).map(|(a, b)| (a.clone(), b.clone()))
        };
        picked.ok_or(RankError::InsufficientItems(items.len()))
    }

    /// Wipes ratings, votes, history, and sessions; keeps the items.
    pub async fn reset_rankings(&self) -> Result<()> {
        self.store.reset_rankings().await?;
        info!("rankings reset; items kept");
        Ok(())
    }

    /// Wipes everything, items included.
    pub async fn reset_all(&self) -> Result<()> {
        self.store.reset_all().await?;
        info!("full reset");
        Ok(())
    }
}
