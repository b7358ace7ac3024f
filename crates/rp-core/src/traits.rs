//! # Core Traits (Ports)
//!
//! Any persistence backend must implement [`RankStore`] to be used by the
//! ranking service.

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{PairKey, RankedItem, Vote, VotingSession};

/// Durable storage contract for the four engine collections: items, votes,
/// per-judge history, and per-judge sessions.
///
/// Implementations must make each logical operation atomic with respect to
/// its own collection (at most one in-flight read-modify-write per
/// collection). There is no cross-collection transaction: the service
/// commits a vote as an ordered sequence of these operations, vote log
/// first, so the log stays the source of truth if a crash interleaves.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait RankStore: Send + Sync {
    // Item operations

    /// Adds an item, or returns the existing one when `name` matches
    /// case-insensitively. The flag is `true` only when a new item was
    /// created.
    async fn add_item(
        &self,
        name: &str,
        created_by: Option<String>,
    ) -> anyhow::Result<(RankedItem, bool)>;

    async fn all_items(&self) -> anyhow::Result<Vec<RankedItem>>;

    async fn item_by_id(&self, id: Uuid) -> anyhow::Result<Option<RankedItem>>;

    /// Sets the item's rating and increments its comparison count by 1.
    async fn update_item_rating(&self, id: Uuid, new_rating: f64) -> anyhow::Result<()>;

    /// All items sorted by rating, highest first.
    async fn items_by_rating(&self) -> anyhow::Result<Vec<RankedItem>>;

    // Vote log

    async fn append_vote(&self, vote: Vote) -> anyhow::Result<()>;

    async fn all_votes(&self) -> anyhow::Result<Vec<Vote>>;

    // Judge history

    /// Marks a pair as judged. Set semantics: re-marking an existing pair
    /// is a no-op.
    async fn mark_pair_judged(&self, judge_id: &str, pair: PairKey) -> anyhow::Result<()>;

    async fn voted_pairs(&self, judge_id: &str) -> anyhow::Result<HashSet<PairKey>>;

    // Sessions

    async fn get_session(&self, judge_id: &str) -> anyhow::Result<Option<VotingSession>>;

    async fn save_session(&self, session: VotingSession) -> anyhow::Result<()>;

    async fn clear_session(&self, judge_id: &str) -> anyhow::Result<()>;

    // Resets

    /// Empties all four collections.
    async fn reset_all(&self) -> anyhow::Result<()>;

    /// Keeps item identities but forces every rating back to the default
    /// and comparison counts to 0; empties votes, history, and sessions.
    async fn reset_rankings(&self) -> anyhow::Result<()>;
}
