//! # Domain Models
//!
//! These structs represent the core entities of the ranking engine.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every item starts here; ratings are unbounded reals after that.
pub const DEFAULT_RATING: f64 = 1500.0;

/// An item under ranking, carrying its current Elo estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedItem {
    pub id: Uuid,
    /// Unique across all items, compared case-insensitively.
    pub name: String,
    pub rating: f64,
    /// Number of resolved comparisons this item has appeared in.
    pub comparison_count: u32,
    /// Judge who added it, if known.
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RankedItem {
    pub fn new(name: impl Into<String>, created_by: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            rating: DEFAULT_RATING,
            comparison_count: 0,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// A single pairwise preference. Append-only; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub judge_id: String,
    pub item_a_id: Uuid,
    pub item_b_id: Uuid,
    /// Always one of `item_a_id` / `item_b_id`.
    pub winner_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Canonical unordered pair of item ids.
///
/// The constructor sorts the two ids, so `(x, y)` and `(y, x)` hash and
/// compare identically. Serializes as `[id_low, id_high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey(Uuid, Uuid);

impl PairKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn low(&self) -> Uuid {
        self.0
    }

    pub fn high(&self) -> Uuid {
        self.1
    }
}

/// The single pair currently offered to a judge and awaiting a response.
/// At most one live session per judge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingSession {
    pub judge_id: String,
    pub item_a_id: Uuid,
    pub item_b_id: Uuid,
}

impl VotingSession {
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.item_a_id, self.item_b_id)
    }
}
