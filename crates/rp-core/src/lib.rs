//! rankpair/crates/rp-core/src/lib.rs
//!
//! The central domain logic and interface definitions for rankpair:
//! Elo arithmetic, informative-pair selection, and the storage port.

pub mod elo;
pub mod error;
pub mod models;
pub mod pairing;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::{RankError, Result};
pub use models::*;
pub use traits::RankStore;

#[cfg(feature = "testing")]
pub use traits::MockRankStore;
