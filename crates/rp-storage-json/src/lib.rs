//! # rp-storage-json
//!
//! JSON snapshot implementation of `RankStore`.
//!
//! Each collection lives in its own file under the data directory and is
//! replaced wholesale on every write: the new snapshot goes to a side file
//! first and is renamed over the target, so a crash mid-write leaves either
//! the old or the new snapshot intact, never a partial one.
//!
//! Each collection has its own `tokio::sync::Mutex`; every logical
//! operation is a read-modify-write cycle under that guard. Operations on
//! different collections never block each other. There is deliberately no
//! cross-collection transaction; the service layer orders its writes so
//! the vote log commits first.

use std::collections::{BTreeMap, HashSet};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use rp_core::models::{PairKey, RankedItem, Vote, VotingSession, DEFAULT_RATING};
use rp_core::traits::RankStore;

type HistoryMap = BTreeMap<String, Vec<PairKey>>;
type SessionMap = BTreeMap<String, VotingSession>;

/// One durable table: a JSON file plus its exclusive-access guard.
struct Table<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Table<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn new(dir: &Path, file_name: &str) -> Self {
        Self {
            path: dir.join(file_name),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    async fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Reads the current snapshot. A missing file is the empty table.
    async fn read(&self) -> anyhow::Result<T> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt table snapshot at {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read {}", self.path.display()))
            }
        }
    }

    /// Replaces the table contents atomically (side file + rename).
    /// On failure the side file is removed and the previously committed
    /// snapshot remains authoritative.
    async fn write(&self, value: &T) -> anyhow::Result<()> {
        let tmp = self.path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(value).context("failed to serialize table")?;

        if let Err(err) = fs::write(&tmp, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err).with_context(|| format!("failed to write {}", tmp.display()));
        }
        if let Err(err) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err)
                .with_context(|| format!("failed to swap snapshot into {}", self.path.display()));
        }

        debug!(table = %self.path.display(), bytes = bytes.len(), "snapshot committed");
        Ok(())
    }

    /// Seeds the file with an empty snapshot if it does not exist yet.
    /// A failed existence check propagates rather than treating the file
    /// as missing, so an existing table is never overwritten on a stat
    /// error.
    async fn init_if_missing(&self) -> anyhow::Result<()> {
        let exists = fs::try_exists(&self.path)
            .await
            .with_context(|| format!("failed to stat {}", self.path.display()))?;
        if exists {
            return Ok(());
        }
        self.write(&T::default()).await
    }
}

/// File-backed store holding the four engine collections.
pub struct JsonStore {
    items: Table<Vec<RankedItem>>,
    votes: Table<Vec<Vote>>,
    history: Table<HistoryMap>,
    sessions: Table<SessionMap>,
}

impl JsonStore {
    /// Opens (and if needed creates) the data directory and its four
    /// table files.
    pub async fn open(data_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create data directory {}", dir.display()))?;

        let store = Self {
            items: Table::new(dir, "items.json"),
            votes: Table::new(dir, "votes.json"),
            history: Table::new(dir, "judge_history.json"),
            sessions: Table::new(dir, "sessions.json"),
        };

        store.items.init_if_missing().await?;
        store.votes.init_if_missing().await?;
        store.history.init_if_missing().await?;
        store.sessions.init_if_missing().await?;

        debug!(data_dir = %dir.display(), "json store opened");
        Ok(store)
    }
}

#[async_trait]
impl RankStore for JsonStore {
    async fn add_item(
        &self,
        name: &str,
        created_by: Option<String>,
    ) -> anyhow::Result<(RankedItem, bool)> {
        let _guard = self.items.guard().await;
        let mut items = self.items.read().await?;

        let wanted = name.to_lowercase();
        if let Some(existing) = items.iter().find(|i| i.name.to_lowercase() == wanted) {
            return Ok((existing.clone(), false));
        }

        let item = RankedItem::new(name, created_by);
        items.push(item.clone());
        self.items.write(&items).await?;
        Ok((item, true))
    }

    async fn all_items(&self) -> anyhow::Result<Vec<RankedItem>> {
        let _guard = self.items.guard().await;
        self.items.read().await
    }

    async fn item_by_id(&self, id: Uuid) -> anyhow::Result<Option<RankedItem>> {
        let _guard = self.items.guard().await;
        let items = self.items.read().await?;
        Ok(items.into_iter().find(|i| i.id == id))
    }

    async fn update_item_rating(&self, id: Uuid, new_rating: f64) -> anyhow::Result<()> {
        let _guard = self.items.guard().await;
        let mut items = self.items.read().await?;

        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            bail!("item {id} not found");
        };
        item.rating = new_rating;
        item.comparison_count += 1;

        self.items.write(&items).await
    }

    async fn items_by_rating(&self) -> anyhow::Result<Vec<RankedItem>> {
        let _guard = self.items.guard().await;
        let mut items = self.items.read().await?;
        items.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        Ok(items)
    }

    async fn append_vote(&self, vote: Vote) -> anyhow::Result<()> {
        let _guard = self.votes.guard().await;
        let mut votes = self.votes.read().await?;
        votes.push(vote);
        self.votes.write(&votes).await
    }

    async fn all_votes(&self) -> anyhow::Result<Vec<Vote>> {
        let _guard = self.votes.guard().await;
        self.votes.read().await
    }

    async fn mark_pair_judged(&self, judge_id: &str, pair: PairKey) -> anyhow::Result<()> {
        let _guard = self.history.guard().await;
        let mut history = self.history.read().await?;

        let pairs = history.entry(judge_id.to_string()).or_default();
        if pairs.contains(&pair) {
            // Set semantics: a re-judged pair is not double-counted.
            return Ok(());
        }
        pairs.push(pair);

        self.history.write(&history).await
    }

    async fn voted_pairs(&self, judge_id: &str) -> anyhow::Result<HashSet<PairKey>> {
        let _guard = self.history.guard().await;
        let history = self.history.read().await?;
        Ok(history
            .get(judge_id)
            .map(|pairs| pairs.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn get_session(&self, judge_id: &str) -> anyhow::Result<Option<VotingSession>> {
        let _guard = self.sessions.guard().await;
        let sessions = self.sessions.read().await?;
        Ok(sessions.get(judge_id).cloned())
    }

    async fn save_session(&self, session: VotingSession) -> anyhow::Result<()> {
        let _guard = self.sessions.guard().await;
        let mut sessions = self.sessions.read().await?;
        sessions.insert(session.judge_id.clone(), session);
        self.sessions.write(&sessions).await
    }

    async fn clear_session(&self, judge_id: &str) -> anyhow::Result<()> {
        let _guard = self.sessions.guard().await;
        let mut sessions = self.sessions.read().await?;
        if sessions.remove(judge_id).is_some() {
            self.sessions.write(&sessions).await?;
        }
        Ok(())
    }

    async fn reset_all(&self) -> anyhow::Result<()> {
        // Fixed lock order: items, votes, history, sessions.
        {
            let _guard = self.items.guard().await;
            self.items.write(&Vec::new()).await?;
        }
        {
            let _guard = self.votes.guard().await;
            self.votes.write(&Vec::new()).await?;
        }
        {
            let _guard = self.history.guard().await;
            self.history.write(&HistoryMap::new()).await?;
        }
        let _guard = self.sessions.guard().await;
        self.sessions.write(&SessionMap::new()).await
    }

    async fn reset_rankings(&self) -> anyhow::Result<()> {
        {
            let _guard = self.items.guard().await;
            let mut items = self.items.read().await?;
            for item in &mut items {
                item.rating = DEFAULT_RATING;
                item.comparison_count = 0;
            }
            self.items.write(&items).await?;
        }
        {
            let _guard = self.votes.guard().await;
            self.votes.write(&Vec::new()).await?;
        }
        {
            let _guard = self.history.guard().await;
            self.history.write(&HistoryMap::new()).await?;
        }
        let _guard = self.sessions.guard().await;
        self.sessions.write(&SessionMap::new()).await
    }
}
