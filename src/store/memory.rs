//! In-memory challenge table guarded by a tokio `RwLock`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::{Challenge, ChallengePatch, NewChallenge};
use crate::error::{StoreError, StoreResult};
use crate::store::ChallengeStore;

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, Challenge>,
    last_id: i64,
}

/// Challenge store kept in process memory. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn count(&self) -> StoreResult<u64> {
        Ok(self.table.read().await.rows.len() as u64)
    }

    async fn find_all(&self) -> StoreResult<Vec<Challenge>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn find_at_offset(&self, offset: u64) -> StoreResult<Option<Challenge>> {
        let table = self.table.read().await;
        let Ok(skip) = usize::try_from(offset) else { return Ok(None) };
        Ok(table.rows.values().nth(skip).cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Challenge>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    #[instrument(level = "debug", skip(self, row), fields(title = %row.title))]
    async fn insert(&self, row: NewChallenge) -> StoreResult<Challenge> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let now = Utc::now();
        let challenge = Challenge {
            id: table.last_id,
            title: row.title,
            description: row.description,
            difficulty: row.difficulty,
            tags: row.tags,
            category: row.category,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(challenge.id, challenge.clone());
        debug!(target: "challenge_picker", id = challenge.id, "memory insert");
        Ok(challenge)
    }

    #[instrument(level = "debug", skip(self, patch))]
    async fn update(&self, id: i64, patch: &ChallengePatch) -> StoreResult<Challenge> {
        let mut table = self.table.write().await;
        let row = table.rows.get_mut(&id).ok_or(StoreError::RecordNotFound)?;
        patch.apply_to(row);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<Challenge> {
        self.table
            .write()
            .await
            .rows
            .remove(&id)
            .ok_or(StoreError::RecordNotFound)
    }
}
