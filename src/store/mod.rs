//! Record store seam: the relational table of challenges behind the service.
//!
//! Two implementations:
//!   - `MemoryStore`: in-process map (default; also used by tests)
//!   - `SqliteStore`: a `challenges` table in SQLite
//!
//! "Natural ordering" for offset fetches is ascending primary key in both.
//! Only `id` is unique; titles may repeat.

use async_trait::async_trait;

use crate::domain::{Challenge, ChallengePatch, NewChallenge};
use crate::error::StoreResult;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Number of persisted records.
    async fn count(&self) -> StoreResult<u64>;

    /// Every persisted record, in natural order.
    async fn find_all(&self) -> StoreResult<Vec<Challenge>>;

    /// The record at `offset` in natural order, if the table is that long.
    async fn find_at_offset(&self, offset: u64) -> StoreResult<Option<Challenge>>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Challenge>>;

    /// Insert a row; the store assigns `id`, `created_at` and `updated_at`.
    async fn insert(&self, row: NewChallenge) -> StoreResult<Challenge>;

    /// Apply `patch` to the row and bump `updated_at`.
    /// Fails with `StoreError::RecordNotFound` if the row is gone.
    async fn update(&self, id: i64, patch: &ChallengePatch) -> StoreResult<Challenge>;

    /// Remove the row and return it.
    /// Fails with `StoreError::RecordNotFound` if the row is gone.
    async fn delete(&self, id: i64) -> StoreResult<Challenge>;
}
