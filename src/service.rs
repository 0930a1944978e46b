//! Challenge service: creation defaults, random selection, and the
//! existence-checked update/delete protocol.
//!
//! The service keeps no state of its own beyond the store handle. Store
//! failures pass through untouched; the service itself raises only
//! `ServiceError::NotFound` and, for an empty title, `ServiceError::Invalid`.
//! The title check lives here so every store sees the same rule.
//!
//! Neither count-then-fetch (random) nor check-then-mutate (update/delete) is
//! transactional. If the table shrinks between the count and the fetch, the
//! random pick fails with NotFound rather than retrying. If a row disappears
//! between the existence check and the write, the store's own
//! `RecordNotFound` is forwarded.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Challenge, ChallengePatch, CreateChallenge, NewChallenge};
use crate::error::{ServiceError, ServiceResult};
use crate::store::ChallengeStore;

#[derive(Clone)]
pub struct ChallengeService {
    store: Arc<dyn ChallengeStore>,
}

/// Externally supplied ids that do not parse as integers resolve to no record.
fn parse_id(raw_id: &str) -> Option<i64> {
    raw_id.parse::<i64>().ok()
}

impl ChallengeService {
    pub fn new(store: Arc<dyn ChallengeStore>) -> Self {
        Self { store }
    }

    /// Insert a new challenge; `description` defaults to "" and `tags` to [].
    #[instrument(level = "info", skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: CreateChallenge) -> ServiceResult<Challenge> {
        if input.title.is_empty() {
            return Err(ServiceError::empty_title());
        }
        let created = self.store.insert(NewChallenge::from(input)).await?;
        info!(target: "challenge", id = created.id, title = %created.title, "Challenge created");
        Ok(created)
    }

    /// Every persisted challenge, in store order.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_all(&self) -> ServiceResult<Vec<Challenge>> {
        Ok(self.store.find_all().await?)
    }

    /// Uniformly random challenge over the store's current ordering.
    #[instrument(level = "info", skip(self))]
    pub async fn get_random(&self) -> ServiceResult<Challenge> {
        let count = self.store.count().await?;
        if count == 0 {
            debug!(target: "challenge", "Random pick requested on empty store");
            return Err(ServiceError::empty_store());
        }

        let offset = rand::thread_rng().gen_range(0..count);
        match self.store.find_at_offset(offset).await? {
            Some(challenge) => {
                debug!(target: "challenge", count, offset, id = challenge.id, "Random challenge picked");
                Ok(challenge)
            }
            None => {
                warn!(target: "challenge", count, offset, "Store shrank between count and fetch");
                Err(ServiceError::empty_store())
            }
        }
    }

    /// Point lookup by externally supplied id.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_by_id(&self, raw_id: &str) -> ServiceResult<Challenge> {
        self.require(raw_id).await
    }

    /// Apply only the fields present in `patch` to an existing challenge.
    #[instrument(level = "info", skip(self, patch), fields(fields = ?patch.field_names()))]
    pub async fn update(&self, raw_id: &str, patch: ChallengePatch) -> ServiceResult<Challenge> {
        let existing = self.require(raw_id).await?;
        if patch.title.as_deref() == Some("") {
            return Err(ServiceError::empty_title());
        }
        if patch.is_empty() {
            return Ok(existing);
        }
        let updated = self.store.update(existing.id, &patch).await?;
        info!(target: "challenge", id = updated.id, "Challenge updated");
        Ok(updated)
    }

    /// Remove an existing challenge and return it as it was stored.
    #[instrument(level = "info", skip(self))]
    pub async fn delete(&self, raw_id: &str) -> ServiceResult<Challenge> {
        let existing = self.require(raw_id).await?;
        let removed = self.store.delete(existing.id).await?;
        info!(target: "challenge", id = removed.id, "Challenge deleted");
        Ok(removed)
    }

    /// Existence check shared by lookup, update and delete.
    async fn require(&self, raw_id: &str) -> ServiceResult<Challenge> {
        let Some(id) = parse_id(raw_id) else {
            debug!(target: "challenge", %raw_id, "Unparseable challenge id");
            return Err(ServiceError::missing_id(raw_id));
        };
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::missing_id(raw_id))
    }
}
