//! Client-side view state that mirrors server responses.
//!
//! Each action calls the API, then folds the result into `ViewState` so a UI
//! can render from one snapshot. Failures are recorded as `last_error`
//! (friendly text) and returned to the caller.

use tokio::sync::RwLock;
use tracing::instrument;

use crate::client::api::{ApiClient, ClientResult};
use crate::domain::{Challenge, ChallengePatch, CreateChallenge};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
  pub random_challenge: Option<Challenge>,
  pub challenges: Vec<Challenge>,
  pub last_error: Option<String>,
}

pub struct ChallengeView {
  api: ApiClient,
  state: RwLock<ViewState>,
}

impl ChallengeView {
  pub fn new(api: ApiClient) -> Self {
    Self { api, state: RwLock::new(ViewState::default()) }
  }

  pub async fn snapshot(&self) -> ViewState {
    self.state.read().await.clone()
  }

  /// Record the outcome: clear the error on success, keep its friendly text on failure.
  async fn settle<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
    let mut state = self.state.write().await;
    match &result {
      Ok(_) => state.last_error = None,
      Err(e) => state.last_error = Some(e.friendly()),
    }
    result
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn load_all(&self) -> ClientResult<Vec<Challenge>> {
    let all = self.settle(self.api.list_challenges().await).await?;
    self.state.write().await.challenges = all.clone();
    Ok(all)
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn load_random(&self) -> ClientResult<Challenge> {
    let picked = self.settle(self.api.random_challenge().await).await?;
    self.state.write().await.random_challenge = Some(picked.clone());
    Ok(picked)
  }

  #[instrument(level = "debug", skip(self, input), fields(title = %input.title))]
  pub async fn create_challenge(&self, input: &CreateChallenge) -> ClientResult<Challenge> {
    let created = self.settle(self.api.create_challenge(input).await).await?;
    self.state.write().await.challenges.push(created.clone());
    Ok(created)
  }

  #[instrument(level = "debug", skip(self, patch))]
  pub async fn update_challenge(&self, id: i64, patch: &ChallengePatch) -> ClientResult<Challenge> {
    let updated = self
      .settle(self.api.update_challenge(&id.to_string(), patch).await)
      .await?;
    let mut state = self.state.write().await;
    if let Some(slot) = state.challenges.iter_mut().find(|c| c.id == id) {
      *slot = updated.clone();
    }
    if state.random_challenge.as_ref().is_some_and(|c| c.id == id) {
      state.random_challenge = Some(updated.clone());
    }
    Ok(updated)
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn delete_challenge(&self, id: i64) -> ClientResult<Challenge> {
    let removed = self
      .settle(self.api.delete_challenge(&id.to_string()).await)
      .await?;
    let mut state = self.state.write().await;
    state.challenges.retain(|c| c.id != id);
    if state.random_challenge.as_ref().is_some_and(|c| c.id == id) {
      state.random_challenge = None;
    }
    Ok(removed)
  }
}
