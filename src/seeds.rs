//! Seed data: built-in challenges and the config bank, inserted at startup
//! only when the store holds nothing yet.

use tracing::{info, instrument, warn};

use crate::config::{AppConfig, SeedChallengeCfg};
use crate::domain::{CreateChallenge, Difficulty};
use crate::error::ServiceResult;
use crate::service::ChallengeService;

/// Small set of classic exercises so a fresh install has something to pick.
pub fn builtin_challenges() -> Vec<CreateChallenge> {
  vec![
    CreateChallenge {
      title: "Two Sum".into(),
      description: Some("Return the indices of the two numbers that add up to the target.".into()),
      difficulty: Some(Difficulty::Easy),
      tags: Some(vec!["array".into(), "hash-map".into()]),
      category: Some("arrays".into()),
    },
    CreateChallenge {
      title: "Valid Parentheses".into(),
      description: Some("Decide whether every bracket in the string is closed in the right order.".into()),
      difficulty: Some(Difficulty::Easy),
      tags: Some(vec!["stack".into(), "string".into()]),
      category: Some("strings".into()),
    },
    CreateChallenge {
      title: "LRU Cache".into(),
      description: Some("Design a fixed-capacity cache that evicts the least recently used key.".into()),
      difficulty: Some(Difficulty::Medium),
      tags: Some(vec!["design".into(), "linked-list".into()]),
      category: Some("design".into()),
    },
    CreateChallenge {
      title: "Median of Two Sorted Arrays".into(),
      description: Some("Find the median of two sorted arrays in logarithmic time.".into()),
      difficulty: Some(Difficulty::Hard),
      tags: Some(vec!["binary-search".into()]),
      category: Some("arrays".into()),
    },
  ]
}

impl From<SeedChallengeCfg> for CreateChallenge {
  fn from(cfg: SeedChallengeCfg) -> Self {
    Self {
      title: cfg.title,
      description: cfg.description,
      difficulty: cfg.difficulty,
      tags: cfg.tags,
      category: cfg.category,
    }
  }
}

/// Insert the config bank (and built-ins when enabled) into an empty store.
/// Returns how many challenges were inserted. Entries with an empty title are skipped.
#[instrument(level = "info", skip_all)]
pub async fn seed_if_empty(service: &ChallengeService, cfg: &AppConfig) -> ServiceResult<usize> {
  let existing = service.get_all().await?.len();
  if existing > 0 {
    info!(target: "challenge", existing, "Store already populated; skipping seeds");
    return Ok(0);
  }

  let mut pending: Vec<CreateChallenge> = cfg.challenges.iter().cloned().map(Into::into).collect();
  if cfg.seed_builtin {
    pending.extend(builtin_challenges());
  }

  let mut inserted = 0;
  for input in pending {
    if input.title.is_empty() {
      warn!(target: "challenge", "Skipping bank item: missing title.");
      continue;
    }
    service.create(input).await?;
    inserted += 1;
  }
  info!(target: "challenge", inserted, "Startup challenge inventory");
  Ok(inserted)
}
