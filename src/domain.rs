//! Domain models: the challenge record, its difficulty, and the create/patch inputs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of difficulties a challenge may carry.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Difficulty {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Difficulty::ALL
      .into_iter()
      .find(|d| d.as_str() == s)
      .ok_or_else(|| format!("unknown difficulty: {s}"))
  }
}

/// A persisted challenge. `id` and both timestamps are owned by the store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
  pub id: i64,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub difficulty: Option<Difficulty>,
  #[serde(default)] pub tags: Vec<String>,
  #[serde(default)] pub category: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Validated creation input as received from a caller; defaults not yet applied.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateChallenge {
  pub title: String,
  #[serde(default)] pub description: Option<String>,
  #[serde(default)] pub difficulty: Option<Difficulty>,
  #[serde(default)] pub tags: Option<Vec<String>>,
  #[serde(default)] pub category: Option<String>,
}

/// Row to insert, with creation defaults applied. The store assigns id and timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct NewChallenge {
  pub title: String,
  pub description: String,
  pub difficulty: Option<Difficulty>,
  pub tags: Vec<String>,
  pub category: Option<String>,
}

impl From<CreateChallenge> for NewChallenge {
  fn from(input: CreateChallenge) -> Self {
    Self {
      title: input.title,
      description: input.description.unwrap_or_default(),
      difficulty: input.difficulty,
      tags: input.tags.unwrap_or_default(),
      category: input.category,
    }
  }
}

/// Partial update. `None` leaves a field untouched; for the nullable fields
/// `Some(None)` clears the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChallengePatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub difficulty: Option<Option<Difficulty>>,
  pub tags: Option<Vec<String>>,
  pub category: Option<Option<String>>,
}

impl ChallengePatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.difficulty.is_none()
      && self.tags.is_none()
      && self.category.is_none()
  }

  /// Names of the fields this patch touches, in declaration order.
  pub fn field_names(&self) -> Vec<&'static str> {
    let mut names = Vec::new();
    if self.title.is_some() { names.push("title"); }
    if self.description.is_some() { names.push("description"); }
    if self.difficulty.is_some() { names.push("difficulty"); }
    if self.tags.is_some() { names.push("tags"); }
    if self.category.is_some() { names.push("category"); }
    names
  }

  /// Copy present fields onto `target`. Timestamps are left to the store.
  pub fn apply_to(&self, target: &mut Challenge) {
    if let Some(title) = &self.title { target.title = title.clone(); }
    if let Some(description) = &self.description { target.description = description.clone(); }
    if let Some(difficulty) = self.difficulty { target.difficulty = difficulty; }
    if let Some(tags) = &self.tags { target.tags = tags.clone(); }
    if let Some(category) = &self.category { target.category = category.clone(); }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Challenge {
    let now = Utc::now();
    Challenge {
      id: 7,
      title: "Two Sum".into(),
      description: "Find indices".into(),
      difficulty: Some(Difficulty::Easy),
      tags: vec!["array".into(), "hash-map".into()],
      category: Some("arrays".into()),
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn difficulty_parses_only_the_closed_set() {
    assert_eq!("medium".parse::<Difficulty>(), Ok(Difficulty::Medium));
    assert!("Medium".parse::<Difficulty>().is_err());
    assert!("extreme".parse::<Difficulty>().is_err());
  }

  #[test]
  fn create_defaults_description_and_tags() {
    let row = NewChallenge::from(CreateChallenge { title: "Reverse".into(), ..Default::default() });
    assert_eq!(row.description, "");
    assert!(row.tags.is_empty());
    assert_eq!(row.difficulty, None);
  }

  #[test]
  fn patch_touches_only_present_fields() {
    let before = sample();
    let mut after = before.clone();
    ChallengePatch { title: Some("X".into()), ..Default::default() }.apply_to(&mut after);

    assert_eq!(after.title, "X");
    assert_eq!(after.description, before.description);
    assert_eq!(after.difficulty, before.difficulty);
    assert_eq!(after.tags, before.tags);
    assert_eq!(after.category, before.category);
  }

  #[test]
  fn patch_can_clear_nullable_fields() {
    let mut ch = sample();
    let patch = ChallengePatch { difficulty: Some(None), category: Some(None), ..Default::default() };
    assert_eq!(patch.field_names(), vec!["difficulty", "category"]);
    patch.apply_to(&mut ch);
    assert_eq!(ch.difficulty, None);
    assert_eq!(ch.category, None);
  }

  #[test]
  fn challenge_serializes_camel_case_timestamps() {
    let v = serde_json::to_value(sample()).unwrap();
    assert!(v.get("createdAt").is_some());
    assert!(v.get("updatedAt").is_some());
    assert_eq!(v["difficulty"], "easy");
  }
}
