//! Loading server configuration from TOML plus environment overrides.
//!
//! See `AppConfig` for the expected schema. Env variables win over the file:
//!   PORT, DATABASE_PATH, CORS_ORIGINS (comma separated), STATIC_DIR

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::Difficulty;

pub const CONFIG_PATH_ENV: &str = "CHALLENGE_CONFIG_PATH";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub bind: IpAddr,
  pub port: u16,
  /// SQLite file; the in-memory store is used when absent.
  pub database_path: Option<PathBuf>,
  pub cors_origins: Vec<String>,
  /// Built frontend served as SPA fallback.
  pub static_dir: Option<PathBuf>,
  /// Insert the built-in seed challenges when the store starts empty.
  pub seed_builtin: bool,
  pub challenges: Vec<SeedChallengeCfg>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
      port: 3000,
      database_path: None,
      cors_origins: vec!["http://localhost:5173".into(), "http://localhost:4173".into()],
      static_dir: None,
      seed_builtin: false,
      challenges: Vec::new(),
    }
  }
}

impl AppConfig {
  pub fn socket_addr(&self) -> SocketAddr {
    SocketAddr::new(self.bind, self.port)
  }

  /// Apply env overrides on top of whatever the file provided.
  fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(p) = lookup("PORT") {
      match p.parse::<u16>() {
        Ok(port) => self.port = port,
        Err(e) => warn!(target: "challenge_picker", value = %p, error = %e, "Ignoring invalid PORT"),
      }
    }
    if let Some(path) = lookup("DATABASE_PATH").filter(|s| !s.is_empty()) {
      self.database_path = Some(PathBuf::from(path));
    }
    if let Some(origins) = lookup("CORS_ORIGINS") {
      self.cors_origins = origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    }
    if let Some(dir) = lookup("STATIC_DIR").filter(|s| !s.is_empty()) {
      self.static_dir = Some(PathBuf::from(dir));
    }
    self
  }
}

/// Challenge bank entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SeedChallengeCfg {
  pub title: String,
  #[serde(default)] pub description: Option<String>,
  #[serde(default)] pub difficulty: Option<Difficulty>,
  #[serde(default)] pub tags: Option<Vec<String>>,
  #[serde(default)] pub category: Option<String>,
}

/// Parse a TOML document into `AppConfig`.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Load from CHALLENGE_CONFIG_PATH (if set) then apply env overrides.
/// On any parsing/IO error the file is ignored and defaults are used.
pub fn load_config_from_env() -> AppConfig {
  let base = match std::env::var(CONFIG_PATH_ENV).ok() {
    Some(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse_config(&s) {
        Ok(cfg) => {
          info!(target: "challenge_picker", %path, "Loaded config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "challenge_picker", %path, error = %e, "Failed to parse TOML config");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "challenge_picker", %path, error = %e, "Failed to read TOML config file");
        AppConfig::default()
      }
    },
    None => AppConfig::default(),
  };
  base.apply_env(|key| std::env::var(key).ok())
}
