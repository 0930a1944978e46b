//! HTTP client for the challenge API.
//!
//! Every call has a 10 s timeout. Transient failures (connect errors,
//! timeouts, 502/503/504) are retried with linear backoff; the final failure
//! is published on the `ErrorBus` with a friendly message and returned.

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::client::events::{friendly_message, ClientEvent, ErrorBus, UNEXPECTED_RESPONSE};
use crate::domain::{Challenge, ChallengePatch, CreateChallenge};

pub const API_URL_ENV: &str = "CHALLENGE_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ClientError {
  /// Server answered with a non-success status.
  #[error("{friendly}")]
  Status { status: u16, message: String, friendly: String },
  /// No response (connect failure, timeout, ...).
  #[error("{friendly}")]
  Network { friendly: String, #[source] source: reqwest::Error },
  /// Success status, but the body did not decode.
  #[error("{friendly}")]
  Decode { status: u16, friendly: String, #[source] source: reqwest::Error },
  #[error("invalid client configuration: {0}")]
  Config(String),
}

impl ClientError {
  pub fn status(&self) -> Option<u16> {
    match self {
      ClientError::Status { status, .. } | ClientError::Decode { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// Message suitable for showing to a user.
  pub fn friendly(&self) -> String {
    self.to_string()
  }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub backoff: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_retries: 2, backoff: Duration::from_millis(200) }
  }
}

/// Server error envelope; only the message is needed here.
#[derive(Deserialize)]
struct Envelope {
  #[serde(default)]
  message: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  events: ErrorBus,
  retry: RetryPolicy,
}

fn is_transient_status(status: u16) -> bool {
  matches!(status, 502 | 503 | 504)
}

/// JSON body holding only the fields present in `patch`; cleared fields become `null`.
pub fn patch_body(patch: &ChallengePatch) -> Value {
  let mut body = Map::new();
  if let Some(title) = &patch.title { body.insert("title".into(), title.clone().into()); }
  if let Some(description) = &patch.description { body.insert("description".into(), description.clone().into()); }
  if let Some(difficulty) = &patch.difficulty {
    body.insert("difficulty".into(), difficulty.map(|d| Value::from(d.as_str())).unwrap_or(Value::Null));
  }
  if let Some(tags) = &patch.tags { body.insert("tags".into(), tags.clone().into()); }
  if let Some(category) = &patch.category {
    body.insert("category".into(), category.clone().map(Value::from).unwrap_or(Value::Null));
  }
  Value::Object(body)
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>, events: ErrorBus) -> ClientResult<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(10))
      .user_agent("challenge-picker/0.1")
      .build()
      .map_err(|e| ClientError::Config(e.to_string()))?;
    let base_url = base_url.into().trim_end_matches('/').to_string();
    Ok(Self { http, base_url, events, retry: RetryPolicy::default() })
  }

  /// Base URL from CHALLENGE_API_URL, default "http://localhost:3000".
  pub fn from_env(events: ErrorBus) -> ClientResult<Self> {
    let base_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.into());
    Self::new(base_url, events)
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub async fn list_challenges(&self) -> ClientResult<Vec<Challenge>> {
    self.call(Method::GET, "/challenge", None).await
  }

  pub async fn get_challenge(&self, id: &str) -> ClientResult<Challenge> {
    self.call(Method::GET, &format!("/challenge/{id}"), None).await
  }

  pub async fn random_challenge(&self) -> ClientResult<Challenge> {
    self.call(Method::GET, "/challenge/random", None).await
  }

  pub async fn create_challenge(&self, input: &CreateChallenge) -> ClientResult<Challenge> {
    let body = serde_json::to_value(input).map_err(|e| ClientError::Config(e.to_string()))?;
    self.call(Method::POST, "/challenge", Some(body)).await
  }

  pub async fn update_challenge(&self, id: &str, patch: &ChallengePatch) -> ClientResult<Challenge> {
    self.call(Method::PATCH, &format!("/challenge/{id}"), Some(patch_body(patch))).await
  }

  pub async fn delete_challenge(&self, id: &str) -> ClientResult<Challenge> {
    self.call(Method::DELETE, &format!("/challenge/{id}"), None).await
  }

  #[instrument(level = "debug", skip(self, body), fields(base_url = %self.base_url))]
  async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<Value>) -> ClientResult<T> {
    let url = format!("{}{}", self.base_url, path);
    let build = || {
      let req: RequestBuilder = self.http.request(method.clone(), &url).header(CONTENT_TYPE, "application/json");
      match &body {
        Some(b) => req.json(b),
        None => req,
      }
    };

    let result = match self.send_with_retry(build).await {
      Ok(res) => {
        let status = res.status().as_u16();
        res.json::<T>().await.map_err(|source| {
          warn!(target: "challenge_picker", status, error = %source, "API response did not decode");
          ClientError::Decode { status, friendly: UNEXPECTED_RESPONSE.into(), source }
        })
      }
      Err(err) => Err(err),
    };

    if let Err(err) = &result {
      self.events.publish(ClientEvent::RequestFailed {
        method: method.to_string(),
        path: path.to_string(),
        status: err.status(),
        message: err.friendly(),
      });
    }
    result
  }

  async fn send_with_retry(&self, build: impl Fn() -> RequestBuilder) -> ClientResult<Response> {
    let mut attempt = 0u32;
    loop {
      let outcome = build().send().await;
      let retryable = match &outcome {
        Ok(res) => is_transient_status(res.status().as_u16()),
        Err(e) => e.is_connect() || e.is_timeout(),
      };
      if retryable && attempt < self.retry.max_retries {
        attempt += 1;
        warn!(target: "challenge_picker", attempt, "Transient API failure; retrying");
        tokio::time::sleep(self.retry.backoff * attempt).await;
        continue;
      }

      let res = outcome.map_err(|source| ClientError::Network {
        friendly: friendly_message(None, ""),
        source,
      })?;
      if res.status().is_success() {
        return Ok(res);
      }

      let status = res.status().as_u16();
      let text = match res.text().await {
        Ok(text) => text,
        Err(e) => {
          debug!(target: "challenge_picker", status, error = %e, "Could not read error body");
          String::new()
        }
      };
      let message = serde_json::from_str::<Envelope>(&text)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(text);
      debug!(target: "challenge_picker", status, %message, "API returned an error");
      return Err(ClientError::Status { status, friendly: friendly_message(Some(status), &message), message });
    }
  }
}
