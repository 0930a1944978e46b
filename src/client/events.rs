//! Publish/subscribe channel for client-side request failures.
//!
//! The composition root owns one `ErrorBus` and hands clones to every
//! `ApiClient`; UI code subscribes to show the friendly message.

use tokio::sync::broadcast;

/// Something a subscriber may want to show the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
  RequestFailed {
    method: String,
    path: String,
    /// HTTP status, or `None` when no response arrived.
    status: Option<u16>,
    message: String,
  },
}

#[derive(Clone)]
pub struct ErrorBus {
  tx: broadcast::Sender<ClientEvent>,
}

impl ErrorBus {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
    self.tx.subscribe()
  }

  /// Publishing with no subscribers is fine; the event is dropped.
  pub fn publish(&self, event: ClientEvent) {
    let _ = self.tx.send(event);
  }
}

impl Default for ErrorBus {
  fn default() -> Self {
    Self::new(64)
  }
}

/// Shown when a successful response carries a body the client cannot read.
pub const UNEXPECTED_RESPONSE: &str = "Unexpected response from server - Please try again later.";

/// Friendly text for a failed request, keyed on the response status.
pub fn friendly_message(status: Option<u16>, detail: &str) -> String {
  match status {
    Some(401) => "Request failed - Please try again.".into(),
    Some(403) => "Access denied.".into(),
    Some(404) => "Resource not found.".into(),
    Some(500) => "Server error - Please try again later.".into(),
    Some(_) => format!("Error: {detail}"),
    None => "Network error - Please check your connection.".into(),
  }
}
