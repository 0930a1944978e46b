//! Client side of the challenge API: HTTP client, error broadcasting, and a
//! view-state mirror for UIs.

pub mod api;
pub mod events;
pub mod view;

pub use api::{ApiClient, ClientError, ClientResult, RetryPolicy};
pub use events::{ClientEvent, ErrorBus};
pub use view::{ChallengeView, ViewState};
