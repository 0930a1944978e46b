//! Challenge Picker · backend and client library
//!
//! Create, list, update, delete and randomly pick coding challenges.
//! `service` holds the core contract; `routes` exposes it over HTTP and
//! `client` consumes that HTTP surface.

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod routes;
pub mod seeds;
pub mod service;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod validation;

pub use domain::{Challenge, ChallengePatch, CreateChallenge, Difficulty};
pub use error::{ServiceError, StoreError};
pub use routes::build_router;
pub use service::ChallengeService;
pub use state::AppState;
