//! Challenge Picker · HTTP backend
//!
//! - Axum REST API over a challenge table (in-memory or SQLite)
//! - Optional static SPA fallback
//!
//! Important env variables:
//!   PORT                  : u16 (default 3000)
//!   DATABASE_PATH         : SQLite file; in-memory store when unset
//!   CORS_ORIGINS          : comma-separated allowed origins
//!   STATIC_DIR            : built frontend to serve as fallback
//!   CHALLENGE_CONFIG_PATH : path to TOML config (server options + challenge bank)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use challenge_picker::config::load_config_from_env;
use challenge_picker::seeds::seed_if_empty;
use challenge_picker::{build_router, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = load_config_from_env();

  // Shared state: store selected from config, service on top.
  let state = AppState::from_config(&cfg).map_err(|e| {
    error!(target: "challenge_picker", error = %e, "Error starting server");
    e
  })?;
  seed_if_empty(&state.challenges, &cfg).await?;

  let app = build_router(Arc::new(state), &cfg);

  let addr = cfg.socket_addr();
  let listener = TcpListener::bind(addr).await?;
  info!(target: "challenge_picker", %addr, "Application is running");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "challenge_picker", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      error!(target: "challenge_picker", error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        error!(target: "challenge_picker", error = %e, "Failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!(target: "challenge_picker", "Shutdown signal received");
}
