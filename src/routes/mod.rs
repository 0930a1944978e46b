//! Router assembly: challenge endpoints, CORS, HTTP tracing, and the fallback.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use crate::config::AppConfig;
use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - `/challenge` CRUD + `/challenge/random`
/// - `/health`
/// - CORS restricted to the configured origins, credentials allowed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
/// - Static SPA from `static_dir` when configured, JSON 404 envelope otherwise
pub fn build_router(state: Arc<AppState>, cfg: &AppConfig) -> Router {
    let router = Router::new()
        .route("/health", get(http::http_health))
        .route(
            "/challenge",
            get(http::http_list_challenges).post(http::http_create_challenge),
        )
        .route("/challenge/random", get(http::http_random_challenge))
        .route(
            "/challenge/:id",
            get(http::http_get_challenge)
                .patch(http::http_update_challenge)
                .delete(http::http_delete_challenge),
        );

    let router = match &cfg.static_dir {
        Some(dir) => {
            let static_service = ServeDir::new(dir)
                .append_index_html_on_directories(true)
                .not_found_service(ServeFile::new(dir.join("index.html")));
            router.fallback_service(static_service)
        }
        None => router.fallback(http::http_fallback),
    };

    router
        // State + HTTP tracing + CORS
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors_layer(&cfg.cors_origins)),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(target: "challenge_picker", origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
