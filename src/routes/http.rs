//! HTTP endpoint handlers. These are thin wrappers that validate the body,
//! forward to the challenge service, and project failures into the envelope.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::domain::Challenge;
use crate::error::{ApiError, ApiFailure, RequestMeta};
use crate::state::AppState;
use crate::validation::{parse_create, parse_patch};

type HandlerResult<T> = Result<T, ApiFailure>;

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_create_challenge(
    meta: RequestMeta,
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> HandlerResult<(StatusCode, Json<Challenge>)> {
    let Json(body) = body.map_err(|e| meta.fail(e))?;
    let input = parse_create(&body).map_err(|errors| meta.fail(ApiError::validation(errors)))?;
    let created = state.challenges.create(input).await.map_err(|e| meta.fail(e))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_challenges(
    meta: RequestMeta,
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Json<Vec<Challenge>>> {
    let all = state.challenges.get_all().await.map_err(|e| meta.fail(e))?;
    info!(target: "challenge", count = all.len(), "HTTP challenge list served");
    Ok(Json(all))
}

#[instrument(level = "info", skip(state))]
pub async fn http_random_challenge(
    meta: RequestMeta,
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Json<Challenge>> {
    let ch = state.challenges.get_random().await.map_err(|e| meta.fail(e))?;
    info!(target: "challenge", id = ch.id, "HTTP random challenge served");
    Ok(Json(ch))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge(
    meta: RequestMeta,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult<Json<Challenge>> {
    let ch = state.challenges.get_by_id(&id).await.map_err(|e| meta.fail(e))?;
    Ok(Json(ch))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_update_challenge(
    meta: RequestMeta,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> HandlerResult<Json<Challenge>> {
    let Json(body) = body.map_err(|e| meta.fail(e))?;
    let patch = parse_patch(&body).map_err(|errors| meta.fail(ApiError::validation(errors)))?;
    let updated = state.challenges.update(&id, patch).await.map_err(|e| meta.fail(e))?;
    Ok(Json(updated))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_challenge(
    meta: RequestMeta,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult<Json<Challenge>> {
    let removed = state.challenges.delete(&id).await.map_err(|e| meta.fail(e))?;
    Ok(Json(removed))
}

/// Unknown route: same envelope as every other failure.
pub async fn http_fallback(meta: RequestMeta) -> ApiFailure {
    let message = format!("Cannot {} {}", meta.method, meta.path);
    meta.fail(ApiError::not_found(message))
}
