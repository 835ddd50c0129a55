//! HTTP routes for the job collection.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::jobs::model::JobPosting;
use crate::session::{CollectionStore, SessionId};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CollectionStore>,
}

/// Build the job CRUD router.
pub fn job_routes(store: Arc<dyn CollectionStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/jobs", get(list_jobs).post(create_job))
        .route(
            "/jobs/{id}",
            get(get_job).put(update_job).delete(delete_job),
        )
        .with_state(AppState { store })
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "job-board"
    }))
}

/// Parse a path id. Non-numeric input behaves as a failed lookup, not a 400.
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

async fn list_jobs(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Json<Vec<JobPosting>> {
    Json(state.store.list(&session).await)
}

async fn get_job(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(id): Path<String>,
) -> Result<Json<JobPosting>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .get(&session, id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn create_job(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Json(body): Json<Map<String, Value>>,
) -> impl IntoResponse {
    let created = state.store.create(&session, body).await;
    (StatusCode::CREATED, Json(created))
}

async fn update_job(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<JobPosting>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .replace(&session, id, body)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Delete responds with a one-element array containing the removed posting,
/// matching the removal primitive's "all removed elements" shape.
async fn delete_job(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(id): Path<String>,
) -> Result<Json<Vec<JobPosting>>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .remove(&session, id)
        .await
        .map(|job| Json(vec![job]))
        .ok_or(ApiError::NotFound)
}
