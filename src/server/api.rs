// src/server/api.rs

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::error;

use crate::build::{BuildOrchestrator, BuildRequest, validate_project_id};
use crate::errors::BuildRunnerError;
use crate::types::{JobState, Platform};

// ── Shared application state ──────────────────────────────────────────

#[derive(Debug)]
pub struct AppState {
    pub orchestrator: BuildOrchestrator,
}

pub type SharedState = Arc<AppState>;

// ── Response payload types ────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: JobState,
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<BuildRunnerError> for ApiError {
    fn from(err: BuildRunnerError) -> Self {
        let msg = err.to_string();
        match err {
            BuildRunnerError::InvalidPlatform(_) | BuildRunnerError::InvalidField { .. } => {
                ApiError::BadRequest(msg)
            }
            BuildRunnerError::UnsupportedPlatform(_) => ApiError::Unprocessable(msg),
            BuildRunnerError::AlreadyRunning(_) => ApiError::Conflict(msg),
            other => {
                error!(error = %other, "request failed");
                ApiError::Internal(msg)
            }
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/build/{platform}", post(trigger_build))
        .route("/logs/{project_id}", get(get_logs))
        .route("/status/{project_id}", get(get_status))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn trigger_build(
    State(state): State<SharedState>,
    Path(platform): Path<String>,
    Json(body): Json<BuildRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let platform: Platform = platform.parse()?;
    let project = body.project_id().to_string();

    state.orchestrator.submit(platform, body)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: format!("Build for project {project} ({platform}) started"),
        }),
    ))
}

async fn get_logs(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Result<Json<LogsResponse>, ApiError> {
    validate_project_id(&project_id)?;

    match state.orchestrator.logs().read(&project_id).await? {
        Some(logs) => Ok(Json(LogsResponse { logs })),
        None => Err(ApiError::NotFound(
            "No logs available for this project.".to_string(),
        )),
    }
}

async fn get_status(
    State(state): State<SharedState>,
    Path(project_id): Path<String>,
) -> Json<StatusResponse> {
    let status = state.orchestrator.registry().get(&project_id);
    Json(StatusResponse { status })
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
