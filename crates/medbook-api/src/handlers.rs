//! Route handler functions for all API endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medbook_core::{Doctor, UserId};
use medbook_dialog::TurnReply;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<Doctor>,
}

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionInfo>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurgeResponse {
    pub purged: usize,
}

// =============================================================================
// Public endpoints
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.service.registry().len(),
    })
}

/// GET /doctors - the directory in listing order.
pub async fn doctors(State(state): State<AppState>) -> Json<DoctorsResponse> {
    Json(DoctorsResponse {
        doctors: state.directory.iter().cloned().collect(),
    })
}

// =============================================================================
// Chat
// =============================================================================

/// POST /chat - run one utterance through the dialog.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<TurnReply>, ApiError> {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    }

    let reply = state
        .service
        .handle_message(&UserId::from(user_id), &body.text)
        .await?;
    Ok(Json(reply))
}

// =============================================================================
// Sessions
// =============================================================================

/// GET /sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    let sessions: Vec<SessionInfo> = state
        .service
        .registry()
        .summaries()
        .into_iter()
        .map(|s| SessionInfo {
            user_id: s.user_id.to_string(),
            created_at: DateTime::from_timestamp(s.created_at, 0),
            last_active: DateTime::from_timestamp(s.last_active, 0),
        })
        .collect();
    let total = sessions.len();
    Json(SessionsResponse { sessions, total })
}

/// DELETE /sessions/{user_id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.service.registry().remove(&UserId::from(user_id.as_str()))?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No session for user {}", user_id)))
    }
}

/// POST /sessions/purge - drop sessions idle past the configured TTL.
pub async fn purge_sessions(
    State(state): State<AppState>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let purged = state.service.registry().purge_expired()?;
    Ok(Json(PurgeResponse { purged }))
}
