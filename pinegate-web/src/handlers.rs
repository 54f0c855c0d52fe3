//! HTTP request handlers
//!
//! Thin marshaling between JSON requests and the access-control facade.
//! Remote failures surface as an `errorMessage` payload with a 500, bad
//! caller input as a 400; per-record outcomes ride on the records
//! themselves.

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use pinegate_core::{ExtensionDirective, PinegateError, SessionState};
use serde::{Deserialize, Serialize};

/// Generic failure payload, one message for every remote fault
const GENERIC_FAILURE: &str = "Unknown Exception Occurred";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    version: String,
    session: SessionState,
}

/// Batch request body for the access routes
#[derive(Deserialize)]
pub struct AccessBatchRequest {
    pub pine_ids: Vec<String>,
    /// Extension directive token, e.g. "3M" or "L"; POST only
    pub duration: Option<String>,
}

/// Failure payload shape shared by every route
#[derive(Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

fn failure_response(error: PinegateError) -> Response {
    error.log();
    match error {
        PinegateError::Validation { ref message, .. } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error_message: message.clone(),
            }),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error_message: GENERIC_FAILURE.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session: state.access.session_state().await,
    })
}

/// Check a username against the platform directory
pub async fn validate_username(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match state.access.validate_identity(&username).await {
        Ok(check) => Json(check).into_response(),
        Err(e) => failure_response(e),
    }
}

/// Resolve the current access state for a batch of scripts
pub async fn get_access(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AccessBatchRequest>,
) -> Response {
    let records = state.access.resolve_records(&username, &request.pine_ids).await;
    Json(records).into_response()
}

/// Grant or extend access for a batch of scripts
pub async fn grant_access(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AccessBatchRequest>,
) -> Response {
    let token = request.duration.unwrap_or_default();
    let directive = match ExtensionDirective::parse(&token) {
        Ok(directive) => directive,
        Err(e) => return failure_response(e),
    };

    let records = state.access.resolve_records(&username, &request.pine_ids).await;
    let results = state.access.apply_extension(records, directive).await;
    Json(results).into_response()
}

/// Revoke access for a batch of scripts
pub async fn revoke_access(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AccessBatchRequest>,
) -> Response {
    let records = state.access.resolve_records(&username, &request.pine_ids).await;
    let results = state.access.revoke_all(records).await;
    Json(results).into_response()
}
