//! HTTP request handlers

use super::types::{AskErrorResponse, AskRequest, AskResponse, FeedbackResponse, ResetResponse};
use super::AppState;
use crate::interview::TurnError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::services::ServeDir;

/// Generic reply for failed turns; details stay in the server log
pub const ASK_FAILURE_REPLY: &str = "Error processing your request.";

pub const RESET_CONFIRMATION: &str = "Interview reset successfully.";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/ask", post(ask))
        .route("/feedback", get(feedback))
        .route("/reset", post(reset))
        .route("/version", get(get_version))
        // Frontend assets for everything else
        .fallback_service(static_files)
        .with_state(state)
}

// ============================================================
// Turns
// ============================================================

/// A missing, non-JSON or mistyped body is treated as an absent message.
async fn ask(
    State(state): State<AppState>,
    body: Option<Json<AskRequest>>,
) -> Result<Json<AskResponse>, AppError> {
    let request = body.map(|Json(req)| req).unwrap_or_default();

    let outcome = state
        .interview
        .handle_turn(request.message.as_deref())
        .await?;

    Ok(Json(AskResponse {
        reply: outcome.reply().to_string(),
        history: outcome.history().to_vec(),
    }))
}

async fn feedback(State(state): State<AppState>) -> Json<FeedbackResponse> {
    Json(FeedbackResponse {
        history: state.interview.feedback(),
    })
}

async fn reset(State(state): State<AppState>) -> Json<ResetResponse> {
    state.interview.reset().await;
    Json(ResetResponse {
        message: RESET_CONFIRMATION.to_string(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("interview-agent ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    Turn(TurnError),
}

impl From<TurnError> for AppError {
    fn from(err: TurnError) -> Self {
        AppError::Turn(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Turn(e) => {
                tracing::error!(error = %e, "Ask failed");
                let body = Json(AskErrorResponse {
                    reply: ASK_FAILURE_REPLY.to_string(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
