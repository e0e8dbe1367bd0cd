use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::models::session::{
    SelectQuizRequest, SessionSnapshot, SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::services::session_engine::AnswerOutcome;
use crate::services::AppState;

/// GET /api/v1/session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let snapshot = state.session.snapshot().await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/session/select
pub async fn select_quiz(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<SelectQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quiz = state.catalog.fetch_quiz(payload.quiz_id).await?;
    let transition = state.session.select_quiz(quiz).await?;

    if !transition.accepted {
        return Err(ApiError::Conflict(format!(
            "A quiz session is already {}",
            transition.snapshot.phase.as_str()
        )));
    }

    Ok((StatusCode::CREATED, Json(transition.snapshot)))
}

/// POST /api/v1/session/answers
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, ApiError> {
    let (outcome, snapshot) = state.session.submit_answer(payload.answer).await?;

    let response = match outcome {
        AnswerOutcome::Ignored => SubmitAnswerResponse {
            accepted: false,
            correct: None,
            snapshot,
        },
        AnswerOutcome::Recorded { correct, .. } => SubmitAnswerResponse {
            accepted: true,
            correct: Some(correct),
            snapshot,
        },
    };

    Ok(Json(response))
}

/// POST /api/v1/session/return
pub async fn return_to_selection(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let transition = state.session.return_to_selection().await?;

    if !transition.accepted {
        return Err(ApiError::Conflict(format!(
            "Cannot return to selection while {}",
            transition.snapshot.phase.as_str()
        )));
    }

    Ok(Json(transition.snapshot))
}
