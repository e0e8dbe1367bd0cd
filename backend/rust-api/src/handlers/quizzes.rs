use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::AppJson;
use crate::models::{Quiz, QuizDraft, QuizSummary};
use crate::services::AppState;

/// GET /results
pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Quiz>>, ApiError> {
    let quizzes = state.catalog.list_quizzes().await?;
    Ok(Json(quizzes))
}

/// GET /results/{id}
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Quiz>, ApiError> {
    let quiz = state.catalog.fetch_quiz(id).await?;
    Ok(Json(quiz))
}

/// POST /results
pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    AppJson(draft): AppJson<QuizDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let quiz = state.catalog.create_quiz(draft).await?;
    tracing::info!("Quiz created: id={}, title={}", quiz.id, quiz.title);
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// PUT /results/{id}
pub async fn update_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    AppJson(draft): AppJson<QuizDraft>,
) -> Result<Json<Quiz>, ApiError> {
    let quiz = state.catalog.update_quiz(id, draft).await?;
    tracing::info!("Quiz updated: id={}", quiz.id);
    Ok(Json(quiz))
}

/// GET /api/v1/quizzes - cards for the selection screen
pub async fn list_summaries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<QuizSummary>>, ApiError> {
    let summaries = state.catalog.list_summaries().await?;
    Ok(Json(summaries))
}
