use async_trait::async_trait;
use validator::Validate;

use crate::models::{Quiz, QuizDraft, QuizSummary};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Quiz not found: {0}")]
    NotFound(i64),
    #[error("Quiz {0} already exists")]
    Conflict(i64),
    #[error("Invalid quiz: {0}")]
    Invalid(String),
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    /// Only storage/transport faults are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Unavailable(_))
    }
}

/// Access to stored quiz definitions.
///
/// Learners only ever read through this; create/update exist for the editor.
#[async_trait]
pub trait QuizCatalog: Send + Sync {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, CatalogError>;

    async fn fetch_quiz(&self, id: i64) -> Result<Quiz, CatalogError>;

    async fn create_quiz(&self, draft: QuizDraft) -> Result<Quiz, CatalogError>;

    async fn update_quiz(&self, id: i64, draft: QuizDraft) -> Result<Quiz, CatalogError>;

    async fn list_summaries(&self) -> Result<Vec<QuizSummary>, CatalogError> {
        let quizzes = self.list_quizzes().await?;
        Ok(quizzes.iter().map(QuizSummary::from).collect())
    }
}

pub fn validate_quiz(quiz: &Quiz) -> Result<(), CatalogError> {
    quiz.validate()
        .map_err(|e| CatalogError::Invalid(e.to_string().replace('\n', "; ")))
}

/// Id the editor would pick for a new quiz: one past the highest in use.
pub fn next_quiz_id(quizzes: &[Quiz]) -> i64 {
    quizzes.iter().map(|quiz| quiz.id).max().unwrap_or(0) + 1
}
