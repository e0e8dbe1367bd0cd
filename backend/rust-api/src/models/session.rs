use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Selecting,
    InProgress,
    Completed,
    TimedOut,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::TimedOut)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Selecting => "selecting",
            SessionPhase::InProgress => "in_progress",
            SessionPhase::Completed => "completed",
            SessionPhase::TimedOut => "timed_out",
        }
    }
}

/// Read-only projection of the session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub active: bool,
    pub quiz_id: Option<i64>,
    pub title: Option<String>,
    pub question_count: usize,
    /// `None` while selecting.
    pub current_index: Option<usize>,
    /// `None` for untimed quizzes or before a quiz is selected.
    pub remaining_seconds: Option<u32>,
    pub remaining_clock: Option<String>,
    pub score: u32,
    /// Display order of the current question's answers, only while in
    /// progress. These are the stored strings, to be sent back verbatim.
    pub answers: Option<Vec<String>>,
    /// `answers` with HTML entities decoded, same order.
    pub answer_labels: Option<Vec<String>>,
    pub question: Option<QuestionView>,
}

/// Display-only fields of the question on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub number: usize,
    /// Entity-decoded question text.
    pub prompt: String,
    pub category: String,
    pub difficulty: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectQuizRequest {
    pub quiz_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    pub snapshot: SessionSnapshot,
}
