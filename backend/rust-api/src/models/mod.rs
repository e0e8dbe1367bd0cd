use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::utils::time::format_clock;

pub mod session;
pub mod timer;

/// Quiz record as stored in the `results` array of the catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Quiz {
    pub id: i64,
    #[validate(length(min = 1, message = "Quiz title must not be empty"))]
    pub title: String,
    #[serde(default)]
    #[validate(nested)]
    pub questions: Vec<Question>,
    /// Total duration in seconds. Absent or zero means untimed.
    #[serde(
        default,
        deserialize_with = "deserialize_timer",
        skip_serializing_if = "Option::is_none"
    )]
    pub timer: Option<u32>,
}

impl Quiz {
    /// Countdown length for a session, `None` for untimed quizzes.
    pub fn duration_seconds(&self) -> Option<u32> {
        self.timer.filter(|seconds| *seconds > 0)
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_answer_sets"))]
pub struct Question {
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub difficulty: String,
    #[validate(length(min = 1, message = "Question prompt must not be empty"))]
    pub question: String,
    #[validate(length(min = 1, message = "At least one correct answer is required"))]
    pub correct_answer: Vec<String>,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Question {
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer.iter().any(|candidate| candidate == answer)
    }
}

fn validate_answer_sets(question: &Question) -> Result<(), ValidationError> {
    if question
        .correct_answer
        .iter()
        .any(|answer| answer.trim().is_empty())
    {
        let mut err = ValidationError::new("blank_correct_answer");
        err.message = Some("Correct answers must not be blank".into());
        return Err(err);
    }

    if let Some(shared) = question
        .correct_answer
        .iter()
        .find(|answer| question.incorrect_answers.contains(answer))
    {
        let mut err = ValidationError::new("overlapping_answers");
        err.message = Some(format!("'{}' is listed as both correct and incorrect", shared).into());
        return Err(err);
    }

    Ok(())
}

/// Body of a create/update request coming from the quiz editor.
///
/// The editor computes the next id itself, but the id stays optional so
/// clients can let the store assign one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDraft {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(
        default,
        deserialize_with = "deserialize_timer",
        skip_serializing_if = "Option::is_none"
    )]
    pub timer: Option<u32>,
}

impl QuizDraft {
    pub fn into_quiz(self, id: i64) -> Quiz {
        Quiz {
            id,
            title: self.title,
            questions: self.questions,
            timer: self.timer,
        }
    }
}

impl From<Quiz> for QuizDraft {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: Some(quiz.id),
            title: quiz.title,
            questions: quiz.questions,
            timer: quiz.timer,
        }
    }
}

/// Card shown on the quiz selection screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub question_count: usize,
    pub total_marks: usize,
    pub timer_seconds: u32,
    pub time_limit: String,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        let timer_seconds = quiz.timer.unwrap_or(0);
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            question_count: quiz.question_count(),
            total_marks: quiz.question_count(),
            timer_seconds,
            time_limit: format_clock(timer_seconds),
        }
    }
}

/// Accepts `90` as well as `"90"`; anything else (negative numbers included)
/// is read as "no timer".
fn deserialize_timer<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|seconds| u32::try_from(seconds).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }))
}
