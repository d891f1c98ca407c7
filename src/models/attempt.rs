// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::models::question::{Difficulty, PublicQuestion, QuestionOption};

/// Attempt lifecycle. `Created` accepts exactly one submission and then the
/// attempt is terminally `Submitted`; there is no other transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttemptStatus {
    Created,
    Submitted,
}

/// Represents the 'quiz_attempts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub user_id: i64,

    /// The criteria the attempt was started with.
    pub school: String,
    pub matiere: String,

    /// What the caller asked for; `total_count` is what the pool yielded.
    pub requested_count: i64,
    pub total_count: i64,

    pub status: AttemptStatus,

    /// Score fields, set once at submission.
    pub correct_count: Option<i64>,
    pub percentage: Option<i64>,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// One row of the frozen question snapshot ('attempt_questions' table).
///
/// Captured at start time; grading and the review view read this, never the
/// live bank, so later edits to a question cannot shift past results.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptQuestion {
    pub attempt_id: i64,
    pub position: i64,
    pub question_id: i64,
    pub stem: String,
    pub options: Json<Vec<QuestionOption>>,
    pub correct_option: i64,
    pub difficulty: Difficulty,
}

impl From<AttemptQuestion> for PublicQuestion {
    fn from(q: AttemptQuestion) -> Self {
        PublicQuestion {
            id: q.question_id,
            stem: q.stem,
            options: q.options,
            difficulty: q.difficulty,
        }
    }
}

/// Represents the 'quiz_answers' table: one row per snapshot question,
/// written together in the submit transaction and never updated after.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizAnswer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub selected_option: Option<i64>,
    pub is_correct: bool,
}

/// DTO for starting a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct StartQuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub school: String,
    #[validate(length(min = 1, max = 100))]
    pub matiere: String,
    /// Bounds-checked against the configured min/max by the sampler.
    pub count: Option<i64>,
}

/// DTO for submitting answers. May be incomplete; unanswered questions in
/// the snapshot score as incorrect.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerInput {
    pub question_id: i64,
    pub selected_option: Option<i64>,
}

/// Response to a start request. An empty pool yields `attempt_id: None`
/// with zero questions; a short pool yields `returned < requested`.
#[derive(Debug, Serialize)]
pub struct StartQuizResponse {
    pub attempt_id: Option<i64>,
    pub requested: i64,
    pub returned: i64,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub correct: i64,
    pub total: i64,
    pub percentage: i64,
}

/// Per-question grading outcome, exposed only after submission.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerBreakdown {
    pub question_id: i64,
    pub selected_option: Option<i64>,
    pub correct_option: i64,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub attempt_id: i64,
    pub score: ScoreSummary,
    pub breakdown: Vec<AnswerBreakdown>,
}

/// Full attempt view for the owner. Before submission the breakdown (and
/// with it the answer key) is absent.
#[derive(Debug, Serialize)]
pub struct AttemptDetail {
    pub id: i64,
    pub school: String,
    pub matiere: String,
    pub status: AttemptStatus,
    pub requested_count: i64,
    pub total_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Seconds between start and submission, once submitted.
    pub duration_seconds: Option<i64>,
    pub questions: Vec<PublicQuestion>,
    pub score: Option<ScoreSummary>,
    pub breakdown: Option<Vec<AnswerBreakdown>>,
}
