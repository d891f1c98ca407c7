// src/store/attempts.rs

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptQuestion, QuizAnswer, QuizAttempt},
        question::Question,
    },
    quiz::scorer::ScoreReport,
};

const ATTEMPT_COLUMNS: &str = "id, user_id, school, matiere, requested_count, total_count, \
     status, correct_count, percentage, created_at, submitted_at";

/// Inserts a `created` attempt together with its frozen question snapshot,
/// in one transaction. Returns the new attempt id.
///
/// The snapshot copies stem, options, answer key and difficulty so that
/// later bank edits or deletions cannot change what this attempt is graded
/// against.
pub async fn create_with_snapshot(
    pool: &SqlitePool,
    user_id: i64,
    school: &str,
    matiere: &str,
    requested_count: i64,
    questions: &[Question],
) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO quiz_attempts \
         (user_id, school, matiere, requested_count, total_count, status, created_at) \
         VALUES (?, ?, ?, ?, ?, 'created', ?)",
    )
    .bind(user_id)
    .bind(school)
    .bind(matiere)
    .bind(requested_count)
    .bind(questions.len() as i64)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create attempt: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let attempt_id = result.last_insert_rowid();

    for (idx, question) in questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO attempt_questions \
             (attempt_id, position, question_id, stem, options, correct_option, difficulty) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(attempt_id)
        .bind((idx + 1) as i64)
        .bind(question.id)
        .bind(&question.stem)
        .bind(&question.options)
        .bind(question.correct_option)
        .bind(question.difficulty)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to snapshot question {}: {:?}", question.id, e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    tx.commit().await?;

    Ok(attempt_id)
}

/// Loads an attempt scoped to its owner. Absent and foreign-owned ids both
/// come back as `None`; callers map that to NotFound.
pub async fn find_for_user(
    pool: &SqlitePool,
    attempt_id: i64,
    user_id: i64,
) -> Result<Option<QuizAttempt>, AppError> {
    let sql = format!(
        "SELECT {} FROM quiz_attempts WHERE id = ? AND user_id = ?",
        ATTEMPT_COLUMNS
    );

    let attempt = sqlx::query_as::<_, QuizAttempt>(&sql)
        .bind(attempt_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(attempt)
}

/// The attempt's frozen questions, in the order they were served.
pub async fn snapshot(pool: &SqlitePool, attempt_id: i64) -> Result<Vec<AttemptQuestion>, AppError> {
    let questions = sqlx::query_as::<_, AttemptQuestion>(
        "SELECT attempt_id, position, question_id, stem, options, correct_option, difficulty \
         FROM attempt_questions WHERE attempt_id = ? ORDER BY position",
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

/// The graded answer rows of a submitted attempt.
pub async fn answers(pool: &SqlitePool, attempt_id: i64) -> Result<Vec<QuizAnswer>, AppError> {
    let answers = sqlx::query_as::<_, QuizAnswer>(
        "SELECT id, attempt_id, question_id, selected_option, is_correct \
         FROM quiz_answers WHERE attempt_id = ? ORDER BY id",
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await?;

    Ok(answers)
}

/// The caller's attempt history, newest first.
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<QuizAttempt>, AppError> {
    let sql = format!(
        "SELECT {} FROM quiz_attempts WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        ATTEMPT_COLUMNS
    );

    let attempts = sqlx::query_as::<_, QuizAttempt>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(attempts)
}

/// Applies the one legal transition, `created` to `submitted`, and persists
/// the graded rows. Returns `false` when the attempt was no longer in
/// `created`, meaning a concurrent submission won; nothing is written then.
///
/// The conditional `WHERE status = 'created'` makes the transition atomic:
/// of two racing submissions exactly one updates the row, and only that one
/// inserts answers and commits.
pub async fn record_submission(
    pool: &SqlitePool,
    attempt_id: i64,
    report: &ScoreReport,
    submitted_at: DateTime<Utc>,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE quiz_attempts \
         SET status = 'submitted', correct_count = ?, percentage = ?, submitted_at = ? \
         WHERE id = ? AND status = 'created'",
    )
    .bind(report.correct_count)
    .bind(report.percentage)
    .bind(submitted_at)
    .bind(attempt_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to submit attempt {}: {:?}", attempt_id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    for row in &report.breakdown {
        sqlx::query(
            "INSERT INTO quiz_answers (attempt_id, question_id, selected_option, is_correct) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(attempt_id)
        .bind(row.question_id)
        .bind(row.selected_option)
        .bind(row.is_correct)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record answer for attempt {}: {:?}", attempt_id, e);
            AppError::InternalServerError(e.to_string())
        })?;
    }

    tx.commit().await?;

    Ok(true)
}
