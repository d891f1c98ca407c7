// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{
            AnswerBreakdown, AttemptDetail, AttemptStatus, QuizAnswer, ScoreSummary,
            StartQuizRequest, StartQuizResponse, SubmitQuizRequest, SubmitQuizResponse,
        },
        question::PublicQuestion,
    },
    quiz::{sampler, scorer},
    store::{attempts, questions},
    utils::jwt::Claims,
};

/// Lists the taxonomy facets of the published bank (schools, matieres,
/// chapters, difficulties). Public; drives the quiz-start form.
pub async fn filter_options(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let options = questions::filter_options(&pool).await?;

    Ok(Json(options))
}

/// Lists the startable (school, matiere) pairs with their question counts.
pub async fn quiz_options(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let options = questions::quiz_filter_options(&pool).await?;

    Ok(Json(options))
}

#[derive(Debug, Deserialize)]
pub struct SchoolParams {
    pub school: String,
}

/// Lists the matieres with published questions for one school.
pub async fn matieres(
    State(pool): State<SqlitePool>,
    Query(params): Query<SchoolParams>,
) -> Result<impl IntoResponse, AppError> {
    let matieres = questions::matieres_for_school(&pool, &params.school).await?;

    Ok(Json(matieres))
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    pub school: String,
    pub matiere: String,
}

/// Reports how many published questions a (school, matiere) pair holds.
/// Unknown pairs report 0 rather than an error.
pub async fn question_count(
    State(pool): State<SqlitePool>,
    Query(params): Query<CountParams>,
) -> Result<impl IntoResponse, AppError> {
    let count = questions::question_count(&pool, &params.school, &params.matiere).await?;

    Ok(Json(json!({
        "school": params.school,
        "matiere": params.matiere,
        "count": count
    })))
}

/// Starts a quiz attempt: samples up to `count` published questions for the
/// requested (school, matiere) and freezes them into a snapshot.
///
/// An empty pool is a signal, not an error. The response carries
/// `attempt_id: null` with zero questions, no attempt row is written, and
/// the status stays 200 so clients can distinguish "nothing to practice"
/// from a failed request.
pub async fn start_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let requested = sampler::resolve_count(payload.count)?;

    let candidates = questions::candidate_ids(&pool, &payload.school, &payload.matiere).await?;
    let sampled = sampler::draw(candidates, requested);
    let selection = questions::fetch_by_ids(&pool, &sampled).await?;

    if selection.is_empty() {
        return Ok(Json(StartQuizResponse {
            attempt_id: None,
            requested,
            returned: 0,
            questions: Vec::new(),
        }));
    }

    let attempt_id = attempts::create_with_snapshot(
        &pool,
        claims.user_id(),
        &payload.school,
        &payload.matiere,
        requested,
        &selection,
    )
    .await?;

    tracing::info!(
        "User {} started attempt {}: {} of {} requested questions",
        claims.user_id(),
        attempt_id,
        selection.len(),
        requested
    );

    Ok(Json(StartQuizResponse {
        attempt_id: Some(attempt_id),
        requested,
        returned: selection.len() as i64,
        questions: selection.into_iter().map(PublicQuestion::from).collect(),
    }))
}

/// Lists the caller's attempts, newest first.
pub async fn list_attempts(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = attempts::list_for_user(&pool, claims.user_id()).await?;

    Ok(Json(attempts))
}

/// Shows one of the caller's attempts, rendered from the frozen snapshot.
///
/// Absent ids and attempts owned by someone else both return 404, so the
/// endpoint never confirms that a foreign attempt exists. The score and the
/// per-question breakdown (which carries the answer key) only appear once
/// the attempt is submitted.
pub async fn get_attempt(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = attempts::find_for_user(&pool, id, claims.user_id())
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    let snapshot = attempts::snapshot(&pool, attempt.id).await?;

    let mut score = None;
    let mut breakdown = None;

    if attempt.status == AttemptStatus::Submitted {
        let rows = attempts::answers(&pool, attempt.id).await?;
        let by_question: HashMap<i64, QuizAnswer> =
            rows.into_iter().map(|a| (a.question_id, a)).collect();

        breakdown = Some(
            snapshot
                .iter()
                .map(|q| {
                    let row = by_question.get(&q.question_id);
                    AnswerBreakdown {
                        question_id: q.question_id,
                        selected_option: row.and_then(|r| r.selected_option),
                        correct_option: q.correct_option,
                        is_correct: row.map(|r| r.is_correct).unwrap_or(false),
                    }
                })
                .collect(),
        );

        score = Some(ScoreSummary {
            correct: attempt.correct_count.unwrap_or(0),
            total: attempt.total_count,
            percentage: attempt.percentage.unwrap_or(0),
        });
    }

    Ok(Json(AttemptDetail {
        id: attempt.id,
        school: attempt.school,
        matiere: attempt.matiere,
        status: attempt.status,
        requested_count: attempt.requested_count,
        total_count: attempt.total_count,
        created_at: attempt.created_at,
        submitted_at: attempt.submitted_at,
        duration_seconds: attempt
            .submitted_at
            .map(|t| (t - attempt.created_at).num_seconds()),
        questions: snapshot.into_iter().map(PublicQuestion::from).collect(),
        score,
        breakdown,
    }))
}

/// Submits answers for one of the caller's attempts and grades them against
/// the frozen snapshot.
///
/// An attempt accepts exactly one submission. A second submit returns 409,
/// and the conditional status write inside `record_submission` guarantees
/// that of two racing submissions only one lands, so a stored score never
/// changes afterwards.
pub async fn submit_attempt(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = attempts::find_for_user(&pool, id, claims.user_id())
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if attempt.status == AttemptStatus::Submitted {
        return Err(AppError::Conflict("Attempt already submitted".to_string()));
    }

    let snapshot = attempts::snapshot(&pool, attempt.id).await?;
    let submitted = scorer::collect_answers(&payload.answers);
    let report = scorer::score_attempt(&snapshot, &submitted);

    let applied = attempts::record_submission(&pool, attempt.id, &report, Utc::now()).await?;
    if !applied {
        // A concurrent submission of the same attempt won the race.
        return Err(AppError::Conflict("Attempt already submitted".to_string()));
    }

    tracing::info!(
        "User {} submitted attempt {}: {}/{} correct ({}%)",
        claims.user_id(),
        attempt.id,
        report.correct_count,
        report.total_count,
        report.percentage
    );

    Ok(Json(SubmitQuizResponse {
        attempt_id: attempt.id,
        score: ScoreSummary {
            correct: report.correct_count,
            total: report.total_count,
            percentage: report.percentage,
        },
        breakdown: report.breakdown,
    }))
}
