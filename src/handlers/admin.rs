// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, QuestionListParams, UpdateQuestionRequest},
    store::questions,
};

/// Lists bank questions with optional school/matiere/status filters.
/// Admin only; rows include the answer key.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = questions::list(&pool, params).await?;

    Ok(Json(questions))
}

/// Creates a new bank question.
/// Admin only. New questions default to 'draft' and stay out of quizzes
/// until published.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = questions::create(&pool, payload).await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Updates a question by ID. Fields are optional; replacing the options also
/// replaces the answer key. Existing attempt snapshots are unaffected.
/// Admin only.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = questions::update(&pool, id, payload).await?;

    Ok(Json(question))
}

/// Deletes a question by ID. Past attempts keep their snapshot copy.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    questions::delete(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
