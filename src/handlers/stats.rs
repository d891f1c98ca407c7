// src/handlers/stats.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{error::AppError, store::stats};

/// Bank composition: totals by status, difficulty, school and matiere.
/// Admin only.
pub async fn question_stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let stats = stats::question_stats(&pool).await?;

    Ok(Json(stats))
}

/// Attempt volume, average score and pass rate, overall and per criteria.
/// Admin only.
pub async fn attempt_stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let stats = stats::attempt_stats(&pool).await?;

    Ok(Json(stats))
}

/// Full taxonomy across all statuses, for the admin listing filters.
/// Admin only.
pub async fn filter_options(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let options = stats::question_filter_options(&pool).await?;

    Ok(Json(options))
}
