// src/store/questions.rs

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json};

use crate::{
    error::AppError,
    models::question::{
        CreateQuestionRequest, FilterOptions, Question, QuestionListParams, QuestionStatus,
        QuizFilterOption, UpdateQuestionRequest, assemble_options,
    },
    utils::html::clean_markup,
};

const QUESTION_COLUMNS: &str = "id, school, matiere, chapter, stem, options, correct_option, \
     difficulty, status, created_at, updated_at";

/// Upper bound on the admin listing page size.
const MAX_LIST_LIMIT: i64 = 200;
const DEFAULT_LIST_LIMIT: i64 = 50;

/// Distinct facets among published questions, for the quiz-start UI.
pub async fn filter_options(pool: &SqlitePool) -> Result<FilterOptions, AppError> {
    let schools = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT school FROM questions WHERE status = 'published' ORDER BY school",
    )
    .fetch_all(pool)
    .await?;

    let matieres = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT matiere FROM questions WHERE status = 'published' ORDER BY matiere",
    )
    .fetch_all(pool)
    .await?;

    let chapters = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT chapter FROM questions \
         WHERE status = 'published' AND chapter IS NOT NULL ORDER BY chapter",
    )
    .fetch_all(pool)
    .await?;

    let difficulties = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT difficulty FROM questions WHERE status = 'published' ORDER BY difficulty",
    )
    .fetch_all(pool)
    .await?;

    Ok(FilterOptions {
        schools,
        matieres,
        chapters,
        difficulties,
    })
}

/// The startable (school, matiere) pairs, each with its published count.
pub async fn quiz_filter_options(pool: &SqlitePool) -> Result<Vec<QuizFilterOption>, AppError> {
    let options = sqlx::query_as::<_, QuizFilterOption>(
        "SELECT school, matiere, COUNT(*) AS question_count \
         FROM questions WHERE status = 'published' \
         GROUP BY school, matiere \
         ORDER BY school, matiere",
    )
    .fetch_all(pool)
    .await?;

    Ok(options)
}

/// Matieres with at least one published question for the given school.
pub async fn matieres_for_school(pool: &SqlitePool, school: &str) -> Result<Vec<String>, AppError> {
    let matieres = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT matiere FROM questions \
         WHERE status = 'published' AND school = ? ORDER BY matiere",
    )
    .bind(school)
    .fetch_all(pool)
    .await?;

    Ok(matieres)
}

/// How many published questions match the pair. Unknown dimensions count 0.
pub async fn question_count(
    pool: &SqlitePool,
    school: &str,
    matiere: &str,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM questions \
         WHERE status = 'published' AND school = ? AND matiere = ?",
    )
    .bind(school)
    .bind(matiere)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Ids of every published question matching the pair; the sampler draws
/// from this list.
pub async fn candidate_ids(
    pool: &SqlitePool,
    school: &str,
    matiere: &str,
) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM questions \
         WHERE status = 'published' AND school = ? AND matiere = ?",
    )
    .bind(school)
    .bind(matiere)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Loads full rows for the sampled ids, preserving the caller's order.
/// Ids that vanished between sampling and loading are silently skipped.
pub async fn fetch_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Question>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    // Use QueryBuilder for dynamic IN clause
    let mut query_builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM questions WHERE id IN (",
        QUESTION_COLUMNS
    ));

    let mut separated = query_builder.separated(",");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let rows: Vec<Question> = query_builder.build_query_as().fetch_all(pool).await?;

    let mut by_id: HashMap<i64, Question> = rows.into_iter().map(|q| (q.id, q)).collect();
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

/// Retrieves a single question by ID, answer key included. Admin paths only.
pub async fn find(pool: &SqlitePool, id: i64) -> Result<Question, AppError> {
    let sql = format!("SELECT {} FROM questions WHERE id = ?", QUESTION_COLUMNS);

    sqlx::query_as::<_, Question>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))
}

/// Inserts a new question. Stems and option markup are sanitized before
/// they enter the bank; callers validate the payload first.
pub async fn create(pool: &SqlitePool, payload: CreateQuestionRequest) -> Result<Question, AppError> {
    let (mut options, correct_option) = assemble_options(&payload.options);
    for opt in &mut options {
        opt.content = clean_markup(&opt.content);
    }

    let status = payload.status.unwrap_or(QuestionStatus::Draft);

    let result = sqlx::query(
        "INSERT INTO questions \
         (school, matiere, chapter, stem, options, correct_option, difficulty, status) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(payload.school)
    .bind(payload.matiere)
    .bind(payload.chapter)
    .bind(clean_markup(&payload.stem))
    .bind(Json(options))
    .bind(correct_option)
    .bind(payload.difficulty)
    .bind(status)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    find(pool, result.last_insert_rowid()).await
}

/// Partially updates a question. Replacing the option set also rewrites the
/// answer key, and `updated_at` is always bumped.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateQuestionRequest,
) -> Result<Question, AppError> {
    if payload.school.is_none()
        && payload.matiere.is_none()
        && payload.chapter.is_none()
        && payload.stem.is_none()
        && payload.options.is_none()
        && payload.difficulty.is_none()
        && payload.status.is_none()
    {
        return find(pool, id).await;
    }

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(school) = payload.school {
        separated.push("school = ");
        separated.push_bind_unseparated(school);
    }

    if let Some(matiere) = payload.matiere {
        separated.push("matiere = ");
        separated.push_bind_unseparated(matiere);
    }

    if let Some(chapter) = payload.chapter {
        separated.push("chapter = ");
        separated.push_bind_unseparated(chapter);
    }

    if let Some(stem) = payload.stem {
        separated.push("stem = ");
        separated.push_bind_unseparated(clean_markup(&stem));
    }

    if let Some(raw_options) = payload.options {
        let (mut options, correct_option) = assemble_options(&raw_options);
        for opt in &mut options {
            opt.content = clean_markup(&opt.content);
        }
        separated.push("options = ");
        separated.push_bind_unseparated(Json(options));
        separated.push("correct_option = ");
        separated.push_bind_unseparated(correct_option);
    }

    if let Some(difficulty) = payload.difficulty {
        separated.push("difficulty = ");
        separated.push_bind_unseparated(difficulty);
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    separated.push("updated_at = ");
    separated.push_bind_unseparated(chrono::Utc::now());

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    find(pool, id).await
}

/// Deletes a question. Snapshots in past attempts keep their copy.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(())
}

/// Lists questions for the admin view, newest first, with optional filters.
pub async fn list(
    pool: &SqlitePool,
    params: QuestionListParams,
) -> Result<Vec<Question>, AppError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM questions WHERE 1 = 1",
        QUESTION_COLUMNS
    ));

    if let Some(school) = params.school {
        builder.push(" AND school = ");
        builder.push_bind(school);
    }

    if let Some(matiere) = params.matiere {
        builder.push(" AND matiere = ");
        builder.push_bind(matiere);
    }

    if let Some(status) = params.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    builder.push(" ORDER BY id DESC LIMIT ");
    builder.push_bind(limit);

    let questions: Vec<Question> = builder.build_query_as().fetch_all(pool).await?;

    Ok(questions)
}
