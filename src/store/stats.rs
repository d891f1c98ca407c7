// src/store/stats.rs

use serde::Serialize;
use sqlx::{SqlitePool, prelude::FromRow};

use crate::{config, error::AppError};

/// One (value, count) pair of a grouped aggregate.
#[derive(Debug, Serialize, FromRow)]
pub struct FacetCount {
    pub value: String,
    pub count: i64,
}

/// Bank composition snapshot for the admin dashboard.
#[derive(Debug, Serialize)]
pub struct QuestionStats {
    pub total: i64,
    pub by_status: Vec<FacetCount>,
    pub by_difficulty: Vec<FacetCount>,
    pub by_school: Vec<FacetCount>,
    pub by_matiere: Vec<FacetCount>,
}

/// Full taxonomy over every status, for the admin question listing filters.
/// The quiz-facing variant in `store::questions` only sees published rows.
#[derive(Debug, Serialize)]
pub struct AdminFilterOptions {
    pub schools: Vec<String>,
    pub matieres: Vec<String>,
    pub statuses: Vec<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CriteriaStats {
    pub school: String,
    pub matiere: String,
    pub attempts: i64,
    pub average_percentage: Option<f64>,
}

/// Attempt volume and outcomes. Averages and the pass rate cover submitted
/// attempts only and are `None` while there are none.
#[derive(Debug, Serialize)]
pub struct AttemptStats {
    pub total_attempts: i64,
    pub submitted_attempts: i64,
    pub average_percentage: Option<f64>,
    pub pass_rate: Option<f64>,
    pub by_criteria: Vec<CriteriaStats>,
}

async fn facet_counts(pool: &SqlitePool, column: &str) -> Result<Vec<FacetCount>, AppError> {
    let sql = format!(
        "SELECT {col} AS value, COUNT(*) AS count FROM questions \
         GROUP BY {col} ORDER BY count DESC, value",
        col = column
    );

    let counts = sqlx::query_as::<_, FacetCount>(&sql).fetch_all(pool).await?;

    Ok(counts)
}

/// Counts the bank by status, difficulty, school and matiere.
pub async fn question_stats(pool: &SqlitePool) -> Result<QuestionStats, AppError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await?;

    Ok(QuestionStats {
        total,
        by_status: facet_counts(pool, "status").await?,
        by_difficulty: facet_counts(pool, "difficulty").await?,
        by_school: facet_counts(pool, "school").await?,
        by_matiere: facet_counts(pool, "matiere").await?,
    })
}

/// Distinct schools, matieres and statuses across the whole bank.
pub async fn question_filter_options(pool: &SqlitePool) -> Result<AdminFilterOptions, AppError> {
    let schools =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT school FROM questions ORDER BY school")
            .fetch_all(pool)
            .await?;

    let matieres =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT matiere FROM questions ORDER BY matiere")
            .fetch_all(pool)
            .await?;

    let statuses =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT status FROM questions ORDER BY status")
            .fetch_all(pool)
            .await?;

    Ok(AdminFilterOptions {
        schools,
        matieres,
        statuses,
    })
}

/// Aggregates attempt outcomes, overall and per (school, matiere).
///
/// The pass rate is the share of submitted attempts at or above
/// `PASSING_SCORE_PERCENTAGE`, expressed as a percentage.
pub async fn attempt_stats(pool: &SqlitePool) -> Result<AttemptStats, AppError> {
    let total_attempts = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM quiz_attempts")
        .fetch_one(pool)
        .await?;

    let submitted_attempts = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM quiz_attempts WHERE status = 'submitted'",
    )
    .fetch_one(pool)
    .await?;

    let average_percentage = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(percentage) FROM quiz_attempts WHERE status = 'submitted'",
    )
    .fetch_one(pool)
    .await?;

    let pass_rate = sqlx::query_scalar::<_, Option<f64>>(
        "SELECT AVG(CASE WHEN percentage >= ? THEN 100.0 ELSE 0.0 END) \
         FROM quiz_attempts WHERE status = 'submitted'",
    )
    .bind(config::PASSING_SCORE_PERCENTAGE)
    .fetch_one(pool)
    .await?;

    let by_criteria = sqlx::query_as::<_, CriteriaStats>(
        "SELECT school, matiere, COUNT(*) AS attempts, AVG(percentage) AS average_percentage \
         FROM quiz_attempts WHERE status = 'submitted' \
         GROUP BY school, matiere \
         ORDER BY attempts DESC, school, matiere",
    )
    .fetch_all(pool)
    .await?;

    Ok(AttemptStats {
        total_attempts,
        submitted_attempts,
        average_percentage,
        pass_rate,
        by_criteria,
    })
}
