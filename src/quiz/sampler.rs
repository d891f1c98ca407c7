// src/quiz/sampler.rs

use rand::seq::SliceRandom;

use crate::{
    config::{DEFAULT_QUIZ_QUESTIONS, MAX_QUIZ_QUESTIONS, MIN_QUIZ_QUESTIONS},
    error::AppError,
};

/// Resolves the requested question count against the configured bounds.
///
/// A missing count falls back to the default; an out-of-range count is a
/// validation error, rejected before any storage access.
pub fn resolve_count(requested: Option<i64>) -> Result<i64, AppError> {
    match requested {
        None => Ok(DEFAULT_QUIZ_QUESTIONS),
        Some(n) if (MIN_QUIZ_QUESTIONS..=MAX_QUIZ_QUESTIONS).contains(&n) => Ok(n),
        Some(n) => Err(AppError::BadRequest(format!(
            "count must be between {} and {}, got {}",
            MIN_QUIZ_QUESTIONS, MAX_QUIZ_QUESTIONS, n
        ))),
    }
}

/// Draws up to `count` distinct ids from the candidate pool, uniformly and
/// without replacement.
///
/// Shuffle-then-take with a fresh thread RNG per call, so repeated draws
/// over the same pool are independent. A pool smaller than `count` comes
/// back whole: under-fill is a valid degraded result, never padded and
/// never an error.
pub fn draw(mut pool: Vec<i64>, count: i64) -> Vec<i64> {
    let mut rng = rand::thread_rng();
    pool.shuffle(&mut rng);
    pool.truncate(count as usize);
    pool
}
