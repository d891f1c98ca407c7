// src/quiz/scorer.rs

use std::collections::HashMap;

use crate::models::attempt::{AnswerBreakdown, AnswerInput, AttemptQuestion};

/// Outcome of grading one submission: aggregate counts plus the
/// per-question rows persisted as 'quiz_answers'.
#[derive(Debug)]
pub struct ScoreReport {
    pub correct_count: i64,
    pub total_count: i64,
    pub percentage: i64,
    pub breakdown: Vec<AnswerBreakdown>,
}

/// Folds the submitted answer list into a question-id lookup map.
/// When a question id repeats, the last entry wins.
pub fn collect_answers(answers: &[AnswerInput]) -> HashMap<i64, Option<i64>> {
    answers
        .iter()
        .map(|a| (a.question_id, a.selected_option))
        .collect()
}

/// Grades a submission against the attempt's frozen snapshot.
///
/// Every snapshot question yields exactly one breakdown row: unanswered
/// questions score as incorrect, and submitted ids outside the snapshot are
/// ignored so stray answers can neither inflate nor deflate the result.
pub fn score_attempt(
    snapshot: &[AttemptQuestion],
    submitted: &HashMap<i64, Option<i64>>,
) -> ScoreReport {
    let mut breakdown = Vec::with_capacity(snapshot.len());
    let mut correct_count = 0;

    for question in snapshot {
        let selected_option = submitted.get(&question.question_id).copied().flatten();
        let is_correct = selected_option == Some(question.correct_option);

        if is_correct {
            correct_count += 1;
        }

        breakdown.push(AnswerBreakdown {
            question_id: question.question_id,
            selected_option,
            correct_option: question.correct_option,
            is_correct,
        });
    }

    let total_count = snapshot.len() as i64;

    ScoreReport {
        correct_count,
        total_count,
        percentage: percentage(correct_count, total_count),
        breakdown,
    }
}

/// Integer percentage: 2 correct of 3 rounds to 67.
fn percentage(correct: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as i64
}
