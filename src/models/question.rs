// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::Validate;

/// Question lifecycle. Only 'published' questions are eligible for sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum QuestionStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// How an option's content should be rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    #[default]
    Text,
    Image,
    Math,
}

/// One answer option inside a question's JSON `options` column.
///
/// Deliberately carries no correctness marker: the answer key lives only in
/// the row's `correct_option` column, so serializing options to a client can
/// never leak it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    /// 1-based position id, unique within the question.
    pub id: i64,
    pub content: String,
    pub kind: OptionKind,
    /// Resolved elsewhere; this core only stores the URL.
    pub image_ref: Option<String>,
}

/// Represents the 'questions' table in the database.
/// Serialized only on admin routes; quiz routes use `PublicQuestion`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: i64,

    /// School dimension (e.g., "HEC").
    pub school: String,

    /// Subject dimension (e.g., "Math").
    pub matiere: String,

    pub chapter: Option<String>,

    /// The question text, possibly with inline math markup.
    pub stem: String,

    /// Ordered option set, stored as a JSON array.
    pub options: Json<Vec<QuestionOption>>,

    /// Id of the single correct option. Server-side only.
    pub correct_option: i64,

    pub difficulty: Difficulty,

    pub status: QuestionStatus,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a question to quiz takers (excludes the answer key).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub stem: String,
    pub options: Json<Vec<QuestionOption>>,
    pub difficulty: Difficulty,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            stem: q.stem,
            options: q.options,
            difficulty: q.difficulty,
        }
    }
}

/// An option as submitted by an admin; ids are assigned server-side.
/// Serializable so a rejected option set can ride along in the
/// validation error params.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestionOption {
    pub content: String,
    #[serde(default)]
    pub kind: OptionKind,
    pub image_ref: Option<String>,
    #[serde(default)]
    pub correct: bool,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 100))]
    pub school: String,
    #[validate(length(min = 1, max = 100))]
    pub matiere: String,
    #[validate(length(max = 100))]
    pub chapter: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub stem: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<NewQuestionOption>,
    pub difficulty: Difficulty,
    /// Defaults to 'draft' when omitted.
    pub status: Option<QuestionStatus>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 100))]
    pub school: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub matiere: Option<String>,
    #[validate(length(max = 100))]
    pub chapter: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub stem: Option<String>,
    /// Replaces the whole option set; partial option edits are not supported.
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<NewQuestionOption>>,
    pub difficulty: Option<Difficulty>,
    pub status: Option<QuestionStatus>,
}

/// Query parameters for the admin question listing.
#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub school: Option<String>,
    pub matiere: Option<String>,
    pub status: Option<QuestionStatus>,
    pub limit: Option<i64>,
}

/// Distinct facets among published questions, for quiz-start selection UIs.
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub schools: Vec<String>,
    pub matieres: Vec<String>,
    pub chapters: Vec<String>,
    pub difficulties: Vec<String>,
}

/// A startable (school, matiere) pair with its published-question count.
#[derive(Debug, Serialize, FromRow)]
pub struct QuizFilterOption {
    pub school: String,
    pub matiere: String,
    pub question_count: i64,
}

/// Assigns 1-based positional ids to submitted options and extracts the id
/// of the option marked correct. Callers validate the option set first, so
/// exactly one option carries the `correct` flag.
pub fn assemble_options(raw: &[NewQuestionOption]) -> (Vec<QuestionOption>, i64) {
    let mut correct_option = 0;
    let options = raw
        .iter()
        .enumerate()
        .map(|(idx, opt)| {
            let id = (idx + 1) as i64;
            if opt.correct {
                correct_option = id;
            }
            QuestionOption {
                id,
                content: opt.content.clone(),
                kind: opt.kind,
                image_ref: opt.image_ref.clone(),
            }
        })
        .collect();

    (options, correct_option)
}

/// Validates an option set: at least two entries, exactly one marked correct,
/// bounded content, and a parseable URL on every image reference.
fn validate_options(options: &[NewQuestionOption]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_options"));
    }

    let correct_count = options.iter().filter(|o| o.correct).count();
    if correct_count != 1 {
        return Err(validator::ValidationError::new("exactly_one_correct_option"));
    }

    for opt in options {
        if opt.content.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
        match opt.kind {
            OptionKind::Image => {
                let image_ref = opt.image_ref.as_deref().unwrap_or("");
                if Url::parse(image_ref).is_err() {
                    return Err(validator::ValidationError::new("invalid_image_ref"));
                }
            }
            OptionKind::Text | OptionKind::Math => {
                if opt.content.is_empty() {
                    return Err(validator::ValidationError::new("empty_option_content"));
                }
                if let Some(image_ref) = &opt.image_ref {
                    if Url::parse(image_ref).is_err() {
                        return Err(validator::ValidationError::new("invalid_image_ref"));
                    }
                }
            }
        }
    }

    Ok(())
}
