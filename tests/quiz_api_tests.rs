// tests/quiz_api_tests.rs

use std::collections::HashSet;

use quiz_backend::{config::Config, routes, state::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// Helper function to spawn the app on a random port for testing.
///
/// Each test gets its own in-memory database. A single pooled connection
/// keeps that database alive and is shared between the server and the
/// test's seeding queries, so max_connections must stay at 1.
async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory sqlite database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "quiz_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Inserts a bank question directly; option 1..=3 with the given answer key.
async fn seed_question(
    pool: &SqlitePool,
    school: &str,
    matiere: &str,
    stem: &str,
    correct_option: i64,
    status: &str,
) -> i64 {
    let options = serde_json::json!([
        {"id": 1, "content": "Option 1", "kind": "text", "image_ref": null},
        {"id": 2, "content": "Option 2", "kind": "text", "image_ref": null},
        {"id": 3, "content": "Option 3", "kind": "text", "image_ref": null}
    ]);

    let result = sqlx::query(
        "INSERT INTO questions \
         (school, matiere, chapter, stem, options, correct_option, difficulty, status) \
         VALUES (?, ?, 'Ch1', ?, ?, ?, 'medium', ?)",
    )
    .bind(school)
    .bind(matiere)
    .bind(stem)
    .bind(options.to_string())
    .bind(correct_option)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();

    result.last_insert_rowid()
}

async fn register_and_login(client: &reqwest::Client, address: &str, username: &str) -> String {
    client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"username": username, "password": "password123"}))
        .send()
        .await
        .expect("Register failed");

    let login: serde_json::Value = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": username, "password": "password123"}))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

#[tokio::test]
async fn start_requires_auth() {
    // Arrange
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(&format!("{}/api/quiz/start", address))
        .json(&serde_json::json!({"school": "HEC", "matiere": "Math"}))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_quiz_flow() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Seed 5 published questions with answer key 2, plus a draft that must
    // never be served.
    for i in 0..5 {
        seed_question(&pool, "HEC", "Math", &format!("Question {}", i), 2, "published").await;
    }
    seed_question(&pool, "HEC", "Math", "Draft question", 2, "draft").await;

    let token = register_and_login(&client, &address, "quiz_taker").await;

    // 1. Start an attempt with 3 questions
    let start_resp = client
        .post(&format!("{}/api/quiz/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"school": "HEC", "matiere": "Math", "count": 3}))
        .send()
        .await
        .expect("Start failed");

    assert_eq!(start_resp.status().as_u16(), 200);
    let start_body = start_resp.text().await.unwrap();
    // The answer key must not appear anywhere in the served questions
    assert!(!start_body.contains("correct_option"));
    assert!(!start_body.contains("Draft question"));

    let start: serde_json::Value = serde_json::from_str(&start_body).unwrap();
    let attempt_id = start["attempt_id"].as_i64().expect("attempt_id missing");
    assert_eq!(start["requested"], 3);
    assert_eq!(start["returned"], 3);

    let questions = start["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);

    let ids: Vec<i64> = questions.iter().map(|q| q["id"].as_i64().unwrap()).collect();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 3, "Sampled questions must be distinct");
    assert_eq!(questions[0]["options"].as_array().unwrap().len(), 3);

    // 2. Detail before submission: no score, no breakdown, no answer key
    let detail_resp = client
        .get(&format!("{}/api/quiz/attempts/{}", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(detail_resp.status().as_u16(), 200);
    let detail_body = detail_resp.text().await.unwrap();
    assert!(!detail_body.contains("correct_option"));

    let detail: serde_json::Value = serde_json::from_str(&detail_body).unwrap();
    assert_eq!(detail["status"], "created");
    assert!(detail["score"].is_null());
    assert!(detail["breakdown"].is_null());
    assert_eq!(detail["questions"].as_array().unwrap().len(), 3);

    // 3. Submit: first two correct (key is 2), last one wrong
    let submit_resp = client
        .post(&format!("{}/api/quiz/attempts/{}/submit", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"answers": [
            {"question_id": ids[0], "selected_option": 2},
            {"question_id": ids[1], "selected_option": 2},
            {"question_id": ids[2], "selected_option": 1}
        ]}))
        .send()
        .await
        .expect("Submit failed");

    assert_eq!(submit_resp.status().as_u16(), 200);
    let result: serde_json::Value = submit_resp.json().await.unwrap();
    assert_eq!(result["score"]["correct"], 2);
    assert_eq!(result["score"]["total"], 3);
    assert_eq!(result["score"]["percentage"], 67);

    let breakdown = result["breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 3);
    assert_eq!(breakdown[0]["is_correct"], true);
    assert_eq!(breakdown[2]["is_correct"], false);
    assert_eq!(breakdown[2]["correct_option"], 2);

    // 4. A second submission must be rejected and the score must not move
    let resubmit_resp = client
        .post(&format!("{}/api/quiz/attempts/{}/submit", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"answers": [
            {"question_id": ids[0], "selected_option": 2},
            {"question_id": ids[1], "selected_option": 2},
            {"question_id": ids[2], "selected_option": 2}
        ]}))
        .send()
        .await
        .unwrap();

    assert_eq!(resubmit_resp.status().as_u16(), 409);

    // 5. Detail after submission carries the stored score and breakdown
    let after: serde_json::Value = client
        .get(&format!("{}/api/quiz/attempts/{}", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(after["status"], "submitted");
    assert_eq!(after["score"]["percentage"], 67);
    assert_eq!(after["breakdown"].as_array().unwrap().len(), 3);
    assert!(after["duration_seconds"].as_i64().unwrap() >= 0);

    // 6. History shows the finished attempt
    let history: Vec<serde_json::Value> = client
        .get(&format!("{}/api/quiz/attempts", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"].as_i64().unwrap(), attempt_id);
    assert_eq!(history[0]["percentage"], 67);
}

#[tokio::test]
async fn short_pool_returns_what_exists() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    for i in 0..4 {
        seed_question(&pool, "HEC", "Math", &format!("Question {}", i), 1, "published").await;
    }

    let token = register_and_login(&client, &address, "short_pool_user").await;

    // Act: ask for 10 when only 4 exist
    let start: serde_json::Value = client
        .post(&format!("{}/api/quiz/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"school": "HEC", "matiere": "Math", "count": 10}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert: the whole pool, no padding, attempt still created
    assert!(start["attempt_id"].is_i64());
    assert_eq!(start["requested"], 10);
    assert_eq!(start["returned"], 4);
    assert_eq!(start["questions"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn empty_pool_is_a_signal_not_an_error() {
    // Arrange: nothing seeded
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, "empty_pool_user").await;

    // Act
    let start_resp = client
        .post(&format!("{}/api/quiz/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"school": "HEC", "matiere": "Math"}))
        .send()
        .await
        .unwrap();

    // Assert: 200 with the explicit empty shape, and no attempt row written
    assert_eq!(start_resp.status().as_u16(), 200);
    let start: serde_json::Value = start_resp.json().await.unwrap();
    assert!(start["attempt_id"].is_null());
    assert_eq!(start["returned"], 0);
    assert_eq!(start["questions"].as_array().unwrap().len(), 0);

    let history: Vec<serde_json::Value> = client
        .get(&format!("{}/api/quiz/attempts", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(history.len(), 0);
}

#[tokio::test]
async fn attempts_are_owner_scoped() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    seed_question(&pool, "HEC", "Math", "Question", 1, "published").await;
    seed_question(&pool, "HEC", "Math", "Question 2", 1, "published").await;

    let token_a = register_and_login(&client, &address, "owner_user").await;
    let token_b = register_and_login(&client, &address, "other_user").await;

    let start: serde_json::Value = client
        .post(&format!("{}/api/quiz/start", address))
        .header("Authorization", format!("Bearer {}", token_a))
        .json(&serde_json::json!({"school": "HEC", "matiere": "Math", "count": 2}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempt_id = start["attempt_id"].as_i64().unwrap();

    // Act + Assert: another user sees 404 on both read and submit, the same
    // status as a genuinely absent id
    let foreign_get = client
        .get(&format!("{}/api/quiz/attempts/{}", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token_b))
        .send()
        .await
        .unwrap();
    assert_eq!(foreign_get.status().as_u16(), 404);

    let foreign_submit = client
        .post(&format!("{}/api/quiz/attempts/{}/submit", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token_b))
        .json(&serde_json::json!({"answers": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(foreign_submit.status().as_u16(), 404);

    let absent_get = client
        .get(&format!("{}/api/quiz/attempts/99999", address))
        .header("Authorization", format!("Bearer {}", token_a))
        .send()
        .await
        .unwrap();
    assert_eq!(absent_get.status().as_u16(), 404);

    // The owner still submits fine
    let own_submit = client
        .post(&format!("{}/api/quiz/attempts/{}/submit", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token_a))
        .json(&serde_json::json!({"answers": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(own_submit.status().as_u16(), 200);
}

#[tokio::test]
async fn partial_and_stray_answers_are_handled() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        seed_question(&pool, "HEC", "Math", &format!("Question {}", i), 1, "published").await;
    }

    let token = register_and_login(&client, &address, "partial_user").await;

    let start: serde_json::Value = client
        .post(&format!("{}/api/quiz/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"school": "HEC", "matiere": "Math", "count": 3}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let attempt_id = start["attempt_id"].as_i64().unwrap();
    let ids: Vec<i64> = start["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();

    // Act: one correct answer, a duplicate where the last entry wins, an
    // answer for a question outside the attempt, and one question unanswered
    let result: serde_json::Value = client
        .post(&format!("{}/api/quiz/attempts/{}/submit", address, attempt_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"answers": [
            {"question_id": ids[0], "selected_option": 1},
            {"question_id": ids[1], "selected_option": 2},
            {"question_id": ids[1], "selected_option": 1},
            {"question_id": 999999, "selected_option": 1}
        ]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert: 2 of 3 correct; the stray id contributes nothing
    assert_eq!(result["score"]["correct"], 2);
    assert_eq!(result["score"]["total"], 3);
    assert_eq!(result["score"]["percentage"], 67);

    let breakdown = result["breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 3);
    assert!(breakdown.iter().all(|b| b["question_id"] != 999999));

    let unanswered = breakdown
        .iter()
        .find(|b| b["question_id"].as_i64() == Some(ids[2]))
        .unwrap();
    assert!(unanswered["selected_option"].is_null());
    assert_eq!(unanswered["is_correct"], false);
}

#[tokio::test]
async fn count_bounds_are_enforced() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    for i in 0..12 {
        seed_question(&pool, "HEC", "Math", &format!("Question {}", i), 1, "published").await;
    }

    let token = register_and_login(&client, &address, "bounds_user").await;

    // Act + Assert: out-of-range counts are rejected before anything is written
    for bad_count in [0, 51] {
        let resp = client
            .post(&format!("{}/api/quiz/start", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({
                "school": "HEC", "matiere": "Math", "count": bad_count
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400, "count {} must be rejected", bad_count);
    }

    // A missing count falls back to the default of 10
    let start: serde_json::Value = client
        .post(&format!("{}/api/quiz/start", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"school": "HEC", "matiere": "Math"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(start["requested"], 10);
    assert_eq!(start["returned"], 10);
}

#[tokio::test]
async fn history_is_newest_first() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    seed_question(&pool, "HEC", "Math", "Question", 1, "published").await;

    let token = register_and_login(&client, &address, "history_user").await;

    let mut started = Vec::new();
    for _ in 0..2 {
        let start: serde_json::Value = client
            .post(&format!("{}/api/quiz/start", address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({"school": "HEC", "matiere": "Math", "count": 1}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        started.push(start["attempt_id"].as_i64().unwrap());
    }

    // Act
    let history: Vec<serde_json::Value> = client
        .get(&format!("{}/api/quiz/attempts", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Assert
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["id"].as_i64().unwrap(), started[1]);
    assert_eq!(history[1]["id"].as_i64().unwrap(), started[0]);
}

#[tokio::test]
async fn public_filters_cover_published_questions_only() {
    // Arrange
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    seed_question(&pool, "HEC", "Math", "Question 1", 1, "published").await;
    seed_question(&pool, "HEC", "Math", "Question 2", 1, "published").await;
    seed_question(&pool, "ESSEC", "Physics", "Hidden draft", 1, "draft").await;

    // Act + Assert: facet listing
    let filters: serde_json::Value = client
        .get(&format!("{}/api/quiz/filters", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(filters["schools"], serde_json::json!(["HEC"]));
    assert_eq!(filters["matieres"], serde_json::json!(["Math"]));
    assert_eq!(filters["chapters"], serde_json::json!(["Ch1"]));
    assert_eq!(filters["difficulties"], serde_json::json!(["medium"]));

    // Startable combinations with counts
    let options: Vec<serde_json::Value> = client
        .get(&format!("{}/api/quiz/options", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(options.len(), 1);
    assert_eq!(options[0]["school"], "HEC");
    assert_eq!(options[0]["matiere"], "Math");
    assert_eq!(options[0]["question_count"], 2);

    // Matieres per school
    let matieres: Vec<String> = client
        .get(&format!("{}/api/quiz/matieres?school=HEC", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(matieres, vec!["Math".to_string()]);

    let none: Vec<String> = client
        .get(&format!("{}/api/quiz/matieres?school=ESSEC", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(none.is_empty());

    // Counts, including an unknown pair
    let count: serde_json::Value = client
        .get(&format!("{}/api/quiz/count?school=HEC&matiere=Math", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(count["count"], 2);

    let zero: serde_json::Value = client
        .get(&format!("{}/api/quiz/count?school=Nope&matiere=Nada", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(zero["count"], 0);
}
