// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Smallest number of questions a quiz may request.
pub const MIN_QUIZ_QUESTIONS: i64 = 1;

/// Largest number of questions a quiz may request.
pub const MAX_QUIZ_QUESTIONS: i64 = 50;

/// Question count used when a start request leaves `count` out.
pub const DEFAULT_QUIZ_QUESTIONS: i64 = 10;

/// Threshold used by the attempt statistics to classify a submitted
/// attempt as passed.
pub const PASSING_SCORE_PERCENTAGE: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Optional seed credentials for the initial admin account.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
        }
    }
}
