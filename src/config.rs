// src/config.rs

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;

/// Reward for a perfect submission when a quiz does not declare one.
pub const DEFAULT_QUIZ_POINTS: u64 = 100;

/// Number of entries returned by the leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// Number of ledger entries shown as recent activity on the progress view.
pub const RECENT_ACTIVITY_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the collection files.
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        Self {
            data_dir,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}
