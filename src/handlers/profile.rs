// src/handlers/profile.rs

use std::collections::HashSet;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    config::RECENT_ACTIVITY_SIZE,
    error::AppError,
    ledger,
    models::{
        quiz::Quiz,
        result::{ProgressResponse, QuizResult},
        user::{PublicUser, User},
    },
    store::DocumentStore,
    utils::jwt::Claims,
};

/// Get current user's profile, including gamification state.
pub async fn get_me(
    State(store): State<DocumentStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = store.read().await?;
    let me = users
        .iter()
        .find(|u| u.id == claims.sub)
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicUser::from(me)))
}

/// Progress of the current user, aggregated from the results ledger.
pub async fn get_progress(
    State(store): State<DocumentStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results: Vec<QuizResult> = store.read().await?;
    let quizzes: Vec<Quiz> = store.read().await?;

    Ok(Json(build_progress(&results, &claims.sub, quizzes.len())))
}

/// Score at or above which an entry counts towards `total_badges`.
const BADGE_SCORE: u64 = 100;

fn build_progress(results: &[QuizResult], user_id: &str, total_quizzes: usize) -> ProgressResponse {
    let mine = ledger::for_user(results, user_id);

    let total_points: u64 = mine.iter().map(|r| r.score).sum();
    let completed_quizzes = mine
        .iter()
        .map(|r| r.quiz_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let average_score = rounded_ratio(total_points, mine.len() as u64);
    let completion_percentage = rounded_ratio(completed_quizzes as u64 * 100, total_quizzes.max(1) as u64);

    ProgressResponse {
        total_points,
        completed_quizzes,
        total_quizzes,
        completion_percentage,
        average_score,
        total_time_spent: mine.iter().filter_map(|r| r.time_spent).sum(),
        total_badges: mine.iter().filter(|r| r.score >= BADGE_SCORE).count(),
        recent_activity: mine.into_iter().take(RECENT_ACTIVITY_SIZE).collect(),
    }
}

/// `round(num / den)` half up; 0 when `den` is 0.
fn rounded_ratio(num: u64, den: u64) -> u64 {
    if den == 0 {
        return 0;
    }
    (2 * num + den) / (2 * den)
}
