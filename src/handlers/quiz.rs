// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    config::LEADERBOARD_SIZE,
    error::AppError,
    models::{
        result::{LeaderboardEntry, SubmitQuizRequest, SubmitQuizResponse},
        user::User,
    },
    store::DocumentStore,
    submission,
    utils::jwt::Claims,
};

/// Lists every quiz with the answer keys removed.
pub async fn list_quizzes(State(store): State<DocumentStore>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(submission::list_quizzes(&store).await?))
}

/// Returns one quiz with the answer keys removed.
pub async fn get_quiz(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = submission::public_quiz(&store, &id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Submits the caller's answers for a quiz.
///
/// * Grades the answers against the answer key.
/// * Credits points, streak and badge to the caller.
/// * Appends a ledger entry (retakes are recorded as new entries).
pub async fn submit_quiz(
    State(store): State<DocumentStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let answers = req.given_answers();
    let outcome = submission::submit(&store, &id, &claims.sub, &answers, req.time_spent).await?;

    Ok(Json(SubmitQuizResponse {
        message: "Quiz submitted".to_string(),
        score: outcome.score,
        correct_count: outcome.correct_count,
        total_questions: outcome.total_questions,
        badges: outcome.badges,
        feedback: outcome.feedback,
    }))
}

/// Top users by points.
pub async fn get_leaderboard(State(store): State<DocumentStore>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = store.read().await?;
    Ok(Json(build_leaderboard(&users, LEADERBOARD_SIZE)))
}

fn build_leaderboard(users: &[User], size: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = users
        .iter()
        .map(|u| LeaderboardEntry {
            id: u.id.clone(),
            email: u.email.clone(),
            points: u.gamification.points,
            badges: u.gamification.badges.len(),
        })
        .collect();

    // Stable sort keeps collection order among equal scores.
    entries.sort_by(|a, b| b.points.cmp(&a.points));
    entries.truncate(size);
    entries
}
