// src/models/result.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::scoring::{Answers, QuestionReview};

/// Represents an entry of the results ledger.
/// Written once per submission and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    /// Millisecond timestamp, bumped past the newest existing id when needed.
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub score: u64,
    pub correct_count: u64,
    pub total_questions: u64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub completed_at: DateTime<Utc>,
    /// Seconds spent on the attempt, when the client reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u64>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    /// Key: question id. Value: chosen option id, `null` when skipped.
    #[serde(default)]
    pub answers: Option<HashMap<String, Option<String>>>,
    pub time_spent: Option<u64>,
}

impl SubmitQuizRequest {
    /// The answers actually given. Skipped questions are left out and grade
    /// as incorrect.
    pub fn given_answers(&self) -> Answers {
        self.answers
            .iter()
            .flatten()
            .filter_map(|(question, chosen)| Some((question.clone(), chosen.clone()?)))
            .collect()
    }
}

/// Response body of a quiz submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub message: String,
    pub score: u64,
    pub correct_count: u64,
    pub total_questions: u64,
    pub badges: Vec<String>,
    pub feedback: Vec<QuestionReview>,
}

/// One row of the points leaderboard.
#[derive(Debug, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    pub id: String,
    pub email: String,
    pub points: u64,
    /// Number of badges held.
    pub badges: usize,
}

/// Per-user progress aggregated from the ledger.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub total_points: u64,
    pub completed_quizzes: usize,
    pub total_quizzes: usize,
    pub completion_percentage: u64,
    pub average_score: u64,
    pub total_time_spent: u64,
    pub recent_activity: Vec<QuizResult>,
    pub total_badges: usize,
}
