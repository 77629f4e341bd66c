// src/ledger.rs

//! Append-only ledger of quiz submissions (the Results collection).
//! Entries are created here and nowhere else, and are never updated or removed.

use chrono::{DateTime, Utc};

use crate::models::result::QuizResult;
use crate::scoring::ScoreOutcome;
use crate::store::{DocumentStore, StoreError};

/// Everything needed to record one submission.
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    pub user_id: &'a str,
    pub quiz_id: &'a str,
    pub outcome: ScoreOutcome,
    pub time_spent: Option<u64>,
}

/// Appends one result. Retakes always produce a new entry.
pub async fn append(store: &DocumentStore, entry: Entry<'_>) -> Result<QuizResult, StoreError> {
    store
        .update(|results: &mut Vec<QuizResult>| {
            let completed_at = Utc::now();
            let result = QuizResult {
                id: next_id(results, completed_at).to_string(),
                user_id: entry.user_id.to_string(),
                quiz_id: entry.quiz_id.to_string(),
                score: entry.outcome.points_awarded,
                correct_count: entry.outcome.correct_count,
                total_questions: entry.outcome.total_questions,
                completed_at,
                time_spent: entry.time_spent,
            };
            results.push(result.clone());
            Ok(result)
        })
        .await
}

/// Millisecond timestamp of `now`, moved past the largest numeric id already
/// present so ids stay unique and increasing within the ledger.
fn next_id(results: &[QuizResult], now: DateTime<Utc>) -> u64 {
    let candidate = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let newest = results
        .iter()
        .filter_map(|r| r.id.parse::<u64>().ok())
        .max();

    match newest {
        Some(newest) if newest >= candidate => newest + 1,
        _ => candidate,
    }
}

/// Entries belonging to `user_id`, newest first.
pub fn for_user(results: &[QuizResult], user_id: &str) -> Vec<QuizResult> {
    let mut mine: Vec<QuizResult> = results
        .iter()
        .filter(|r| r.user_id == user_id)
        .cloned()
        .collect();
    mine.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    mine
}
