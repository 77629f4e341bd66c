// src/submission.rs

//! Quiz submission: grade, credit the user, record the result.
//!
//! The Users update and the Results append are two independent atomic
//! writes. When the append fails, the user's gamification record is put back
//! (if nothing else touched it since) so a failed submission leaves both
//! collections as they were. A process crash between the two writes can
//! still leave points credited without a ledger entry.

use thiserror::Error;

use crate::gamification;
use crate::ledger::{self, Entry};
use crate::models::quiz::{PublicQuiz, Quiz};
use crate::scoring::{self, Answers, QuestionReview};
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("quiz {0} not found")]
    QuizNotFound(String),

    /// The authenticated caller has no user record.
    #[error("user {0} not found")]
    UserNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the submitter gets back.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub score: u64,
    pub correct_count: u64,
    pub total_questions: u64,
    /// The user's full badge list after this submission.
    pub badges: Vec<String>,
    pub new_badge: Option<String>,
    pub feedback: Vec<QuestionReview>,
}

/// Grades and records one submission by `user_id`, who must already be
/// authenticated.
pub async fn submit(
    store: &DocumentStore,
    quiz_id: &str,
    user_id: &str,
    answers: &Answers,
    time_spent: Option<u64>,
) -> Result<SubmissionOutcome, SubmissionError> {
    let quiz = find_quiz(store, quiz_id)
        .await?
        .ok_or_else(|| SubmissionError::QuizNotFound(quiz_id.to_string()))?;

    let outcome = scoring::score(&quiz, answers);
    let award = gamification::award(store, user_id, &quiz.title, &outcome).await?;

    let entry = Entry {
        user_id,
        quiz_id,
        outcome,
        time_spent,
    };
    if let Err(err) = ledger::append(store, entry).await {
        tracing::warn!(user_id, quiz_id, "Ledger append failed, reverting award: {}", err);
        match gamification::revert(store, user_id, &award).await {
            Ok(true) => {}
            Ok(false) => tracing::error!(
                user_id,
                quiz_id,
                "User record changed before revert; award kept without ledger entry"
            ),
            Err(revert_err) => tracing::error!(
                user_id,
                quiz_id,
                "Failed to revert award: {}",
                revert_err
            ),
        }
        return Err(err.into());
    }

    tracing::info!(
        user_id,
        quiz_id,
        points = outcome.points_awarded,
        "Awarded {} pts",
        outcome.points_awarded
    );

    Ok(SubmissionOutcome {
        score: outcome.points_awarded,
        correct_count: outcome.correct_count,
        total_questions: outcome.total_questions,
        badges: award.after.badges,
        new_badge: award.new_badge,
        feedback: scoring::review(&quiz, answers),
    })
}

/// All quizzes with every answer key removed.
pub async fn list_quizzes(store: &DocumentStore) -> Result<Vec<PublicQuiz>, StoreError> {
    let quizzes: Vec<Quiz> = store.read().await?;
    Ok(quizzes.iter().map(Quiz::to_public).collect())
}

/// A single quiz with its answer key removed.
pub async fn public_quiz(store: &DocumentStore, quiz_id: &str) -> Result<Option<PublicQuiz>, StoreError> {
    Ok(find_quiz(store, quiz_id).await?.as_ref().map(Quiz::to_public))
}

async fn find_quiz(store: &DocumentStore, quiz_id: &str) -> Result<Option<Quiz>, StoreError> {
    let quizzes: Vec<Quiz> = store.read().await?;
    Ok(quizzes.into_iter().find(|q| q.id == quiz_id))
}
