// src/gamification.rs

use crate::models::user::{Gamification, User};
use crate::scoring::ScoreOutcome;
use crate::store::{DocumentStore, StoreError};
use crate::submission::SubmissionError;

/// Badge awarded for a perfect submission of the quiz titled `quiz_title`.
pub fn badge_name(quiz_title: &str) -> String {
    format!("Master of {quiz_title}")
}

/// Applies one graded submission to a gamification record.
///
/// Points grow by the awarded amount and the streak by one. A perfect
/// submission adds the quiz badge unless it is already held. Returns the
/// badge when it was newly added.
pub fn apply(gamification: &mut Gamification, outcome: &ScoreOutcome, quiz_title: &str) -> Option<String> {
    gamification.points = gamification.points.saturating_add(outcome.points_awarded);
    gamification.streak = gamification.streak.saturating_add(1);

    if outcome.is_perfect() {
        let badge = badge_name(quiz_title);
        if gamification.add_badge(badge.clone()) {
            return Some(badge);
        }
    }
    None
}

/// State of a user's gamification record around one award.
#[derive(Debug, Clone, PartialEq)]
pub struct Award {
    pub before: Gamification,
    pub after: Gamification,
    pub new_badge: Option<String>,
}

/// Credits a submission to the user with id `user_id` and persists the
/// Users collection. Nothing is written when the user does not exist.
pub async fn award(
    store: &DocumentStore,
    user_id: &str,
    quiz_title: &str,
    outcome: &ScoreOutcome,
) -> Result<Award, SubmissionError> {
    store
        .update(|users: &mut Vec<User>| {
            let user = users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or_else(|| SubmissionError::UserNotFound(user_id.to_string()))?;

            let before = user.gamification.clone();
            let new_badge = apply(&mut user.gamification, outcome, quiz_title);
            Ok(Award {
                before,
                after: user.gamification.clone(),
                new_badge,
            })
        })
        .await
}

/// Puts back `award.before` for the user, provided the record still holds
/// exactly `award.after`. Returns whether the rollback was applied; a record
/// that changed in the meantime is left alone.
pub async fn revert(store: &DocumentStore, user_id: &str, award: &Award) -> Result<bool, StoreError> {
    store
        .update(|users: &mut Vec<User>| {
            match users.iter_mut().find(|u| u.id == user_id) {
                Some(user) if user.gamification == award.after => {
                    user.gamification = award.before.clone();
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
        .await
}
