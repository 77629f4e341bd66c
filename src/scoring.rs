// src/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::quiz::Quiz;

/// Submitted answers. Key: question id. Value: chosen option id.
pub type Answers = HashMap<String, String>;

/// Result of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    pub correct_count: u64,
    pub total_questions: u64,
    pub points_awarded: u64,
}

impl ScoreOutcome {
    /// Every question answered correctly. A quiz without questions never
    /// counts as perfect.
    pub fn is_perfect(&self) -> bool {
        self.total_questions > 0 && self.correct_count == self.total_questions
    }
}

/// Per-question feedback returned to the submitter after grading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    pub question_id: String,
    pub chosen_option_id: Option<String>,
    pub correct_option_id: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Grades `answers` against the quiz's answer key.
///
/// Unanswered questions count as incorrect, answers to unknown question ids
/// are ignored. `points_awarded` is `correct / total * max_points` rounded
/// half up, and 0 for a quiz without questions.
pub fn score(quiz: &Quiz, answers: &Answers) -> ScoreOutcome {
    let total_questions = quiz.questions.len() as u64;
    let correct_count = quiz
        .questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_option_id))
        .count() as u64;

    ScoreOutcome {
        correct_count,
        total_questions,
        points_awarded: award_points(correct_count, total_questions, quiz.max_points()),
    }
}

/// Integer form of `round(correct / total * max)`, exact for every input.
fn award_points(correct: u64, total: u64, max: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let numerator = 2 * correct as u128 * max as u128 + total as u128;
    (numerator / (2 * total as u128)) as u64
}

/// Question-by-question feedback in quiz order.
pub fn review(quiz: &Quiz, answers: &Answers) -> Vec<QuestionReview> {
    quiz.questions
        .iter()
        .map(|q| {
            let chosen = answers.get(&q.id).cloned();
            QuestionReview {
                question_id: q.id.clone(),
                is_correct: chosen.as_deref() == Some(q.correct_option_id.as_str()),
                chosen_option_id: chosen,
                correct_option_id: q.correct_option_id.clone(),
                explanation: q.explanation.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiz(title: &str, keys: &[&str], points: Option<u64>) -> Quiz {
        let questions: Vec<_> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                json!({
                    "id": format!("q{i}"),
                    "text": format!("Question {i}"),
                    "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}],
                    "correctOptionId": key
                })
            })
            .collect();
        let mut value = json!({"id": title, "title": title, "questions": questions});
        if let Some(points) = points {
            value["points"] = json!(points);
        }
        serde_json::from_value(value).unwrap()
    }

    fn answers(pairs: &[(&str, &str)]) -> Answers {
        pairs
            .iter()
            .map(|(q, a)| (q.to_string(), a.to_string()))
            .collect()
    }

    #[test]
    fn test_three_of_four() {
        let q1 = quiz("Q1", &["a", "a", "b", "b"], Some(100));
        let out = score(&q1, &answers(&[("q0", "a"), ("q1", "a"), ("q2", "b"), ("q3", "a")]));
        assert_eq!(
            out,
            ScoreOutcome { correct_count: 3, total_questions: 4, points_awarded: 75 }
        );
        assert!(!out.is_perfect());
    }

    #[test]
    fn test_perfect_score() {
        let q1 = quiz("Q1", &["a", "a", "b", "b"], Some(100));
        let out = score(&q1, &answers(&[("q0", "a"), ("q1", "a"), ("q2", "b"), ("q3", "b")]));
        assert_eq!(out.points_awarded, 100);
        assert!(out.is_perfect());
    }

    #[test]
    fn test_missing_answers_are_incorrect() {
        let q = quiz("Q", &["a", "b"], Some(50));
        let out = score(&q, &answers(&[("q1", "b"), ("unknown", "a")]));
        assert_eq!(out.correct_count, 1);
        assert_eq!(out.points_awarded, 25);
    }

    #[test]
    fn test_default_points() {
        let q = quiz("Q", &["a", "a"], None);
        let out = score(&q, &answers(&[("q0", "a")]));
        assert_eq!(out.points_awarded, 50);
    }

    #[test]
    fn test_rounds_half_up() {
        // 1/8 of 100 = 12.5
        let q = quiz("Q", &["a"; 8], Some(100));
        let out = score(&q, &answers(&[("q0", "a")]));
        assert_eq!(out.points_awarded, 13);

        // 1/3 of 100 = 33.33.., 2/3 of 100 = 66.66..
        let q = quiz("Q", &["a"; 3], Some(100));
        assert_eq!(score(&q, &answers(&[("q0", "a")])).points_awarded, 33);
        assert_eq!(score(&q, &answers(&[("q0", "a"), ("q1", "a")])).points_awarded, 67);
    }

    #[test]
    fn test_zero_questions() {
        let q = quiz("Empty", &[], Some(100));
        let out = score(&q, &answers(&[("q0", "a")]));
        assert_eq!(
            out,
            ScoreOutcome { correct_count: 0, total_questions: 0, points_awarded: 0 }
        );
        assert!(!out.is_perfect());
    }

    #[test]
    fn test_score_is_deterministic() {
        let q = quiz("Q", &["a", "b", "a", "b", "a"], Some(70));
        let given = answers(&[("q0", "a"), ("q1", "a"), ("q4", "a")]);
        let first = score(&q, &given);
        for _ in 0..50 {
            assert_eq!(score(&q, &given), first);
        }
    }

    #[test]
    fn test_review_marks_each_question() {
        let q = quiz("Q", &["a", "b"], None);
        let reviews = review(&q, &answers(&[("q0", "a")]));
        assert_eq!(reviews.len(), 2);
        assert!(reviews[0].is_correct);
        assert!(!reviews[1].is_correct);
        assert_eq!(reviews[1].chosen_option_id, None);
        assert_eq!(reviews[1].correct_option_id, "b");
    }
}
