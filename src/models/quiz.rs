// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::config::DEFAULT_QUIZ_POINTS;

/// A selectable answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A question together with its answer key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<QuizOption>,

    /// Answer key. Only the scoring path may read this.
    pub correct_option_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Represents an entry of the quizzes collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,

    /// Reward for a perfect submission. Older records
    /// call this `points_reward`.
    #[serde(
        default,
        alias = "pointsReward",
        alias = "points_reward",
        skip_serializing_if = "Option::is_none"
    )]
    pub points: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Quiz {
    pub fn max_points(&self) -> u64 {
        self.points.unwrap_or(DEFAULT_QUIZ_POINTS)
    }

    /// Strips every answer key before the quiz leaves the core.
    pub fn to_public(&self) -> PublicQuiz {
        PublicQuiz {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            points: self.max_points(),
            questions: self
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id.clone(),
                    text: q.text.clone(),
                    options: q
                        .options
                        .iter()
                        .map(|o| PublicOption {
                            id: o.id.clone(),
                            text: o.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
            extra: self.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicOption {
    pub id: String,
    pub text: String,
}

/// DTO for sending a question to a client (no answer key, no explanation).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<PublicOption>,
}

/// DTO for sending a quiz to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: String,
    pub title: String,
    pub description: String,
    pub points: u64,
    pub questions: Vec<PublicQuestion>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 50))]
    pub id: String,
    #[validate(length(min = 1, max = 500))]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_answer_key))]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 50))]
    pub id: String,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(length(min = 2), nested)]
    pub options: Vec<CreateOptionRequest>,
    pub correct_option_id: String,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

/// DTO for an admin authoring a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
    #[validate(range(min = 1, max = 10000))]
    pub points: Option<u64>,
}

fn validate_answer_key(question: &CreateQuestionRequest) -> Result<(), validator::ValidationError> {
    if !question
        .options
        .iter()
        .any(|o| o.id == question.correct_option_id)
    {
        return Err(validator::ValidationError::new("correct_option_not_in_options"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Quiz {
        serde_json::from_value(serde_json::json!({
            "id": "q1",
            "title": "Intro",
            "description": "Basics",
            "timeLimit": 300,
            "questions": [{
                "id": "a",
                "text": "2 + 2?",
                "options": [{"id": "x", "text": "3"}, {"id": "y", "text": "4"}],
                "correctOptionId": "y",
                "explanation": "Arithmetic."
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_points_default_when_absent() {
        assert_eq!(sample().max_points(), DEFAULT_QUIZ_POINTS);
    }

    #[test]
    fn test_points_reward_alias() {
        let quiz: Quiz = serde_json::from_value(serde_json::json!({
            "id": "q2",
            "title": "Legacy",
            "questions": [],
            "points_reward": 40
        }))
        .unwrap();
        assert_eq!(quiz.max_points(), 40);
        assert_eq!(quiz.description, "");
    }

    #[test]
    fn test_public_quiz_has_no_answer_key() {
        let public = serde_json::to_value(sample().to_public()).unwrap();
        let text = public.to_string();
        assert!(!text.contains("correctOptionId"));
        assert!(!text.contains("Arithmetic."));
        // Unknown top-level fields still reach the client.
        assert_eq!(public["timeLimit"], 300);
        assert_eq!(public["questions"][0]["options"][1]["text"], "4");
    }

    #[test]
    fn test_create_question_requires_known_answer() {
        let req = CreateQuestionRequest {
            id: "a".to_string(),
            text: "Pick".to_string(),
            options: vec![
                CreateOptionRequest { id: "x".to_string(), text: "X".to_string() },
                CreateOptionRequest { id: "y".to_string(), text: "Y".to_string() },
            ],
            correct_option_id: "z".to_string(),
            explanation: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_create_quiz_validates_nested_options() {
        let mut req: CreateQuizRequest = serde_json::from_value(serde_json::json!({
            "title": "Cells",
            "questions": [{
                "id": "1",
                "text": "Powerhouse?",
                "options": [{"id": "a", "text": "Mitochondria"}, {"id": "b", "text": "Golgi"}],
                "correctOptionId": "a"
            }]
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        req.questions[0].options[1].text = String::new();
        assert!(req.validate().is_err());

        req.questions[0].options.truncate(1);
        assert!(req.validate().is_err());
    }
}
