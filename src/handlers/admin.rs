// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        quiz::{CreateQuizRequest, Question, Quiz, QuizOption},
        user::{CreateUserRequest, PublicUser, Role, UpdateRoleRequest, User},
    },
    handlers::auth::{insert_user, new_user},
    store::DocumentStore,
    utils::{hash::hash_password, html::clean_text, jwt::Claims},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(store): State<DocumentStore>) -> Result<impl IntoResponse, AppError> {
    let users: Vec<User> = store.read().await?;
    let public: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    Ok(Json(public))
}

/// Creates an account with the given role (student by default).
/// Admin only.
pub async fn create_user(
    State(store): State<DocumentStore>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let role = match payload.role.as_deref() {
        None => Role::Student,
        Some(name) => Role::from_name(name)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid role '{}'", name)))?,
    };

    let hashed_password = hash_password(&payload.password)?;
    let mut user = new_user(payload.email.trim().to_string(), hashed_password, role);
    user.username = payload
        .name
        .as_deref()
        .map(clean_text)
        .filter(|name| !name.trim().is_empty());

    let created = insert_user(&store, user).await?;
    tracing::info!("Admin created {} {}", created.role.as_str(), created.email);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User created successfully",
            "user": created,
        })),
    ))
}

/// Changes a user's role.
/// Admin only. Admins cannot change their own role.
pub async fn update_user_role(
    State(store): State<DocumentStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.sub {
        return Err(AppError::BadRequest("Cannot change your own role".to_string()));
    }

    let updated = store
        .update(|users: &mut Vec<User>| -> Result<PublicUser, AppError> {
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(AppError::NotFound("User not found".to_string()))?;
            user.role = payload.role;
            Ok(PublicUser::from(&*user))
        })
        .await?;

    tracing::info!("Role of user {} set to {}", id, payload.role.as_str());
    Ok(Json(updated))
}

/// Builds a stored quiz from an authoring request, stripping markup from
/// every piece of display text.
fn quiz_from_request(req: CreateQuizRequest) -> Result<Quiz, AppError> {
    let title = clean_text(&req.title);
    if title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must contain text".to_string()));
    }

    let questions = req
        .questions
        .into_iter()
        .map(|q| Question {
            id: q.id,
            text: clean_text(&q.text),
            options: q
                .options
                .into_iter()
                .map(|o| QuizOption {
                    id: o.id,
                    text: clean_text(&o.text),
                    extra: Default::default(),
                })
                .collect(),
            correct_option_id: q.correct_option_id,
            explanation: q.explanation.as_deref().map(clean_text),
            extra: Default::default(),
        })
        .collect();

    Ok(Quiz {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        description: clean_text(&req.description),
        questions,
        points: req.points,
        extra: Default::default(),
    })
}

/// Creates a new quiz.
/// Admin only.
pub async fn create_quiz(
    State(store): State<DocumentStore>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let quiz = quiz_from_request(payload)?;
    let id = quiz.id.clone();

    store
        .update(|quizzes: &mut Vec<Quiz>| {
            quizzes.push(quiz);
            Ok::<_, AppError>(())
        })
        .await?;

    tracing::info!("Quiz {} created", id);
    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Deletes a quiz by ID. Ledger entries that reference it are kept.
/// Admin only.
pub async fn delete_quiz(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    store
        .update(|quizzes: &mut Vec<Quiz>| {
            let before = quizzes.len();
            quizzes.retain(|q| q.id != id);
            if quizzes.len() == before {
                return Err(AppError::NotFound("Quiz not found".to_string()));
            }
            Ok(())
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
