// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{Gamification, LoginRequest, PublicUser, RegisterRequest, Role, User},
    store::DocumentStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

pub(crate) fn new_user(email: String, password_hash: String, role: Role) -> User {
    User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        username: None,
        password_hash: Some(password_hash),
        role,
        gamification: Gamification::default(),
        created_at: Some(Utc::now()),
        extra: Default::default(),
    }
}

/// Appends `user` unless its email is already registered.
pub(crate) async fn insert_user(store: &DocumentStore, user: User) -> Result<PublicUser, AppError> {
    store
        .update(|users: &mut Vec<User>| {
            if users.iter().any(|u| u.email == user.email) {
                return Err(AppError::Conflict(format!(
                    "Email '{}' already registered",
                    user.email
                )));
            }
            let public = PublicUser::from(&user);
            users.push(user);
            Ok(public)
        })
        .await
}

/// Registers a new student.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the public user view.
pub async fn register(
    State(store): State<DocumentStore>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let user = insert_user(
        &store,
        new_user(payload.email.trim().to_string(), hashed_password, Role::Student),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "user": user,
        })),
    ))
}

/// Authenticates a user by email and password and returns a JWT token.
pub async fn login(
    State(store): State<DocumentStore>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let users: Vec<User> = store.read().await?;
    let email = payload.email.trim();

    // Same message for unknown email and wrong password.
    let user = users
        .iter()
        .find(|u| u.email == email)
        .filter(|u| verify_password(&payload.password, u.password_hash.as_deref()))
        .ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

    let token = sign_jwt(user, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": PublicUser::from(user),
    })))
}

/// Creates the configured admin account on start-up if no user has its email.
pub async fn seed_admin(store: &DocumentStore, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    let users: Vec<User> = store.read().await?;
    if users.iter().any(|u| &u.email == email) {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", email);
    let hashed_password = hash_password(password)?;
    match insert_user(store, new_user(email.clone(), hashed_password, Role::Admin)).await {
        Ok(_) => {
            tracing::info!("Admin user created successfully.");
            Ok(())
        }
        // Created concurrently between the check and the insert.
        Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
