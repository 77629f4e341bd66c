// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, profile, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, leaderboard, progress, profile, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (document store and config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/submit", post(quiz::submit_quiz))
        .layer(auth_layer.clone());

    let member_routes = Router::new()
        .route("/api/leaderboard", get(quiz::get_leaderboard))
        .route("/api/progress", get(profile::get_progress))
        .route("/api/profile/me", get(profile::get_me))
        .layer(auth_layer.clone());

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route("/quizzes", post(admin::create_quiz))
        .route("/quizzes/{id}", delete(admin::delete_quiz))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth_layer);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/admin", admin_routes)
        .merge(member_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
