// tests/api_tests.rs

use std::collections::HashMap;
use std::path::PathBuf;

use quizhub::{
    config::Config,
    models::{quiz::Quiz, result::QuizResult, user::User},
    routes,
    state::AppState,
    store::{Collection, DocumentStore},
};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345") and the store
/// backing it.
async fn spawn_app() -> (String, DocumentStore) {
    // Each test gets its own data directory.
    let data_dir = std::env::temp_dir().join(format!("quizhub-api-{}", uuid::Uuid::new_v4()));
    let store = DocumentStore::new(data_dir.clone());

    let config = Config {
        data_dir,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        store: store.clone(),
        config,
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, store)
}

fn data_dir(store: &DocumentStore) -> PathBuf {
    store.data_dir().to_path_buf()
}

async fn seed_quiz(store: &DocumentStore) {
    let quiz: Quiz = serde_json::from_value(serde_json::json!({
        "id": "Q1",
        "title": "Q1",
        "description": "Four equally weighted questions",
        "points": 100,
        "questions": [
            {"id": "1", "text": "one", "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}], "correctOptionId": "a"},
            {"id": "2", "text": "two", "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}], "correctOptionId": "b"},
            {"id": "3", "text": "three", "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}], "correctOptionId": "a"},
            {"id": "4", "text": "four", "options": [{"id": "a", "text": "A"}, {"id": "b", "text": "B"}], "correctOptionId": "b", "explanation": "B it is"}
        ]
    }))
    .unwrap();
    store.write(&[quiz]).await.unwrap();
}

/// Registers and logs in a fresh student. Returns (token, user id).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (String, String) {
    let email = format!("s_{}@school.test", &uuid::Uuid::new_v4().to_string()[..8]);
    let password = "password123";

    let register = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(register.status().as_u16(), 201);

    let login = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    let token = login["token"].as_str().expect("Token not found").to_string();
    let id = login["user"]["id"].as_str().expect("User id not found").to_string();
    (token, id)
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let (address, store) = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}

#[tokio::test]
async fn register_validation_and_duplicates() {
    let (address, store) = spawn_app().await;
    let client = reqwest::Client::new();

    let bad_email = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"email": "not-an-email", "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_email.status().as_u16(), 400);

    let short_password = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({"email": "a@school.test", "password": "123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(short_password.status().as_u16(), 400);

    for expected in [201, 409] {
        let response = client
            .post(&format!("{}/api/auth/register", address))
            .json(&serde_json::json!({"email": "dup@school.test", "password": "password123"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }

    let users: Vec<User> = store.read().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].gamification.level, 1);
    assert!(users[0].password_hash.as_deref().unwrap().starts_with("$argon2"));
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let (address, store) = spawn_app().await;
    let client = reqwest::Client::new();
    register_and_login(&client, &address).await;

    let users: Vec<User> = store.read().await.unwrap();
    let response = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": users[0].email, "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}

#[tokio::test]
async fn quiz_routes_require_token() {
    let (address, store) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/quizzes", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(&format!("{}/api/quizzes", address))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}

#[tokio::test]
async fn quiz_listing_hides_answer_keys() {
    let (address, store) = spawn_app().await;
    seed_quiz(&store).await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address).await;

    let body = client
        .get(&format!("{}/api/quizzes", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("\"Q1\""));
    assert!(!body.contains("correctOptionId"));
    assert!(!body.contains("B it is"));

    let single = client
        .get(&format!("{}/api/quizzes/Q1", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(single.status().as_u16(), 200);
    let quiz: serde_json::Value = single.json().await.unwrap();
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 4);
    assert!(quiz["questions"][0].get("correctOptionId").is_none());

    let missing = client
        .get(&format!("{}/api/quizzes/nope", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}

#[tokio::test]
async fn test_submission_flow() {
    // Arrange
    let (address, store) = spawn_app().await;
    seed_quiz(&store).await;
    let client = reqwest::Client::new();
    let (token, user_id) = register_and_login(&client, &address).await;

    // 1. Three of four correct: 75 points, no badge
    let mut answers = HashMap::new();
    answers.insert("1", "a");
    answers.insert("2", "b");
    answers.insert("3", "a");
    answers.insert("4", "a");

    let first: serde_json::Value = client
        .post(&format!("{}/api/quizzes/Q1/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": answers, "timeSpent": 90 }))
        .send()
        .await
        .expect("Submit failed")
        .json()
        .await
        .unwrap();

    assert_eq!(first["score"], 75);
    assert_eq!(first["correctCount"], 3);
    assert_eq!(first["totalQuestions"], 4);
    assert_eq!(first["badges"], serde_json::json!([]));
    assert_eq!(first["feedback"][3]["isCorrect"], false);
    assert_eq!(first["feedback"][3]["correctOptionId"], "b");

    // 2. All four correct: 100 points and the quiz badge
    answers.insert("4", "b");
    let second: serde_json::Value = client
        .post(&format!("{}/api/quizzes/Q1/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": answers }))
        .send()
        .await
        .expect("Submit failed")
        .json()
        .await
        .unwrap();

    assert_eq!(second["score"], 100);
    assert_eq!(second["badges"], serde_json::json!(["Master of Q1"]));

    // 3. Persisted state
    let users: Vec<User> = store.read().await.unwrap();
    let me = users.iter().find(|u| u.id == user_id).unwrap();
    assert_eq!(me.gamification.points, 175);
    assert_eq!(me.gamification.streak, 2);
    assert_eq!(me.gamification.badges, vec!["Master of Q1".to_string()]);

    let results: Vec<QuizResult> = store.read().await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].score, 100);
    assert_eq!(results[0].time_spent, Some(90));

    // 4. Read-only consumers
    let leaderboard: serde_json::Value = client
        .get(&format!("{}/api/leaderboard", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(leaderboard[0]["id"], user_id.as_str());
    assert_eq!(leaderboard[0]["points"], 175);
    assert_eq!(leaderboard[0]["badges"], 1);

    let progress: serde_json::Value = client
        .get(&format!("{}/api/progress", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(progress["totalPoints"], 175);
    assert_eq!(progress["completedQuizzes"], 1);
    assert_eq!(progress["completionPercentage"], 100);
    assert_eq!(progress["averageScore"], 88);
    assert_eq!(progress["totalTimeSpent"], 90);
    assert_eq!(progress["totalBadges"], 1);
    assert_eq!(progress["recentActivity"].as_array().unwrap().len(), 2);

    let me: serde_json::Value = client
        .get(&format!("{}/api/profile/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["gamification"]["points"], 175);
    assert!(me.get("passwordHash").is_none());
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}

#[tokio::test]
async fn skipped_answer_counts_as_incorrect() {
    let (address, store) = spawn_app().await;
    seed_quiz(&store).await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address).await;

    let response = client
        .post(&format!("{}/api/quizzes/Q1/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "answers": {"1": "a", "2": "b", "3": "a", "4": null}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["score"], 75);
    assert_eq!(body["correctCount"], 3);
    assert_eq!(body["feedback"][3]["chosenOptionId"], serde_json::Value::Null);
    assert_eq!(body["feedback"][3]["isCorrect"], false);
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}

#[tokio::test]
async fn submit_unknown_quiz_is_404_and_writes_nothing() {
    let (address, store) = spawn_app().await;
    seed_quiz(&store).await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address).await;
    let users_before = tokio::fs::read(store.path(Collection::Users)).await.unwrap();

    let response = client
        .post(&format!("{}/api/quizzes/missing/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    assert_eq!(tokio::fs::read(store.path(Collection::Users)).await.unwrap(), users_before);
    let results: Vec<QuizResult> = store.read().await.unwrap();
    assert!(results.is_empty());
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}

#[tokio::test]
async fn legacy_users_are_repaired_on_first_read() {
    let (address, store) = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &address).await;

    // Append a record written by an older version, straight to disk.
    let path = store.path(Collection::Users);
    let mut raw: Vec<serde_json::Value> =
        serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    raw.push(serde_json::json!({"id": "old-1", "username": "grace", "role": "user"}));
    tokio::fs::write(&path, serde_json::to_vec(&raw).unwrap()).await.unwrap();

    let leaderboard: Vec<serde_json::Value> = client
        .get(&format!("{}/api/leaderboard", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(leaderboard.iter().any(|e| e["email"] == "grace@example.com" && e["points"] == 0));

    let on_disk: Vec<serde_json::Value> =
        serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    let healed = on_disk.iter().find(|u| u["id"] == "old-1").unwrap();
    assert_eq!(
        healed["gamification"],
        serde_json::json!({"points": 0, "level": 1, "badges": [], "streak": 0})
    );
    assert_eq!(healed["email"], "grace@example.com");
    assert_eq!(healed["role"], "student");
    let _ = tokio::fs::remove_dir_all(data_dir(&store)).await;
}
