// src/main.rs

use std::net::SocketAddr;

use dotenvy::dotenv;
use quizhub::config::Config;
use quizhub::handlers::auth::seed_admin;
use quizhub::routes;
use quizhub::state::AppState;
use quizhub::store::DocumentStore;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Create missing collection files and repair legacy users up front
    let store = DocumentStore::new(config.data_dir.clone());
    store
        .bootstrap()
        .await
        .expect("Failed to open data directory");
    tracing::info!("Data directory ready: {}", store.data_dir().display());

    // Seed Admin User
    if let Err(e) = seed_admin(&store, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Create AppState
    let state = AppState {
        store,
        config,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
