// src/lib.rs

pub mod config;
pub mod error;
pub mod gamification;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod normalizer;
pub mod routes;
pub mod scoring;
pub mod state;
pub mod store;
pub mod submission;
pub mod utils;

pub use routes::create_router;
