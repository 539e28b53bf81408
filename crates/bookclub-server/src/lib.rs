//! Bookclub Server Library
//!
//! Club membership roles and realtime club chat, exposed for testing and
//! embedding.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod ws;

use anyhow::Result;

/// Create and configure the server application
pub async fn create_app(config: state::Config) -> Result<(axum::Router, sqlx::SqlitePool)> {
    let db_pool = db::init_pool(&config.database_url, config.db_timeout).await?;
    db::run_migrations(&db_pool).await?;
    let app_state = state::AppState::new(config, db_pool.clone());
    let router = api::create_router(app_state);
    Ok((router, db_pool))
}
