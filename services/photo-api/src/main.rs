use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod controllers;
mod error;
mod identity;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod storage;
mod visibility;

#[cfg(test)]
mod test_support;

use auth::JwtService;
use common::{
    database::{health_check, init_pool},
    error::DatabaseError,
};
use tokio::net::TcpListener;

use crate::{
    config::AppConfig,
    repositories::{PgPhotoRepository, PgUserRepository},
    state::AppState,
    storage::PhotoStorage,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting photo API service");

    let config = AppConfig::load()?;

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    info!("Database migrations applied");

    // Prepare the photo root
    let storage = PhotoStorage::new(&config.server.photo_dir);
    tokio::fs::create_dir_all(storage.root()).await?;

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone())?);
    let app_state = AppState::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgPhotoRepository::new(pool)),
        storage.clone(),
        jwt_service,
    );

    // Start the web server
    let app = routes::create_router(app_state, &storage, config.server.max_upload_bytes);

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Photo API listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
