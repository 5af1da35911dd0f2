//! Application initialization: database, storage, services, routes.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;
pub mod telemetry;

use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use parley_core::Config;
use std::sync::Arc;

/// Initialize the application and return the shared state plus the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    config.validate()?;

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let state = services::initialize_services(&config, pool, storage)?;
    let router = routes::build_router(state.clone());

    Ok((state, router))
}
