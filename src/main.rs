// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spots API Server
//!
//! Serves audio stories pinned to places: upload, transcription,
//! translation, nearby search, profiles and journeys.

use spots_backend::{config::Config, db::FirestoreDb, services::StorageService, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Spots API");

    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let storage = StorageService::new(&config.storage_base_url);
    tracing::info!(base_url = %config.storage_base_url, "Object storage configured");

    if config.lingo_api_key.is_empty() || config.assemblyai_api_key.is_empty() {
        tracing::warn!("Translation or title API key missing; those routes will fail");
    }

    let state = Arc::new(AppState::new(config.clone(), db, storage));
    let app = spots_backend::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spots_backend=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
