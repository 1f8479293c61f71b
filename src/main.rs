// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shelfwise API Server
//!
//! Serves the book summary and business plan catalog, user libraries,
//! checkout and the admin panel from an in-memory store.

use shelfwise::{
    config::Config,
    db::{MemoryDb, Seed},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Shelfwise API");

    // Seed the in-memory store
    tracing::info!(path = %config.catalog_path, "Loading catalog");
    let seed = Seed::load_from_file(&config.catalog_path)?;
    let db = MemoryDb::from_seed(seed);
    tracing::info!(
        books = db.list_books().len(),
        business_plans = db.list_business_plans().len(),
        users = db.list_users().len(),
        "Catalog loaded"
    );

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db));

    // Build router
    let app = shelfwise::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shelfwise=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
