// Meetbrief API server
// Decision: PostgreSQL when DATABASE_URL is set, in-memory otherwise (dev mode)

use anyhow::{Context, Result};
use meetbrief_api::auth::AuthConfig;
use meetbrief_api::{build_app, AppConfig, AppServices};
use meetbrief_storage::StorageBackend;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "meetbrief_api=debug,meetbrief_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("meetbrief-api starting...");

    let config = AppConfig::from_env();

    // Initialize database
    let db = match &config.database_url {
        Some(database_url) => {
            let db = StorageBackend::postgres(database_url)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await?;
            tracing::info!("Connected to database");
            db
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            StorageBackend::in_memory()
        }
    };
    let db = Arc::new(db);

    // Load authentication configuration
    let auth_config = AuthConfig::from_env();
    if auth_config.oauth_enabled() {
        tracing::info!("Google sign-in configured");
    } else {
        tracing::warn!("AUTH_GOOGLE_CLIENT_ID/SECRET not set, nobody can sign in");
    }

    if !config.api_prefix.is_empty() {
        tracing::info!(prefix = %config.api_prefix, "API prefix configured");
    }

    if config.cors_allowed_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?config.cors_allowed_origins, "CORS origins configured");
    }

    let services = AppServices::from_config(&config, auth_config, db)?;
    let app = build_app(services, &config.api_prefix, &config.cors_allowed_origins);

    // Start HTTP server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
