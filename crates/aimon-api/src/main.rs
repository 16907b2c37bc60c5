//! Aimon API - turns doodles into creatures and serves the gallery
//!
//! Doodles are sent to Gemini for metadata and artwork, stored in
//! PostgreSQL, and listed through a read-through gallery cache that is
//! patched in place on every write.

mod cache;
mod config;
mod constants;
mod error;
mod gallery;
mod generator;
mod images;
mod routes;
mod server;
mod state;
mod store;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::http::{header, Method};
use chrono::Utc;
use gemini_client::GeminiClient;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use cache::{MokaBackend, ReadThroughCache};
use config::Config;
use constants::CACHE_MAX_CAPACITY;
use gallery::GalleryCache;
use generator::GeminiGenerator;
use images::FsImageStore;
use state::AppState;
use store::PgCreatureStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::from_default_env().add_directive("aimon_api=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Config::from_env();
    info!(port = config.port, "Starting aimon-api");
    info!(
        ttl_secs = config.gallery_cache_ttl_secs,
        image_dir = ?config.image_dir,
        "Gallery cache and image storage configured"
    );

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        aimon_db::migrate::migrate(&pool).await?;
    }

    let images = FsImageStore::new(config.image_dir.clone(), &config.image_url_prefix);
    images.init().await?;

    let gallery = GalleryCache::new(
        ReadThroughCache::new(Arc::new(MokaBackend::new(CACHE_MAX_CAPACITY))),
        config.gallery_cache_ttl_secs,
    );

    let generator = GeminiGenerator::new(
        GeminiClient::with_base_url(&config.gemini_base_url),
        &config.gemini_text_model,
        &config.gemini_image_model,
    );

    if config.gemini_api_key.is_none() {
        info!("GEMINI_API_KEY not set; requests must supply gemini_api_key");
    }

    let state = AppState {
        store: Arc::new(PgCreatureStore::new(pool)),
        gallery: Arc::new(gallery),
        images: Arc::new(images),
        generator: Arc::new(generator),
        default_api_key: config.gemini_api_key.clone(),
        started_at: Utc::now(),
    };

    // CORS
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PATCH])
            .allow_headers([header::CONTENT_TYPE])
    };

    let app = server::create_router(state)
        .nest_service(&config.image_url_prefix, ServeDir::new(&config.image_dir))
        .layer(cors);

    server::start_server(app, config.port).await?;

    Ok(())
}
