use std::env;
use std::path::PathBuf;

use crate::constants::DEFAULT_GALLERY_TTL_SECS;

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub run_migrations: bool,
    pub cors_origins: Vec<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_text_model: String,
    pub gemini_image_model: String,
    pub image_dir: PathBuf,
    pub image_url_prefix: String,
    pub gallery_cache_ttl_secs: u64,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let port = var("PORT").and_then(|p| p.parse().ok()).unwrap_or(3001);

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/aimon".to_string());

        let run_migrations = var("RUN_MIGRATIONS")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let cors_origins = var("CORS_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let gemini_api_key = var("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        let gemini_base_url = var("GEMINI_BASE_URL")
            .unwrap_or_else(|| gemini_client::GeminiClient::DEFAULT_BASE_URL.to_string());

        let gemini_text_model =
            var("GEMINI_TEXT_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string());

        let gemini_image_model =
            var("GEMINI_IMAGE_MODEL").unwrap_or_else(|| "gemini-2.5-flash-image".to_string());

        let image_dir = var("IMAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/images"));

        let image_url_prefix = var("IMAGE_URL_PREFIX")
            .map(|p| format!("/{}", p.trim_matches('/')))
            .filter(|p| p.len() > 1)
            .unwrap_or_else(|| "/images".to_string());

        let gallery_cache_ttl_secs = var("GALLERY_CACHE_TTL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_GALLERY_TTL_SECS);

        Self {
            port,
            database_url,
            run_migrations,
            cors_origins,
            gemini_api_key,
            gemini_base_url,
            gemini_text_model,
            gemini_image_model,
            image_dir,
            image_url_prefix,
            gallery_cache_ttl_secs,
        }
    }
}
