use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::AppError;
use crate::gallery::GalleryCache;
use crate::generator::CreatureGenerator;
use crate::images::ImageStore;
use crate::store::CreatureStore;

/// Shared application state passed to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CreatureStore>,
    pub gallery: Arc<GalleryCache>,
    pub images: Arc<dyn ImageStore>,
    pub generator: Arc<dyn CreatureGenerator>,
    /// Server-side Gemini key used when a request brings none
    pub default_api_key: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Pick the request's Gemini key, falling back to the configured one
    pub fn resolve_api_key(&self, requested: Option<&str>) -> Result<String, AppError> {
        requested
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or(self.default_api_key.as_deref())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("gemini_api_key is required".into()))
    }
}
