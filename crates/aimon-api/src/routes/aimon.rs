use aimon_db::Creature;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::error::AppError;
use crate::state::AppState;

pub async fn like(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Creature>, AppError> {
    let Path(id) = id?;
    let creature = state
        .store
        .like(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Aimon not found".into()))?;

    state.gallery.record_updated(&creature).await;

    Ok(Json(creature))
}

#[derive(Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionImageRequest {
    #[ts(optional)]
    power: Option<String>,
    #[serde(default)]
    force: bool,
    #[ts(optional)]
    gemini_api_key: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionImageResponse {
    pub image_url: String,
    pub cached: bool,
}

pub async fn action_image(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<ActionImageRequest>, JsonRejection>,
) -> Result<Json<ActionImageResponse>, AppError> {
    let Path(id) = id?;
    let Json(body) = body?;

    let power_name = body
        .power
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("power is required".into()))?;

    let creature = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Aimon not found".into()))?;

    let power = creature
        .power(&power_name)
        .cloned()
        .ok_or_else(|| AppError::BadRequest(format!("Unknown power: {power_name}")))?;

    if !body.force {
        if let Some(existing) = creature.action_image(&power.name) {
            return Ok(Json(ActionImageResponse {
                image_url: existing.to_string(),
                cached: true,
            }));
        }
    }

    let api_key = state.resolve_api_key(body.gemini_api_key.as_deref())?;

    let reference = match state.images.load(&creature.image_url).await {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(id, error = %e, "Creature image unavailable, generating without reference");
            None
        }
    };

    let image = state
        .generator
        .generate_action_image(&api_key, &creature, &power, reference.as_ref())
        .await?;
    let image_url = state.images.save(&image).await?;

    let updated = state
        .store
        .set_action_image(id, &power.name, &image_url)
        .await?
        .ok_or_else(|| AppError::NotFound("Aimon not found".into()))?;

    info!(id, power = %power.name, "Generated action image");

    state.gallery.record_updated(&updated).await;

    Ok(Json(ActionImageResponse {
        image_url,
        cached: false,
    }))
}
