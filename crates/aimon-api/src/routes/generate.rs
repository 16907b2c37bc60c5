use aimon_db::{Creature, NewCreature};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use ts_rs::TS;

use crate::constants::DOODLE_SOURCE_MAX_CHARS;
use crate::error::AppError;
use crate::images::decode_base64_image;
use crate::state::AppState;

#[derive(Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GenerateRequest {
    #[ts(optional)]
    doodle_data: Option<String>,
    #[ts(optional)]
    gemini_api_key: Option<String>,
}

pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Creature>, AppError> {
    let Json(body) = body?;

    let doodle_data = body
        .doodle_data
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("doodle_data is required".into()))?;
    let doodle = decode_base64_image(&doodle_data)?;
    let api_key = state.resolve_api_key(body.gemini_api_key.as_deref())?;

    let generated = state.generator.generate_creature(&api_key, &doodle).await?;
    let image_url = state.images.save(&generated.image).await?;

    let params = NewCreature {
        creature_type: generated.type_label(),
        name: generated.name,
        powers: generated.powers,
        characteristics: generated.characteristics,
        image_url,
        doodle_source: truncate_chars(&doodle_data, DOODLE_SOURCE_MAX_CHARS),
    };
    let creature = state.store.insert(&params).await?;

    info!(id = creature.id, name = %creature.name, "Created creature");

    state.gallery.record_created(&creature).await;

    Ok(Json(creature))
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
