use aimon_db::Creature;
use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

pub async fn get_gallery(State(state): State<AppState>) -> Result<Json<Vec<Creature>>, AppError> {
    let creatures = state.gallery.list(state.store.as_ref()).await?;
    Ok(Json(creatures))
}
