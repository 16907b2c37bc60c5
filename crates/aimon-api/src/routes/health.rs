use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0);

    Json(json!({
        "ok": true,
        "uptime_secs": uptime_secs,
        "cache": state.gallery.stats(),
    }))
}
