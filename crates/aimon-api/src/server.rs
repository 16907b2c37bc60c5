//! HTTP router and listener

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use tracing::info;

use crate::constants::MAX_BODY_BYTES;
use crate::routes;
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/gallery", get(routes::gallery::get_gallery))
        .route("/api/generate", post(routes::generate::generate))
        .route("/api/aimon/{id}/like", patch(routes::aimon::like))
        .route(
            "/api/aimon/{id}/action-image",
            post(routes::aimon::action_image),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(app: Router, port: u16) -> std::io::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, app).await
}
