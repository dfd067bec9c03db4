mod api;
mod websocket;

use crate::console::Console;
use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Builds the HTTP and producer WebSocket routes.
pub fn router(console: Arc<Console>) -> Router {
    let api_router = Router::new()
        .route("/api/entries", get(api::get_entries))
        .route("/api/counts", get(api::get_counts))
        .route("/api/alerts", get(api::get_alerts))
        .route("/api/state", get(api::get_state))
        .route("/api/current-tool", put(api::set_current_tool))
        .route("/api/levels/default", put(api::set_default_level))
        .route(
            "/api/levels/:tool",
            put(api::set_tool_level).delete(api::clear_tool_level),
        )
        .route("/api/filter", put(api::set_filter).delete(api::clear_filter))
        .route("/api/tools/:tool/entries", post(api::post_entries))
        .route("/api/session/reset", post(api::reset_session))
        .route("/api/capacity", put(api::set_capacity));

    let ws_router = Router::new().route("/ws/producer", get(websocket::producer_ws_handler));

    Router::new()
        .merge(api_router)
        .merge(ws_router)
        .with_state(console)
        .layer(CorsLayer::permissive())
}

pub async fn start_server(console: Arc<Console>, port: u16) -> Result<()> {
    let app = router(console);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Log console listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
