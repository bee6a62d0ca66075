use axum::{routing::get, Router};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::websocket::websocket_handler;

use super::handlers::{get_stats, health_check, ping, AppState};
use super::openapi::ApiDoc;

/// Create the API router with Swagger UI and WebSocket support
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // WebSocket ping endpoint
        .route("/ws", get(websocket_handler))
        // Ping endpoint, unversioned path kept for the browser client
        .route("/api/ping", get(ping))
        .route("/api/v1/ping", get(ping))
        // Health endpoints (legacy + versioned, same payload)
        .route("/health", get(health_check))
        .route("/api/v1/health", get(health_check))
        // Prober statistics
        .route("/api/v1/stats", get(get_stats))
        .with_state(state)
}
