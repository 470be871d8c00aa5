// Server module - router assembly and HTTP listener

use axum::Router;
use axum::http::HeaderValue;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api;
use crate::api_docs::ApiDoc;
use crate::infrastructure::AppState;

/// CORS layer for the browser client. No configured origin means any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let mut origins = Vec::new();
    for origin in allowed_origins {
        match origin.parse::<HeaderValue>() {
            Ok(v) => origins.push(v),
            Err(e) => tracing::error!("Failed to parse CORS origin '{}': {}", origin, e),
        }
    }
    cors.allow_origin(origins)
}

/// Build the application router with database connection
pub fn build_router(db: DatabaseConnection, allowed_origins: &[String]) -> Router {
    let state = AppState::new(db);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api::api_router(state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process stops
pub async fn serve(app: Router, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Library Desk server listening on {}", addr);

    axum::serve(listener, app).await
}
