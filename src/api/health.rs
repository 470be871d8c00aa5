use axum::Json;
use serde_json::{Value, json};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "library-desk",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
