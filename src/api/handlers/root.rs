use axum::{Json, response::IntoResponse};
use serde_json::json;

// Undocumented banner route; useful for quick smoke checks.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
