use crate::state::SharedState;
use axum::{extract::State, response::IntoResponse, response::Json};
use serde_json::json;

const SERVICE_NAME: &str = "rembg-api";

pub async fn info(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.model_name(),
        "endpoints": {
            "/health": "GET - Health check",
            "/remove-background": "POST - Remove background (multipart/form-data with image file)",
        },
    }))
}
