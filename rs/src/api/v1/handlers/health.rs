/*
 * Responsibility
 * - GET /health (疎通用)
 * - token pipeline の外側 (token middleware を通さない)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
