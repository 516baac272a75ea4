//! 健康检查处理器

use axum::Json;
use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// 健康检查
pub async fn health_check() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "no-store, no-cache, max-age=0")],
        Json(HealthStatus { status: "ok" }),
    )
}
