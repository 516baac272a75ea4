//! # API 错误响应结构
//!
//! 统一的 JSON 错误信封；成功路径各自返回原生内容
//! （SVG 文档或 JSON），不做包装。

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BadgeError;

/// 标准错误信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// 标准错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for BadgeError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_http_response_parts();

        if status.is_server_error() {
            tracing::error!(error = ?self, "请求处理失败");
        } else {
            tracing::debug!(error = %self, "请求被拒绝");
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorInfo {
                code: code.to_string(),
                message: self.to_string(),
            },
            timestamp: Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}
