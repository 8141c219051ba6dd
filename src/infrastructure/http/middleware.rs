//! HTTP Middleware
//!
//! HTTP 状态码错误日志中间件

use axum::{extract::Request, middleware::Next, response::Response};

use super::extract::STUDENT_ID_HEADER;

/// HTTP 状态码错误日志中间件
///
/// 响应状态码为 4xx / 5xx 时记录方法、路径与学生标识，
/// 具体 errno 与错误信息在 `ApiError::into_response()` 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let student = request
        .headers()
        .get(STUDENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            student = %student,
            status = %status.as_u16(),
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            student = %student,
            status = %status.as_u16(),
            "HTTP client error"
        );
    }

    response
}
