//! API 帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;
use tracing::{error, warn};

use crate::errors::DeviceMatcherError;

use super::types::ApiErrorResponse;

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(body)
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    json_response(
        status,
        &ApiErrorResponse {
            status: status.as_u16(),
            error: error.to_string(),
            message: message.into(),
        },
    )
}

/// 从 DeviceMatcherError 构建错误响应，4xx 记 warn，5xx 记 error
pub fn error_from_domain(err: &DeviceMatcherError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("Request failed [{}]: {}", err.code(), err);
    } else {
        warn!("Request rejected [{}]: {}", err.code(), err);
    }
    error_response(status, err.error_type(), err.message())
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 `status` + JSON 数据，失败时按错误映射状态码。
pub fn api_result<T: Serialize>(
    status: StatusCode,
    result: Result<T, DeviceMatcherError>,
) -> HttpResponse {
    match result {
        Ok(data) => json_response(status, &data),
        Err(e) => error_from_domain(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_rt::test]
    async fn test_error_body_shape() {
        let err = DeviceMatcherError::validation("User-Agent cannot be null or empty");
        let resp = error_from_domain(&err);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["error"], "Validation Error");
        assert_eq!(json["message"], "User-Agent cannot be null or empty");
    }
}
