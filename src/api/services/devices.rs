//! `/v1/devices` handlers

use actix_web::http::StatusCode;
use actix_web::http::header::USER_AGENT;
use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use tracing::trace;

use crate::services::DeviceMatchingService;

use super::helpers::{api_result, error_from_domain, error_response, json_response};
use super::types::{DeviceProfileResponse, DeviceProfilesResponse};

pub const OS_NAME_HEADER: &str = "os-name";

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// POST /v1/devices，按 `User-Agent` 匹配或创建设备并计数
pub async fn match_device(
    req: HttpRequest,
    service: web::Data<Arc<DeviceMatchingService>>,
) -> HttpResponse {
    let user_agent = header_str(&req, USER_AGENT.as_str());
    trace!("API: match device for {:?}", user_agent);

    let result = service
        .match_device(user_agent)
        .await
        .map(|profile| DeviceProfileResponse::from(&profile));
    api_result(StatusCode::OK, result)
}

/// GET /v1/devices/{device_id}
pub async fn get_device(
    path: web::Path<String>,
    service: web::Data<Arc<DeviceMatchingService>>,
) -> HttpResponse {
    let device_id = path.into_inner();
    trace!("API: get device {}", device_id);

    match service.get_device_by_id(Some(&device_id)).await {
        Ok(Some(profile)) => json_response(StatusCode::OK, &DeviceProfileResponse::from(&profile)),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "Resource Not Found",
            format!("Device not found: {}", device_id),
        ),
        Err(e) => error_from_domain(&e),
    }
}

/// GET /v1/devices，按 `os-name` 请求头过滤
pub async fn get_devices_by_os(
    req: HttpRequest,
    service: web::Data<Arc<DeviceMatchingService>>,
) -> HttpResponse {
    let os_name = header_str(&req, OS_NAME_HEADER);
    trace!("API: list devices for os {:?}", os_name);

    match service.get_devices_by_os(os_name).await {
        Ok(devices) if devices.is_empty() => error_response(
            StatusCode::NOT_FOUND,
            "Resource Not Found",
            format!("No devices found for OS: {}", os_name.unwrap_or_default()),
        ),
        Ok(devices) => json_response(
            StatusCode::OK,
            &DeviceProfilesResponse {
                devices: devices.iter().map(DeviceProfileResponse::from).collect(),
            },
        ),
        Err(e) => error_from_domain(&e),
    }
}

/// DELETE /v1/devices/{device_id}，幂等
pub async fn delete_device(
    path: web::Path<String>,
    service: web::Data<Arc<DeviceMatchingService>>,
) -> HttpResponse {
    let device_id = path.into_inner();
    trace!("API: delete device {}", device_id);

    match service.delete_device_by_id(Some(&device_id)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_from_domain(&e),
    }
}

/// 设备路由 `/v1/devices`
///
/// - POST /v1/devices - 匹配设备
/// - GET /v1/devices - 按 OS 查询
/// - GET /v1/devices/{device_id} - 获取单个设备
/// - DELETE /v1/devices/{device_id} - 删除设备
pub fn device_routes() -> actix_web::Scope {
    web::scope("/v1/devices")
        .route("", web::post().to(match_device))
        .route("", web::get().to(get_devices_by_os))
        .route("/{device_id}", web::get().to(get_device))
        .route("/{device_id}", web::delete().to(delete_device))
}
