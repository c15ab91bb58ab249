use actix_web::web;

pub mod devices;
pub mod health;
pub mod helpers;
pub mod types;

pub use devices::device_routes;
pub use health::{AppStartTime, HealthService, health_routes};

/// 注册全部路由（服务器与测试共用）
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_routes()).service(device_routes());
}
