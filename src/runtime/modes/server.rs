//! Server mode
//!
//! Configures and starts the HTTP server with all device routes.

use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::api::middleware::RequestIdMiddleware;
use crate::api::services::{AppStartTime, configure_routes};
use crate::config::get_config;
use crate::runtime::lifetime;

const MAX_WORKERS: usize = 32;

/// Run the HTTP server
///
/// Reads the configuration stored by [`crate::config::init_config`].
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = get_config();
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup(&config)
        .await
        .inspect_err(|e| error!("Server startup failed: {:#}", e))?;
    let service = startup.service;

    let workers = config.server.workers.clamp(1, MAX_WORKERS);
    warn!("Using {} workers for the server", workers);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .configure(configure_routes)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .client_request_timeout(std::time::Duration::from_millis(5000))
    .client_disconnect_timeout(std::time::Duration::from_millis(1000))
    .workers(workers)
    .disable_signals()
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    warn!("Server listening at http://{}", bind_address);

    let handle = server.handle();
    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            handle.stop(true).await;
            warn!("Graceful shutdown: server stopped");
        }
    }

    Ok(())
}
