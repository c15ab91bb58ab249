use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{IdStrategy, StaticConfig};
use crate::domain::{DeviceIdGenerator, UserAgentIdGenerator, UuidIdGenerator};
use crate::parser::build_parser;
use crate::services::DeviceMatchingService;
use crate::storage::StorageFactory;

pub struct StartupContext {
    pub service: Arc<DeviceMatchingService>,
}

pub fn build_id_generator(strategy: IdStrategy) -> Arc<dyn DeviceIdGenerator> {
    match strategy {
        IdStrategy::UserAgent => Arc::new(UserAgentIdGenerator),
        IdStrategy::Uuid => Arc::new(UuidIdGenerator),
    }
}

/// 准备服务器启动的上下文：存储、解析器、ID 生成器
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let repository = StorageFactory::create(&config.storage)
        .await
        .context("Failed to create storage backend")?;

    let parser = build_parser(config.parser.strategy);
    let id_generator = build_id_generator(config.matching.id_strategy);

    let service = Arc::new(DeviceMatchingService::new(parser, repository, id_generator));

    info!(
        "Startup ready in {:?} | backend={} parser={} idStrategy={}",
        start_time.elapsed(),
        service.backend_name(),
        service.parser_name(),
        config.matching.id_strategy
    );

    Ok(StartupContext { service })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SemVersion, UserAgent};

    #[test]
    fn test_build_id_generator() {
        let ua = UserAgent::new(
            "linux",
            SemVersion::new(1, 0, 0),
            "firefox",
            SemVersion::new(1, 0, 0),
        )
        .unwrap();
        assert!(build_id_generator(IdStrategy::UserAgent).new_id(&ua).starts_with("linux-"));
        assert!(uuid::Uuid::parse_str(&build_id_generator(IdStrategy::Uuid).new_id(&ua)).is_ok());
    }

    #[tokio::test]
    async fn test_prepare_with_memory_backend() {
        let startup = prepare_server_startup(&StaticConfig::default()).await.unwrap();
        assert_eq!(startup.service.backend_name(), "memory");
        assert_eq!(startup.service.parser_name(), "woothee");
    }
}
