use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::errors::{DeviceMatcherError, Result};

/// 环境变量前缀，分隔符为 `__`，例如 `DM__SERVER__PORT=9090`
pub const ENV_PREFIX: &str = "DM";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Redis,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            _ => Err(format!(
                "Invalid storage backend: '{}'. Valid: memory, redis",
                s
            )),
        }
    }
}

/// User-Agent 解析策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParserStrategy {
    #[default]
    Woothee,
    Regex,
}

impl std::fmt::Display for ParserStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Woothee => write!(f, "woothee"),
            Self::Regex => write!(f, "regex"),
        }
    }
}

impl std::str::FromStr for ParserStrategy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "woothee" => Ok(Self::Woothee),
            "regex" => Ok(Self::Regex),
            _ => Err(format!(
                "Invalid parser strategy: '{}'. Valid: woothee, regex",
                s
            )),
        }
    }
}

/// 设备 ID 生成策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    #[default]
    UserAgent,
    Uuid,
}

impl std::fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserAgent => write!(f, "user-agent"),
            Self::Uuid => write!(f, "uuid"),
        }
    }
}

impl std::str::FromStr for IdStrategy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user-agent" => Ok(Self::UserAgent),
            "uuid" => Ok(Self::Uuid),
            _ => Err(format!(
                "Invalid id strategy: '{}'. Valid: user-agent, uuid",
                s
            )),
        }
    }
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量
/// - storage: 存储后端与 Redis 连接
/// - parser: User-Agent 解析策略
/// - matching: 设备 ID 生成策略
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > 配置文件 > 默认值。未指定路径时读取可选的
    /// `config.toml`；显式指定的路径必须存在。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::load_with_env(path, env)
    }

    pub(crate) fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let settings = Config::builder()
            // 1. 从 TOML 文件加载
            .add_source(file)
            // 2. 从环境变量覆盖
            .add_source(env)
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 启动前的配置校验
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(DeviceMatcherError::config("server.port must be non-zero"));
        }
        if self.storage.timeout_ms == 0 {
            return Err(DeviceMatcherError::config(
                "storage.timeout_ms must be greater than 0",
            ));
        }
        if self.storage.max_records == 0 {
            return Err(DeviceMatcherError::config(
                "storage.max_records must be greater than 0",
            ));
        }
        if self.storage.backend == StorageBackend::Redis && self.storage.redis.url.trim().is_empty()
        {
            return Err(DeviceMatcherError::config(
                "storage.redis.url is required when storage.backend = \"redis\"",
            ));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// 单次存储调用超时（毫秒）
    #[serde(default = "default_storage_timeout_ms")]
    pub timeout_ms: u64,
    /// 按 OS 名称查询时返回的最大记录数
    #[serde(default = "default_max_records")]
    pub max_records: usize,
    #[serde(default)]
    pub redis: RedisConfig,
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParserConfig {
    #[serde(default)]
    pub strategy: ParserStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MatchingConfig {
    #[serde(default)]
    pub id_strategy: IdStrategy,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_storage_timeout_ms() -> u64 {
    1000
}

fn default_max_records() -> usize {
    100
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "devicematcher:".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_workers(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            timeout_ms: default_storage_timeout_ms(),
            max_records: default_max_records(),
            redis: RedisConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(vars: &[(&str, &str)]) -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(
                vars.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ))
    }

    #[test]
    fn test_strategy_round_trip_through_str() {
        for s in ["memory", "redis"] {
            assert_eq!(s.parse::<StorageBackend>().unwrap().to_string(), s);
        }
        for s in ["woothee", "regex"] {
            assert_eq!(s.parse::<ParserStrategy>().unwrap().to_string(), s);
        }
        for s in ["user-agent", "uuid"] {
            assert_eq!(s.parse::<IdStrategy>().unwrap().to_string(), s);
        }
        assert!("aerospike".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_defaults_without_file() {
        let config = StaticConfig::load_with_env(None, env_with(&[])).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.parser.strategy, ParserStrategy::Woothee);
        assert_eq!(config.matching.id_strategy, IdStrategy::UserAgent);
    }

    #[test]
    fn test_env_overrides() {
        let env = env_with(&[
            ("DM__SERVER__PORT", "9090"),
            ("DM__PARSER__STRATEGY", "regex"),
            ("DM__STORAGE__MAX_RECORDS", "7"),
        ]);
        let config = StaticConfig::load_with_env(None, env).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.parser.strategy, ParserStrategy::Regex);
        assert_eq!(config.storage.max_records, 7);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = StaticConfig::default();
        config.storage.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DeviceMatcherError::Config(_)));
    }

    #[test]
    fn test_sample_config_parses_back() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.storage.redis.key_prefix, "devicematcher:");
        assert_eq!(parsed.logging.level, "info");
    }
}
