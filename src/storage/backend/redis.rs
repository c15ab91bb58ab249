//! Redis 存储后端
//!
//! 数据布局：
//! - `<prefix>device:<id>`：hash，字段见 [`crate::storage::models`]
//! - `<prefix>os:<osName>`：该 OS 下的设备 id 集合
//! - `<prefix>fp:<fingerprint>`：该指纹下的设备 id 集合

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, error, trace, warn};

use crate::config::RedisConfig;
use crate::domain::{DeviceProfile, UserAgent};
use crate::errors::{DeviceMatcherError, Result};
use crate::storage::DeviceProfileRepository;
use crate::storage::models::{self, HIT_COUNT};

/// 键存在时 HINCRBY，否则返回 nil，整个过程在服务端原子执行
const INCREMENT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
    return redis.call('HINCRBY', KEYS[1], ARGV[1], 1)
end
return false
"#;

pub struct RedisRepository {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
    timeout: Duration,
    max_records: usize,
    increment_script: redis::Script,
}

impl RedisRepository {
    pub fn new(config: &RedisConfig, timeout: Duration, max_records: usize) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            DeviceMatcherError::config(format!("Invalid Redis URL '{}': {}", config.url, e))
        })?;

        debug!(
            "RedisRepository created with prefix: '{}', timeout: {:?}",
            config.key_prefix, timeout
        );

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: config.key_prefix.clone(),
            timeout,
            max_records,
            increment_script: redis::Script::new(INCREMENT_SCRIPT),
        })
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> redis::RedisResult<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    /// 在超时限制内执行一次 Redis 调用，失败时重置连接
    async fn run<T, F, Fut>(&self, operation: &str, call: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let attempt = async {
            let conn = self.get_connection().await?;
            call(conn).await
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Redis {} failed: {}", operation, e);
                self.reset_connection().await;
                Err(DeviceMatcherError::from(e).with_context(operation))
            }
            Err(elapsed) => {
                warn!("Redis {} timed out after {:?}", operation, self.timeout);
                self.reset_connection().await;
                Err(DeviceMatcherError::from(elapsed).with_context(operation))
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn device_key(&self, device_id: &str) -> String {
        self.make_key(&format!("device:{}", device_id))
    }

    fn os_key(&self, os_name: &str) -> String {
        self.make_key(&format!("os:{}", os_name))
    }

    fn fingerprint_key(&self, user_agent: &UserAgent) -> String {
        self.make_key(&format!("fp:{}", user_agent.fingerprint()))
    }

    /// 批量读取设备 hash，跳过索引中已失效的 id
    async fn load_many(&self, operation: &str, ids: &[String]) -> Result<Vec<DeviceProfile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in ids {
            pipe.hgetall(self.device_key(id));
        }

        let hashes: Vec<HashMap<String, String>> = self
            .run(operation, move |mut conn| async move {
                pipe.query_async(&mut conn).await
            })
            .await?;

        let mut profiles = Vec::with_capacity(hashes.len());
        for (id, fields) in ids.iter().zip(hashes.iter()) {
            match models::from_fields(fields)? {
                Some(profile) => profiles.push(profile),
                None => trace!("Stale index entry for device {}", id),
            }
        }
        Ok(profiles)
    }
}

#[async_trait]
impl DeviceProfileRepository for RedisRepository {
    async fn find_by_id(&self, device_id: &str) -> Result<Option<DeviceProfile>> {
        let key = self.device_key(device_id);
        let fields: HashMap<String, String> = self
            .run("find_by_id", move |mut conn| async move {
                conn.hgetall(key).await
            })
            .await?;
        models::from_fields(&fields)
    }

    async fn find_by_user_agent(&self, user_agent: &UserAgent) -> Result<Vec<DeviceProfile>> {
        let key = self.fingerprint_key(user_agent);
        let mut ids: Vec<String> = self
            .run("find_by_user_agent", move |mut conn| async move {
                conn.smembers(key).await
            })
            .await?;
        ids.sort();

        // 逐个尝试，跳过失效 id，最多返回一个
        for id in ids {
            let found = self
                .load_many("find_by_user_agent", std::slice::from_ref(&id))
                .await?;
            if let Some(profile) = found.into_iter().next() {
                return Ok(vec![profile]);
            }
        }
        Ok(Vec::new())
    }

    async fn find_by_os_name(&self, os_name: &str) -> Result<Vec<DeviceProfile>> {
        let key = self.os_key(os_name);
        let mut ids: Vec<String> = self
            .run("find_by_os_name", move |mut conn| async move {
                conn.smembers(key).await
            })
            .await?;
        ids.sort();
        ids.truncate(self.max_records);

        self.load_many("find_by_os_name", &ids).await
    }

    async fn persist(&self, profile: &DeviceProfile) -> Result<()> {
        let previous = self.find_by_id(profile.device_id()).await?;

        let device_key = self.device_key(profile.device_id());
        let os_key = self.os_key(profile.user_agent().os_name());
        let fp_key = self.fingerprint_key(profile.user_agent());
        let device_id = profile.device_id().to_string();

        let mut pipe = redis::pipe();
        pipe.atomic();

        // 指纹变化时先移除旧索引
        if let Some(old) = previous {
            let old_os_key = self.os_key(old.user_agent().os_name());
            let old_fp_key = self.fingerprint_key(old.user_agent());
            if old_os_key != os_key {
                pipe.srem(old_os_key, &device_id).ignore();
            }
            if old_fp_key != fp_key {
                pipe.srem(old_fp_key, &device_id).ignore();
            }
        }

        pipe.hset_multiple(&device_key, &models::to_fields(profile))
            .ignore()
            .sadd(os_key, &device_id)
            .ignore()
            .sadd(fp_key, &device_id)
            .ignore();

        let _: () = self
            .run("persist", move |mut conn| async move {
                pipe.query_async(&mut conn).await
            })
            .await?;

        trace!("Persisted device {}", device_id);
        Ok(())
    }

    async fn delete_by_id(&self, device_id: &str) -> Result<()> {
        let Some(existing) = self.find_by_id(device_id).await? else {
            trace!("Delete of absent device {} is a no-op", device_id);
            return Ok(());
        };

        let mut pipe = redis::pipe();
        pipe.atomic()
            .del(self.device_key(device_id))
            .ignore()
            .srem(self.os_key(existing.user_agent().os_name()), device_id)
            .ignore()
            .srem(self.fingerprint_key(existing.user_agent()), device_id)
            .ignore();

        self.run("delete_by_id", move |mut conn| async move {
            pipe.query_async(&mut conn).await
        })
        .await
    }

    async fn increment_hit_count(&self, device_id: &str) -> Result<u64> {
        let key = self.device_key(device_id);
        let script = self.increment_script.clone();

        let value: Option<i64> = self
            .run("increment_hit_count", move |mut conn| async move {
                script.key(key).arg(HIT_COUNT).invoke_async(&mut conn).await
            })
            .await?;

        match value {
            Some(count) => u64::try_from(count).map_err(|_| {
                DeviceMatcherError::storage(format!(
                    "Negative hit count {} for device {}",
                    count, device_id
                ))
            }),
            None => Err(DeviceMatcherError::not_found(format!(
                "Device not found: {}",
                device_id
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<()> {
        let response: String = self
            .run("ping", |mut conn| async move {
                redis::cmd("PING").query_async(&mut conn).await
            })
            .await?;
        trace!("Redis ping: {}", response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SemVersion;

    fn repository() -> RedisRepository {
        let config = RedisConfig {
            url: "redis://127.0.0.1:6379/".to_string(),
            key_prefix: "dm-test:".to_string(),
        };
        RedisRepository::new(&config, Duration::from_millis(50), 10).unwrap()
    }

    #[test]
    fn test_key_layout() {
        let repo = repository();
        let ua = UserAgent::new(
            "Windows 10",
            SemVersion::new(10, 0, 0),
            "Chrome",
            SemVersion::new(120, 0, 0),
        )
        .unwrap();

        assert_eq!(repo.device_key("abc"), "dm-test:device:abc");
        assert_eq!(repo.os_key("windows 10"), "dm-test:os:windows 10");
        assert_eq!(
            repo.fingerprint_key(&ua),
            "dm-test:fp:windows 10|10.0.0|chrome|120.0.0"
        );
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let config = RedisConfig {
            url: "not a url".to_string(),
            key_prefix: String::new(),
        };
        let err = RedisRepository::new(&config, Duration::from_millis(50), 10)
            .err()
            .unwrap();
        assert!(matches!(err, DeviceMatcherError::Config(_)));
    }
}
