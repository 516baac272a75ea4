//! # 缓存后端契约与 Redis 实现
//!
//! 后端只负责字符串键值的读写；单键未命中表示为 `Ok(None)`，
//! 批量读取逐键可缺失，批量写入整体成败。

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Deserialize, Serialize};

use crate::error::{BadgeError, Result};

/// 缓存条目：与后端交换的最小单位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// 命名空间键字符串
    pub key: String,
    /// 值
    pub value: String,
    /// 本条目的存活时间
    pub ttl: Duration,
}

/// 缓存后端契约
///
/// 实现必须可被多个并发请求同时使用；单条命令各自原子，
/// 调用方取消时请求随 future 一起丢弃，不做内部重试。
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// 读取单个键；未命中返回 `Ok(None)`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 批量读取；返回值与入参等长同序，逐键独立缺失
    async fn bulk_get(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    /// 批量写入；每个条目携带各自的 TTL，一次往返完成
    async fn bulk_set(&self, entries: &[CacheEntry]) -> Result<()>;
}

/// Redis 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedisConfig {
    /// 完整连接 URL（优先于分项配置，可由 REDIS_URL 环境变量注入）
    #[serde(default)]
    pub url: Option<String>,
    /// Redis 服务器地址
    #[serde(default = "default_redis_host")]
    pub host: String,
    /// Redis 服务器端口
    #[serde(default = "default_redis_port")]
    pub port: u16,
    /// 数据库编号
    #[serde(default)]
    pub database: u8,
    /// 连接密码（可选）
    #[serde(default)]
    pub password: Option<String>,
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_redis_port() -> u16 {
    6379
}

impl RedisConfig {
    /// 构建 Redis 连接 URL
    #[must_use]
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        if let Some(password) = &self.password {
            format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.database
            )
        } else {
            format!("redis://{}:{}/{}", self.host, self.port, self.database)
        }
    }
}

/// Redis 缓存后端
///
/// TTL 过期由服务端负责，容量由远端服务约束，本地不做淘汰。
pub struct RedisCache {
    /// Redis 连接管理器
    connection_manager: ConnectionManager,
}

impl RedisCache {
    /// 创建新的 Redis 缓存后端
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        tracing::info!("正在连接 Redis 服务器: {}:{}", config.host, config.port);

        let client = Client::open(config.connection_url())
            .map_err(|e| BadgeError::cache_with_source("创建 Redis 客户端失败", e))?;

        let connection_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| BadgeError::cache_with_source("建立 Redis 连接失败", e))?;

        tracing::info!("Redis 连接建立成功");

        Ok(Self { connection_manager })
    }
}

#[async_trait]
impl CacheProvider for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection_manager.clone();

        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| BadgeError::cache_with_source(format!("获取缓存失败: {key}"), e))?;

        tracing::debug!(key, hit = value.is_some(), "Redis GET");
        Ok(value)
    }

    async fn bulk_get(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection_manager.clone();

        // MGET 对单个键也返回数组，显式走 cmd 保证结果形状稳定
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| BadgeError::cache_with_source(format!("批量获取缓存失败: {keys:?}"), e))?;

        tracing::debug!(requested = keys.len(), "Redis MGET");
        Ok(values)
    }

    async fn bulk_set(&self, entries: &[CacheEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection_manager.clone();

        let mut pipeline = redis::pipe();
        for entry in entries {
            // SETEX 不接受 0 秒，最低按 1 秒写入
            pipeline
                .set_ex(&entry.key, &entry.value, entry.ttl.as_secs().max(1))
                .ignore();
        }

        pipeline
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| BadgeError::cache_with_source("批量写入缓存失败", e))?;

        tracing::debug!(written = entries.len(), "Redis pipeline SETEX");
        Ok(())
    }
}
