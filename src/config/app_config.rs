//! # 应用配置结构定义

use serde::{Deserialize, Serialize};

use crate::cache::RedisConfig;

/// 应用总配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// 上游 42 API 配置
    #[serde(default)]
    pub ftapi: FtApiConfig,
}

/// HTTP 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 是否启用CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    /// 请求超时时间（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// 速率限制配置
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: true,
            request_timeout: default_request_timeout(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// 速率限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// 是否启用速率限制
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 单个时间窗口内允许的最大请求数
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// 时间窗口长度（秒）
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// 进程内缓存
    Memory,
    /// Redis 缓存
    Redis,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 缓存后端类型
    #[serde(default = "default_cache_type")]
    pub cache_type: CacheType,
    /// 内存缓存容量预算（字节，按值长度计费）
    #[serde(default = "default_memory_max_capacity")]
    pub memory_max_capacity: u64,
    /// Redis 配置（cache_type 为 redis 时必填）
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            memory_max_capacity: default_memory_max_capacity(),
            redis: None,
        }
    }
}

/// 上游 42 API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtApiConfig {
    /// intra API 基础地址
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// intra CDN 基础地址
    #[serde(default = "default_cdn_base_url")]
    pub cdn_base_url: String,
    /// OAuth 客户端ID（可由 FT_CLIENT_ID 环境变量覆盖）
    #[serde(default)]
    pub client_id: String,
    /// OAuth 客户端密钥（可由 FT_CLIENT_SECRET 环境变量覆盖）
    #[serde(default)]
    pub client_secret: String,
    /// 上游请求超时时间（秒）
    #[serde(default = "default_upstream_timeout")]
    pub request_timeout: u64,
}

impl Default for FtApiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            cdn_base_url: default_cdn_base_url(),
            client_id: String::new(),
            client_secret: String::new(),
            request_timeout: default_upstream_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

const fn default_true() -> bool {
    true
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_requests() -> u32 {
    20
}

const fn default_window_secs() -> u64 {
    60
}

const fn default_cache_type() -> CacheType {
    CacheType::Memory
}

// 与上游头像体积匹配的 100 MiB 预算
const fn default_memory_max_capacity() -> u64 {
    100 << 20
}

fn default_api_base_url() -> String {
    "https://api.intra.42.fr/v2".to_string()
}

fn default_cdn_base_url() -> String {
    "https://cdn.intra.42.fr".to_string()
}

const fn default_upstream_timeout() -> u64 {
    10
}
