//! # 配置管理模块
//!
//! 处理应用配置加载、验证和环境变量覆盖

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, CacheType, FtApiConfig, RateLimitConfig, ServerConfig,
};

use std::env;
use std::path::Path;

use crate::error::{BadgeError, Result};

/// 加载配置文件
///
/// 按 `RUST_ENV`（默认 `dev`）选择 `config/config.{env}.toml`，
/// 然后应用环境变量覆盖。
pub fn load_config() -> Result<AppConfig> {
    let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    let config_file = format!("config/config.{env}.toml");

    if !Path::new(&config_file).exists() {
        return Err(BadgeError::config(format!("配置文件不存在: {config_file}")));
    }

    let config_content = std::fs::read_to_string(&config_file).map_err(|e| {
        BadgeError::config_with_source(format!("读取配置文件失败: {config_file}"), e)
    })?;

    let mut config: AppConfig = toml::from_str(&config_content).map_err(|e| {
        BadgeError::config_with_source(format!("解析配置文件失败: {config_file}"), e)
    })?;

    apply_env_overrides(&mut config);

    // 验证配置的有效性
    validate_config(&config)?;

    Ok(config)
}

/// 应用环境变量覆盖
///
/// 密钥类配置不落盘，统一从环境变量读取。
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(port) = env::var("PORT")
        && let Ok(port) = port.parse::<u16>()
    {
        config.server.port = port;
    }

    if let Ok(client_id) = env::var("FT_CLIENT_ID") {
        config.ftapi.client_id = client_id;
    }
    if let Ok(client_secret) = env::var("FT_CLIENT_SECRET") {
        config.ftapi.client_secret = client_secret;
    }

    if let Ok(redis_url) = env::var("REDIS_URL") {
        let redis = config.cache.redis.get_or_insert_with(Default::default);
        redis.url = Some(redis_url);
    }
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<()> {
    // 验证服务器配置
    if config.server.port == 0 {
        return Err(BadgeError::config(format!(
            "无效的服务器端口: {}",
            config.server.port
        )));
    }

    if config.server.rate_limit.enabled {
        if config.server.rate_limit.max_requests == 0 {
            return Err(BadgeError::config("速率限制请求数必须大于0"));
        }
        if config.server.rate_limit.window_secs == 0 {
            return Err(BadgeError::config("速率限制时间窗口必须大于0"));
        }
    }

    // 验证缓存配置
    match config.cache.cache_type {
        CacheType::Memory => {
            if config.cache.memory_max_capacity == 0 {
                return Err(BadgeError::config("内存缓存容量必须大于0"));
            }
        }
        CacheType::Redis => {
            if config.cache.redis.is_none() {
                return Err(BadgeError::config(
                    "cache_type 为 redis 时必须提供 Redis 配置",
                ));
            }
        }
    }

    // 验证上游API配置
    if config.ftapi.api_base_url.is_empty() {
        return Err(BadgeError::config("上游API基础地址不能为空"));
    }
    if config.ftapi.cdn_base_url.is_empty() {
        return Err(BadgeError::config("上游CDN基础地址不能为空"));
    }
    if config.ftapi.client_id.is_empty() || config.ftapi.client_secret.is_empty() {
        return Err(BadgeError::config(
            "OAuth 客户端凭据未配置（FT_CLIENT_ID / FT_CLIENT_SECRET）",
        ));
    }
    if config.ftapi.request_timeout == 0 {
        return Err(BadgeError::config("上游请求超时时间必须大于0"));
    }

    Ok(())
}
