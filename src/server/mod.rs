//! # HTTP 服务器
//!
//! Axum 路由组装、共享应用状态与服务生命周期

pub mod middleware;
pub mod response;

pub use middleware::RateLimiter;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cache::{CacheProvider, MemoryCache, RedisCache};
use crate::config::{AppConfig, CacheType};
use crate::error::{BadgeError, Result};
use crate::ftapi::FtClient;
use crate::handlers;

/// 共享应用状态
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Arc<AppConfig>,
    /// 缓存后端，供每个请求创建自己的缓存管理器
    pub cache: Arc<dyn CacheProvider>,
    /// 上游 42 API 客户端
    pub ft_client: Arc<FtClient>,
    /// 速率限制器
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// 用注入的缓存后端构建应用状态（测试也走这条路径）
    pub fn with_provider(config: AppConfig, cache: Arc<dyn CacheProvider>) -> Result<Self> {
        let ft_client = FtClient::new(config.ftapi.clone())?;
        let rate_limiter = RateLimiter::new(config.server.rate_limit.clone());

        Ok(Self {
            config: Arc::new(config),
            cache,
            ft_client: Arc::new(ft_client),
            rate_limiter: Arc::new(rate_limiter),
        })
    }
}

/// 按配置构建缓存后端并组装应用状态
pub async fn build_state(config: AppConfig) -> Result<AppState> {
    let cache: Arc<dyn CacheProvider> = match config.cache.cache_type {
        CacheType::Memory => {
            tracing::info!(
                "使用内存缓存，容量预算: {} 字节",
                config.cache.memory_max_capacity
            );
            Arc::new(MemoryCache::new(config.cache.memory_max_capacity))
        }
        CacheType::Redis => {
            let redis_config = config
                .cache
                .redis
                .as_ref()
                .ok_or_else(|| BadgeError::config("Redis 缓存配置缺失"))?;
            Arc::new(RedisCache::new(redis_config).await?)
        }
    };

    AppState::with_provider(config, cache)
}

/// 创建路由器
pub fn create_router(state: AppState) -> Router {
    // 健康检查不参与速率限制
    let profile_routes = Router::new()
        .route("/profile/{login}", get(handlers::profile::get_profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(profile_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    state.config.server.request_timeout,
                ))),
        );

    if state.config.server.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}

/// 启动服务并阻塞至退出
pub async fn run(config: AppConfig) -> Result<()> {
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let state = build_state(config).await?;
    let router = create_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|e| BadgeError::server_start_with_source(format!("绑定 {bind_address} 失败"), e))?;

    tracing::info!("服务启动，监听 {bind_address}");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| BadgeError::server_start_with_source("服务器运行失败", e))?;

    Ok(())
}

/// 等待退出信号
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败: {e}");
        return;
    }
    tracing::info!("收到退出信号，开始优雅关闭");
}
