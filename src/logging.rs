//! # 日志配置模块
//!
//! 基于 tracing 的日志初始化，支持 RUST_LOG 覆盖默认过滤规则

use std::env;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化日志系统
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");

    // 默认配置：应用自身 debug，第三方库按给定级别
    let default_filter = format!("{level},ftbadge=debug");
    let log_filter = env::var("RUST_LOG").unwrap_or(default_filter);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)))
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
