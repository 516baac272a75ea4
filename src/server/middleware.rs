//! # HTTP 中间件
//!
//! 按客户端 IP 的固定窗口速率限制

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::error::{BadgeError, Result};

use super::AppState;

/// 固定窗口计数器
#[derive(Debug)]
struct WindowCounter {
    window_start: Instant,
    count: u32,
}

/// 按客户端 IP 的速率限制器
///
/// 所有请求共享一个实例；计数器表由 dashmap 提供分段锁。
pub struct RateLimiter {
    config: RateLimitConfig,
    counters: DashMap<IpAddr, WindowCounter>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            counters: DashMap::new(),
        }
    }

    /// 记录一次请求并判断是否放行
    pub fn check(&self, ip: IpAddr) -> bool {
        if !self.config.enabled {
            return true;
        }

        let window = Duration::from_secs(self.config.window_secs);
        let now = Instant::now();

        let mut counter = self.counters.entry(ip).or_insert(WindowCounter {
            window_start: now,
            count: 0,
        });

        if now.duration_since(counter.window_start) >= window {
            counter.window_start = now;
            counter.count = 0;
        }

        if counter.count >= self.config.max_requests {
            return false;
        }

        counter.count += 1;
        true
    }
}

/// 速率限制中间件
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let ip = client_ip(request.headers(), addr);

    if !state.rate_limiter.check(ip) {
        tracing::warn!(%ip, "请求超出速率限制");
        return Err(BadgeError::rate_limit("请求过于频繁，请稍后再试"));
    }

    Ok(next.run(request).await)
}

/// 解析客户端真实 IP
///
/// 反向代理场景下优先取转发头，否则退回连接对端地址。
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> IpAddr {
    let forwarded_ip = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|value| value.trim().parse::<IpAddr>().ok());

    if let Some(ip) = forwarded_ip {
        return ip;
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<IpAddr>().ok())
        .unwrap_or_else(|| addr.ip())
}
