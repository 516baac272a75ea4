//! # 上游 HTTP 客户端封装

use std::time::Duration;

use crate::config::FtApiConfig;
use crate::error::{BadgeError, Result};

/// 42 intra API 客户端
///
/// 同时面向 API 与 CDN 两个上游；单个客户端被所有请求共享，
/// 连接复用由 reqwest 内部处理。
pub struct FtClient {
    pub(crate) client: reqwest::Client,
    pub(crate) config: FtApiConfig,
}

impl FtClient {
    /// 创建新的上游客户端
    pub fn new(config: FtApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| BadgeError::network_with_source("创建上游 HTTP 客户端失败", e))?;

        Ok(Self { client, config })
    }

    /// 拼接 API 地址
    pub(crate) fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}{endpoint}",
            self.config.api_base_url.trim_end_matches('/')
        )
    }

    /// 拼接 CDN 地址
    pub(crate) fn cdn_url(&self, endpoint: &str) -> String {
        format!(
            "{}{endpoint}",
            self.config.cdn_base_url.trim_end_matches('/')
        )
    }
}
