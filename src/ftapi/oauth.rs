//! # OAuth 客户端凭据流程
//!
//! 令牌缓存在全局 `AccessToken` 键下，TTL 始终取上游响应的
//! `expires_in`，不使用默认 TTL。

use std::time::Duration;

use axum::http::StatusCode;
use serde::Deserialize;

use crate::cache::{CacheKey, CacheManager};
use crate::error::{BadgeError, Result};

use super::client::FtClient;

const GRANT_TYPE: &str = "client_credentials";

/// 令牌端点响应
#[derive(Debug, Deserialize)]
struct OauthTokenResponse {
    access_token: String,
    expires_in: u64,
}

impl FtClient {
    /// 获取上游访问令牌
    ///
    /// 命中读快照时直接返回；否则走客户端凭据流程，
    /// 并按令牌有效期写入待刷缓冲。
    pub async fn get_access_token(&self, cm: &mut CacheManager) -> Result<String> {
        if let Some(cached) = cm.get(CacheKey::AccessToken) {
            tracing::debug!("访问令牌缓存命中");
            return Ok(cached.to_string());
        }

        let params = [
            ("grant_type", GRANT_TYPE),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(self.api_url("/oauth/token"))
            .form(&params)
            .send()
            .await
            .map_err(|e| BadgeError::network_with_source("发送令牌请求失败", e))?;

        if response.status() != StatusCode::OK {
            return Err(BadgeError::upstream(format!(
                "令牌端点返回异常状态: {}",
                response.status()
            )));
        }

        let token: OauthTokenResponse = response
            .json()
            .await
            .map_err(|e| BadgeError::serialization("解析令牌端点响应失败", e))?;

        let ttl = Duration::from_secs(token.expires_in);
        cm.set_with_ttl(CacheKey::AccessToken, token.access_token.as_str(), ttl);
        tracing::debug!(expires_in = token.expires_in, "获取到新的访问令牌");

        Ok(token.access_token)
    }
}
