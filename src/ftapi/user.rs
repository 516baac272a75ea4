//! # 用户资料查询
//!
//! 映射后的用户资料以 JSON 形式缓存在 `User` 键下（默认 24 小时）。

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheManager};
use crate::error::{BadgeError, Result};
use crate::utils::compression::decompress_gzip;

use super::client::FtClient;

/// 上游用户端点的原始响应（仅保留需要的字段）
#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    email: String,
    #[serde(default)]
    displayname: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    image: ImageResponse,
    #[serde(default)]
    cursus_users: Vec<CursusUserResponse>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    versions: ImageVersions,
}

#[derive(Debug, Default, Deserialize)]
struct ImageVersions {
    #[serde(default)]
    medium: String,
}

#[derive(Debug, Deserialize)]
struct CursusUserResponse {
    #[serde(default)]
    grade: Option<String>,
    #[serde(default)]
    level: f64,
    #[serde(default)]
    cursus: CursusResponse,
}

#[derive(Debug, Default, Deserialize)]
struct CursusResponse {
    #[serde(default)]
    name: String,
}

/// 映射后的用户资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
    pub role: String,
    pub avatar_url: String,
    pub grade: String,
    pub level: f64,
    pub cursus: String,
}

impl User {
    /// 从上游响应映射；取最后一个 cursus 作为当前进度
    fn from_response(response: UserResponse) -> Self {
        let mut grade = "N/A".to_string();
        let mut level = 0.0;
        let mut cursus = "N/A".to_string();

        if let Some(current) = response.cursus_users.last() {
            grade = current.grade.clone().unwrap_or_default();
            level = current.level;
            cursus = current.cursus.name.clone();
        }

        Self {
            email: response.email,
            name: response.displayname,
            role: response.kind,
            avatar_url: response.image.versions.medium,
            grade,
            level,
            cursus,
        }
    }
}

impl FtClient {
    /// 查询用户资料
    ///
    /// 命中读快照时反序列化缓存值；未命中则带令牌请求上游，
    /// 404 映射为 `Ok(None)`。上游以 gzip 响应时手工解压。
    pub async fn get_user(&self, cm: &mut CacheManager, login: &str) -> Result<Option<User>> {
        if let Some(cached) = cm.get(CacheKey::User) {
            tracing::debug!(login, "用户资料缓存命中");
            let user: User = serde_json::from_str(cached)
                .map_err(|e| BadgeError::serialization("解析缓存的用户资料失败", e))?;
            return Ok(Some(user));
        }

        let access_token = self.get_access_token(cm).await?;

        let endpoint = format!("/users/{}", urlencoding::encode(login));
        let response = self
            .client
            .get(self.api_url(&endpoint))
            .header("Accept-Encoding", "gzip")
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| BadgeError::network_with_source("发送用户资料请求失败", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if response.status() != StatusCode::OK {
            return Err(BadgeError::upstream(format!(
                "用户端点返回异常状态: {}",
                response.status()
            )));
        }

        let is_gzip = response
            .headers()
            .get("Content-Encoding")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("gzip"));

        let body = response
            .bytes()
            .await
            .map_err(|e| BadgeError::network_with_source("读取用户资料响应失败", e))?;

        let data = if is_gzip {
            decompress_gzip(&body)?
        } else {
            body.to_vec()
        };

        let user_response: UserResponse = serde_json::from_slice(&data)
            .map_err(|e| BadgeError::serialization("解析用户端点响应失败", e))?;
        let user = User::from_response(user_response);

        let cache_data = serde_json::to_string(&user)
            .map_err(|e| BadgeError::serialization("序列化用户资料用于缓存失败", e))?;
        cm.set(CacheKey::User, cache_data)?;

        Ok(Some(user))
    }
}
