//! # 头像抓取与加工
//!
//! CDN 原图经居中裁剪、JPEG 重编码后以 data URI 缓存在
//! `Avatar` 键下（默认 7 天），徽章渲染时直接内嵌。

use axum::http::StatusCode;

use crate::cache::{CacheKey, CacheManager};
use crate::error::{BadgeError, Result};
use crate::utils::image::{crop_to_square, encode_to_jpeg, jpeg_data_uri};

use super::client::FtClient;

const JPEG_QUALITY: u8 = 70;

impl FtClient {
    /// 获取头像 data URI
    ///
    /// 命中读快照时直接返回；未命中则从 CDN 抓取原图并加工，
    /// 按键的默认 TTL 写入待刷缓冲。
    pub async fn get_avatar(&self, cm: &mut CacheManager, endpoint: &str) -> Result<String> {
        if let Some(cached) = cm.get(CacheKey::Avatar) {
            tracing::debug!("头像缓存命中");
            return Ok(cached.to_string());
        }

        let response = self
            .client
            .get(self.cdn_url(endpoint))
            .send()
            .await
            .map_err(|e| BadgeError::network_with_source("发送头像请求失败", e))?;

        if response.status() != StatusCode::OK {
            return Err(BadgeError::upstream(format!(
                "CDN 返回异常状态: {} (端点 {endpoint})",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BadgeError::network_with_source("读取头像响应失败", e))?;

        let image = image::load_from_memory(&body)
            .map_err(|e| BadgeError::upstream_with_source("解码头像图片失败", e))?;
        let square = crop_to_square(&image);

        let jpeg_data = encode_to_jpeg(&square, JPEG_QUALITY)?;
        let data_uri = jpeg_data_uri(&jpeg_data);

        cm.set(CacheKey::Avatar, data_uri.as_str())?;

        Ok(data_uri)
    }
}
