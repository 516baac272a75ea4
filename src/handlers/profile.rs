//! # 徽章渲染处理器
//!
//! `/profile/{login}` 的完整流程：先尝试用缓存的渲染结果
//! 短路，未命中时预取原始数据分组、调用上游补齐缺口，
//! 渲染后把所有新值一次性批量写回缓存。

use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use regex::Regex;

use crate::cache::{CacheGroup, CacheKey, CacheManager};
use crate::error::{BadgeError, Result};
use crate::render::Profile;
use crate::server::AppState;

/// 浏览器端缓存策略：CDN 缓存 1 小时，过期后允许一天内先用旧值
const CACHE_CONTROL_VALUE: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

static LOGIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z0-9]{1,32}$").expect("login 正则无效"));

/// 获取用户徽章
pub async fn get_profile(
    State(state): State<AppState>,
    Path(login): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    validate_login(&login)?;

    let badge = render_profile(&state, &login).await?;

    let etag = etag_for(&badge);
    let client_etag = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok());

    if client_etag == Some(etag.as_str()) {
        return Ok((
            StatusCode::NOT_MODIFIED,
            [
                (header::CACHE_CONTROL, CACHE_CONTROL_VALUE.to_string()),
                (header::ETAG, etag),
            ],
        )
            .into_response());
    }

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/svg+xml".to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL_VALUE.to_string()),
            (header::ETAG, etag),
        ],
        badge,
    )
        .into_response())
}

/// 渲染徽章，优先使用缓存
async fn render_profile(state: &AppState, login: &str) -> Result<String> {
    let mut cm = CacheManager::new(state.cache.clone(), login);

    cm.prefetch(CacheGroup::Profile).await?;
    if let Some(cached) = cm.get(CacheKey::Profile) {
        tracing::debug!(login, "徽章缓存命中");
        return Ok(cached.to_string());
    }

    cm.prefetch(CacheGroup::Data).await?;

    let user = state
        .ft_client
        .get_user(&mut cm, login)
        .await?
        .ok_or_else(|| BadgeError::user_not_found(login))?;

    let avatar_path = url::Url::parse(&user.avatar_url)
        .map(|parsed| parsed.path().to_string())
        .map_err(|e| BadgeError::upstream_with_source("解析用户头像地址失败", e))?;
    let avatar = state.ft_client.get_avatar(&mut cm, &avatar_path).await?;

    let profile = Profile::new(&user, avatar);
    let badge = profile.render_svg();

    cm.set(CacheKey::Profile, badge.as_str())?;
    cm.flush().await?;

    tracing::info!(login, "徽章渲染完成");
    Ok(badge)
}

/// 验证 login 参数
fn validate_login(login: &str) -> Result<()> {
    if !LOGIN_PATTERN.is_match(login) {
        return Err(BadgeError::validation(
            "login 只能包含字母和数字，且长度不超过32个字符",
        ));
    }
    Ok(())
}

/// 基于内容生成 ETag
fn etag_for(data: &str) -> String {
    // ETag 只用于缓存指纹，不要求抗碰撞强度
    format!("\"{:x}\"", md5::compute(data.as_bytes()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("jdoe")]
    #[case("JDoe42")]
    #[case("a")]
    fn test_validate_login_accepts_alphanumeric(#[case] login: &str) {
        assert!(validate_login(login).is_ok(), "login {login:?} 应被接受");
    }

    #[rstest]
    #[case("")]
    #[case("j doe")]
    #[case("jdoe/../admin")]
    #[case("j.doe")]
    fn test_validate_login_rejects_invalid_input(#[case] login: &str) {
        assert!(validate_login(login).is_err(), "login {login:?} 应被拒绝");
    }

    #[test]
    fn test_validate_login_rejects_overlong_input() {
        assert!(validate_login(&"a".repeat(32)).is_ok());
        assert!(validate_login(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_etag_is_quoted_and_deterministic() {
        let etag = etag_for("<svg/>");
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_eq!(etag, etag_for("<svg/>"));
        assert_ne!(etag, etag_for("<svg></svg>"));
    }
}
