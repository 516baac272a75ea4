//! # 缓存键命名规范
//!
//! 定义封闭的缓存键集合及其命名、默认 TTL 和预取分组策略。
//! 键集合是编译期封闭的枚举，不存在"未注册键"这类运行时错误。

use std::fmt;
use std::time::Duration;

/// 缓存键类型
///
/// 每个键自带命名空间生成规则和默认 TTL。`AccessToken` 是全局键
/// （上游令牌与用户无关），其余键按用户 login 区分命名空间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// 上游 OAuth 访问令牌 - `access-token`
    AccessToken,
    /// 渲染完成的 SVG 徽章 - `profile:{login}`
    Profile,
    /// 上游用户资料（JSON） - `user:{login}`
    User,
    /// 头像 data URI - `avatar:{login}`
    Avatar,
}

/// 全部缓存键，便于遍历和容量预估
pub const CACHE_KEYS: [CacheKey; 4] = [
    CacheKey::AccessToken,
    CacheKey::Profile,
    CacheKey::User,
    CacheKey::Avatar,
];

impl CacheKey {
    /// 生成后端使用的命名空间键字符串
    #[must_use]
    pub fn build(&self, id: &str) -> String {
        match self {
            Self::AccessToken => "access-token".to_string(),
            Self::Profile => format!("profile:{id}"),
            Self::User => format!("user:{id}"),
            Self::Avatar => format!("avatar:{id}"),
        }
    }

    /// 键的默认 TTL
    ///
    /// `AccessToken` 没有默认值：令牌的有效期只能来自上游响应的
    /// `expires_in`，必须通过 `set_with_ttl` 写入。
    #[must_use]
    pub const fn default_ttl(&self) -> Option<Duration> {
        match self {
            Self::AccessToken => None,
            Self::Profile => Some(Duration::from_secs(60 * 60)),
            Self::User => Some(Duration::from_secs(24 * 60 * 60)),
            Self::Avatar => Some(Duration::from_secs(7 * 24 * 60 * 60)),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccessToken => "access-token",
            Self::Profile => "profile",
            Self::User => "user",
            Self::Avatar => "avatar",
        };
        write!(f, "{name}")
    }
}

/// 预取分组
///
/// 一个分组内的键通过一次批量读取一起预取，减少后端往返。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheGroup {
    /// 徽章快速路径：仅渲染结果
    Profile,
    /// 徽章慢速路径所需的全部原始数据
    Data,
}

impl CacheGroup {
    /// 分组包含的缓存键（静态表，恒非空）
    #[must_use]
    pub const fn keys(&self) -> &'static [CacheKey] {
        match self {
            Self::Profile => &[CacheKey::Profile],
            Self::Data => &[CacheKey::AccessToken, CacheKey::User, CacheKey::Avatar],
        }
    }
}

impl fmt::Display for CacheGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Profile => "profile",
            Self::Data => "data",
        };
        write!(f, "{name}")
    }
}
