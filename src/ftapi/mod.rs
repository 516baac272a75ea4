//! # 上游 42 API 客户端
//!
//! OAuth 令牌获取、用户资料查询和头像抓取，全部经由
//! 缓存管理器短路昂贵的上游调用。

pub mod avatar;
pub mod client;
pub mod oauth;
pub mod user;

pub use client::FtClient;
pub use user::User;
