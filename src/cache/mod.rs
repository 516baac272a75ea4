//! # 缓存模块
//!
//! 封闭键集合、可插拔后端（内存 / Redis）与单请求缓存管理器

pub mod client;
pub mod keys;
pub mod manager;
pub mod memory;

pub use client::{CacheEntry, CacheProvider, RedisCache, RedisConfig};
pub use keys::{CACHE_KEYS, CacheGroup, CacheKey};
pub use manager::CacheManager;
pub use memory::MemoryCache;
