//! # 压缩处理工具

use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::{BadgeError, Result};

/// 解压 gzip 数据
pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| BadgeError::internal_with_source("解压 gzip 数据失败", e))?;
    Ok(decompressed)
}
