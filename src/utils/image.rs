//! # 图像处理工具
//!
//! 头像的居中裁剪、JPEG 重编码和 data URI 封装

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder};

use crate::error::{BadgeError, Result};

/// 居中裁剪为正方形
#[must_use]
pub fn crop_to_square(image: &DynamicImage) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let size = width.min(height);

    let x_offset = (width - size) / 2;
    let y_offset = (height - size) / 2;

    image.crop_imm(x_offset, y_offset, size, size)
}

/// 按指定质量编码为 JPEG
pub fn encode_to_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG 不支持 alpha 通道，统一转为 RGB
    let rgb = image.to_rgb8();

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BadgeError::internal_with_source("JPEG 编码失败", e))?;

    Ok(buffer)
}

/// 把 JPEG 字节封装为 base64 data URI
#[must_use]
pub fn jpeg_data_uri(jpeg_data: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg_data))
}
