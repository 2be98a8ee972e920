//! # 解码流水线模块
//!
//! ## 设计思路
//!
//! 将"字节 → 图像 → RGBA 网格"的过程集中管理，并在关键节点增加资源上限控制。
//! 优先读 header 做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 零尺寸直接拒绝，按像素/内存上限快速拒绝
//! 3. 完整解码（原始分辨率，不做任何缩放）
//! 4. 转换 RGBA 并构造 `RasterImage`

use image::{GenericImageView, ImageReader};
use std::io::Cursor;

use super::source::RawImageData;
use super::{RasterConfig, RasterError, RasterImage};

/// 将原始字节解码为原始分辨率的像素网格。
///
/// 纯 CPU 计算，调用方负责放到阻塞线程执行。
pub(crate) fn decode_raster(raw: RawImageData, config: &RasterConfig) -> Result<RasterImage, RasterError> {
    let (header_width, header_height) = inspect_dimensions_from_memory(&raw.bytes)?;
    validate_dimensions(config, header_width, header_height)?;

    let decoded = image::load_from_memory(&raw.bytes)
        .map_err(|e| RasterError::Decode(format!("图片解码失败：{}", e)))?;

    let (width, height) = decoded.dimensions();
    validate_dimensions(config, width, height)?;

    let raster = RasterImage::try_from(decoded.to_rgba8())?;

    log::info!(
        "✅ 图片解码成功 - 来源: {} 尺寸: {}x{}",
        raw.source_hint,
        width,
        height
    );

    Ok(raster)
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), RasterError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RasterError::Decode(format!("无法识别图片格式：{}", e)))?;

    if reader.format().is_none() {
        return Err(RasterError::Decode("不支持的图片格式".to_string()));
    }

    reader
        .into_dimensions()
        .map_err(|e| RasterError::Decode(format!("无法读取图片尺寸：{}", e)))
}

fn validate_dimensions(config: &RasterConfig, width: u32, height: u32) -> Result<(), RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::EmptyImage { width, height });
    }

    let pixels = (width as u64) * (height as u64);
    if pixels > config.max_decoded_pixels {
        return Err(RasterError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, config.max_decoded_pixels
        )));
    }

    let estimated = pixels
        .checked_mul(4)
        .ok_or_else(|| RasterError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

    if estimated > config.max_decoded_bytes {
        return Err(RasterError::ResourceLimit(format!(
            "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
            estimated as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}
