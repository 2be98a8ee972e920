//! # 像素网格模块
//!
//! `RasterImage` 以稠密 RGBA8 数组保存原图像素，下标为 `(y * width + x) * 4`，
//! 查询为 O(1)。构造后不可变，换图时整体替换。

use image::RgbaImage;

use super::RasterError;
use crate::color::Sample;

/// 已解码的原图像素网格（原始分辨率，与显示尺寸无关）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl RasterImage {
    /// 由 RGBA 字节构造，校验尺寸非零且长度一致。
    pub fn from_rgba(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyImage { width, height });
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| RasterError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if samples.len() != expected_len {
            return Err(RasterError::Decode(format!(
                "像素数据长度异常：期望 {} 实际 {}",
                expected_len,
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// 启动时的占位图：1x1 透明黑。
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            samples: vec![0, 0, 0, 0],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 读取 `(x, y)` 处颜色；越界（含负数、`x == width`、`y == height`）返回 `None`。
    pub fn sample(&self, x: i64, y: i64) -> Option<Sample> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.samples.get(offset..offset + 3)?;
        Some(Sample::new(px[0], px[1], px[2]))
    }
}

impl TryFrom<RgbaImage> for RasterImage {
    type Error = RasterError;

    fn try_from(image: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.into_raw())
    }
}
