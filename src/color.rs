//! # 颜色格式化模块
//!
//! ## 设计思路
//!
//! 采样结果只需要两种文本形式：`#rrggbb` 与 `rgb(r, g, b)`。
//! 两者都是纯函数，输入域为 `[0,255]^3`（由 `u8` 保证），不存在错误分支。
//!
//! `parse_hex` 是 `to_hex` 的逆运算，供前端回显校验与测试使用。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// 形如 `#rrggbb` 的十六进制颜色（大小写不敏感）。
static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
        .expect("内置十六进制颜色正则必须合法")
});

/// 网格单元的颜色读数（alpha 已丢弃）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Sample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Sample {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        to_hex(self.r, self.g, self.b)
    }

    pub fn to_rgb_string(self) -> String {
        to_rgb_string(self.r, self.g, self.b)
    }
}

/// 格式化为 `#rrggbb`，每个通道两位小写十六进制，不含 alpha。
///
/// # 示例
/// ```
/// assert_eq!(pixel_picker::color::to_hex(255, 8, 0), "#ff0800");
/// ```
pub fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// 格式化为 `rgb(r, g, b)`，逗号后各一个空格。
///
/// # 示例
/// ```
/// assert_eq!(pixel_picker::color::to_rgb_string(0, 128, 255), "rgb(0, 128, 255)");
/// ```
pub fn to_rgb_string(r: u8, g: u8, b: u8) -> String {
    format!("rgb({}, {}, {})", r, g, b)
}

/// 解析 `#rrggbb`，格式不符时返回 `None`。
pub fn parse_hex(text: &str) -> Option<Sample> {
    let caps = HEX_COLOR.captures(text.trim())?;
    let channel = |i: usize| u8::from_str_radix(caps.get(i)?.as_str(), 16).ok();

    Some(Sample::new(channel(1)?, channel(2)?, channel(3)?))
}

/// 点击后持久展示的颜色：采样值加两种文本形式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickedColor {
    pub sample: Sample,
    pub hex: String,
    pub rgb: String,
}

impl From<Sample> for PickedColor {
    fn from(sample: Sample) -> Self {
        Self {
            sample,
            hex: sample.to_hex(),
            rgb: sample.to_rgb_string(),
        }
    }
}
