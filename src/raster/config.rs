//! # 配置模块
//!
//! ## 设计思路
//!
//! 将加载与解码阶段所有"可调策略"集中到 `RasterConfig`，
//! 保证运行时行为可观测、可调整、可测试。
//!
//! - `Default` 提供生产可用配置。
//! - `validate` 拒绝明显不合理的取值（由设置加载时调用）。

use serde::{Deserialize, Serialize};

use super::RasterError;

/// 图片加载与解码配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// 读取原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 网络下载总超时（秒）。
    pub download_timeout: u64,
    /// 建立连接超时（秒）。
    pub connect_timeout: u64,
    /// 下载首包超时（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 下载分块读取超时（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 最大重定向次数。
    pub max_redirects: usize,
    /// 是否允许访问本地或内网地址（默认关闭）。
    pub allow_private_network: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            max_redirects: 5,
            allow_private_network: false,
        }
    }
}

impl RasterConfig {
    pub fn validate(&self) -> Result<(), RasterError> {
        if self.max_file_size == 0 {
            return Err(RasterError::InvalidFormat("max_file_size 不能为 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(RasterError::InvalidFormat("max_decoded_pixels 不能为 0".to_string()));
        }
        if self.max_decoded_bytes < 4 {
            return Err(RasterError::InvalidFormat("max_decoded_bytes 至少容纳 1 个像素".to_string()));
        }
        if !(1..=600).contains(&self.download_timeout) {
            return Err(RasterError::InvalidFormat("download_timeout 必须在 1~600 秒之间".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(RasterError::InvalidFormat("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        if !(500..=120_000).contains(&self.stream_first_byte_timeout_ms) {
            return Err(RasterError::InvalidFormat(
                "stream_first_byte_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(RasterError::InvalidFormat(
                "stream_chunk_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RasterConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_invalid_timeouts() {
        let mut config = RasterConfig::default();
        config.connect_timeout = 0;
        assert!(matches!(config.validate(), Err(RasterError::InvalidFormat(_))));

        let mut config = RasterConfig::default();
        config.stream_chunk_timeout_ms = 100;
        assert!(matches!(config.validate(), Err(RasterError::InvalidFormat(_))));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: RasterConfig =
            serde_json::from_str(r#"{ "allow_private_network": true }"#).expect("parse failed");

        assert!(config.allow_private_network);
        assert_eq!(config.max_file_size, RasterConfig::default().max_file_size);
    }
}
