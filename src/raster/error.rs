//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载"加载 → 解码 → 提交"链路中的所有错误来源。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 对用户而言，除 `Superseded` 外的所有分支都等价于"图片无法加载"，
//! 当前图片保持不变；`is_decode_failure` 用于表达这一归类。

/// 图片加载统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("图片尺寸为空：{width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// 加载期间有更新的加载请求发起，本次结果被丢弃。
    #[error("加载已被更新的请求取代")]
    Superseded,
}

impl RasterError {
    /// 稳定错误码，供前端分支处理。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_DECODE",
            Self::EmptyImage { .. } => "E_EMPTY_IMAGE",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::FileSystem(_) => "E_FILE",
            Self::Network(_) => "E_NETWORK",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Superseded => "E_SUPERSEDED",
        }
    }

    /// 出错所处阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FileSystem(_) | Self::Network(_) | Self::Timeout(_) | Self::InvalidFormat(_) => {
                "load"
            }
            Self::Decode(_) | Self::EmptyImage { .. } | Self::ResourceLimit(_) => "decode",
            Self::Superseded => "commit",
        }
    }

    /// 是否属于"图片无法加载"一类（需要提示用户）。
    pub fn is_decode_failure(&self) -> bool {
        !matches!(self, Self::Superseded)
    }
}
