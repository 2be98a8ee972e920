//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各子模块保留自己的错误枚举（`RasterError`、`ClipboardError`），
//! 在 crate 边界汇总为 `AppError`，嵌入方只需处理一种错误类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息，`#[from]` 免去手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于直接交给前端。
//! - `ErrorPayload` 携带稳定错误码与阶段，作为 `UiUpdate::Failed` 的内容。

use serde::Serialize;

use crate::clipboard::ClipboardError;
use crate::raster::RasterError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片加载流水线错误（读取 / 下载 / 解码）
    #[error("{0}")]
    Raster(#[from] RasterError),

    /// 剪贴板写入失败
    #[error("{0}")]
    Clipboard(#[from] ClipboardError),

    /// 设置文件内容非法
    #[error("设置错误: {0}")]
    Settings(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// 面向界面的错误提示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub code: &'static str,
    pub stage: &'static str,
    pub message: String,
}

impl ErrorPayload {
    /// 复制时尚未拾取任何颜色。
    pub fn nothing_picked() -> Self {
        Self {
            code: "E_NOTHING_PICKED",
            stage: "copy",
            message: "尚未拾取颜色，无法复制".to_string(),
        }
    }
}

impl From<&RasterError> for ErrorPayload {
    fn from(error: &RasterError) -> Self {
        Self {
            code: error.code(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }
}

impl From<RasterError> for ErrorPayload {
    fn from(error: RasterError) -> Self {
        Self::from(&error)
    }
}

impl From<ClipboardError> for ErrorPayload {
    fn from(error: ClipboardError) -> Self {
        Self {
            code: error.code(),
            stage: "copy",
            message: error.to_string(),
        }
    }
}

impl From<&AppError> for ErrorPayload {
    fn from(error: &AppError) -> Self {
        match error {
            AppError::Raster(e) => Self::from(e),
            AppError::Clipboard(e) => Self::from(e.clone()),
            AppError::Settings(_) => Self {
                code: "E_SETTINGS",
                stage: "settings",
                message: error.to_string(),
            },
            AppError::Io(_) => Self {
                code: "E_IO",
                stage: "settings",
                message: error.to_string(),
            },
        }
    }
}
