//! # 数据源与中间模型
//!
//! 将"外部输入类型"和"流水线中间结果"解耦：
//! - `ImageSource` 表示外部来源语义（文件选择、拖拽、默认图片）
//! - `RawImageData` 表示已加载但未解码的字节

/// 图片输入来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// 已在内存中的编码字节。
    Bytes(Vec<u8>),
    /// 本地文件路径。
    FilePath(String),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 网络地址（仅 http/https）。
    Url(String),
}

impl ImageSource {
    /// 按字符串形态推断来源：Data URL → Base64，http(s) → Url，其余视为路径。
    ///
    /// 用于配置中的默认图片等"只有一个字符串"的场景。
    pub fn infer(reference: &str) -> Self {
        let trimmed = reference.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("data:") {
            Self::Base64(trimmed.to_string())
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::FilePath(trimmed.to_string())
        }
    }

    /// 日志用的来源类别。
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::FilePath(_) => "file",
            Self::Base64(_) => "base64",
            Self::Url(_) => "url",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    pub(crate) bytes: Vec<u8>,
    pub(crate) source_hint: &'static str,
}
