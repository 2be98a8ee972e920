//! # 剪贴板导出模块
//!
//! ## 设计思路
//!
//! 将与操作系统剪贴板交互的逻辑独立出来，便于隔离平台不稳定因素：
//! - `ClipboardSink` 抽象"写入一段文本"，控制器只依赖该 trait，测试可注入内存实现。
//! - `SystemClipboard` 基于 `arboard`，在阻塞线程中执行。
//! - 写入失败时按"指数退避 + 抖动"有限重试，并受总时长预算约束。
//!
//! 复制失败对系统其余部分无影响，只作为非阻塞提示返回给用户。

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// 剪贴板错误。
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClipboardError {
    /// 平台不支持或无法访问剪贴板，重试无意义。
    #[error("剪贴板不可用：{0}")]
    Unavailable(String),

    /// 剪贴板被其他进程占用。
    #[error("剪贴板忙：{0}")]
    Busy(String),

    #[error("复制失败：{0}")]
    WriteFailed(String),
}

impl ClipboardError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_CLIPBOARD_UNAVAILABLE",
            Self::Busy(_) => "E_CLIPBOARD_BUSY",
            Self::WriteFailed(_) => "E_CLIPBOARD",
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::WriteFailed(_))
    }
}

/// 剪贴板写入重试策略。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// 最大尝试次数（至少 1 次）。
    pub retries: u32,
    /// 基础重试间隔（毫秒）。
    pub retry_delay_ms: u64,
    /// 单次复制允许的总重试预算（毫秒）。
    pub retry_max_total_ms: u64,
    /// 单次退避延迟上限（毫秒）。
    pub retry_max_delay_ms: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay_ms: 100,
            retry_max_total_ms: 1_800,
            retry_max_delay_ms: 900,
        }
    }
}

impl ClipboardConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=10).contains(&self.retries) {
            return Err("retries 必须在 1~10 之间".to_string());
        }
        if !(200..=30_000).contains(&self.retry_max_total_ms) {
            return Err("retry_max_total_ms 必须在 200~30000 毫秒之间".to_string());
        }
        if !(10..=5_000).contains(&self.retry_max_delay_ms) {
            return Err("retry_max_delay_ms 必须在 10~5000 毫秒之间".to_string());
        }
        if self.retry_max_delay_ms > self.retry_max_total_ms {
            return Err("retry_max_delay_ms 不能大于 retry_max_total_ms".to_string());
        }
        Ok(())
    }
}

/// 文本剪贴板写入端。
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// 系统剪贴板（`arboard`）。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new().map_err(classify_arboard_error)?;

        clipboard.set_text(text.to_owned()).map_err(classify_arboard_error)
    }
}

fn classify_arboard_error(error: arboard::Error) -> ClipboardError {
    match error {
        arboard::Error::ClipboardNotSupported => ClipboardError::Unavailable(error.to_string()),
        arboard::Error::ClipboardOccupied => ClipboardError::Busy(error.to_string()),
        other => ClipboardError::WriteFailed(other.to_string()),
    }
}

fn compute_backoff_delay_with_jitter(base_delay_ms: u64, attempt: u32, max_delay_ms: u64) -> u64 {
    let exp = base_delay_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(8));
    let capped = exp.min(max_delay_ms.max(base_delay_ms));
    let jitter_bound = (capped / 3).max(1);
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    capped.saturating_add(seed % (jitter_bound + 1))
}

fn would_exceed_retry_budget(elapsed_ms: u64, wait_ms: u64, budget_ms: u64) -> bool {
    elapsed_ms.saturating_add(wait_ms) > budget_ms
}

/// 写入文本并在可重试错误上有限重试（阻塞调用）。
pub fn write_text_with_retry(
    sink: &dyn ClipboardSink,
    text: &str,
    config: &ClipboardConfig,
) -> Result<(), ClipboardError> {
    let retry_count = config.retries.max(1);
    let started = Instant::now();
    let mut last_error = None;

    for attempt in 1..=retry_count {
        if attempt > 1 {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let wait_ms = compute_backoff_delay_with_jitter(
                config.retry_delay_ms.max(1),
                attempt - 1,
                config.retry_max_delay_ms,
            );

            if would_exceed_retry_budget(elapsed_ms, wait_ms, config.retry_max_total_ms) {
                log::warn!(
                    "⏱️ 跳过第 {} 次重试：等待 {}ms 会超过预算 {}ms",
                    attempt,
                    wait_ms,
                    config.retry_max_total_ms
                );
                break;
            }

            log::debug!("🔄 重试 {}/{}，等待 {}ms", attempt, retry_count, wait_ms);
            std::thread::sleep(Duration::from_millis(wait_ms));
        }

        match sink.set_text(text) {
            Ok(()) => {
                log::info!("✅ 复制成功 (尝试 {})", attempt);
                return Ok(());
            }
            Err(err) => {
                log::warn!("❌ 尝试 {} 失败: {}", attempt, err);
                let retryable = err.is_retryable();
                last_error = Some(err);

                if !retryable {
                    log::warn!("🛑 非可重试错误，提前终止重试");
                    break;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ClipboardError::WriteFailed("未知错误".to_string())))
}
