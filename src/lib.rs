//! # 图片取色器 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            界面层（任意窗口工具包 / 测试）               │
//! │                                                          │
//! │   PickerEvent ──→ handle_event ──→ Vec<UiUpdate>         │
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ controller ── 应用状态 + 事件分发                    │
//! │  │                                                       │
//! │  ├─ raster ────── 加载·解码·原子替换·像素查询            │
//! │  ├─ pointer ───── 视口坐标 → 原图网格坐标                │
//! │  ├─ color ─────── #rrggbb / rgb(r, g, b)                 │
//! │  ├─ clipboard ─── 文本写入 + 有限重试                    │
//! │  ├─ settings ──── JSON 设置文件                          │
//! │  └─ error ─────── AppError / ErrorPayload                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`controller`] | 持有应用状态，把指针/加载/复制事件转换为界面更新 |
//! | [`raster`] | 从字节/文件/Base64/URL 加载图片，按原始分辨率存储并查询像素 |
//! | [`pointer`] | 指针坐标映射、显示区域命中、色块定位 |
//! | [`color`] | 采样值的两种文本格式 |
//! | [`clipboard`] | 剪贴板写入抽象与 `arboard` 实现 |
//! | [`settings`] | 设置读写与校验 |
//! | [`error`] | 统一错误类型与界面错误提示 |

pub mod clipboard;
pub mod color;
pub mod controller;
pub mod error;
pub mod pointer;
pub mod raster;
pub mod settings;

/// 初始化日志，默认级别 `info`，可由 `RUST_LOG` 覆盖。重复调用无副作用。
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
