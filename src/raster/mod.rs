//! # 像素网格模块（raster）
//!
//! ## 设计思路
//!
//! 将"图片来源识别 → 加载校验 → 解码 → 原子替换 → 像素查询"按职责拆分为多个子模块：
//!
//! - `store`：持有当前图片，编排加载流程与替换策略
//! - `loader`：负责字节/文件/Base64/URL 加载与安全校验
//! - `decode`：负责解码、尺寸与内存上限
//! - `grid`：稠密 RGBA 网格与 O(1) 查询
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! controller（图片加载事件）
//!    ↓
//! store.rs（领取票据 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名/URL 校验）
//!    ├─ decode.rs（阻塞线程解码 + 像素限制）
//!    └─ commit（票据仍最新时替换当前图片）
//!    ↓
//! pointer 事件 → store.current().sample(x, y)
//! ```

mod config;
mod decode;
mod error;
mod grid;
mod loader;
mod source;
mod store;

pub use config::RasterConfig;
pub use error::RasterError;
pub use grid::RasterImage;
pub use source::ImageSource;
pub use store::RasterStore;
