//! # 像素网格存储（核心编排）
//!
//! ## 设计思路
//!
//! `RasterStore` 持有"当前图片"，负责加载流程编排与原子替换：
//! 1. 领取加载票据（代数计数器自增）
//! 2. 按来源读取原始字节（`loader`），下载过程逐块核对票据
//! 3. 在阻塞线程中解码为 `RasterImage`
//! 4. 票据仍是最新时才替换当前图片
//!
//! ## 实现思路
//!
//! - 当前图片为 `RwLock<Arc<RasterImage>>`，替换只是一次引用交换，
//!   读者持有自己的 `Arc`，不会观察到中间状态。
//! - 重叠加载采用"最后一次调用胜出"：与完成顺序无关。票据过期后，
//!   该次加载无论成功失败都只返回 `Superseded`。
//! - 启动时存放 1x1 占位图，查询永远不会落在未初始化状态。
//! - 记录 `load/decode/total` 阶段耗时，便于性能诊断。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::decode::decode_raster;
use super::loader::fetch_raw;
use super::source::RawImageData;
use super::{ImageSource, RasterConfig, RasterError, RasterImage};
use crate::color::Sample;

/// 像素网格存储。
pub struct RasterStore {
    config: RasterConfig,
    current: RwLock<Arc<RasterImage>>,
    latest_ticket: AtomicU64,
}

/// 单次加载的票据。一旦有更新的加载发起，本票据即过期。
pub(super) struct LoadTicket<'a> {
    store: &'a RasterStore,
    id: u64,
}

impl LoadTicket<'_> {
    fn is_current(&self) -> bool {
        self.store.latest_ticket.load(Ordering::SeqCst) == self.id
    }

    pub(super) fn ensure_current(&self) -> Result<(), RasterError> {
        if self.is_current() {
            return Ok(());
        }
        log::info!("⏭️ 加载请求 #{} 已被取代", self.id);
        Err(RasterError::Superseded)
    }

    /// 过期票据的阶段结果一律作废，失败也不再上报。
    fn settle<T>(&self, result: Result<T, RasterError>) -> Result<T, RasterError> {
        self.ensure_current()?;
        result
    }
}

impl RasterStore {
    /// 根据配置创建存储，当前图片为占位图。
    pub fn new(config: RasterConfig) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(RasterImage::placeholder())),
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// 当前图片。锁中毒时仍返回其中的值（引用交换不会留下半成品）。
    pub fn current(&self) -> Arc<RasterImage> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// 在当前图片上采样。
    pub fn sample_current(&self, x: i64, y: i64) -> Option<Sample> {
        self.current().sample(x, y)
    }

    /// 加载并解码图片，成功后原子替换当前图片。
    ///
    /// 失败时当前图片保持不变；被更新的 `load` 取代时返回 `Superseded`。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use pixel_picker::raster::{ImageSource, RasterConfig, RasterStore};
    ///
    /// # async fn demo() -> Result<(), pixel_picker::raster::RasterError> {
    /// let store = RasterStore::new(RasterConfig::default());
    /// let image = store.load(ImageSource::FilePath("photo.png".into())).await?;
    /// println!("{}x{}", image.width(), image.height());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load(&self, source: ImageSource) -> Result<Arc<RasterImage>, RasterError> {
        self.load_with(source, decode_raster).await
    }

    async fn load_with<D>(&self, source: ImageSource, decode: D) -> Result<Arc<RasterImage>, RasterError>
    where
        D: FnOnce(RawImageData, &RasterConfig) -> Result<RasterImage, RasterError> + Send + 'static,
    {
        let ticket = self.issue_ticket();
        let source_kind = source.kind();
        let total_start = Instant::now();

        let raw = ticket.settle(fetch_raw(source, &self.config, &ticket).await)?;
        let load_elapsed = total_start.elapsed();

        let decode_start = Instant::now();
        let config = self.config.clone();
        let decoded = tokio::task::spawn_blocking(move || decode(raw, &config))
            .await
            .map_err(|e| RasterError::Decode(format!("解码线程执行失败：{}", e)))
            .and_then(|result| result);
        let image = ticket.settle(decoded)?;
        let decode_elapsed = decode_start.elapsed();

        let image = self.commit(&ticket, image)?;

        log::info!(
            "✅ 图片加载完成 - 来源: {} 尺寸: {}x{} load={}ms decode={}ms total={}ms",
            source_kind,
            image.width(),
            image.height(),
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(image)
    }

    pub(super) fn issue_ticket(&self) -> LoadTicket<'_> {
        LoadTicket {
            store: self,
            id: self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// 票据仍为最新时替换当前图片。检查与替换在同一把写锁内完成。
    fn commit(&self, ticket: &LoadTicket<'_>, image: RasterImage) -> Result<Arc<RasterImage>, RasterError> {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        ticket.ensure_current()?;

        let image = Arc::new(image);
        *guard = Arc::clone(&image);
        Ok(image)
    }
}

impl Default for RasterStore {
    fn default() -> Self {
        Self::new(RasterConfig::default())
    }
}
