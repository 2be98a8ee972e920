//! # 取色控制器
//!
//! ## 设计思路
//!
//! 应用状态由单个 `PickerController` 持有，界面层只通过 `handle_event`
//! 投递事件并渲染返回的 `UiUpdate`，不接触任何全局变量。
//!
//! - 指针事件（移动、离开、点击）是同步路径，不等待任何异步操作；
//!   每次处理只读取一次当前图片的 `Arc`，映射与采样基于同一张图。
//! - 图片加载是唯一的挂起操作，被取代的加载不产生任何更新。
//! - 复制在阻塞线程中执行，失败只作为 `Failed` 提示返回。
//!
//! ## 事件流
//!
//! ```text
//! LoadImage     → RasterStore::load → ImageReplaced | Failed
//! PointerMove   → map_to_grid → sample → SwatchMoved | SwatchHidden
//! PointerLeave  → SwatchHidden
//! PointerClick  → map_to_grid → sample → ColorPicked
//! Copy          → 最近拾取的颜色 → 剪贴板 → Copied | Failed
//! ```

mod event;

pub use event::{CopyTarget, PickerEvent, UiUpdate};

use std::sync::{Arc, Mutex, MutexGuard};

use crate::clipboard::{self, ClipboardError, ClipboardSink, SystemClipboard};
use crate::color::{PickedColor, Sample};
use crate::error::{AppError, ErrorPayload};
use crate::pointer::{self, DisplayRect, ViewportPoint};
use crate::raster::{ImageSource, RasterError, RasterStore};
use crate::settings::PickerSettings;

#[derive(Debug, Default)]
struct PickerState {
    last_picked: Option<PickedColor>,
    swatch_visible: bool,
}

pub struct PickerController {
    store: RasterStore,
    clipboard: Arc<dyn ClipboardSink>,
    settings: PickerSettings,
    state: Mutex<PickerState>,
}

impl PickerController {
    pub fn new(settings: PickerSettings, clipboard: Arc<dyn ClipboardSink>) -> Result<Self, AppError> {
        settings.validate()?;

        Ok(Self {
            store: RasterStore::new(settings.raster.clone()),
            clipboard,
            settings,
            state: Mutex::new(PickerState::default()),
        })
    }

    /// 使用系统剪贴板。
    pub fn with_system_clipboard(settings: PickerSettings) -> Result<Self, AppError> {
        Self::new(settings, Arc::new(SystemClipboard))
    }

    pub fn store(&self) -> &RasterStore {
        &self.store
    }

    pub fn settings(&self) -> &PickerSettings {
        &self.settings
    }

    pub fn last_picked(&self) -> Option<PickedColor> {
        self.lock_state().last_picked.clone()
    }

    /// 加载设置中的启动图片（若有）。
    pub async fn bootstrap(&self) -> Vec<UiUpdate> {
        match self.settings.bootstrap_source() {
            Some(source) => self.load_image(source).await,
            None => Vec::new(),
        }
    }

    pub async fn handle_event(&self, event: PickerEvent) -> Vec<UiUpdate> {
        match event {
            PickerEvent::LoadImage(source) => self.load_image(source).await,
            PickerEvent::PointerMove { point, rect } => self.pointer_move(point, rect),
            PickerEvent::PointerLeave => self.pointer_leave(),
            PickerEvent::PointerClick { point, rect } => self.pointer_click(point, rect),
            PickerEvent::Copy(target) => self.copy(target).await,
        }
    }

    async fn load_image(&self, source: ImageSource) -> Vec<UiUpdate> {
        match self.store.load(source).await {
            Ok(image) => vec![UiUpdate::ImageReplaced {
                width: image.width(),
                height: image.height(),
            }],
            Err(RasterError::Superseded) => Vec::new(),
            Err(e) => {
                log::warn!("⚠️ 图片加载失败，保留当前图片: {}", e);
                vec![UiUpdate::Failed(ErrorPayload::from(e))]
            }
        }
    }

    /// 在当前图片上按视口坐标采样。显示区域外一律视为无结果。
    fn sample_at(&self, point: ViewportPoint, rect: DisplayRect) -> Option<Sample> {
        if !rect.contains(point) {
            return None;
        }

        let image = self.store.current();
        let grid = pointer::map_to_grid(point, rect, image.width(), image.height());
        image.sample(grid.x, grid.y)
    }

    fn pointer_move(&self, point: ViewportPoint, rect: DisplayRect) -> Vec<UiUpdate> {
        let sample = self.sample_at(point, rect);
        let mut state = self.lock_state();

        match sample {
            Some(sample) => {
                state.swatch_visible = true;
                let size = self.settings.swatch_size;
                vec![UiUpdate::SwatchMoved {
                    placement: pointer::swatch_placement(point, size, size),
                    sample,
                    hex: sample.to_hex(),
                }]
            }
            None => Self::hide_swatch(&mut state),
        }
    }

    fn pointer_leave(&self) -> Vec<UiUpdate> {
        Self::hide_swatch(&mut self.lock_state())
    }

    fn hide_swatch(state: &mut PickerState) -> Vec<UiUpdate> {
        if !state.swatch_visible {
            return Vec::new();
        }
        state.swatch_visible = false;
        vec![UiUpdate::SwatchHidden]
    }

    fn pointer_click(&self, point: ViewportPoint, rect: DisplayRect) -> Vec<UiUpdate> {
        let Some(sample) = self.sample_at(point, rect) else {
            return Vec::new();
        };

        let picked = PickedColor::from(sample);
        log::debug!("🎯 拾取颜色 {} {}", picked.hex, picked.rgb);
        self.lock_state().last_picked = Some(picked.clone());

        vec![UiUpdate::ColorPicked(picked)]
    }

    async fn copy(&self, target: CopyTarget) -> Vec<UiUpdate> {
        let Some(picked) = self.last_picked() else {
            return vec![UiUpdate::Failed(ErrorPayload::nothing_picked())];
        };

        let text = match target {
            CopyTarget::Hex => picked.hex,
            CopyTarget::Rgb => picked.rgb,
        };

        let sink = Arc::clone(&self.clipboard);
        let config = self.settings.clipboard.clone();
        let written = text.clone();
        let result = tokio::task::spawn_blocking(move || {
            clipboard::write_text_with_retry(sink.as_ref(), &written, &config)
        })
        .await
        .unwrap_or_else(|e| Err(ClipboardError::WriteFailed(format!("剪贴板线程执行失败：{}", e))));

        match result {
            Ok(()) => vec![UiUpdate::Copied { text }],
            Err(e) => {
                log::warn!("⚠️ 复制失败: {}", e);
                vec![UiUpdate::Failed(ErrorPayload::from(e))]
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PickerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
