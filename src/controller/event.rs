//! 控制器的输入事件与输出更新。

use serde::{Deserialize, Serialize};

use crate::color::{PickedColor, Sample};
use crate::error::ErrorPayload;
use crate::pointer::{DisplayRect, SwatchPlacement, ViewportPoint};
use crate::raster::ImageSource;

/// 复制哪种文本形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyTarget {
    Hex,
    Rgb,
}

/// 界面层投递给控制器的事件。
#[derive(Debug, Clone)]
pub enum PickerEvent {
    /// 文件选择、拖拽或启动图片。
    LoadImage(ImageSource),
    PointerMove {
        point: ViewportPoint,
        rect: DisplayRect,
    },
    PointerLeave,
    PointerClick {
        point: ViewportPoint,
        rect: DisplayRect,
    },
    Copy(CopyTarget),
}

/// 控制器产出的界面更新。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiUpdate {
    /// 跟随光标色块移动并换色。
    SwatchMoved {
        placement: SwatchPlacement,
        sample: Sample,
        hex: String,
    },
    SwatchHidden,
    /// 点击拾取，更新持久展示区。
    ColorPicked(PickedColor),
    ImageReplaced { width: u32, height: u32 },
    Copied { text: String },
    /// 非阻塞错误提示。
    Failed(ErrorPayload),
}
